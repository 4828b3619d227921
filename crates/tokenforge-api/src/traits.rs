//! Trait definitions for the remote collaborators.
//!
//! The hosted database and the local snapshot both implement
//! [`DataService`], so stores never know where rows live. AI providers
//! implement [`AiProvider`] and are treated as opaque completion calls.

use std::future::Future;

use tokenforge_core::models::{Filter, Record};

/// Row-level CRUD against a table-per-record backend.
pub trait DataService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All rows of `R` matching the filter.
    fn list<R: Record>(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<R>, Self::Error>> + Send;

    /// Insert a row, returning the stored representation.
    fn insert<R: Record>(&self, record: &R) -> impl Future<Output = Result<R, Self::Error>> + Send;

    /// Replace a row by id, returning the stored representation.
    fn update<R: Record>(&self, record: &R) -> impl Future<Output = Result<R, Self::Error>> + Send;

    /// Delete a row by id.
    fn delete<R: Record>(&self, id: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A text-completion model.
pub trait AiProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short provider name, stored with each analysis.
    fn name(&self) -> &'static str;

    /// Send one system + user prompt pair and return the reply text.
    fn complete(
        &self,
        system: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
