use tokenforge_api::backend::RestClient;
use tokenforge_api::traits::DataService;
use tokenforge_core::models::{Filter, Record};

use crate::db::DbHandle;
use crate::RuntimeError;

/// Where the stores read and write rows.
pub enum Backend {
    /// SQLite snapshot on this machine.
    Local(DbHandle),
    /// Hosted database.
    Remote(RestClient),
}

impl Backend {
    pub fn describe(&self) -> String {
        match self {
            Self::Local(_) => "local snapshot".into(),
            Self::Remote(c) => format!("remote {}", c.base_url()),
        }
    }
}

impl DataService for Backend {
    type Error = RuntimeError;

    async fn list<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, RuntimeError> {
        Ok(match self {
            Self::Local(db) => db.list(filter).await?,
            Self::Remote(c) => c.list(filter).await?,
        })
    }

    async fn insert<R: Record>(&self, record: &R) -> Result<R, RuntimeError> {
        Ok(match self {
            Self::Local(db) => db.insert(record).await?,
            Self::Remote(c) => c.insert(record).await?,
        })
    }

    async fn update<R: Record>(&self, record: &R) -> Result<R, RuntimeError> {
        Ok(match self {
            Self::Local(db) => db.update(record).await?,
            Self::Remote(c) => c.update(record).await?,
        })
    }

    async fn delete<R: Record>(&self, id: &str) -> Result<(), RuntimeError> {
        match self {
            Self::Local(db) => db.delete::<R>(id).await?,
            Self::Remote(c) => c.delete::<R>(id).await?,
        }
        Ok(())
    }
}
