pub mod client;
pub mod error;

pub use client::RestClient;
pub use error::BackendError;
