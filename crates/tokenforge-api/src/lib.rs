pub mod ai;
pub mod backend;
pub mod github;
mod http;
pub mod traits;
