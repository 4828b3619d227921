use std::path::Path;

use tokio::sync::{mpsc, oneshot};

use tokenforge_api::traits::DataService;
use tokenforge_core::error::TokenforgeError;
use tokenforge_core::models::{Filter, Record};
use tokenforge_core::storage::Storage;

type Job = Box<dyn FnOnce(&Storage) + Send>;

/// Async handle to the SQLite snapshot.
///
/// `rusqlite::Connection` is not `Sync`, so the storage lives on a dedicated
/// thread and every call is shipped to it as a job.
#[derive(Clone)]
pub struct DbHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl DbHandle {
    pub fn open(path: &Path) -> Result<Self, TokenforgeError> {
        Self::spawn(Storage::open(path)?)
    }

    /// In-memory snapshot (for tests).
    pub fn open_memory() -> Result<Self, TokenforgeError> {
        Self::spawn(Storage::open_memory()?)
    }

    fn spawn(storage: Storage) -> Result<Self, TokenforgeError> {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("db-actor".into())
            .spawn(move || actor_loop(storage, rx))?;
        Ok(Self { tx })
    }

    /// Run a closure against the storage on the actor thread.
    pub async fn call<T, F>(&self, f: F) -> Result<T, TokenforgeError>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T, TokenforgeError> + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: Job = Box::new(move |storage| {
            let _ = reply.send(f(storage));
        });
        if self.tx.send(job).is_err() {
            return Err(actor_closed());
        }
        rx.await.unwrap_or_else(|_| Err(actor_closed()))
    }

    /// Replace every row of `R` within `scope` (pull-sync).
    pub async fn replace_all<R: Record>(
        &self,
        scope: Filter,
        rows: Vec<R>,
    ) -> Result<usize, TokenforgeError> {
        self.call(move |s| s.replace_all(&scope, &rows)).await
    }

    pub async fn counts(&self) -> Result<Vec<(String, i64)>, TokenforgeError> {
        self.call(|s| s.counts()).await
    }
}

fn actor_closed() -> TokenforgeError {
    TokenforgeError::Config("DB actor closed".into())
}

fn actor_loop(storage: Storage, mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.blocking_recv() {
        job(&storage);
    }
    tracing::debug!("db actor stopped");
}

impl DataService for DbHandle {
    type Error = TokenforgeError;

    async fn list<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, TokenforgeError> {
        let filter = filter.clone();
        self.call(move |s| s.list::<R>(&filter)).await
    }

    async fn insert<R: Record>(&self, record: &R) -> Result<R, TokenforgeError> {
        let record = record.clone();
        self.call(move |s| s.insert(&record)).await
    }

    async fn update<R: Record>(&self, record: &R) -> Result<R, TokenforgeError> {
        let record = record.clone();
        self.call(move |s| s.update(&record)).await
    }

    async fn delete<R: Record>(&self, id: &str) -> Result<(), TokenforgeError> {
        let id = id.to_string();
        self.call(move |s| s.delete::<R>(&id)).await
    }
}
