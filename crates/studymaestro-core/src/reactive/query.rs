//! Observable store queries.
//!
//! A [`Query`] pairs a read with the change counter of the table it reads.
//! Whoever holds it can re-run the read whenever the counter moves, which is
//! how every query re-emits its full result set after a write.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{StoreError, StoreResult};

type Fetch<T> = Arc<dyn Fn() -> StoreResult<T> + Send + Sync>;

pub struct Query<T> {
    changes: watch::Receiver<u64>,
    fetch: Fetch<T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            changes: self.changes.clone(),
            fetch: Arc::clone(&self.fetch),
        }
    }
}

impl<T: Send + 'static> Query<T> {
    pub fn new<F>(changes: watch::Receiver<u64>, fetch: F) -> Self
    where
        F: Fn() -> StoreResult<T> + Send + Sync + 'static,
    {
        Self {
            changes,
            fetch: Arc::new(fetch),
        }
    }

    /// Run the read once on the calling thread.
    pub fn fetch(&self) -> StoreResult<T> {
        (self.fetch)()
    }

    /// Run the read once on the blocking pool.
    pub async fn fetch_async(&self) -> StoreResult<T> {
        let fetch = Arc::clone(&self.fetch);
        tokio::task::spawn_blocking(move || fetch())
            .await
            .map_err(StoreError::from)?
    }

    /// A fresh receiver for the table's change counter.
    ///
    /// The current revision is marked as seen, so the first `changed()`
    /// resolves on the next write.
    pub fn changes(&self) -> watch::Receiver<u64> {
        let mut rx = self.changes.clone();
        rx.mark_unchanged();
        rx
    }

    /// Transform every result of this query.
    pub fn map<U, F>(self, f: F) -> Query<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let fetch = self.fetch;
        Query {
            changes: self.changes,
            fetch: Arc::new(move || fetch().map(&f)),
        }
    }
}
