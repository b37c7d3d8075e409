//! Shared ownership of a slice, with change notifications for subscribers.
use crate::request::{OperationKey, RequestTracker, Settlement, Ticket};
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// State that tracks its operations with a [`RequestTracker`].
pub trait Slice {
    type Operation: OperationKey;

    fn requests(&mut self) -> &mut RequestTracker<Self::Operation>;
}

/// Cloneable handle to a slice. Every clone sees the same state.
///
/// Writes only happen when an operation begins or settles; the lock is released
/// while the remote call is in flight.
#[derive(Debug)]
pub struct SliceHandle<S> {
    state: Arc<RwLock<S>>,
    changes: Arc<watch::Sender<u64>>,
}

impl<S> Clone for SliceHandle<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            changes: Arc::clone(&self.changes),
        }
    }
}

impl<S: Slice> SliceHandle<S> {
    pub fn new(slice: S) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(slice)),
            changes: Arc::new(changes),
        }
    }

    /// Yields a new revision every time the slice changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.changes.borrow()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.state.read().await)
    }

    pub async fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.state.read().await.clone()
    }

    /// Applies a local change that does not involve the remote API.
    pub async fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let result = f(&mut *self.state.write().await);
        self.notify();
        result
    }

    /// Runs one operation: marks it pending, awaits `call`, then lets `settle` merge
    /// the outcome into the slice.
    pub async fn dispatch<R, F>(
        &self,
        operation: S::Operation,
        call: impl Future<Output = Result<R, String>>,
        settle: F,
    ) -> Settlement
    where
        F: FnOnce(&mut S, Ticket<S::Operation>, Result<R, String>) -> Settlement,
    {
        let ticket = self.update(|slice| slice.requests().begin(operation)).await;
        let result = call.await;
        self.update(|slice| settle(slice, ticket, result)).await
    }

    /// Rejects `operation` without calling the remote API. Calls already in flight
    /// still settle normally.
    pub async fn refuse(&self, operation: S::Operation, message: String) -> Settlement {
        self.update(|slice| slice.requests().refuse(operation, message))
            .await
    }

    pub async fn cancel(&self, operation: S::Operation) -> bool {
        self.update(|slice| slice.requests().cancel(operation)).await
    }

    pub async fn clear_error(&self, operation: S::Operation) -> Option<String> {
        self.update(|slice| slice.requests().clear_error(operation))
            .await
    }

    fn notify(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }
}
