//! Compute-once values shared between readers

use crate::utils::error::{GatewayError, Result};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A lazily awaited value
///
/// The wrapped future runs at most once, on first read, and every reader gets
/// a clone of the same result. A failure is returned to each reader of this
/// value and affects nothing else.
pub struct Deferred<T> {
    inner: Shared<BoxFuture<'static, std::result::Result<T, String>>>,
    read: Arc<AtomicBool>,
}

impl<T> Clone for Deferred<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            read: self.read.clone(),
        }
    }
}

impl<T> Deferred<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = std::result::Result<T, String>> + Send + 'static,
    {
        Self {
            inner: future.boxed().shared(),
            read: Arc::new(AtomicBool::new(false)),
        }
    }

    /// An already known value
    pub fn ready(value: T) -> Self {
        Self::new(async move { Ok(value) })
    }

    pub async fn get(&self) -> Result<T> {
        self.read.store(true, Ordering::SeqCst);
        self.inner.clone().await.map_err(GatewayError::logging)
    }

    /// Whether any reader has asked for the value
    pub fn has_been_read(&self) -> bool {
        self.read.load(Ordering::SeqCst)
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("has_been_read", &self.read.load(Ordering::SeqCst))
            .finish()
    }
}
