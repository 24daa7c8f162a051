//! Tee between the upstream body, the client and the log accumulator
//!
//! [`StreamInterceptor::new`] splits an upstream body into an
//! [`InterceptedBody`] that is handed to the client and a cloneable
//! [`StreamInterceptor`] handle. Every chunk that reaches the client is also
//! pushed into a shared accumulator. The first terminal event wins and
//! resolves a single [`CompletedChunk`] that every waiter observes.

use super::types::BodyStream;
use crate::utils::error::Result;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::task::AtomicWaker;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use tokio::sync::Notify;

/// How a response stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalReason {
    /// Upstream finished normally
    Done,
    /// Client dropped the stream
    Cancel,
    /// External deadline fired
    Timeout,
    /// Upstream body failed
    Error,
}

impl TerminalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalReason::Done => "done",
            TerminalReason::Cancel => "cancel",
            TerminalReason::Timeout => "timeout",
            TerminalReason::Error => "error",
        }
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memoized outcome of an intercepted stream
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedChunk {
    /// Every byte relayed before the terminal event
    pub body: Bytes,
    pub end_time: DateTime<Utc>,
    pub first_chunk_time: Option<DateTime<Utc>>,
    pub reason: TerminalReason,
}

#[derive(Default)]
struct Accumulator {
    chunks: Vec<Bytes>,
    first_chunk_time: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Shared {
    accumulator: Mutex<Accumulator>,
    outcome: OnceLock<Arc<CompletedChunk>>,
    resolved: Notify,
    /// Client stream task, woken on external resolution
    client: AtomicWaker,
}

impl Shared {
    fn record(&self, chunk: &Bytes) {
        if chunk.is_empty() {
            return;
        }
        let mut acc = self.accumulator.lock();
        if acc.first_chunk_time.is_none() {
            acc.first_chunk_time = Some(Utc::now());
        }
        acc.chunks.push(chunk.clone());
    }

    fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Resolve the outcome; false if it was already resolved
    fn resolve(&self, reason: TerminalReason) -> bool {
        let mut won = false;
        self.outcome.get_or_init(|| {
            won = true;
            let acc = self.accumulator.lock();
            let mut body = BytesMut::with_capacity(acc.chunks.iter().map(Bytes::len).sum());
            for chunk in &acc.chunks {
                body.extend_from_slice(chunk);
            }
            Arc::new(CompletedChunk {
                body: body.freeze(),
                end_time: Utc::now(),
                first_chunk_time: acc.first_chunk_time,
                reason,
            })
        });
        if won {
            self.resolved.notify_waiters();
            self.client.wake();
        }
        won
    }
}

/// Handle on an intercepted stream
///
/// Cheap to clone. The HTTP layer uses it to fire the deadline, the log
/// assembler uses it to wait for the outcome.
#[derive(Clone)]
pub struct StreamInterceptor {
    shared: Arc<Shared>,
}

impl fmt::Debug for StreamInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamInterceptor")
            .field("resolved", &self.shared.is_resolved())
            .finish()
    }
}

impl StreamInterceptor {
    /// Split an upstream body
    ///
    /// With no body there is nothing to relay: the outcome resolves at once
    /// as `done` with an empty body and no client stream is returned.
    pub fn new(body: Option<BodyStream>) -> (Self, Option<InterceptedBody>) {
        let shared = Arc::new(Shared::default());
        let handle = Self {
            shared: shared.clone(),
        };
        match body {
            Some(inner) => (handle, Some(InterceptedBody { inner, shared })),
            None => {
                shared.resolve(TerminalReason::Done);
                (handle, None)
            }
        }
    }

    /// Wait for the terminal outcome
    ///
    /// All callers receive the same memoized value.
    pub async fn wait_for_chunk(&self) -> Arc<CompletedChunk> {
        loop {
            let notified = self.shared.resolved.notified();
            if let Some(chunk) = self.shared.outcome.get() {
                return chunk.clone();
            }
            notified.await;
        }
    }

    /// Outcome if already resolved
    pub fn try_get(&self) -> Option<Arc<CompletedChunk>> {
        self.shared.outcome.get().cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.shared.is_resolved()
    }

    /// Resolve as timed out; no-op once resolved
    pub fn timeout(&self) -> bool {
        self.shared.resolve(TerminalReason::Timeout)
    }

    /// Resolve as cancelled; no-op once resolved
    pub fn cancel(&self) -> bool {
        self.shared.resolve(TerminalReason::Cancel)
    }
}

/// Client side of the tee
///
/// Dropping it before the upstream ends resolves the outcome as `cancel`.
/// After an external resolution (deadline) it ends the client stream.
pub struct InterceptedBody {
    inner: BodyStream,
    shared: Arc<Shared>,
}

impl Stream for InterceptedBody {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.shared.client.register(cx.waker());
        if this.shared.is_resolved() {
            return Poll::Ready(None);
        }
        match this.inner.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                this.shared.record(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.shared.resolve(TerminalReason::Error);
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.shared.resolve(TerminalReason::Done);
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for InterceptedBody {
    fn drop(&mut self) {
        self.shared.resolve(TerminalReason::Cancel);
    }
}
