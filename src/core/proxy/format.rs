//! Client-side chunk coalescing for `x-meter-stream-force-format`

use bytes::{Bytes, BytesMut};
use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

/// Chunks shorter than this are held back
pub const MIN_CHUNK_LEN: usize = 50;

pin_project! {
    /// Holds chunks shorter than [`MIN_CHUNK_LEN`] and prefixes them onto the
    /// next chunk
    ///
    /// Consecutive short chunks accumulate. Whatever is still held when the
    /// inner stream ends is flushed as a final chunk. An inner error is
    /// passed through and drops the held bytes.
    pub struct CoalesceSmallChunks<S> {
        #[pin]
        inner: S,
        held: BytesMut,
        threshold: usize,
        finished: bool,
    }
}

impl<S> CoalesceSmallChunks<S> {
    pub fn new(inner: S) -> Self {
        Self::with_threshold(inner, MIN_CHUNK_LEN)
    }

    pub fn with_threshold(inner: S, threshold: usize) -> Self {
        Self {
            inner,
            held: BytesMut::new(),
            threshold,
            finished: false,
        }
    }
}

impl<S, E> Stream for CoalesceSmallChunks<S>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }
        loop {
            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => {
                    if chunk.len() < *this.threshold {
                        this.held.extend_from_slice(&chunk);
                        continue;
                    }
                    if this.held.is_empty() {
                        return Poll::Ready(Some(Ok(chunk)));
                    }
                    this.held.extend_from_slice(&chunk);
                    return Poll::Ready(Some(Ok(this.held.split().freeze())));
                }
                Some(Err(e)) => {
                    this.held.clear();
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    *this.finished = true;
                    if this.held.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(this.held.split().freeze())));
                }
            }
        }
    }
}
