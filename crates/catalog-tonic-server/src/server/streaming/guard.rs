//! Response-stream wrapper tying producer cancellation to stream drop.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::DropGuard;

/// A response stream that owns the drop guard of its producer's
/// cancellation token.
///
/// The transport drops the response stream when the client disconnects or
/// the call completes; dropping the guard cancels the token, so a producer
/// still running (e.g. a blocking search scan) observes the cancellation at
/// its next check and stops promptly.
pub struct Guarded<S> {
    inner: S,
    _guard: DropGuard,
}

impl<S> Guarded<S> {
    pub fn new(inner: S, guard: DropGuard) -> Self {
        Self {
            inner,
            _guard: guard,
        }
    }
}

impl<S: Stream + Unpin> Stream for Guarded<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}
