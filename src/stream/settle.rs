//! Ending a stream once its subject has settled

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::board::EventBoard;

/// Values that can report a final state.
pub trait Settled {
    fn is_settled(&self) -> bool;
}

impl Settled for EventBoard {
    fn is_settled(&self) -> bool {
        self.all_finished
    }
}

impl<T: Settled + ?Sized> Settled for Arc<T> {
    fn is_settled(&self) -> bool {
        T::is_settled(self)
    }
}

/// Extension trait to end any stream of [`Settled`] items
pub trait SettleExt: Stream {
    /// Yield items up to and including the first settled one, then end.
    fn until_settled(self) -> UntilSettled<Self>
    where
        Self: Sized,
        Self::Item: Settled,
    {
        UntilSettled::new(self)
    }
}

impl<T: Stream> SettleExt for T {}

pin_project! {
    /// Stream for [`SettleExt::until_settled`]
    pub struct UntilSettled<S> {
        #[pin]
        stream: S,
        done: bool,
    }
}

impl<S> UntilSettled<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, done: false }
    }
}

impl<S> Stream for UntilSettled<S>
where
    S: Stream,
    S::Item: Settled,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        let item = ready!(this.stream.poll_next(cx));
        match &item {
            Some(value) if value.is_settled() => *this.done = true,
            Some(_) => {}
            None => *this.done = true,
        }
        Poll::Ready(item)
    }
}
