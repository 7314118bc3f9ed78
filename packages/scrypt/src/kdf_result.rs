//! Async derivation result implementing the unwrapping pattern

use crate::{DerivedKey, Result, ScryptError};
use kdfbridge_common::NotResult;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Pending derivation
pub struct AsyncKdfResult {
    receiver: oneshot::Receiver<Result<DerivedKey>>,
}

/// Pending derivation with a user-defined result handler
pub struct AsyncKdfResultWithHandler<F> {
    receiver: oneshot::Receiver<Result<DerivedKey>>,
    handler: Option<F>,
}

impl AsyncKdfResult {
    /// Create a new `AsyncKdfResult` from a oneshot receiver
    pub(crate) fn new(receiver: oneshot::Receiver<Result<DerivedKey>>) -> Self {
        Self { receiver }
    }

    /// Create an `AsyncKdfResult` that's already completed
    #[must_use]
    pub fn ready(result: Result<DerivedKey>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { receiver: rx }
    }

    /// Create an `AsyncKdfResult` that yields an error
    #[must_use]
    pub fn error(error: ScryptError) -> Self {
        Self::ready(Err(error))
    }

    /// Attach a handler that turns the `Result` into a plain value
    pub fn on_result<F, T>(self, handler: F) -> AsyncKdfResultWithHandler<F>
    where
        F: FnOnce(Result<DerivedKey>) -> T,
        T: NotResult,
    {
        AsyncKdfResultWithHandler {
            receiver: self.receiver,
            handler: Some(handler),
        }
    }
}

fn dropped() -> ScryptError {
    ScryptError::internal("Derivation task dropped")
}

impl Future for AsyncKdfResult {
    type Output = Result<DerivedKey>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(dropped())),
            Poll::Pending => Poll::Pending,
        }
    }
}

// The handler is only moved out, never pinned
impl<F> Unpin for AsyncKdfResultWithHandler<F> {}

impl<F, T> Future for AsyncKdfResultWithHandler<F>
where
    F: FnOnce(Result<DerivedKey>) -> T,
    T: NotResult,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        // Handler already consumed: the future has completed
        if this.handler.is_none() {
            return Poll::Pending;
        }

        let result = match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => result,
            Poll::Ready(Err(_)) => Err(dropped()),
            Poll::Pending => return Poll::Pending,
        };
        match this.handler.take() {
            Some(handler) => Poll::Ready(handler(result)),
            None => Poll::Pending,
        }
    }
}
