//! Awaitable single-shot results for store and lifecycle operations
//!
//! Every backend operation hands back a [`PendingResult`] wrapping a
//! `oneshot` receiver. Awaiting it yields `Result<T>`; attaching a handler
//! with `on_result` yields whatever the handler maps the result to.

use crate::{KeyError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use zeroize::Zeroizing;

/// Result of a store operation
pub type StoreResult = PendingResult<()>;
/// Result of a fetch operation; `None` when nothing is stored
pub type FetchResult = PendingResult<Option<Zeroizing<Vec<u8>>>>;
/// Result of a delete operation
pub type DeleteResult = PendingResult<()>;
/// Result of an exists check
pub type ExistsResult = PendingResult<bool>;

/// Single-shot result delivered by a background task
pub struct PendingResult<T> {
    receiver: oneshot::Receiver<Result<T>>,
    operation: &'static str,
}

impl<T: Send + 'static> PendingResult<T> {
    /// Wrap a receiver whose sender is owned by a running task
    #[must_use]
    pub fn from_receiver(operation: &'static str, receiver: oneshot::Receiver<Result<T>>) -> Self {
        Self {
            receiver,
            operation,
        }
    }

    /// A result that is already known
    #[must_use]
    pub fn ready(operation: &'static str, result: Result<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self::from_receiver(operation, rx)
    }

    /// Run `work` on the current tokio runtime and deliver its output
    ///
    /// Outside a runtime nothing is spawned and the result resolves to
    /// [`KeyError::Internal`].
    pub fn spawn<Fut>(operation: &'static str, work: Fut) -> Self
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::error!("{operation} was started outside a tokio runtime");
                return Self::ready(
                    operation,
                    Err(KeyError::internal(format!(
                        "{operation} requires a tokio runtime"
                    ))),
                );
            }
        };

        let (tx, rx) = oneshot::channel();
        handle.spawn(async move {
            let _ = tx.send(work.await);
        });
        Self::from_receiver(operation, rx)
    }

    /// Add a result handler
    pub fn on_result<F, U>(self, handler: F) -> PendingResultWithHandler<T, F>
    where
        F: FnOnce(Result<T>) -> U,
    {
        PendingResultWithHandler::new(self, handler)
    }
}

impl<T> Future for PendingResult<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let operation = self.operation;
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(dropped(operation))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Pending result with a user-defined handler
pub struct PendingResultWithHandler<T, F> {
    receiver: oneshot::Receiver<Result<T>>,
    operation: &'static str,
    handler: Option<F>,
    completed: bool,
}

impl<T, F> PendingResultWithHandler<T, F> {
    /// Attach `handler` to a pending result
    pub fn new(pending: PendingResult<T>, handler: F) -> Self {
        Self {
            receiver: pending.receiver,
            operation: pending.operation,
            handler: Some(handler),
            completed: false,
        }
    }
}

impl<T, F, U> Future for PendingResultWithHandler<T, F>
where
    F: FnOnce(Result<T>) -> U + Unpin,
{
    type Output = U;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        // A completed future stays pending instead of panicking on re-poll
        if this.completed {
            return Poll::Pending;
        }

        let result = match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => result,
            Poll::Ready(Err(_)) => Err(dropped(this.operation)),
            Poll::Pending => return Poll::Pending,
        };

        this.completed = true;
        match this.handler.take() {
            Some(handler) => Poll::Ready(handler(result)),
            None => Poll::Pending,
        }
    }
}

fn dropped(operation: &str) -> KeyError {
    KeyError::internal(format!("{operation} task dropped before completing"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_result_resolves() {
        let result: ExistsResult = PendingResult::ready("exists", Ok(true));
        assert!(result.await.unwrap());
    }

    #[tokio::test]
    async fn test_spawned_work_resolves() {
        let result: PendingResult<u32> = PendingResult::spawn("compute", async { Ok(7) });
        assert_eq!(result.await.unwrap(), 7);
    }

    #[test]
    fn test_spawn_outside_runtime_reports_error() {
        let result: PendingResult<u32> = PendingResult::spawn("compute", async { Ok(7) });

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let outcome = runtime.block_on(result);
        assert!(matches!(outcome, Err(KeyError::Internal(msg)) if msg.contains("compute")));
    }

    #[tokio::test]
    async fn test_dropped_sender_surfaces_internal_error() {
        let (tx, rx) = oneshot::channel::<Result<()>>();
        drop(tx);
        let result = StoreResult::from_receiver("store", rx).await;
        assert!(matches!(result, Err(KeyError::Internal(msg)) if msg.contains("store")));
    }

    #[tokio::test]
    async fn test_handler_maps_error() {
        let outcome = DeleteResult::ready("delete", Err(KeyError::KeyNotAvailable))
            .on_result(|result| match result {
                Ok(()) => "deleted".to_string(),
                Err(e) => format!("error: {e}"),
            })
            .await;
        assert!(outcome.starts_with("error:"));
    }
}
