//! Cooperative cancellation for store calls.
//!
//! Every repository operation accepts an optional [`CancellationToken`].
//! When the token fires first, the in-flight store future is dropped,
//! which aborts the request on the driver side or discards its result.
//! A write already acknowledged by the store is not rolled back.

use std::future::Future;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::result::AppResult;

/// Drive `fut` to completion unless `cancel` fires first.
pub async fn run_cancellable<F, T>(
    cancel: Option<&CancellationToken>,
    operation: &str,
    fut: F,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    let Some(token) = cancel else {
        return fut.await;
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(AppError::cancelled(format!("{operation} was cancelled"))),
        result = fut => result,
    }
}

/// Wrap `inner` so that it yields one `Cancelled` error and ends once
/// `token` fires.
pub fn cancellable_stream<T: Send + 'static>(
    inner: BoxStream<'static, AppResult<T>>,
    token: CancellationToken,
    operation: &str,
) -> BoxStream<'static, AppResult<T>> {
    let operation = operation.to_string();
    stream::unfold(Some((inner, token)), move |state| {
        let operation = operation.clone();
        async move {
            let (mut inner, token) = state?;
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                item = inner.next() => Some(item),
            };
            match next {
                None => Some((
                    Err(AppError::cancelled(format!("{operation} was cancelled"))),
                    None,
                )),
                Some(None) => None,
                Some(Some(item)) => Some((item, Some((inner, token)))),
            }
        }
    })
    .boxed()
}
