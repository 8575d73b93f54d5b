//! Bounded fan-out of independent requests
//!
//! Results come back in input order regardless of completion order.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;

/// Run `f` over every item with at most `limit` futures in flight
pub async fn bounded<I, F, Fut, T>(items: I, limit: usize, f: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    stream::iter(items)
        .map(f)
        .buffered(limit.max(1))
        .collect()
        .await
}

/// Like [`bounded`] but stops at the first error
pub async fn try_bounded<I, F, Fut, T, E>(items: I, limit: usize, f: F) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    stream::iter(items)
        .map(f)
        .buffered(limit.max(1))
        .try_collect()
        .await
}
