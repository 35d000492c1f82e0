//! Stale-response suppression for overlapping fetches
//!
//! Every call through a [`SequencedFetcher`] takes a ticket from a
//! monotonic counter before the wrapped call starts. When the call
//! succeeds, its ticket is compared against the latest one issued: only
//! the most recently issued call is delivered, older successes surface as
//! [`FetchError::Stale`]. Failures are passed through untouched, since a
//! failed call carries no data that could overwrite fresher state.
//!
//! ```text
//! fetch(a) ─ seq 1 ──────────────────────── ok ─→ Stale
//! fetch(b) ─ seq 2 ──────── ok ─→ delivered
//! ```
//!
//! Nothing is aborted. The stale response is discarded at the consumer.

use crate::error::{FetchError, StaleResponseError};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Wraps a fetch function so that only the latest call's success is delivered
///
/// Construct one per logical fetch site. Clones share the same counter, so
/// a clone belongs to the same site; independently constructed fetchers
/// never affect each other.
#[derive(Debug, Clone)]
pub struct SequencedFetcher<F> {
    call: F,
    counter: Arc<AtomicU64>,
}

/// Wrap `call` in a new [`SequencedFetcher`]
#[inline]
#[must_use]
pub fn fetch_latest<F>(call: F) -> SequencedFetcher<F> {
    SequencedFetcher::new(call)
}

impl<F> SequencedFetcher<F> {
    /// Create fetcher around `call`
    #[inline]
    #[must_use]
    pub fn new(call: F) -> Self {
        Self {
            call,
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Sequence number of the most recently issued call (0 before any call)
    #[inline]
    #[must_use]
    pub fn latest(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Check if `seq` is still the most recently issued call
    #[inline]
    #[must_use]
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest()
    }

    /// Issue a call
    ///
    /// The ticket is taken and the wrapped call is started immediately, not
    /// when the returned future is first polled. Multiple arguments are
    /// passed as a tuple.
    ///
    /// # Errors
    /// - `FetchError::Stale` if the call succeeded after a newer call was issued
    /// - `FetchError::Upstream` if the wrapped call failed
    pub fn fetch<A, Fut, T, E>(&self, args: A) -> impl Future<Output = Result<T, FetchError<E>>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(seq, "issued sequenced fetch");

        let counter = Arc::clone(&self.counter);
        let pending = (self.call)(args);

        async move {
            let value = pending.await.map_err(FetchError::Upstream)?;

            let latest = counter.load(Ordering::SeqCst);
            if seq == latest {
                Ok(value)
            } else {
                tracing::debug!(seq, latest, "discarding stale response");
                Err(StaleResponseError.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    type Reply = oneshot::Receiver<Result<u32, &'static str>>;

    fn controlled() -> SequencedFetcher<
        impl Fn(Reply) -> futures::future::BoxFuture<'static, Result<u32, &'static str>> + Clone,
    > {
        use futures::FutureExt;
        fetch_latest(|rx: Reply| {
            async move { rx.await.unwrap_or(Err("sender dropped")) }.boxed()
        })
    }

    #[tokio::test]
    async fn single_call_resolves() {
        let fetcher = controlled();
        let (tx, rx) = oneshot::channel();
        let pending = fetcher.fetch(rx);
        tx.send(Ok(7)).unwrap();

        assert_eq!(pending.await.unwrap(), 7);
        assert_eq!(fetcher.latest(), 1);
    }

    #[tokio::test]
    async fn older_success_completing_first_is_stale() {
        let fetcher = controlled();
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();

        let first = fetcher.fetch(rx1);
        let second = fetcher.fetch(rx2);

        tx1.send(Ok(1)).unwrap();
        let first = first.await;
        tx2.send(Ok(2)).unwrap();
        let second = second.await;

        assert!(first.unwrap_err().is_stale());
        assert_eq!(second.unwrap(), 2);
    }

    #[tokio::test]
    async fn older_success_completing_last_is_stale() {
        let fetcher = controlled();
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();

        let first = fetcher.fetch(rx1);
        let second = fetcher.fetch(rx2);

        tx2.send(Ok(2)).unwrap();
        assert_eq!(second.await.unwrap(), 2);
        tx1.send(Ok(1)).unwrap();
        assert!(first.await.unwrap_err().is_stale());
    }

    #[tokio::test]
    async fn failure_is_never_converted_to_stale() {
        let fetcher = controlled();
        let (tx1, rx1) = oneshot::channel();
        let (_tx2, rx2) = oneshot::channel();

        let first = fetcher.fetch(rx1);
        let _second = fetcher.fetch(rx2);

        tx1.send(Err("503")).unwrap();
        let err = first.await.unwrap_err();
        assert_eq!(err.into_upstream(), Some("503"));
    }

    #[tokio::test]
    async fn independent_fetchers_do_not_interfere() {
        let search = controlled();
        let suggest = controlled();
        let (tx1, rx1) = oneshot::channel();
        let (_tx2, rx2) = oneshot::channel();

        let pending = search.fetch(rx1);
        let _other = suggest.fetch(rx2);

        tx1.send(Ok(3)).unwrap();
        assert_eq!(pending.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn clones_share_staleness() {
        let fetcher = controlled();
        let clone = fetcher.clone();
        let (tx1, rx1) = oneshot::channel();
        let (_tx2, rx2) = oneshot::channel();

        let pending = fetcher.fetch(rx1);
        let _newer = clone.fetch(rx2);

        tx1.send(Ok(1)).unwrap();
        assert!(pending.await.unwrap_err().is_stale());
        assert!(fetcher.is_current(2));
    }

    #[test]
    fn ticket_is_taken_at_call_time() {
        let fetcher = controlled();
        let (_tx, rx) = oneshot::channel();
        let _unpolled = fetcher.fetch(rx);
        assert_eq!(fetcher.latest(), 1);
        assert!(!fetcher.is_current(0));
    }
}
