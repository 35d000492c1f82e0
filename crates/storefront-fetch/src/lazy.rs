//! Deadline-bound loading of page props
//!
//! A client-side transition has to render something right away. [`LazyProps`]
//! races the fetch callback against a short timer:
//!
//! - fetch settles first: its value (or error) is returned directly
//! - timer fires first: a [`LazyResult::Lazy`] is returned at once, holding a
//!   handle to the fetch, which keeps running
//!
//! In [`RenderMode::Server`] there is no deadline and the callback is simply
//! awaited. On the client a history cache hit for the destination skips the
//! network entirely.
//!
//! A timeout is not an error. Errors come only from the callback itself.

use crate::cache::HistoryCache;
use crate::error::FetchError;
use crate::types::{LazyPropsConfig, LoadContext, RenderMode};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::{JoinError, JoinHandle};

/// Outcome of a lazy props load
///
/// The shape is decided once, when the race settles.
#[derive(Debug)]
pub enum LazyResult<T, E> {
    /// Data arrived before the deadline (or no deadline applied)
    Ready(T),
    /// Deadline passed first; await the handle for the data
    Lazy(LazyHandle<T, E>),
}

impl<T, E> LazyResult<T, E> {
    /// Check if the caller should render a placeholder
    #[inline]
    #[must_use]
    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }

    /// Check if data is available now
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Take the data, if it is available now
    #[inline]
    pub fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Lazy(_) => None,
        }
    }

    /// Take the pending handle, if the deadline passed first
    #[inline]
    pub fn into_lazy(self) -> Option<LazyHandle<T, E>> {
        match self {
            Self::Ready(_) => None,
            Self::Lazy(handle) => Some(handle),
        }
    }

    /// Wait for the data regardless of shape
    ///
    /// # Errors
    /// - `FetchError::Upstream` if the still-pending fetch failed
    /// - `FetchError::Cancelled` if its task was torn down by the runtime
    pub async fn resolve(self) -> Result<T, FetchError<E>> {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Lazy(handle) => handle.await,
        }
    }
}

/// Handle to a fetch that outlived its deadline
///
/// Resolves to the fetch's own outcome; a failure is delivered here rather
/// than dropped. Dropping the handle detaches the fetch, which still runs
/// to completion.
pub struct LazyHandle<T, E> {
    task: JoinHandle<Result<T, E>>,
}

impl<T, E> LazyHandle<T, E> {
    /// Check if the fetch has settled without consuming the handle
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T, E> fmt::Debug for LazyHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl<T, E> Future for LazyHandle<T, E> {
    type Output = Result<T, FetchError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().task).poll(cx).map(settle)
    }
}

/// Unwrap a joined fetch task. A panic in the fetch resumes on the caller.
fn settle<T, E>(joined: Result<Result<T, E>, JoinError>) -> Result<T, FetchError<E>> {
    match joined {
        Ok(outcome) => outcome.map_err(FetchError::Upstream),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(FetchError::Cancelled),
    }
}

/// Wraps a fetch callback with a rendering deadline
///
/// `F` takes a [`LoadContext`] and returns the future of the page data.
pub struct LazyProps<F, T> {
    fetch: F,
    config: LazyPropsConfig,
    cache: Option<Arc<dyn HistoryCache<T>>>,
}

/// Wrap `fetch` in [`LazyProps`] with the given configuration
#[inline]
#[must_use]
pub fn create_lazy_props<F, T>(fetch: F, config: LazyPropsConfig) -> LazyProps<F, T> {
    LazyProps::new(fetch).with_config(config)
}

impl<F, T> LazyProps<F, T> {
    /// Create with default configuration (client, 50 ms) and no cache
    #[inline]
    #[must_use]
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            config: LazyPropsConfig::default(),
            cache: None,
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: LazyPropsConfig) -> Self {
        self.config = config;
        self
    }

    /// With history cache consulted on client transitions
    #[inline]
    #[must_use]
    pub fn with_cache<C>(self, cache: C) -> Self
    where
        C: HistoryCache<T> + 'static,
    {
        self.with_shared_cache(Arc::new(cache))
    }

    /// With a history cache already shared elsewhere
    #[inline]
    #[must_use]
    pub fn with_shared_cache(mut self, cache: Arc<dyn HistoryCache<T>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LazyPropsConfig {
        &self.config
    }

    /// Load props for a destination
    ///
    /// # Errors
    /// - `FetchError::Upstream` if the callback failed before the deadline
    ///   (or at all, in server mode)
    /// - `FetchError::Cancelled` if the fetch task was torn down by the runtime
    pub async fn load<Fut, E>(&self, ctx: LoadContext) -> Result<LazyResult<T, E>, FetchError<E>>
    where
        F: Fn(LoadContext) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        match self.config.mode {
            RenderMode::Server => (self.fetch)(ctx)
                .await
                .map(LazyResult::Ready)
                .map_err(FetchError::Upstream),
            RenderMode::Client => self.load_before_deadline(ctx).await,
        }
    }

    async fn load_before_deadline<Fut, E>(
        &self,
        ctx: LoadContext,
    ) -> Result<LazyResult<T, E>, FetchError<E>>
    where
        F: Fn(LoadContext) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lookup(ctx.cache_key()).await {
                tracing::debug!(path = %ctx.as_path, "serving props from history");
                return Ok(LazyResult::Ready(hit));
            }
        }

        let path = ctx.as_path.clone();
        let timeout = self.config.timeout();
        let mut task = tokio::spawn((self.fetch)(ctx));

        tokio::select! {
            biased;
            joined = &mut task => {
                tracing::debug!(%path, "props arrived before deadline");
                settle(joined).map(LazyResult::Ready)
            }
            () = tokio::time::sleep(timeout) => {
                tracing::debug!(%path, ?timeout, "deadline passed, props pending");
                Ok(LazyResult::Lazy(LazyHandle { task }))
            }
        }
    }
}

impl<F, T> fmt::Debug for LazyProps<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyProps")
            .field("config", &self.config)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}
