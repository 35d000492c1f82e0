//! Storefront Fetch - navigation data fetching
//!
//! Two small utilities used by page transitions and search-as-you-type:
//! - [`SequencedFetcher`]: only the latest of several overlapping calls is
//!   delivered; older successes surface as stale
//! - [`LazyProps`]: races a fetch against a rendering deadline and hands back
//!   either the data or a handle to the still-pending fetch
//!
//! # Architecture
//!
//! ```text
//! UI event → LazyProps ──(history hit)──────────────→ Ready(data)
//!                │
//!                └─ spawn fetch ─┬─ settles first ──→ Ready(data) / Err
//!                   (optionally  └─ deadline first ─→ Lazy(handle) ─→ data / Err
//!                    sequenced)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_fetch::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let search = fetch_latest(|query: String| api.suggest(query));
//! match search.fetch("sho".into()).await {
//!     Ok(suggestions) => render(suggestions),
//!     Err(e) if e.is_stale() => {}
//!     Err(e) => return Err(e.into()),
//! }
//!
//! let props = create_lazy_props(|ctx: LoadContext| api.page(ctx), LazyPropsConfig::new());
//! match props.load(LoadContext::new("/p/42")).await? {
//!     LazyResult::Ready(page) => render(page),
//!     LazyResult::Lazy(pending) => render_skeleton(pending),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod cache;
pub mod error;
pub mod lazy;
pub mod sequenced;
pub mod types;

// Re-exports for convenience
pub use cache::{CacheStats, HistoryCache, PageCache};
pub use error::{ConfigError, FetchError, StaleResponseError};
pub use lazy::{create_lazy_props, LazyHandle, LazyProps, LazyResult};
pub use sequenced::{fetch_latest, SequencedFetcher};
pub use types::{LazyPropsConfig, LoadContext, RenderMode, DEFAULT_TIMEOUT_MS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with storefront fetching
    pub use crate::{
        create_lazy_props, fetch_latest, FetchError, HistoryCache, LazyProps, LazyPropsConfig,
        LazyResult, LoadContext, PageCache, RenderMode, SequencedFetcher, StaleResponseError,
    };
}
