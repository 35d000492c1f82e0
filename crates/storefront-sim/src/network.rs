//! Simulated storefront backend
//!
//! Answers search and page requests after a seeded random latency, and
//! fails a configurable share of them.

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storefront_fetch::LoadContext;

const CATALOG: &[&str] = &[
    "sandals", "shirts", "shoes", "shorts", "skirts", "sneakers", "socks", "sweaters", "hats",
    "hoodies", "jackets", "jeans",
];

/// Failure reported by the simulated backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// The request was dropped by the simulated backend
    #[error("request for {0} failed")]
    RequestFailed(String),
}

/// Latency and reliability of the simulated backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// Fastest response
    pub min_latency_ms: u64,
    /// Slowest response
    pub max_latency_ms: u64,
    /// Share of requests that fail, 0.0 to 1.0
    pub failure_rate: f64,
}

impl NetworkProfile {
    /// Every request takes exactly `latency_ms` and succeeds
    #[inline]
    #[must_use]
    pub fn fixed(latency_ms: u64) -> Self {
        Self {
            min_latency_ms: latency_ms,
            max_latency_ms: latency_ms,
            failure_rate: 0.0,
        }
    }

    /// With share of failing requests, clamped to 0.0..=1.0 (NaN counts as 0.0)
    #[inline]
    #[must_use]
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = clamp_rate(rate);
        self
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

impl Default for NetworkProfile {
    fn default() -> Self {
        Self {
            min_latency_ms: 20,
            max_latency_ms: 200,
            failure_rate: 0.0,
        }
    }
}

/// Page data returned by the simulated backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    /// Path the page was loaded for
    pub path: String,
    /// Page title
    pub title: String,
}

/// Seeded simulated backend. Clones share the random stream and counters.
#[derive(Debug, Clone)]
pub struct SimulatedNetwork {
    profile: NetworkProfile,
    rng: Arc<Mutex<StdRng>>,
    requests: Arc<AtomicU64>,
}

impl SimulatedNetwork {
    /// Create backend with profile and seed
    #[must_use]
    pub fn new(profile: NetworkProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of requests received so far
    #[inline]
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Draw latency and failure for the next request
    fn draw(&self) -> (Duration, bool) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut rng = self.rng.lock();
        let (min, max) = (
            self.profile.min_latency_ms,
            self.profile.max_latency_ms.max(self.profile.min_latency_ms),
        );
        let latency = rng.gen_range(min..=max);
        let fails = rng.gen_bool(clamp_rate(self.profile.failure_rate));
        (Duration::from_millis(latency), fails)
    }

    /// Suggestions for a search prefix
    pub fn search(
        &self,
        query: String,
    ) -> impl Future<Output = Result<Vec<String>, NetworkError>> + Send + 'static {
        let (latency, fails) = self.draw();
        tracing::trace!(%query, ?latency, fails, "search request");

        async move {
            tokio::time::sleep(latency).await;
            if fails {
                return Err(NetworkError::RequestFailed(query));
            }
            Ok(CATALOG
                .iter()
                .filter(|item| item.starts_with(query.as_str()))
                .map(|item| (*item).to_string())
                .collect())
        }
    }

    /// Page data for a destination
    pub fn page(
        &self,
        ctx: LoadContext,
    ) -> impl Future<Output = Result<PageData, NetworkError>> + Send + 'static {
        let (latency, fails) = self.draw();
        tracing::trace!(path = %ctx.as_path, ?latency, fails, "page request");

        async move {
            tokio::time::sleep(latency).await;
            if fails {
                return Err(NetworkError::RequestFailed(ctx.as_path));
            }
            let title = format!("Page {}", ctx.as_path.trim_start_matches('/'));
            Ok(PageData {
                path: ctx.as_path,
                title,
            })
        }
    }
}
