//! Page transition simulation
//!
//! Loads a page through lazy props against the simulated backend, then
//! optionally navigates back to it, which should be served from history.

use crate::elapsed_ms;
use crate::network::{NetworkProfile, PageData, SimulatedNetwork};
use serde::Serialize;
use storefront_fetch::{
    create_lazy_props, LazyPropsConfig, LazyResult, LoadContext, PageCache, RenderMode,
};
use tokio::time::Instant;

/// Navigation simulation configuration
#[derive(Debug, Clone, Serialize)]
pub struct NavigationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Destination path
    pub path: String,
    /// Backend latency for page requests
    pub latency_ms: u64,
    /// Make every page request fail
    pub fail: bool,
    /// Navigate to the same destination a second time
    pub revisit: bool,
    /// Deadline settings
    pub lazy: LazyPropsConfig,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            path: "/p/1".to_string(),
            latency_ms: 120,
            fail: false,
            revisit: false,
            lazy: LazyPropsConfig::default(),
        }
    }
}

/// Shape the UI had to render first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderShape {
    /// Data was available immediately
    Ready,
    /// Skeleton first, data later
    Lazy,
    /// Load failed before anything could render
    Rejected,
}

/// Record of one navigation
#[derive(Debug, Clone, Serialize)]
pub struct VisitReport {
    /// Destination visited
    pub path: String,
    /// Shape rendered first
    pub shape: RenderShape,
    /// Time until the load returned and something could render
    pub first_render_ms: u64,
    /// Time until data (or an error) was available
    pub settled_ms: u64,
    /// Page title, if the load succeeded
    pub title: Option<String>,
    /// Error message, if the load failed
    pub error: Option<String>,
}

/// Final report from the navigation simulation
#[derive(Debug, Clone, Serialize)]
pub struct NavigationReport {
    /// Configuration the run used
    pub config: NavigationConfig,
    /// One record per navigation, in order
    pub visits: Vec<VisitReport>,
    /// Requests the backend received
    pub network_requests: u64,
}

impl NavigationReport {
    /// Check if simulation passed all criteria
    ///
    /// A successful first visit in client mode must make the revisit a
    /// history hit: ready immediately, no second request.
    pub fn passed(&self) -> bool {
        let client = self.config.lazy.mode == RenderMode::Client;
        match self.visits.as_slice() {
            [first, second] if client && first.error.is_none() => {
                second.shape == RenderShape::Ready && self.network_requests == 1
            }
            _ => true,
        }
    }

    /// Generate text report
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Navigation Simulation ===\n\n");
        report.push_str(&format!("Path: {}\n", self.config.path));
        report.push_str(&format!("Backend Latency: {}ms\n", self.config.latency_ms));
        report.push_str(&format!(
            "Mode: {:?}, Deadline: {}ms\n",
            self.config.lazy.mode, self.config.lazy.timeout_ms
        ));
        report.push_str(&format!("Network Requests: {}\n", self.network_requests));

        report.push_str("\n=== Visits ===\n");
        for (i, visit) in self.visits.iter().enumerate() {
            report.push_str(&format!(
                "{}. {:?} first render {}ms, settled {}ms",
                i + 1,
                visit.shape,
                visit.first_render_ms,
                visit.settled_ms
            ));
            if let Some(title) = &visit.title {
                report.push_str(&format!(", title {title:?}"));
            }
            if let Some(error) = &visit.error {
                report.push_str(&format!(", error: {error}"));
            }
            report.push('\n');
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Run the navigation simulation
pub async fn run_navigation(config: NavigationConfig) -> NavigationReport {
    let mut profile = NetworkProfile::fixed(config.latency_ms);
    if config.fail {
        profile = profile.with_failure_rate(1.0);
    }
    let network = SimulatedNetwork::new(profile, config.seed);
    let history = PageCache::<PageData>::default();

    let backend = network.clone();
    let props = create_lazy_props(move |ctx: LoadContext| backend.page(ctx), config.lazy.clone())
        .with_cache(history.clone());

    let planned = if config.revisit { 2 } else { 1 };
    let mut visits = Vec::with_capacity(planned);

    for _ in 0..planned {
        let ctx = LoadContext::new(config.path.clone());
        let start = Instant::now();

        let loaded = props.load(ctx.clone()).await;
        let first_render_ms = elapsed_ms(start);

        let (shape, settled) = match loaded {
            Ok(LazyResult::Ready(page)) => (RenderShape::Ready, Ok(page)),
            Ok(LazyResult::Lazy(pending)) => {
                tracing::info!(path = %ctx.as_path, "rendering skeleton while page loads");
                (RenderShape::Lazy, pending.await)
            }
            Err(e) => (RenderShape::Rejected, Err(e)),
        };
        let settled_ms = elapsed_ms(start);

        let visit = match settled {
            Ok(page) => {
                history.remember(&ctx, &page).await;
                VisitReport {
                    path: ctx.as_path,
                    shape,
                    first_render_ms,
                    settled_ms,
                    title: Some(page.title),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(path = %ctx.as_path, "page load failed: {}", e);
                VisitReport {
                    path: ctx.as_path,
                    shape,
                    first_render_ms,
                    settled_ms,
                    title: None,
                    error: Some(e.to_string()),
                }
            }
        };
        visits.push(visit);
    }

    NavigationReport {
        config,
        visits,
        network_requests: network.requests(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn nav(latency_ms: u64, timeout_ms: u64) -> NavigationConfig {
        NavigationConfig {
            latency_ms,
            lazy: LazyPropsConfig::new().with_timeout(Duration::from_millis(timeout_ms)),
            ..NavigationConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_backend_renders_ready() {
        let report = run_navigation(nav(10, 50)).await;

        assert_eq!(report.visits.len(), 1);
        assert_eq!(report.visits[0].shape, RenderShape::Ready);
        assert_eq!(report.visits[0].title.as_deref(), Some("Page p/1"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_renders_skeleton_first() {
        let report = run_navigation(nav(100, 10)).await;
        let visit = &report.visits[0];

        assert_eq!(visit.shape, RenderShape::Lazy);
        assert!(visit.first_render_ms < 100);
        assert!(visit.settled_ms >= 100);
        assert!(visit.title.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn revisit_is_served_from_history() {
        let mut config = nav(100, 10);
        config.revisit = true;
        let report = run_navigation(config).await;

        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.visits[1].shape, RenderShape::Ready);
        assert_eq!(report.network_requests, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_mode_always_waits() {
        let mut config = nav(100, 10);
        config.lazy = config.lazy.server();
        let report = run_navigation(config).await;

        assert_eq!(report.visits[0].shape, RenderShape::Ready);
        assert!(report.visits[0].first_render_ms >= 100);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_surface_through_either_shape() {
        let mut config = nav(100, 10);
        config.fail = true;
        let report = run_navigation(config).await;
        assert_eq!(report.visits[0].shape, RenderShape::Lazy);
        assert_eq!(
            report.visits[0].error.as_deref(),
            Some("request for /p/1 failed")
        );

        let mut config = nav(5, 50);
        config.fail = true;
        let report = run_navigation(config).await;
        assert_eq!(report.visits[0].shape, RenderShape::Rejected);
        assert!(report.visits[0].error.is_some());
    }
}
