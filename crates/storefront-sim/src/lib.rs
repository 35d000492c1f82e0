//! Storefront Simulator
//!
//! Drives the fetch core against a seeded simulated backend:
//! - **Typeahead**: overlapping sequenced searches, one per keystroke
//! - **Navigation**: page loads racing a rendering deadline, with history
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use storefront_sim::prelude::*;
//!
//! let report = run_typeahead(TypeaheadConfig::default()).await;
//! println!("{}", report.generate_text());
//! ```

pub mod navigation;
pub mod network;
pub mod typeahead;

pub use network::{NetworkError, NetworkProfile, PageData, SimulatedNetwork};

/// Re-exports for driving simulations
pub mod prelude {
    pub use crate::navigation::{run_navigation, NavigationConfig, NavigationReport, RenderShape};
    pub use crate::network::{NetworkProfile, SimulatedNetwork};
    pub use crate::typeahead::{run_typeahead, KeystrokeOutcome, TypeaheadConfig, TypeaheadReport};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Milliseconds since `start`, saturating
pub(crate) fn elapsed_ms(start: tokio::time::Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
