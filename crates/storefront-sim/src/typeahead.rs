//! Search-as-you-type simulation
//!
//! Types a word one character at a time, issuing a sequenced search per
//! keystroke while earlier searches are still in flight. Delivered
//! responses are applied to the suggestion list in arrival order, unless a
//! newer keystroke is already showing.
//!
//! Invariants checked:
//! - Applied keystrokes only ever move forward (no older response
//!   overwrites a newer one)
//! - The final keystroke is never reported stale
//! - If the final keystroke succeeded, its suggestions are what remains

use crate::network::{NetworkProfile, SimulatedNetwork};
use crate::elapsed_ms;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use storefront_fetch::fetch_latest;
use tokio::time::Instant;

/// Typeahead simulation configuration
#[derive(Debug, Clone, Serialize)]
pub struct TypeaheadConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Text typed, one search per prefix
    pub text: String,
    /// Delay between keystrokes
    pub interval_ms: u64,
    /// Backend behaviour
    pub profile: NetworkProfile,
}

impl Default for TypeaheadConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            text: "shoes".to_string(),
            interval_ms: 30,
            profile: NetworkProfile::default(),
        }
    }
}

/// What happened to one keystroke's search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum KeystrokeOutcome {
    /// Applied to the suggestion list
    Delivered {
        /// Number of suggestions returned
        suggestions: usize,
    },
    /// Superseded by a later keystroke
    Stale,
    /// Backend failure
    Failed {
        /// Error message
        error: String,
    },
}

/// Per-keystroke record
#[derive(Debug, Clone, Serialize)]
pub struct KeystrokeReport {
    /// Position in the typed text
    pub index: usize,
    /// Query sent
    pub query: String,
    /// Outcome
    pub outcome: KeystrokeOutcome,
    /// When the search settled, from the first keystroke
    pub settled_at_ms: u64,
}

/// Final report from the typeahead simulation
#[derive(Debug, Clone, Serialize)]
pub struct TypeaheadReport {
    /// Configuration the run used
    pub config: TypeaheadConfig,
    /// One record per keystroke, in typing order
    pub keystrokes: Vec<KeystrokeReport>,
    /// Keystroke indexes in the order their results were applied
    pub applied: Vec<usize>,
    /// Suggestions showing at the end
    pub final_suggestions: Vec<String>,
    /// Requests the backend received
    pub network_requests: u64,
}

impl TypeaheadReport {
    /// Count keystrokes with a given outcome kind
    fn count(&self, pred: impl Fn(&KeystrokeOutcome) -> bool) -> usize {
        self.keystrokes.iter().filter(|k| pred(&k.outcome)).count()
    }

    /// Check that applied results only ever moved forward
    pub fn applied_in_order(&self) -> bool {
        self.applied.windows(2).all(|w| w[0] < w[1])
    }

    /// Check if simulation passed all criteria
    pub fn passed(&self) -> bool {
        let Some(last) = self.keystrokes.iter().max_by_key(|k| k.index) else {
            return true;
        };
        let last_settled_correctly = match last.outcome {
            KeystrokeOutcome::Stale => false,
            KeystrokeOutcome::Delivered { .. } => self.applied.last() == Some(&last.index),
            KeystrokeOutcome::Failed { .. } => true,
        };
        self.applied_in_order() && last_settled_correctly
    }

    /// Generate text report
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Typeahead Simulation ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Text: {:?}\n", self.config.text));
        report.push_str(&format!("Keystroke Interval: {}ms\n", self.config.interval_ms));
        report.push_str(&format!(
            "Latency: {}-{}ms, Failure Rate: {:.0}%\n",
            self.config.profile.min_latency_ms,
            self.config.profile.max_latency_ms,
            self.config.profile.failure_rate * 100.0
        ));
        report.push_str(&format!("Network Requests: {}\n", self.network_requests));
        report.push_str(&format!(
            "Delivered: {}\n",
            self.count(|o| matches!(o, KeystrokeOutcome::Delivered { .. }))
        ));
        report.push_str(&format!(
            "Stale: {}\n",
            self.count(|o| matches!(o, KeystrokeOutcome::Stale))
        ));
        report.push_str(&format!(
            "Failed: {}\n",
            self.count(|o| matches!(o, KeystrokeOutcome::Failed { .. }))
        ));

        report.push_str("\n=== Keystrokes ===\n");
        for k in &self.keystrokes {
            let outcome = match &k.outcome {
                KeystrokeOutcome::Delivered { suggestions } => {
                    format!("delivered ({suggestions} suggestions)")
                }
                KeystrokeOutcome::Stale => "stale".to_string(),
                KeystrokeOutcome::Failed { error } => format!("failed: {error}"),
            };
            report.push_str(&format!(
                "{:>2}. {:<12} {:>5}ms  {}\n",
                k.index + 1,
                k.query,
                k.settled_at_ms,
                outcome
            ));
        }

        report.push_str(&format!(
            "\nFinal Suggestions: {}\n",
            if self.final_suggestions.is_empty() {
                "(none)".to_string()
            } else {
                self.final_suggestions.join(", ")
            }
        ));
        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Suggestion list shown to the user
#[derive(Debug, Default)]
struct SuggestionState {
    applied: Vec<usize>,
    suggestions: Vec<String>,
}

impl SuggestionState {
    /// Show `suggestions` for keystroke `index` unless a newer keystroke is
    /// already showing.
    ///
    /// The fetcher's staleness check runs before this lock is taken, so on a
    /// multi-threaded runtime a newer keystroke can settle and be applied in
    /// between. Keystroke order is the fetcher's ticket order.
    fn apply(&mut self, index: usize, suggestions: Vec<String>) -> bool {
        if self.applied.last().is_some_and(|&shown| shown > index) {
            return false;
        }
        self.applied.push(index);
        self.suggestions = suggestions;
        true
    }
}

/// Run the typeahead simulation
pub async fn run_typeahead(config: TypeaheadConfig) -> TypeaheadReport {
    let network = SimulatedNetwork::new(config.profile, config.seed);
    let backend = network.clone();
    let search = fetch_latest(move |query: String| backend.search(query));

    let state = Arc::new(Mutex::new(SuggestionState::default()));
    let interval = Duration::from_millis(config.interval_ms);
    let start = Instant::now();
    let mut tasks = Vec::new();

    let chars: Vec<char> = config.text.chars().collect();
    for index in 0..chars.len() {
        let query: String = chars[..=index].iter().collect();
        let pending = search.fetch(query.clone());
        let state = Arc::clone(&state);

        tasks.push(tokio::spawn(async move {
            let outcome = match pending.await {
                Ok(suggestions) => {
                    let count = suggestions.len();
                    if state.lock().apply(index, suggestions) {
                        KeystrokeOutcome::Delivered { suggestions: count }
                    } else {
                        KeystrokeOutcome::Stale
                    }
                }
                Err(e) if e.is_stale() => KeystrokeOutcome::Stale,
                Err(e) => KeystrokeOutcome::Failed {
                    error: e.to_string(),
                },
            };
            tracing::debug!(index, %query, ?outcome, "keystroke settled");
            KeystrokeReport {
                index,
                query,
                outcome,
                settled_at_ms: elapsed_ms(start),
            }
        }));

        if index + 1 < chars.len() {
            tokio::time::sleep(interval).await;
        }
    }

    let mut keystrokes = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(report) => keystrokes.push(report),
            Err(e) => tracing::error!("keystroke task failed: {}", e),
        }
    }

    let state = std::mem::take(&mut *state.lock());
    TypeaheadReport {
        config,
        keystrokes,
        applied: state.applied,
        final_suggestions: state.suggestions,
        network_requests: network.requests(),
    }
}
