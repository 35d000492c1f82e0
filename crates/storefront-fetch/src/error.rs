//! Error types for storefront fetching
//!
//! Provides error handling for:
//! - Responses superseded by a newer request (stale)
//! - Failures of the wrapped fetch call (passed through unchanged)
//! - Fetch tasks torn down before producing a value
//! - Configuration loading

use std::path::PathBuf;

/// Marker error for a successful response that arrived after a newer request
/// was issued from the same fetch site.
///
/// Carries no payload. Callers should simply ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("response superseded by a newer request")]
pub struct StaleResponseError;

/// Error surface for sequenced and lazy fetches
///
/// `E` is the wrapped call's own error type. It is never inspected, only
/// carried through.
#[derive(Debug, thiserror::Error)]
pub enum FetchError<E> {
    /// A newer request was issued before this one succeeded
    #[error(transparent)]
    Stale(#[from] StaleResponseError),

    /// The wrapped call failed
    #[error(transparent)]
    Upstream(E),

    /// The spawned fetch task was dropped by the runtime before completing
    #[error("fetch task cancelled before completing")]
    Cancelled,
}

impl<E> FetchError<E> {
    /// Check if this is a superseded response
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    /// Check if the wrapped call itself failed
    #[inline]
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }

    /// Borrow the wrapped call's error, if that is what this is
    #[inline]
    #[must_use]
    pub fn upstream(&self) -> Option<&E> {
        match self {
            Self::Upstream(e) => Some(e),
            _ => None,
        }
    }

    /// Take the wrapped call's error, if that is what this is
    #[inline]
    pub fn into_upstream(self) -> Option<E> {
        match self {
            Self::Upstream(e) => Some(e),
            _ => None,
        }
    }

    /// Convert the upstream error with `f`, leaving other variants intact
    pub fn map_upstream<E2, M>(self, f: M) -> FetchError<E2>
    where
        M: FnOnce(E) -> E2,
    {
        match self {
            Self::Stale(s) => FetchError::Stale(s),
            Self::Upstream(e) => FetchError::Upstream(f(e)),
            Self::Cancelled => FetchError::Cancelled,
        }
    }
}

impl<E> FetchError<FetchError<E>> {
    /// Collapse a nested error, as produced when a sequenced fetch is used
    /// as the callback of a lazy load
    pub fn flatten(self) -> FetchError<E> {
        match self {
            Self::Stale(s) => FetchError::Stale(s),
            Self::Upstream(inner) => inner,
            Self::Cancelled => FetchError::Cancelled,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading a config file
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for the expected shape
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("network down")]
    struct NetworkDown;

    #[test]
    fn stale_is_distinguishable() {
        let err: FetchError<NetworkDown> = StaleResponseError.into();
        assert!(err.is_stale());
        assert!(!err.is_upstream());
        assert_eq!(err.to_string(), "response superseded by a newer request");
    }

    #[test]
    fn upstream_is_transparent() {
        let err = FetchError::Upstream(NetworkDown);
        assert_eq!(err.to_string(), "network down");
        assert_eq!(err.upstream(), Some(&NetworkDown));
        assert_eq!(err.into_upstream(), Some(NetworkDown));
    }

    #[test]
    fn flatten_unwraps_nested_upstream() {
        let nested: FetchError<FetchError<NetworkDown>> =
            FetchError::Upstream(FetchError::Stale(StaleResponseError));
        assert!(nested.flatten().is_stale());

        let nested: FetchError<FetchError<NetworkDown>> = FetchError::Cancelled;
        assert!(matches!(nested.flatten(), FetchError::Cancelled));
    }

    #[test]
    fn map_upstream_keeps_other_variants() {
        let err: FetchError<NetworkDown> = FetchError::Stale(StaleResponseError);
        let mapped = err.map_upstream(|e| e.to_string());
        assert!(mapped.is_stale());

        let mapped = FetchError::Upstream(NetworkDown).map_upstream(|e| e.to_string());
        assert_eq!(mapped.into_upstream().as_deref(), Some("network down"));
    }
}
