//! Configuration for tree construction and queries.

use serde::{Deserialize, Serialize};

/// What to do when more neighbors are requested than the index holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShortfallPolicy {
    /// Reject the query with [`crate::KdError::InsufficientData`] before traversal.
    #[default]
    Fail,
    /// Run the query and pad the result with sentinel neighbors.
    Pad,
}

/// Per-query search options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Relative error tolerance. Zero gives exact results.
    pub eps: f64,

    /// Stop after this many points have been scanned. Zero means unbounded.
    ///
    /// A search cut short by this budget is best-effort: it carries neither
    /// the exact nor the `eps` bounded guarantee.
    pub max_points_visited: usize,

    /// Whether a stored point at distance zero from the query may be reported.
    pub allow_self_match: bool,

    pub shortfall: ShortfallPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            eps: 0.0,
            max_points_visited: 0,
            allow_self_match: true,
            shortfall: ShortfallPolicy::Fail,
        }
    }
}

impl SearchConfig {
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_budget(mut self, max_points_visited: usize) -> Self {
        self.max_points_visited = max_points_visited;
        self
    }

    pub fn with_self_match(mut self, allow: bool) -> Self {
        self.allow_self_match = allow;
        self
    }

    pub fn with_shortfall(mut self, shortfall: ShortfallPolicy) -> Self {
        self.shortfall = shortfall;
        self
    }
}

/// Options for [`crate::KdTreeBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Maximum number of points stored in one leaf.
    pub bucket_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { bucket_size: 16 }
    }
}

impl BuildConfig {
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.eps, 0.0);
        assert_eq!(config.max_points_visited, 0);
        assert!(config.allow_self_match);
        assert_eq!(config.shortfall, ShortfallPolicy::Fail);
        assert_eq!(BuildConfig::default().bucket_size, 16);
    }

    #[test]
    fn test_json_round_trip_and_partial_input() {
        let config = SearchConfig::default()
            .with_eps(0.5)
            .with_budget(100)
            .with_self_match(false)
            .with_shortfall(ShortfallPolicy::Pad);
        let json = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: SearchConfig = serde_json::from_str(r#"{"eps": 1.0}"#).unwrap();
        assert_eq!(partial.eps, 1.0);
        assert!(partial.allow_self_match);

        let build: BuildConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(build, BuildConfig::default());
    }
}
