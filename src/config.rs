//! Tunables for a [`Session`](crate::session::Session).
//!
//! Every struct fills missing fields from its defaults when deserialized, so
//! hosts only need to spell out what they change.

use serde::{Deserialize, Serialize};

use crate::tessellation::TessellationParams;

/// Top-level session configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub history: HistoryConfig,
    pub rebuild: RebuildConfig,
    pub tessellation: TessellationParams,
}

/// Undo/redo history settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo snapshots kept; the oldest is evicted beyond this.
    pub max_depth: usize,
    /// Panic on reference-count invariant violations instead of only logging them.
    pub strict_invariants: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            strict_invariants: cfg!(debug_assertions),
        }
    }
}

/// Vertex-displacement rebuild settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildConfig {
    /// Distance within which boundaries are merged when sewing the rebuilt shell.
    pub sew_tolerance: f64,
    /// Consecutive boundary vertices closer than this, or than `sew_tolerance`
    /// if that is larger, make a move degenerate.
    pub coincidence_tolerance: f64,
    /// Largest accepted ratio of rebuilt to original bounding-box diagonal when
    /// the kernel cannot validate solids itself.
    pub max_bbox_growth: f64,
    /// Fall back to per-face construction plus sewing when shared construction fails.
    pub allow_disconnected_fallback: bool,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            sew_tolerance: 1e-6,
            coincidence_tolerance: 1e-9,
            max_bbox_growth: 10.0,
            allow_disconnected_fallback: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{"history": {"max_depth": 5}, "rebuild": {"sew_tolerance": 0.001}}"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.history.max_depth, 5);
        assert_eq!(config.history.strict_invariants, cfg!(debug_assertions));
        assert!((config.rebuild.sew_tolerance - 0.001).abs() < f64::EPSILON);
        assert!(config.rebuild.allow_disconnected_fallback);
        assert_eq!(config.tessellation, TessellationParams::default());
    }

    #[test]
    fn round_trips_through_json() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
