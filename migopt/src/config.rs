//! Optimizer configuration.
//!
//! Every knob of every pass lives here. All structures deserialize with defaults for missing fields, so a
//! configuration file only has to mention what it changes.

use serde::{Deserialize, Serialize};

/// Settings for the algebraic rewriting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteParams {
    /// Allow rewrites that add gates, which enables distributivity.
    pub allow_area_increase: bool,
    /// Upper bound on the number of sweeps over the network.
    pub max_iterations: usize,
}

impl Default for RewriteParams {
    fn default() -> Self {
        Self { allow_area_increase: false, max_iterations: 4 }
    }
}

/// Settings for the cone refactoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefactorParams {
    /// Largest number of cone leaves (at most six).
    pub max_leaves: usize,
    /// Accept replacements that save no gates.
    pub allow_zero_gain: bool,
}

impl Default for RefactorParams {
    fn default() -> Self {
        Self { max_leaves: 6, allow_zero_gain: true }
    }
}

/// Settings for the resubstitution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResubParams {
    /// Largest number of gates a replacement may add.
    pub max_inserts: usize,
    /// Largest number of window leaves (at most six).
    pub max_leaves: usize,
    /// Largest number of divisors considered per node.
    pub max_divisors: usize,
    /// Reject replacements that would make the node deeper.
    pub preserve_depth: bool,
}

impl Default for ResubParams {
    fn default() -> Self {
        Self { max_inserts: 2, max_leaves: 6, max_divisors: 50, preserve_depth: true }
    }
}

/// What to do after rebalancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cleanup {
    /// Run the algebraic rewriting pass.
    Rewrite,
    /// Only remove dangling nodes.
    Sweep,
}

/// One rebalancing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Maximum cut size (at most six).
    pub cut_size: usize,
    /// Maximum number of cuts kept per node.
    pub max_cuts: usize,
    /// Only rebalance nodes on a critical path.
    pub only_on_critical_path: bool,
    /// Largest sum of products considered for a cut.
    pub max_cubes: usize,
    /// Post-processing step.
    pub cleanup: Cleanup,
}

impl BalanceConfig {
    /// The configuration for networks at or below the size threshold.
    #[must_use]
    pub const fn small() -> Self {
        Self { cut_size: 6, max_cuts: 8, only_on_critical_path: false, max_cubes: 16, cleanup: Cleanup::Rewrite }
    }

    /// The configuration for networks above the size threshold.
    #[must_use]
    pub const fn large() -> Self {
        Self { cut_size: 4, max_cuts: 8, only_on_critical_path: true, max_cubes: 16, cleanup: Cleanup::Sweep }
    }
}

/// Settings for the balancing pass: one configuration per network size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceParams {
    /// Networks with at most this many gates are small.
    pub size_threshold: usize,
    /// Used for small networks.
    pub small: BalanceConfig,
    /// Used for large networks.
    pub large: BalanceConfig,
}

impl Default for BalanceParams {
    fn default() -> Self {
        Self { size_threshold: 50_000, small: BalanceConfig::small(), large: BalanceConfig::large() }
    }
}

impl BalanceParams {
    /// The configuration to use on a network with `gates` gates.
    #[must_use]
    pub const fn select(&self, gates: usize) -> &BalanceConfig {
        if gates <= self.size_threshold {
            &self.small
        } else {
            &self.large
        }
    }
}

/// Settings for every pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// See [`RewriteParams`].
    pub rewrite: RewriteParams,
    /// See [`RefactorParams`].
    pub refactor: RefactorParams,
    /// See [`BalanceParams`].
    pub balance: BalanceParams,
    /// See [`ResubParams`].
    pub resub: ResubParams,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{BalanceParams, Cleanup, OptimizerConfig};

    #[rstest]
    #[case(0, 6)]
    #[case(50_000, 6)]
    #[case(50_001, 4)]
    fn threshold_selects_cut_size(#[case] gates: usize, #[case] cut_size: usize) {
        let params = BalanceParams::default();
        assert_eq!(params.select(gates).cut_size, cut_size);
    }

    #[test]
    fn policies_differ_across_threshold() {
        let params = BalanceParams::default();
        let small = params.select(50_000);
        let large = params.select(50_001);
        assert!(!small.only_on_critical_path);
        assert!(large.only_on_critical_path);
        assert_eq!(small.cleanup, Cleanup::Rewrite);
        assert_eq!(large.cleanup, Cleanup::Sweep);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: OptimizerConfig =
            serde_json::from_str(r#"{"rewrite": {"allow_area_increase": true}, "balance": {"size_threshold": 10}}"#)
                .expect("valid configuration");

        assert!(config.rewrite.allow_area_increase);
        assert_eq!(config.rewrite.max_iterations, 4);
        assert_eq!(config.balance.size_threshold, 10);
        assert_eq!(config.balance.small.cut_size, 6);
        assert_eq!(config.resub.max_inserts, 2);
        assert!(config.refactor.allow_zero_gain);
    }

    #[test]
    fn round_trips_through_json() {
        let config = OptimizerConfig::default();
        let text = serde_json::to_string(&config).expect("serializable");
        let back: OptimizerConfig = serde_json::from_str(&text).expect("valid configuration");
        assert_eq!(config, back);
    }
}
