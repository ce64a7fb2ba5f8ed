// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Computation settings and convergence policy.

use bitflags::bitflags;

use crate::error::{Result, TreemapError};
use crate::types::SeedEntry;

bitflags! {
    /// What a subdivision does when it converges or runs out of iterations.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ConvergencePolicy: u8 {
        /// Abort the whole computation when a subdivision is still above the error
        /// threshold after the iteration limit. Without it the best partition is accepted.
        const CANCEL_ON_MAX_ITERATION        = 0b0000_0001;
        /// Stop iterating as soon as the area error is within the threshold. Without it
        /// every subdivision runs the full iteration budget and keeps its best partition.
        const CANCEL_ON_AREA_ERROR_THRESHOLD = 0b0000_0010;
    }
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self::CANCEL_ON_AREA_ERROR_THRESHOLD
    }
}

/// Settings for one computation.
///
/// Builder methods coerce counts into range; [`Settings::validate`] rejects values that
/// cannot be coerced.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "RawSettings", into = "RawSettings")
)]
pub struct Settings {
    /// Iteration limit per subdivision (at least 1).
    pub max_iterations: usize,
    /// Largest accepted per-child difference between achieved and wanted area share.
    pub error_threshold: f64,
    /// Convergence policy flags.
    pub policy: ConvergencePolicy,
    /// Worker thread count (at least 1).
    pub worker_count: usize,
    /// Seed for the generator that places node seeds.
    pub random_seed: u64,
    /// Treat every node as weight `1.0`.
    pub uniform_weights: bool,
    /// Explicit normalized seed coordinates, overriding the random draw per node.
    pub seed_table: Option<Vec<SeedEntry>>,
    /// Area kept by each subdivided cell, in `(0, 1]`. Below `1.0` every cell is scaled
    /// toward its centroid, leaving a gap between siblings and around nested cells.
    pub shrink: f64,
}

impl Settings {
    /// Default iteration limit.
    pub const DEFAULT_MAX_ITERATIONS: usize = 800;
    /// Default area error threshold.
    pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.01;
    /// Default generator seed.
    pub const DEFAULT_RANDOM_SEED: u64 = 21;
    /// Default shrink: cells keep their whole area.
    pub const DEFAULT_SHRINK: f64 = 1.0;

    /// Default settings.
    pub fn new() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            error_threshold: Self::DEFAULT_ERROR_THRESHOLD,
            policy: ConvergencePolicy::default(),
            worker_count: 1,
            random_seed: Self::DEFAULT_RANDOM_SEED,
            uniform_weights: false,
            seed_table: None,
            shrink: Self::DEFAULT_SHRINK,
        }
    }

    /// Set the iteration limit; `0` becomes `1`.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set the area error threshold.
    #[must_use]
    pub fn with_error_threshold(mut self, error_threshold: f64) -> Self {
        self.error_threshold = error_threshold;
        self
    }

    /// Replace the convergence policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ConvergencePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set or clear [`ConvergencePolicy::CANCEL_ON_MAX_ITERATION`].
    #[must_use]
    pub fn cancel_on_max_iteration(mut self, on: bool) -> Self {
        self.policy.set(ConvergencePolicy::CANCEL_ON_MAX_ITERATION, on);
        self
    }

    /// Set or clear [`ConvergencePolicy::CANCEL_ON_AREA_ERROR_THRESHOLD`].
    #[must_use]
    pub fn cancel_on_area_error_threshold(mut self, on: bool) -> Self {
        self.policy
            .set(ConvergencePolicy::CANCEL_ON_AREA_ERROR_THRESHOLD, on);
        self
    }

    /// Set the worker count; `0` becomes `1`.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    /// Use one worker per available hardware thread.
    #[must_use]
    pub fn with_available_parallelism(self) -> Self {
        let n = std::thread::available_parallelism().map_or(1, |n| n.get());
        self.with_worker_count(n)
    }

    /// Set the generator seed.
    #[must_use]
    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    /// Enable or disable uniform weights.
    #[must_use]
    pub fn with_uniform_weights(mut self, uniform_weights: bool) -> Self {
        self.uniform_weights = uniform_weights;
        self
    }

    /// Supply explicit seed coordinates.
    #[must_use]
    pub fn with_seed_table(mut self, seed_table: impl Into<Vec<SeedEntry>>) -> Self {
        self.seed_table = Some(seed_table.into());
        self
    }

    /// Set the area fraction each subdivided cell keeps.
    #[must_use]
    pub fn with_shrink(mut self, shrink: f64) -> Self {
        self.shrink = shrink;
        self
    }

    /// True if any tree-building input differs from its default.
    pub(crate) fn has_tree_inputs(&self) -> bool {
        self.uniform_weights
            || self.seed_table.is_some()
            || self.random_seed != Self::DEFAULT_RANDOM_SEED
    }

    /// Bring counts into range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_iterations = self.max_iterations.max(1);
        self.worker_count = self.worker_count.max(1);
        self
    }

    /// Reject settings that cannot be coerced into range.
    pub fn validate(&self) -> Result<()> {
        if !self.error_threshold.is_finite() || self.error_threshold < 0.0 {
            return Err(TreemapError::invalid_settings(format!(
                "error threshold must be finite and non-negative, got {}",
                self.error_threshold
            )));
        }
        if self.shrink.is_nan() || self.shrink <= 0.0 || self.shrink > 1.0 {
            return Err(TreemapError::invalid_settings(format!(
                "shrink must be in (0, 1], got {}",
                self.shrink
            )));
        }
        if let Some(entry) = self
            .seed_table
            .iter()
            .flatten()
            .find(|e| !e.x.is_finite() || !e.y.is_finite())
        {
            return Err(TreemapError::invalid_settings(format!(
                "seed for node {} is not finite",
                entry.id
            )));
        }
        Ok(())
    }

    /// Parse settings from JSON, coerce counts and validate.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire shape of [`Settings`]: flat camelCase options with the policy as two booleans.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSettings {
    max_iterations: usize,
    error_threshold: f64,
    cancel_on_max_iteration: bool,
    cancel_on_area_error_threshold: bool,
    worker_count: usize,
    random_seed: u64,
    uniform_weights: bool,
    #[serde(alias = "explicitSeedTable", skip_serializing_if = "Option::is_none")]
    seed_table: Option<Vec<SeedEntry>>,
    #[serde(alias = "shrinkPercentage")]
    shrink: f64,
}

#[cfg(feature = "serde")]
impl Default for RawSettings {
    fn default() -> Self {
        Settings::default().into()
    }
}

#[cfg(feature = "serde")]
impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        let mut policy = ConvergencePolicy::empty();
        policy.set(
            ConvergencePolicy::CANCEL_ON_MAX_ITERATION,
            raw.cancel_on_max_iteration,
        );
        policy.set(
            ConvergencePolicy::CANCEL_ON_AREA_ERROR_THRESHOLD,
            raw.cancel_on_area_error_threshold,
        );
        Self {
            max_iterations: raw.max_iterations,
            error_threshold: raw.error_threshold,
            policy,
            worker_count: raw.worker_count,
            random_seed: raw.random_seed,
            uniform_weights: raw.uniform_weights,
            seed_table: raw.seed_table,
            shrink: raw.shrink,
        }
        .normalized()
    }
}

#[cfg(feature = "serde")]
impl From<Settings> for RawSettings {
    fn from(settings: Settings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            error_threshold: settings.error_threshold,
            cancel_on_max_iteration: settings
                .policy
                .contains(ConvergencePolicy::CANCEL_ON_MAX_ITERATION),
            cancel_on_area_error_threshold: settings
                .policy
                .contains(ConvergencePolicy::CANCEL_ON_AREA_ERROR_THRESHOLD),
            worker_count: settings.worker_count,
            random_seed: settings.random_seed,
            uniform_weights: settings.uniform_weights,
            seed_table: settings.seed_table,
            shrink: settings.shrink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.max_iterations, 800);
        assert_eq!(s.error_threshold, 0.01);
        assert_eq!(s.worker_count, 1);
        assert_eq!(s.random_seed, 21);
        assert!(!s.uniform_weights);
        assert_eq!(s.shrink, 1.0);
        assert!(!s.has_tree_inputs());
        assert_eq!(s.policy, ConvergencePolicy::CANCEL_ON_AREA_ERROR_THRESHOLD);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn counts_are_coerced_up() {
        let s = Settings::new().with_worker_count(0).with_max_iterations(0);
        assert_eq!(s.worker_count, 1);
        assert_eq!(s.max_iterations, 1);
        assert!(Settings::new().with_available_parallelism().worker_count >= 1);
    }

    #[test]
    fn policy_toggles() {
        let s = Settings::new()
            .cancel_on_max_iteration(true)
            .cancel_on_area_error_threshold(false);
        assert_eq!(s.policy, ConvergencePolicy::CANCEL_ON_MAX_ITERATION);
    }

    #[test]
    fn bad_threshold_is_rejected() {
        for t in [-0.5, f64::NAN, f64::INFINITY] {
            let err = Settings::new().with_error_threshold(t).validate().unwrap_err();
            assert!(matches!(err, TreemapError::InvalidSettings { .. }));
        }
    }

    #[test]
    fn shrink_outside_unit_interval_is_rejected() {
        for shrink in [0.0, -0.2, 1.5, f64::NAN] {
            let err = Settings::new().with_shrink(shrink).validate().unwrap_err();
            assert!(matches!(err, TreemapError::InvalidSettings { .. }));
        }
        assert!(Settings::new().with_shrink(0.8).validate().is_ok());
    }

    #[test]
    fn non_finite_seed_is_rejected() {
        let s = Settings::new().with_seed_table([SeedEntry::new(NodeId::new(1), f64::NAN, 0.5)]);
        assert!(s.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_uses_flat_options() {
        let s = Settings::from_json_str(
            r#"{
                "maxIterations": 0,
                "errorThreshold": 0.05,
                "cancelOnMaxIteration": true,
                "cancelOnAreaErrorThreshold": true,
                "workerCount": 0,
                "randomSeed": 7,
                "uniformWeights": true,
                "shrinkPercentage": 0.9,
                "explicitSeedTable": [{ "id": 2, "x": 0.25, "y": 0.75 }]
            }"#,
        )
        .unwrap();
        assert_eq!(s.max_iterations, 1);
        assert_eq!(s.error_threshold, 0.05);
        assert_eq!(s.policy, ConvergencePolicy::all());
        assert_eq!(s.worker_count, 1);
        assert_eq!(s.random_seed, 7);
        assert!(s.uniform_weights);
        assert_eq!(s.shrink, 0.9);
        assert_eq!(
            s.seed_table,
            Some(vec![SeedEntry::new(NodeId::new(2), 0.25, 0.75)])
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_missing_fields_take_defaults() {
        let s = Settings::from_json_str("{}").unwrap();
        assert_eq!(s, Settings::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_rejects_negative_threshold() {
        let err = Settings::from_json_str(r#"{ "errorThreshold": -1.0 }"#).unwrap_err();
        assert!(matches!(err, TreemapError::InvalidSettings { .. }));
    }
}
