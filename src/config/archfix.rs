//! Project configuration (archfix.yaml) data structures
//!
//! Every field is optional; a missing file means all defaults. Unknown keys
//! are rejected so typos surface as parse errors instead of being ignored.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ArchfixError, Result};

/// Configuration file name at the project root
pub const CONFIG_FILE: &str = "archfix.yaml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchfixConfig {
    pub repair: RepairConfig,
    pub validation: ValidationConfig,
    pub proposer: ProposerConfig,
}

/// Repair loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepairConfig {
    pub max_rounds: u32,
    pub batch_size: usize,
    /// Keep going even when rounds stop improving
    pub force_all_rounds: bool,
    pub max_issues_per_module: usize,
    pub max_related_modules: usize,
    /// Batch checkpoints retained after each round
    pub keep_checkpoints: usize,
    pub regression: RegressionPolicy,
    pub retry: RetryPolicy,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            batch_size: 3,
            force_all_rounds: false,
            max_issues_per_module: 3,
            max_related_modules: 5,
            keep_checkpoints: 5,
            regression: RegressionPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// When a batch counts as a regression and is rolled back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegressionPolicy {
    /// Largest tolerated increase in scoped issue count
    pub tolerance: i64,
    /// Roll back any batch in which a module failed to apply
    pub rollback_on_apply_failure: bool,
}

impl Default for RegressionPolicy {
    fn default() -> Self {
        Self {
            tolerance: 2,
            rollback_on_apply_failure: true,
        }
    }
}

impl RegressionPolicy {
    /// `delta` is `after - before`; positive means more issues
    pub fn should_rollback(&self, delta: i64, apply_failed: bool) -> bool {
        delta > self.tolerance || (apply_failed && self.rollback_on_apply_failure)
    }
}

/// Retry and timeout settings for fix proposals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 10_000,
            max_delay_ms: 30_000,
            attempt_timeout_ms: 120_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt `attempt` (1-based):
    /// `min(base * attempt, max)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let millis = self
            .base_delay_ms
            .saturating_mul(u64::from(attempt))
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

/// Validator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Report empty required fields as `incomplete_record`
    pub check_completeness: bool,
    /// Report modules without a pattern/layer
    pub report_missing_layer: bool,
    /// Share of names a case style needs to count as the convention
    pub naming_majority: f64,
    /// Word-overlap ratio above which responsibilities are near duplicates
    pub similarity_threshold: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_completeness: true,
            report_missing_layer: false,
            naming_majority: 0.7,
            similarity_threshold: 0.7,
        }
    }
}

/// External fix proposer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProposerConfig {
    /// Program and arguments; empty means no proposer
    pub command: Vec<String>,
}

impl ArchfixConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(yaml)
    }

    /// Load `archfix.yaml` from `root`, or defaults when absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| ArchfixError::ConfigReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Self::from_yaml(&content).map_err(|e| match e {
            ArchfixError::ConfigParseFailed { reason, .. } => ArchfixError::ConfigParseFailed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Reject values the repair loop cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(ArchfixError::ConfigInvalid {
                message: message.to_string(),
            })
        };

        if self.repair.max_rounds == 0 {
            return invalid("repair.max_rounds must be at least 1");
        }
        if self.repair.batch_size == 0 {
            return invalid("repair.batch_size must be at least 1");
        }
        if self.repair.retry.max_attempts == 0 {
            return invalid("repair.retry.max_attempts must be at least 1");
        }
        if self.repair.regression.tolerance < 0 {
            return invalid("repair.regression.tolerance must not be negative");
        }
        if !(self.validation.naming_majority > 0.0 && self.validation.naming_majority <= 1.0) {
            return invalid("validation.naming_majority must be in (0, 1]");
        }
        if !(self.validation.similarity_threshold > 0.0
            && self.validation.similarity_threshold <= 1.0)
        {
            return invalid("validation.similarity_threshold must be in (0, 1]");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ArchfixConfig::default();
        assert_eq!(config.repair.max_rounds, 3);
        assert_eq!(config.repair.batch_size, 3);
        assert_eq!(config.repair.regression.tolerance, 2);
        assert!(config.repair.regression.rollback_on_apply_failure);
        assert_eq!(config.repair.retry.max_attempts, 5);
        assert!(config.validation.check_completeness);
        assert!(config.proposer.command.is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r"
repair:
  batch_size: 5
  regression:
    tolerance: 0
proposer:
  command: [my-fixer, --json]
";
        let config = ArchfixConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.repair.batch_size, 5);
        assert_eq!(config.repair.max_rounds, 3);
        assert_eq!(config.repair.regression.tolerance, 0);
        assert!(config.repair.regression.rollback_on_apply_failure);
        assert_eq!(config.proposer.command, vec!["my-fixer", "--json"]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = "repair:\n  batch_sise: 5\n";
        let err = ArchfixConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ArchfixError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ArchfixConfig::from_yaml("repair:\n  batch_size: 0\n").unwrap_err();
        assert!(matches!(err, ArchfixError::ConfigInvalid { .. }));

        let err = ArchfixConfig::from_yaml("validation:\n  naming_majority: 1.5\n").unwrap_err();
        assert!(err.to_string().contains("naming_majority"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            ArchfixConfig::load(temp.path()).unwrap(),
            ArchfixConfig::default()
        );
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "repair: [oops").unwrap();

        let err = ArchfixConfig::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay_for(1), Duration::from_secs(10));
        assert_eq!(retry.delay_for(2), Duration::from_secs(20));
        assert_eq!(retry.delay_for(3), Duration::from_secs(30));
        assert_eq!(retry.delay_for(4), Duration::from_secs(30));
    }

    #[test]
    fn test_regression_policy() {
        let policy = RegressionPolicy::default();
        assert!(!policy.should_rollback(2, false));
        assert!(policy.should_rollback(3, false));
        assert!(!policy.should_rollback(-4, false));
        assert!(policy.should_rollback(-4, true));

        let lenient = RegressionPolicy {
            rollback_on_apply_failure: false,
            ..policy
        };
        assert!(!lenient.should_rollback(0, true));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ArchfixConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(ArchfixConfig::from_yaml(&yaml).unwrap(), config);
    }
}
