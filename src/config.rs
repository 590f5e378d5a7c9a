//! TOML run configuration: the judge panel and evaluation settings.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::audit::AuditConfig;
use crate::error::ConfigError;
use crate::judge::types::JudgeConfig;
use crate::judge::DispatchMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Judge panel keyed by judge name.
    #[serde(default)]
    pub judges: BTreeMap<String, JudgeConfig>,

    #[serde(default)]
    pub evaluation: EvaluationSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationSettings {
    #[serde(default)]
    pub mode: DispatchMode,

    #[serde(default)]
    pub consistency: AuditConfig,
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: BenchConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => BenchConfig::load(path),
            None => Ok(BenchConfig::default()),
        }
    }

    /// Enabled judges with their map key stamped in as the name, in
    /// configuration (map) order.
    pub fn judge_configs(&self) -> Vec<JudgeConfig> {
        self.judges
            .iter()
            .filter(|(_, judge)| judge.enabled)
            .map(|(name, judge)| {
                let mut judge = judge.clone();
                judge.name = name.clone();
                judge
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let enabled = self.judge_configs();
        if enabled.is_empty() {
            return Err(ConfigError::NoJudges);
        }

        let mut total_weight = 0.0;
        for judge in &enabled {
            if !judge.weight.is_finite() || !(0.0..=1.0).contains(&judge.weight) {
                return Err(ConfigError::JudgeWeight {
                    judge: judge.name.clone(),
                    weight: judge.weight,
                });
            }
            if judge.scale.min >= judge.scale.max {
                return Err(ConfigError::InvalidScale {
                    judge: judge.name.clone(),
                    min: judge.scale.min,
                    max: judge.scale.max,
                });
            }
            total_weight += judge.weight;
        }

        // Weights are renormalized over surviving judges at aggregation
        // time, so an off-unity sum is a smell rather than an error.
        if (total_weight - 1.0).abs() > 0.01 {
            warn!(total_weight, "judge weights do not sum to 1.0");
        }
        Ok(())
    }
}
