use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Numeric range a judge reports scores in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub min: f64,
    pub max: f64,
}

impl Scale {
    pub const ONE_TO_FIVE: Scale = Scale { min: 1.0, max: 5.0 };
    pub const ZERO_TO_TEN: Scale = Scale { min: 0.0, max: 10.0 };

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn clamp(&self, score: f64) -> f64 {
        score.clamp(self.min, self.max)
    }

    /// Prompt template to use for this scale. The anchored five-point
    /// template only makes sense for a 1-5 judge; everything else gets
    /// the fine-grained banded template.
    pub fn mode(&self) -> ScaleMode {
        if *self == Scale::ONE_TO_FIVE {
            ScaleMode::Anchored
        } else {
            ScaleMode::FineGrained
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::ZERO_TO_TEN
    }
}

/// Which judge-facing prompt template to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Fixed 1-5 scale with one semantic anchor per integer.
    Anchored,
    /// Fine-grained 0-10 scale with banded anchors, strict JSON demanded.
    FineGrained,
}

fn default_true() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f64 {
    0.3
}

fn default_timeout_secs() -> u64 {
    120
}

/// Static per-judge configuration. Loaded once per run and read-only
/// afterwards; the map key in the config file supplies `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    #[serde(skip)]
    pub name: String,

    /// Wire protocol: "openai", "anthropic", or "mock".
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: String,

    #[serde(default)]
    pub base_url: Option<String>,

    pub weight: f64,

    #[serde(default)]
    pub scale: Scale,

    #[serde(default = "default_true")]
    pub blind_evaluation: bool,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// One candidate output to be judged. Immutable; cloned into each
/// judge task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub test_name: String,
    pub category: String,
    /// Original prompt given to the candidate model.
    pub prompt: String,
    /// Candidate model output under evaluation.
    pub output: String,
    /// Identifier of the model that produced the output. Never shown to
    /// a blind judge.
    pub model_name: String,
}

/// A single criterion's score as reported (or defaulted) for one judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub name: String,
    /// Bounded to the judge's own native scale.
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// The structured verdict of one judge for one request. Produced once
/// per (request, judge) pair and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeEvaluation {
    pub judge_name: String,
    pub judge_model: String,
    pub test_name: String,
    pub category: String,
    pub model_evaluated: String,
    pub scores: BTreeMap<String, CriterionScore>,
    /// Score used for aggregation, on the judge's native scale. The
    /// judge-reported value when one was supplied, otherwise the
    /// criteria-weighted recomputation.
    pub overall_score: f64,
    /// Criteria-weighted overall recomputed from `scores`, retained
    /// alongside the reported value for divergence auditing.
    pub weighted_score: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub reasoning: String,
    pub timestamp: String,
    pub evaluation_ms: f64,
    pub blind_evaluation: bool,
}

impl JudgeEvaluation {
    /// Per-criterion scores in the given rubric order. Criteria missing
    /// from the evaluation are skipped.
    pub fn criterion_vector(&self, order: &[String]) -> Vec<f64> {
        order
            .iter()
            .filter_map(|name| self.scores.get(name).map(|c| c.score))
            .collect()
    }
}
