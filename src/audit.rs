//! Consistency auditing: re-run sampled evaluations to detect judges
//! that do not agree with themselves, and measure how far the judges on
//! one request disagree with each other.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::judge::types::{EvaluationRequest, JudgeConfig, JudgeEvaluation};
use crate::judge::JudgeDispatcher;
use crate::rubric::RubricRegistry;
use crate::scoring::aggregate::normalize;
use crate::scoring::stats;

fn default_sample_rate() -> f64 {
    0.1
}

fn default_correlation_threshold() -> f64 {
    0.8
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Fraction of requests whose evaluations are repeated.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Self-correlation below this flags the judge as inconsistent.
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            sample_rate: default_sample_rate(),
            correlation_threshold: default_correlation_threshold(),
        }
    }
}

/// Outcome of repeating one judge's evaluation of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyRecord {
    pub judge_name: String,
    pub test_name: String,
    /// Overall score from the original run, native scale.
    pub first: f64,
    /// Overall score from the repeat run, native scale.
    pub second: f64,
    /// Self-correlation of the two per-criterion score vectors.
    pub correlation: f64,
    pub flagged: bool,
}

pub struct ConsistencyAuditor {
    config: AuditConfig,
}

impl ConsistencyAuditor {
    pub fn new(config: AuditConfig) -> Self {
        ConsistencyAuditor { config }
    }

    /// Whether this request should be re-run. Decided synchronously so
    /// the sampling draw never straddles an await.
    pub fn should_sample(&self) -> bool {
        rand::random::<f64>() < self.config.sample_rate
    }

    /// Repeat every surviving judge from `baseline` against the same
    /// request and compare.
    pub async fn audit(
        &self,
        dispatcher: &JudgeDispatcher,
        request: &EvaluationRequest,
        baseline: &HashMap<String, JudgeEvaluation>,
    ) -> Vec<ConsistencyRecord> {
        let mut names: Vec<String> = baseline.keys().cloned().collect();
        names.sort();
        self.audit_judges(dispatcher, request, &names, baseline).await
    }

    /// Deterministic entry point: repeat only the named judges.
    pub async fn audit_judges(
        &self,
        dispatcher: &JudgeDispatcher,
        request: &EvaluationRequest,
        names: &[String],
        baseline: &HashMap<String, JudgeEvaluation>,
    ) -> Vec<ConsistencyRecord> {
        let order = dispatcher.registry().get(&request.category).criterion_names();

        let mut records = Vec::new();
        for name in names {
            let Some(first) = baseline.get(name) else {
                continue;
            };
            let Some(second) = dispatcher.evaluate_with(name, request).await else {
                continue;
            };

            let correlation =
                vector_consistency(&first.criterion_vector(&order), &second.criterion_vector(&order));
            let flagged = correlation < self.config.correlation_threshold;
            if flagged {
                warn!(
                    judge = %name,
                    test = %request.test_name,
                    correlation,
                    "judge disagrees with its own earlier verdict"
                );
            } else {
                info!(judge = %name, test = %request.test_name, correlation, "consistency check passed");
            }

            records.push(ConsistencyRecord {
                judge_name: name.clone(),
                test_name: request.test_name.clone(),
                first: first.overall_score,
                second: second.overall_score,
                correlation,
                flagged,
            });
        }
        records
    }
}

/// Consistency of two per-criterion vectors. Identical vectors count as
/// perfect agreement even when flat, which plain correlation would
/// report as zero.
fn vector_consistency(first: &[f64], second: &[f64]) -> f64 {
    if !first.is_empty()
        && first.len() == second.len()
        && first
            .iter()
            .zip(second)
            .all(|(a, b)| (a - b).abs() < 1e-9)
    {
        return 1.0;
    }
    stats::pearson(first, second)
}

/// How strongly the judges on one request agree with each other, on
/// the canonical 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementLevel {
    High,
    Medium,
    Low,
}

impl AgreementLevel {
    fn from_std(std: f64) -> AgreementLevel {
        if std < 0.5 {
            AgreementLevel::High
        } else if std < 1.0 {
            AgreementLevel::Medium
        } else {
            AgreementLevel::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementReport {
    pub level: AgreementLevel,
    /// Sample standard deviation of the normalized overall scores.
    pub score_std: f64,
    /// Max minus min normalized overall score.
    pub spread: f64,
    /// Per-criterion normalized spread across judges, largest first
    /// when iterated by value.
    pub criteria_disagreements: BTreeMap<String, f64>,
}

/// Cross-judge agreement for one request. None with fewer than two
/// surviving judges.
pub fn agreement(
    registry: &RubricRegistry,
    category: &str,
    evaluations: &HashMap<String, JudgeEvaluation>,
    configs: &[JudgeConfig],
) -> Option<AgreementReport> {
    if evaluations.len() < 2 {
        return None;
    }
    let scales: HashMap<&str, _> = configs
        .iter()
        .map(|c| (c.name.as_str(), c.scale))
        .collect();

    let mut overall = Vec::new();
    let mut per_criterion: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (name, evaluation) in evaluations {
        let Some(scale) = scales.get(name.as_str()).copied() else {
            continue;
        };
        overall.push(normalize(evaluation.overall_score, scale));
        for criterion in registry.get(category).criterion_names() {
            if let Some(score) = evaluation.scores.get(&criterion) {
                per_criterion
                    .entry(criterion)
                    .or_default()
                    .push(normalize(score.score, scale));
            }
        }
    }

    let criteria_disagreements = per_criterion
        .into_iter()
        .filter(|(_, scores)| scores.len() >= 2)
        .map(|(name, scores)| {
            let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (name, max - min)
        })
        .collect();

    let score_std = stats::sample_std(&overall);
    let min = overall.iter().copied().fold(f64::INFINITY, f64::min);
    let max = overall.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(AgreementReport {
        level: AgreementLevel::from_std(score_std),
        score_std,
        spread: max - min,
        criteria_disagreements,
    })
}
