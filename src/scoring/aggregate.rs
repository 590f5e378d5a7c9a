//! Cross-scale normalization and weighted aggregation of judge verdicts.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::judge::types::{EvaluationRequest, JudgeConfig, JudgeEvaluation, Scale};

/// Map a score from its native scale onto the canonical 0-10 range.
/// Out-of-range inputs are clamped before projection.
pub fn normalize(score: f64, scale: Scale) -> f64 {
    let span = scale.max - scale.min;
    if span <= 0.0 {
        return 0.0;
    }
    (scale.clamp(score) - scale.min) / span * 10.0
}

/// Qualitative band for a composite score on the 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Acceptable,
    Deficient,
    SeverelyDeficient,
}

impl Grade {
    pub fn from_composite(score: f64) -> Grade {
        if score >= 9.0 {
            Grade::Excellent
        } else if score >= 7.5 {
            Grade::Good
        } else if score >= 6.0 {
            Grade::Acceptable
        } else if score >= 3.0 {
            Grade::Deficient
        } else {
            Grade::SeverelyDeficient
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Acceptable => "acceptable",
            Grade::Deficient => "deficient",
            Grade::SeverelyDeficient => "severely deficient",
        };
        f.write_str(label)
    }
}

/// Final multi-judge verdict for one candidate output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub test_name: String,
    pub category: String,
    pub model_evaluated: String,
    /// Verdicts of the judges that responded, keyed by judge name.
    pub evaluations: BTreeMap<String, JudgeEvaluation>,
    /// Per-judge overall scores projected onto the 0-10 scale.
    pub normalized_scores: BTreeMap<String, f64>,
    /// Judge-weighted composite on the 0-10 scale. None when no judge
    /// responded.
    pub composite_score: Option<f64>,
    pub grade: Option<Grade>,
}

/// Combine surviving judge verdicts into one composite. Judge weights
/// are renormalized over the judges that actually responded, so a
/// failed judge redistributes its influence instead of dragging the
/// composite down.
pub fn aggregate(
    request: &EvaluationRequest,
    evaluations: HashMap<String, JudgeEvaluation>,
    configs: &[JudgeConfig],
) -> AggregatedResult {
    let weights: HashMap<&str, (f64, Scale)> = configs
        .iter()
        .map(|c| (c.name.as_str(), (c.weight, c.scale)))
        .collect();

    let evaluations: BTreeMap<String, JudgeEvaluation> = evaluations.into_iter().collect();

    let mut normalized_scores = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (name, evaluation) in &evaluations {
        let Some((weight, scale)) = weights.get(name.as_str()).copied() else {
            warn!(judge = %name, "evaluation from unconfigured judge ignored");
            continue;
        };
        let normalized = normalize(evaluation.overall_score, scale);
        normalized_scores.insert(name.clone(), normalized);
        weighted_sum += normalized * weight;
        total_weight += weight;
    }

    let composite_score = if normalized_scores.is_empty() {
        None
    } else if total_weight > 0.0 {
        Some(weighted_sum / total_weight)
    } else {
        // All surviving judges carry zero weight; fall back to the
        // unweighted mean rather than dividing by zero.
        let sum: f64 = normalized_scores.values().sum();
        Some(sum / normalized_scores.len() as f64)
    };
    let grade = composite_score.map(Grade::from_composite);

    AggregatedResult {
        test_name: request.test_name.clone(),
        category: request.category.clone(),
        model_evaluated: request.model_name.clone(),
        evaluations,
        normalized_scores,
        composite_score,
        grade,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::types::CriterionScore;

    fn config(name: &str, weight: f64, scale: Scale) -> JudgeConfig {
        JudgeConfig {
            name: name.into(),
            kind: "mock".into(),
            enabled: true,
            model: "m".into(),
            api_key_env: String::new(),
            base_url: None,
            weight,
            scale,
            blind_evaluation: true,
            max_tokens: 256,
            temperature: 0.0,
            timeout_secs: 5,
        }
    }

    fn evaluation(name: &str, overall: f64) -> JudgeEvaluation {
        JudgeEvaluation {
            judge_name: name.into(),
            judge_model: "m".into(),
            test_name: "qa_001".into(),
            category: "qa_simple".into(),
            model_evaluated: "candidate".into(),
            scores: BTreeMap::from([(
                "accuracy".to_string(),
                CriterionScore {
                    name: "accuracy".into(),
                    score: overall,
                    justification: None,
                },
            )]),
            overall_score: overall,
            weighted_score: overall,
            strengths: vec![],
            weaknesses: vec![],
            reasoning: String::new(),
            timestamp: String::new(),
            evaluation_ms: 0.0,
            blind_evaluation: true,
        }
    }

    fn request() -> EvaluationRequest {
        EvaluationRequest {
            test_name: "qa_001".into(),
            category: "qa_simple".into(),
            prompt: "p".into(),
            output: "o".into(),
            model_name: "candidate".into(),
        }
    }

    #[test]
    fn test_normalize_scales() {
        assert!((normalize(4.35, Scale::ONE_TO_FIVE) - 8.375).abs() < 1e-9);
        assert_eq!(normalize(8.5, Scale::ZERO_TO_TEN), 8.5);
        assert_eq!(normalize(1.0, Scale::ONE_TO_FIVE), 0.0);
        assert_eq!(normalize(5.0, Scale::ONE_TO_FIVE), 10.0);
        // Out of range clamps before projection.
        assert_eq!(normalize(7.0, Scale::ONE_TO_FIVE), 10.0);
        assert_eq!(normalize(-3.0, Scale::ZERO_TO_TEN), 0.0);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_composite(9.0), Grade::Excellent);
        assert_eq!(Grade::from_composite(8.9999), Grade::Good);
        assert_eq!(Grade::from_composite(7.5), Grade::Good);
        assert_eq!(Grade::from_composite(6.0), Grade::Acceptable);
        assert_eq!(Grade::from_composite(5.999), Grade::Deficient);
        assert_eq!(Grade::from_composite(3.0), Grade::Deficient);
        assert_eq!(Grade::from_composite(0.0), Grade::SeverelyDeficient);
        assert_eq!(Grade::SeverelyDeficient.to_string(), "severely deficient");
    }

    #[test]
    fn test_two_judge_composite() {
        // 1-5 judge at 4.35 normalizes to 8.375; 0-10 judge at 8.5
        // stays put. Equal weights give 8.4375.
        let configs = vec![
            config("anchored", 0.5, Scale::ONE_TO_FIVE),
            config("fine", 0.5, Scale::ZERO_TO_TEN),
        ];
        let mut evaluations = HashMap::new();
        evaluations.insert("anchored".to_string(), evaluation("anchored", 4.35));
        evaluations.insert("fine".to_string(), evaluation("fine", 8.5));

        let result = aggregate(&request(), evaluations, &configs);
        let composite = result.composite_score.unwrap();
        assert!((composite - 8.4375).abs() < 1e-9);
        assert_eq!(result.grade, Some(Grade::Good));
        assert!((result.normalized_scores["anchored"] - 8.375).abs() < 1e-9);
    }

    #[test]
    fn test_weights_renormalized_over_survivors() {
        // The 0.7-weight judge failed; the survivor's weight becomes
        // the whole denominator so the composite equals its score.
        let configs = vec![
            config("gone", 0.7, Scale::ZERO_TO_TEN),
            config("here", 0.3, Scale::ZERO_TO_TEN),
        ];
        let mut evaluations = HashMap::new();
        evaluations.insert("here".to_string(), evaluation("here", 6.0));

        let result = aggregate(&request(), evaluations, &configs);
        assert!((result.composite_score.unwrap() - 6.0).abs() < 1e-9);
        assert_eq!(result.grade, Some(Grade::Acceptable));
    }

    #[test]
    fn test_no_survivors_yields_none() {
        let configs = vec![config("a", 1.0, Scale::ZERO_TO_TEN)];
        let result = aggregate(&request(), HashMap::new(), &configs);
        assert!(result.composite_score.is_none());
        assert!(result.grade.is_none());
        assert!(result.evaluations.is_empty());
    }

    #[test]
    fn test_zero_weight_survivors_fall_back_to_mean() {
        let configs = vec![
            config("a", 0.0, Scale::ZERO_TO_TEN),
            config("b", 0.0, Scale::ZERO_TO_TEN),
        ];
        let mut evaluations = HashMap::new();
        evaluations.insert("a".to_string(), evaluation("a", 4.0));
        evaluations.insert("b".to_string(), evaluation("b", 8.0));

        let result = aggregate(&request(), evaluations, &configs);
        assert!((result.composite_score.unwrap() - 6.0).abs() < 1e-9);
    }
}
