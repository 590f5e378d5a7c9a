//! Tolerant parsing of free-form judge replies.
//!
//! An ordered chain of strategies is tried and the first success wins:
//! strict JSON extraction, then a textual criterion/number scan, then a
//! midpoint-default record carrying the raw text for auditing. The chain
//! never fails; a judge that answered anything at all still produces a
//! complete evaluation with every expected criterion in range.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::judge::types::{CriterionScore, Scale};
use crate::rubric::{Criterion, Rubric};

/// How far past a criterion name the textual fallback looks for a number.
const TEXT_LOOKAHEAD: usize = 40;

/// Characters of raw judge text kept in `reasoning` when no structured
/// reply could be recovered.
const RAW_TEXT_LIMIT: usize = 500;

/// Judge-reported overall may drift this far from the criteria-weighted
/// recomputation before a data-quality warning is logged.
pub const OVERALL_DIVERGENCE_TOLERANCE: f64 = 0.5;

/// Intermediate result of one parse strategy, on the judge's native scale.
#[derive(Debug, Clone)]
pub struct ParsedEvaluation {
    pub scores: BTreeMap<String, CriterionScore>,
    pub reported_overall: Option<f64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub reasoning: String,
}

type ParseStrategy = fn(&str, &[Criterion], Scale) -> Option<ParsedEvaluation>;

/// Ordered fallback chain; the first strategy that recovers any numeric
/// signal commits the result.
const STRATEGIES: &[ParseStrategy] = &[parse_json, parse_text];

/// Parse a raw judge reply against the rubric's criteria. Always returns
/// a usable evaluation; total failure degrades to scale midpoints with
/// the raw text preserved for auditing.
pub fn parse(raw: &str, rubric: &Rubric, scale: Scale) -> ParsedEvaluation {
    for strategy in STRATEGIES {
        if let Some(parsed) = strategy(raw, &rubric.criteria, scale) {
            return parsed;
        }
    }
    parse_default(raw, &rubric.criteria, scale)
}

/// Check the reported overall against the criteria-weighted recomputation
/// and log a data-quality warning when they diverge beyond tolerance.
/// Returns the score to aggregate with: the reported value when present.
pub fn resolve_overall(parsed: &ParsedEvaluation, rubric: &Rubric, judge_name: &str) -> (f64, f64) {
    let flat: BTreeMap<String, f64> = parsed
        .scores
        .iter()
        .map(|(name, c)| (name.clone(), c.score))
        .collect();
    let recomputed = rubric.overall_score(&flat);

    match parsed.reported_overall {
        Some(reported) => {
            if (reported - recomputed).abs() > OVERALL_DIVERGENCE_TOLERANCE {
                warn!(
                    judge = %judge_name,
                    reported,
                    recomputed,
                    "judge overall score diverges from criteria-weighted value"
                );
            }
            (reported, recomputed)
        }
        None => (recomputed, recomputed),
    }
}

/// Locate the first balanced `{...}` span in the text, respecting JSON
/// string literals and escapes.
fn extract_balanced_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Overall score from any of the field names judges have been seen to use.
fn reported_overall(root: &Value) -> Option<f64> {
    for key in ["overall_score", "total_score", "score", "rating"] {
        if let Some(v) = root.get(key).and_then(Value::as_f64) {
            return Some(v);
        }
    }
    None
}

/// Strategy 1: strict JSON. Accepts a fenced ```json block or the first
/// balanced object in the reply; requires a `scores` object. Criterion
/// entries may be `{score, justification}` objects or bare numbers;
/// anything missing or out of range is defaulted and clamped.
fn parse_json(raw: &str, criteria: &[Criterion], scale: Scale) -> Option<ParsedEvaluation> {
    let fenced = Regex::new(r"```json\s*([\s\S]*?)\s*```").ok()?;
    let candidate = fenced
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .or_else(|| extract_balanced_json(raw))?;

    let root: Value = serde_json::from_str(candidate).ok()?;
    let scores_obj = root.get("scores")?.as_object()?;

    let mut scores = BTreeMap::new();
    for criterion in criteria {
        let entry = scores_obj.get(&criterion.name);
        let (score, justification) = match entry {
            Some(Value::Object(obj)) => (
                obj.get("score").and_then(Value::as_f64),
                obj.get("justification")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            ),
            Some(value) => (value.as_f64(), None),
            None => (None, None),
        };
        scores.insert(
            criterion.name.clone(),
            CriterionScore {
                name: criterion.name.clone(),
                score: scale.clamp(score.unwrap_or_else(|| scale.midpoint())),
                justification,
            },
        );
    }

    Some(ParsedEvaluation {
        scores,
        reported_overall: reported_overall(&root).map(|s| scale.clamp(s)),
        strengths: string_list(root.get("strengths")),
        weaknesses: string_list(root.get("weaknesses")),
        reasoning: root
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Strategy 2: scan the plain text for each criterion name followed by a
/// numeric token within a bounded lookahead. Succeeds only if at least
/// one criterion matched; the rest get the scale midpoint.
fn parse_text(raw: &str, criteria: &[Criterion], scale: Scale) -> Option<ParsedEvaluation> {
    let mut scores = BTreeMap::new();
    let mut matched = 0usize;

    for criterion in criteria {
        let pattern = format!(
            r"(?i){}\D{{0,{}}}?(\d+(?:\.\d+)?)",
            regex::escape(&criterion.name),
            TEXT_LOOKAHEAD
        );
        let score = Regex::new(&pattern)
            .ok()
            .and_then(|re| re.captures(raw))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok());

        if score.is_some() {
            matched += 1;
        }
        scores.insert(
            criterion.name.clone(),
            CriterionScore {
                name: criterion.name.clone(),
                score: scale.clamp(score.unwrap_or_else(|| scale.midpoint())),
                justification: None,
            },
        );
    }

    if matched == 0 {
        return None;
    }

    Some(ParsedEvaluation {
        scores,
        reported_overall: None,
        strengths: Vec::new(),
        weaknesses: Vec::new(),
        reasoning: truncate(raw, RAW_TEXT_LIMIT),
    })
}

/// Strategy 3: no numeric signal at all. Every criterion gets the scale
/// midpoint and the raw text is kept (truncated) so the failure stays
/// auditable.
fn parse_default(raw: &str, criteria: &[Criterion], scale: Scale) -> ParsedEvaluation {
    let scores = criteria
        .iter()
        .map(|c| {
            (
                c.name.clone(),
                CriterionScore {
                    name: c.name.clone(),
                    score: scale.midpoint(),
                    justification: None,
                },
            )
        })
        .collect();

    ParsedEvaluation {
        scores,
        reported_overall: None,
        strengths: Vec::new(),
        weaknesses: Vec::new(),
        reasoning: truncate(raw, RAW_TEXT_LIMIT),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::RubricRegistry;

    fn qa_rubric() -> Rubric {
        RubricRegistry::builtin().get("qa_simple").clone()
    }

    const WELL_FORMED: &str = r#"Here is my evaluation:
{
    "scores": {
        "accuracy": {"score": 4.5, "justification": "Correct answer"},
        "conciseness": {"score": 4.0, "justification": "To the point"},
        "clarity": {"score": 4.5, "justification": "Very clear"}
    },
    "overall_score": 4.35,
    "strengths": ["Accurate", "Direct"],
    "weaknesses": ["Could cite a source"],
    "reasoning": "Strong factual answer."
}"#;

    #[test]
    fn test_parse_well_formed_json() {
        let parsed = parse(WELL_FORMED, &qa_rubric(), Scale::ONE_TO_FIVE);

        assert_eq!(parsed.scores["accuracy"].score, 4.5);
        assert_eq!(parsed.scores["conciseness"].score, 4.0);
        assert_eq!(
            parsed.scores["accuracy"].justification.as_deref(),
            Some("Correct answer")
        );
        assert_eq!(parsed.reported_overall, Some(4.35));
        assert_eq!(parsed.strengths, vec!["Accurate", "Direct"]);
        assert_eq!(parsed.reasoning, "Strong factual answer.");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse(WELL_FORMED, &qa_rubric(), Scale::ONE_TO_FIVE);
        let second = parse(WELL_FORMED, &qa_rubric(), Scale::ONE_TO_FIVE);
        assert_eq!(first.scores, second.scores);
        assert_eq!(first.reported_overall, second.reported_overall);
    }

    #[test]
    fn test_parse_fenced_json_block() {
        let raw = "Sure!\n```json\n{\"scores\": {\"accuracy\": 5}}\n```\nDone.";
        let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        assert_eq!(parsed.scores["accuracy"].score, 5.0);
        // Unmentioned criteria default to the scale midpoint.
        assert_eq!(parsed.scores["clarity"].score, 3.0);
    }

    #[test]
    fn test_parse_bare_number_scores() {
        let raw = r#"{"scores": {"accuracy": 4, "conciseness": 2.5, "clarity": 3}}"#;
        let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        assert_eq!(parsed.scores["accuracy"].score, 4.0);
        assert_eq!(parsed.scores["conciseness"].score, 2.5);
        assert_eq!(parsed.reported_overall, None);
    }

    #[test]
    fn test_parse_clamps_out_of_range_scores() {
        let raw = r#"{"scores": {"accuracy": 11, "conciseness": -3, "clarity": "n/a"}}"#;
        let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        assert_eq!(parsed.scores["accuracy"].score, 5.0);
        assert_eq!(parsed.scores["conciseness"].score, 1.0);
        // Non-numeric values fall back to the midpoint.
        assert_eq!(parsed.scores["clarity"].score, 3.0);
    }

    #[test]
    fn test_parse_textual_fallback() {
        let raw = "accuracy: 4 out of 5. The conciseness was 3. Clarity I'd call a 5.";
        let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        assert_eq!(parsed.scores["accuracy"].score, 4.0);
        assert_eq!(parsed.scores["conciseness"].score, 3.0);
        assert_eq!(parsed.scores["clarity"].score, 5.0);
        assert_eq!(parsed.reported_overall, None);
    }

    #[test]
    fn test_parse_textual_fallback_clamps() {
        let raw = "accuracy: 99, conciseness: 0";
        let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        assert_eq!(parsed.scores["accuracy"].score, 5.0);
        assert_eq!(parsed.scores["conciseness"].score, 1.0);
        assert_eq!(parsed.scores["clarity"].score, 3.0);
    }

    #[test]
    fn test_parse_total_failure_defaults_to_midpoints() {
        let raw = "I refuse to answer in the requested format.";
        let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        for criterion in ["accuracy", "conciseness", "clarity"] {
            assert_eq!(parsed.scores[criterion].score, 3.0);
        }
        assert!(parsed.reasoning.contains("refuse"));
    }

    #[test]
    fn test_parse_empty_input() {
        let parsed = parse("", &qa_rubric(), Scale::ZERO_TO_TEN);
        assert_eq!(parsed.scores.len(), 3);
        for score in parsed.scores.values() {
            assert_eq!(score.score, 5.0);
        }
    }

    #[test]
    fn test_parse_truncated_json_falls_through() {
        let raw = r#"{"scores": {"accuracy": {"score": 4"#;
        let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        // Truncated JSON is unparseable; the text scan still finds "accuracy: 4".
        assert_eq!(parsed.scores["accuracy"].score, 4.0);
    }

    #[test]
    fn test_parse_never_panics_on_garbage() {
        let inputs = [
            "{}",
            "}{",
            "{\"scores\": []}",
            "{\"scores\": null}",
            "null",
            "\u{0000}\u{FFFF} binary-ish \"{",
        ];
        for raw in inputs {
            let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
            assert_eq!(parsed.scores.len(), 3, "input {raw:?}");
            for score in parsed.scores.values() {
                assert!((1.0..=5.0).contains(&score.score));
            }
        }
    }

    #[test]
    fn test_raw_text_truncated_in_reasoning() {
        let raw = "x".repeat(2000);
        let parsed = parse(&raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        assert_eq!(parsed.reasoning.chars().count(), RAW_TEXT_LIMIT);
    }

    #[test]
    fn test_resolve_overall_prefers_reported() {
        let parsed = parse(WELL_FORMED, &qa_rubric(), Scale::ONE_TO_FIVE);
        let (overall, recomputed) = resolve_overall(&parsed, &qa_rubric(), "judge_a");
        assert!((overall - 4.35).abs() < 1e-9);
        assert!((recomputed - 4.35).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_overall_recomputes_when_absent() {
        let raw = r#"{"scores": {"accuracy": 4, "conciseness": 4, "clarity": 4}}"#;
        let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        let (overall, recomputed) = resolve_overall(&parsed, &qa_rubric(), "judge_a");
        assert!((overall - 4.0).abs() < 1e-9);
        assert_eq!(overall, recomputed);
    }

    #[test]
    fn test_resolve_overall_divergence_keeps_reported() {
        let raw = r#"{
            "scores": {"accuracy": 2, "conciseness": 2, "clarity": 2},
            "overall_score": 5.0
        }"#;
        let parsed = parse(raw, &qa_rubric(), Scale::ONE_TO_FIVE);
        let (overall, recomputed) = resolve_overall(&parsed, &qa_rubric(), "judge_a");
        assert_eq!(overall, 5.0);
        assert!((recomputed - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_balanced_json_ignores_braces_in_strings() {
        let raw = r#"note {"scores": {"accuracy": {"score": 4, "justification": "used { and } here"}}} trailing"#;
        let span = extract_balanced_json(raw).unwrap();
        assert!(serde_json::from_str::<Value>(span).is_ok());
    }
}
