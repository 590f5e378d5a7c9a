//! Judge-facing evaluation prompt rendering.
//!
//! Two templates: an anchored 1-5 scale and a fine-grained banded 0-10
//! scale. Both demand a single strict JSON object; anything a judge does
//! beyond that contract is the parser's problem, not the prompt's.

use crate::judge::types::{EvaluationRequest, ScaleMode};
use crate::rubric::Rubric;

/// Label shown to blind judges in place of the real model identity.
pub const BLIND_LABEL: &str = "Candidate A";

const ANCHORED_SCALE: &str = "\
Scoring scale:
- 5: excellent, exceeds expectations
- 4: good, meets expectations well
- 3: adequate, meets the minimum requirements
- 2: poor, below expectations with clear problems
- 1: very poor, fails the requirements";

const FINE_GRAINED_SCALE: &str = "\
Scoring scale (0-10):
- 9-10: excellent, exceeds expectations
- 7.5-8.9: good, meets expectations well
- 6-7.4: acceptable, meets the minimum requirements
- 3-5.9: deficient, below expectations
- 0-2.9: severely deficient, fails the requirements";

/// Render the evaluation prompt for one request. When `blind` is set the
/// candidate model identity is replaced by a fixed anonymous label; the
/// judge never sees the real model name, other judges' scores, or where
/// the test case came from.
pub fn build_evaluation_prompt(
    request: &EvaluationRequest,
    rubric: &Rubric,
    mode: ScaleMode,
    blind: bool,
) -> String {
    let label = if blind {
        BLIND_LABEL.to_string()
    } else {
        request.model_name.clone()
    };

    let criteria_desc = rubric
        .criteria
        .iter()
        .map(|c| format!("- {}: {} (weight {:.2})", c.name, c.description, c.weight))
        .collect::<Vec<_>>()
        .join("\n");

    let (range, scale_desc) = match mode {
        ScaleMode::Anchored => ("1-5", ANCHORED_SCALE),
        ScaleMode::FineGrained => ("0-10", FINE_GRAINED_SCALE),
    };

    format!(
        r#"You are an expert evaluator of AI model output quality.

Task category: {category}

Original prompt:
{prompt}

Output from {label}:
{output}

Evaluation criteria (score each {range}):
{criteria}

{scale}

Respond with a single JSON object in exactly this format and nothing else:
{{
    "scores": {{
        "criterion_name": {{"score": <number>, "justification": "<reason>"}},
        ...
    }},
    "overall_score": <weighted overall {range}>,
    "strengths": ["<strength>", ...],
    "weaknesses": ["<weakness>", ...],
    "reasoning": "<overall assessment>"
}}

Make sure the output is valid JSON."#,
        category = request.category,
        prompt = request.prompt,
        label = label,
        output = request.output,
        range = range,
        criteria = criteria_desc,
        scale = scale_desc,
    )
}
