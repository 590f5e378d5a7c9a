//! Category rubrics: named, weighted, described scoring criteria.
//!
//! The registry is built once at startup and read-only for the run.
//! Unknown categories fall back to a generic relevance/accuracy/clarity
//! rubric so every request can be scored.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub weight: f64,
    pub description: String,
}

/// Ordered, weighted criteria for one test category. Weights sum to 1.0;
/// enforced at construction so lookups never need to re-validate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubric {
    pub category: String,
    pub criteria: Vec<Criterion>,
}

impl Rubric {
    pub fn new(category: impl Into<String>, criteria: Vec<Criterion>) -> Result<Self, ConfigError> {
        let category = category.into();
        let total: f64 = criteria.iter().map(|c| c.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::RubricWeights { category, total });
        }
        Ok(Rubric { category, criteria })
    }

    pub fn criterion(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.name == name)
    }

    pub fn criterion_names(&self) -> Vec<String> {
        self.criteria.iter().map(|c| c.name.clone()).collect()
    }

    /// Criteria-weighted overall score. Criteria absent from `scores`
    /// contribute nothing, mirroring how a judge that skipped a criterion
    /// is scored after the parser substituted defaults upstream.
    pub fn overall_score(&self, scores: &BTreeMap<String, f64>) -> f64 {
        self.criteria
            .iter()
            .filter_map(|c| scores.get(&c.name).map(|s| s * c.weight))
            .sum()
    }
}

/// Human-readable description for a known criterion name. Unknown names
/// echo back as their own description.
pub fn describe_criterion(name: &str) -> &str {
    match name {
        "accuracy" => "Factual correctness; the information is accurate",
        "conciseness" => "Expresses the complete idea in as few words as possible",
        "clarity" => "Clear structure, easy to understand",
        "reasoning_quality" => "Rigorous logic and well-founded argument",
        "completeness" => "Covers every required aspect",
        "code_correctness" => "The code runs and does what was asked",
        "code_style" => "Follows idiomatic style and best practices",
        "efficiency" => "Reasonable algorithmic complexity",
        "documentation" => "Clear comments and explanations",
        "structure" => "Well organized with a clear logical flow",
        "content_quality" => "Substantive content, not filler",
        "creativity" => "Offers original insight",
        "fluency" => "Natural, fluent language",
        "cultural_appropriateness" => "Fits the cultural context",
        "coherence" => "Internally consistent from start to end",
        "emotional_impact" => "Evokes a genuine response",
        "originality" => "Avoids cliche",
        "citation_quality" => "Sources are reliable and attributed",
        "context_retention" => "Remembers earlier turns of the conversation",
        "relevance" => "Stays on topic",
        other => other,
    }
}

fn criterion(name: &str, weight: f64) -> Criterion {
    Criterion {
        name: name.to_string(),
        weight,
        description: describe_criterion(name).to_string(),
    }
}

/// File format for YAML rubric overrides: category -> list of criteria.
#[derive(Debug, Deserialize)]
struct RubricFile {
    #[serde(flatten)]
    categories: BTreeMap<String, Vec<Criterion>>,
}

/// Static mapping from test category to rubric.
#[derive(Debug, Clone)]
pub struct RubricRegistry {
    rubrics: BTreeMap<String, Rubric>,
    fallback: Rubric,
}

impl RubricRegistry {
    /// Registry with the built-in category rubrics.
    pub fn builtin() -> Self {
        let table: &[(&str, &[(&str, f64)])] = &[
            (
                "qa_simple",
                &[("accuracy", 0.4), ("conciseness", 0.3), ("clarity", 0.3)],
            ),
            (
                "reasoning_complex",
                &[
                    ("reasoning_quality", 0.4),
                    ("completeness", 0.3),
                    ("clarity", 0.3),
                ],
            ),
            (
                "code_generation",
                &[
                    ("code_correctness", 0.5),
                    ("code_style", 0.2),
                    ("efficiency", 0.2),
                    ("documentation", 0.1),
                ],
            ),
            (
                "generation_long",
                &[
                    ("structure", 0.25),
                    ("content_quality", 0.35),
                    ("creativity", 0.2),
                    ("clarity", 0.2),
                ],
            ),
            (
                "summarization",
                &[("completeness", 0.4), ("conciseness", 0.3), ("accuracy", 0.3)],
            ),
            (
                "translation",
                &[
                    ("accuracy", 0.5),
                    ("fluency", 0.3),
                    ("cultural_appropriateness", 0.2),
                ],
            ),
            (
                "math_reasoning",
                &[("accuracy", 0.5), ("reasoning_quality", 0.3), ("clarity", 0.2)],
            ),
            (
                "creative_writing",
                &[
                    ("creativity", 0.3),
                    ("coherence", 0.3),
                    ("emotional_impact", 0.2),
                    ("originality", 0.2),
                ],
            ),
            (
                "factual_accuracy",
                &[
                    ("accuracy", 0.5),
                    ("completeness", 0.3),
                    ("citation_quality", 0.2),
                ],
            ),
            (
                "multi_turn",
                &[
                    ("context_retention", 0.4),
                    ("relevance", 0.3),
                    ("coherence", 0.3),
                ],
            ),
        ];

        let mut rubrics = BTreeMap::new();
        for (category, weights) in table {
            let criteria = weights.iter().map(|(n, w)| criterion(n, *w)).collect();
            // Built-in weight tables sum to 1.0 by construction.
            let rubric = Rubric::new(*category, criteria)
                .unwrap_or_else(|e| panic!("built-in rubric invalid: {e}"));
            rubrics.insert(category.to_string(), rubric);
        }

        let fallback = Rubric::new(
            "default",
            vec![
                criterion("relevance", 0.4),
                criterion("accuracy", 0.3),
                criterion("clarity", 0.3),
            ],
        )
        .unwrap_or_else(|e| panic!("built-in rubric invalid: {e}"));

        RubricRegistry { rubrics, fallback }
    }

    /// Rubric for a category, falling back to the generic rubric for
    /// unknown categories.
    pub fn get(&self, category: &str) -> &Rubric {
        self.rubrics.get(category).unwrap_or(&self.fallback)
    }

    pub fn insert(&mut self, rubric: Rubric) {
        self.rubrics.insert(rubric.category.clone(), rubric);
    }

    pub fn categories(&self) -> impl Iterator<Item = &Rubric> {
        self.rubrics.values()
    }

    /// Merge category rubrics from a YAML file into the registry. New
    /// categories are added and existing ones replaced; weight sums are
    /// validated on construction.
    pub fn load_overrides(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rubric file: {}", path.display()))?;
        let file: RubricFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse rubric YAML: {}", path.display()))?;

        for (category, criteria) in file.categories {
            let rubric = Rubric::new(category, criteria)?;
            self.insert(rubric);
        }
        Ok(())
    }
}

impl Default for RubricRegistry {
    fn default() -> Self {
        RubricRegistry::builtin()
    }
}
