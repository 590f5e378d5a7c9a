//! Fan-out of one evaluation request to every configured judge.
//!
//! A failing judge is logged and omitted from the result mapping; it
//! never aborts or corrupts the evaluation of the others. The mapping is
//! keyed by judge name, so collection order carries no meaning.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::client::{ChatMessage, JudgeClient};
use crate::error::{ConfigError, TransportError};
use crate::judge::parser;
use crate::judge::prompt::build_evaluation_prompt;
use crate::judge::types::{EvaluationRequest, JudgeConfig, JudgeEvaluation};
use crate::rubric::RubricRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// All judges invoked concurrently; waits for every judge to return
    /// or fail, bounded only by each client's own timeout.
    #[default]
    Parallel,
    /// Judges invoked one at a time in configuration order. For shared
    /// rate-limited backends or deterministic debugging.
    Sequential,
}

/// One configured judge with its bound chat client.
#[derive(Debug)]
pub struct Judge {
    pub config: JudgeConfig,
    pub client: JudgeClient,
}

impl Judge {
    pub fn new(config: JudgeConfig, client: JudgeClient) -> Self {
        Judge { config, client }
    }
}

/// Owns the judge set and evaluates candidate outputs against all of it.
pub struct JudgeDispatcher {
    judges: Vec<Arc<Judge>>,
    registry: Arc<RubricRegistry>,
    mode: DispatchMode,
}

impl JudgeDispatcher {
    pub fn new(
        judges: Vec<Judge>,
        registry: RubricRegistry,
        mode: DispatchMode,
    ) -> Result<Self, ConfigError> {
        if judges.is_empty() {
            return Err(ConfigError::NoJudges);
        }
        Ok(JudgeDispatcher {
            judges: judges.into_iter().map(Arc::new).collect(),
            registry: Arc::new(registry),
            mode,
        })
    }

    pub fn judges(&self) -> &[Arc<Judge>] {
        &self.judges
    }

    pub fn judge_configs(&self) -> Vec<JudgeConfig> {
        self.judges.iter().map(|j| j.config.clone()).collect()
    }

    pub fn registry(&self) -> &RubricRegistry {
        &self.registry
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Evaluate one candidate output with every judge. Judges that
    /// failed are absent from the mapping.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> HashMap<String, JudgeEvaluation> {
        match self.mode {
            DispatchMode::Parallel => self.evaluate_parallel(request).await,
            DispatchMode::Sequential => self.evaluate_sequential(request).await,
        }
    }

    async fn evaluate_parallel(
        &self,
        request: &EvaluationRequest,
    ) -> HashMap<String, JudgeEvaluation> {
        let mut set = JoinSet::new();
        for judge in &self.judges {
            let judge = Arc::clone(judge);
            let registry = Arc::clone(&self.registry);
            let request = request.clone();
            set.spawn(async move {
                let name = judge.config.name.clone();
                let result = evaluate_one(&judge, &registry, &request).await;
                (name, result)
            });
        }

        let mut evaluations = HashMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, Ok(evaluation))) => {
                    evaluations.insert(name, evaluation);
                }
                Ok((name, Err(e))) => {
                    warn!(judge = %name, error = %e, "judge unavailable for this request");
                }
                Err(e) => {
                    warn!(error = %e, "judge task failed to complete");
                }
            }
        }
        evaluations
    }

    async fn evaluate_sequential(
        &self,
        request: &EvaluationRequest,
    ) -> HashMap<String, JudgeEvaluation> {
        let mut evaluations = HashMap::new();
        for judge in &self.judges {
            match evaluate_one(judge, &self.registry, request).await {
                Ok(evaluation) => {
                    evaluations.insert(judge.config.name.clone(), evaluation);
                }
                Err(e) => {
                    warn!(judge = %judge.config.name, error = %e, "judge unavailable for this request");
                }
            }
        }
        evaluations
    }

    /// Run a single named judge against the request. Used by the
    /// consistency auditor to repeat an evaluation.
    pub async fn evaluate_with(
        &self,
        judge_name: &str,
        request: &EvaluationRequest,
    ) -> Option<JudgeEvaluation> {
        let judge = self.judges.iter().find(|j| j.config.name == judge_name)?;
        match evaluate_one(judge, &self.registry, request).await {
            Ok(evaluation) => Some(evaluation),
            Err(e) => {
                warn!(judge = %judge_name, error = %e, "judge unavailable during re-run");
                None
            }
        }
    }
}

/// One judge, end to end: rubric lookup, prompt, chat call, parse.
/// Transport errors propagate; parsing never fails.
async fn evaluate_one(
    judge: &Judge,
    registry: &RubricRegistry,
    request: &EvaluationRequest,
) -> Result<JudgeEvaluation, TransportError> {
    let config = &judge.config;
    let rubric = registry.get(&request.category);
    let prompt = build_evaluation_prompt(
        request,
        rubric,
        config.scale.mode(),
        config.blind_evaluation,
    );

    debug!(judge = %config.name, test = %request.test_name, "dispatching evaluation");
    let started = Instant::now();
    let messages = [ChatMessage::user(prompt)];
    let response = judge
        .client
        .chat(&messages, config.max_tokens, config.temperature)
        .await?;
    let evaluation_ms = started.elapsed().as_secs_f64() * 1000.0;

    let parsed = parser::parse(&response, rubric, config.scale);
    let (overall_score, weighted_score) = parser::resolve_overall(&parsed, rubric, &config.name);

    Ok(JudgeEvaluation {
        judge_name: config.name.clone(),
        judge_model: config.model.clone(),
        test_name: request.test_name.clone(),
        category: request.category.clone(),
        model_evaluated: request.model_name.clone(),
        scores: parsed.scores,
        overall_score,
        weighted_score,
        strengths: parsed.strengths,
        weaknesses: parsed.weaknesses,
        reasoning: parsed.reasoning,
        timestamp: chrono::Utc::now().to_rfc3339(),
        evaluation_ms,
        blind_evaluation: config.blind_evaluation,
    })
}
