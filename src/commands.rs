//! Command implementations behind the CLI.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::audit::{self, AgreementReport, ConsistencyAuditor, ConsistencyRecord};
use crate::client::JudgeClient;
use crate::config::BenchConfig;
use crate::judge::types::EvaluationRequest;
use crate::judge::{DispatchMode, Judge, JudgeDispatcher};
use crate::rubric::RubricRegistry;
use crate::scoring::{aggregate, AggregatedResult};

/// Everything `evaluate` learned about one candidate output, printed
/// as a single JSON document.
#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    #[serde(flatten)]
    pub result: AggregatedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<AgreementReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consistency: Vec<ConsistencyRecord>,
}

pub struct EvaluateArgs {
    pub config: BenchConfig,
    pub request: EvaluationRequest,
    pub sequential: bool,
    pub no_audit: bool,
    pub rubric_overrides: Option<std::path::PathBuf>,
}

fn load_registry(overrides: Option<&Path>) -> Result<RubricRegistry> {
    let mut registry = RubricRegistry::builtin();
    if let Some(path) = overrides {
        registry.load_overrides(path)?;
    }
    Ok(registry)
}

fn build_dispatcher(
    config: &BenchConfig,
    registry: RubricRegistry,
    sequential: bool,
) -> Result<JudgeDispatcher> {
    let mut judges = Vec::new();
    for judge_config in config.judge_configs() {
        if let Some(client) = JudgeClient::from_config(&judge_config)? {
            judges.push(Judge::new(judge_config, client));
        }
    }

    let mode = if sequential {
        DispatchMode::Sequential
    } else {
        config.evaluation.mode
    };
    Ok(JudgeDispatcher::new(judges, registry, mode)?)
}

/// Run the full pipeline for one candidate output and print the report
/// as pretty JSON on stdout.
pub async fn evaluate(args: EvaluateArgs) -> Result<()> {
    let report = run_evaluation(&args).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn run_evaluation(args: &EvaluateArgs) -> Result<EvaluationReport> {
    let registry = load_registry(args.rubric_overrides.as_deref())?;
    let dispatcher = build_dispatcher(&args.config, registry, args.sequential)?;
    let configs = dispatcher.judge_configs();

    info!(
        test = %args.request.test_name,
        category = %args.request.category,
        judges = configs.len(),
        "starting evaluation"
    );
    let evaluations = dispatcher.evaluate(&args.request).await;

    let agreement = audit::agreement(
        dispatcher.registry(),
        &args.request.category,
        &evaluations,
        &configs,
    );

    let auditor = ConsistencyAuditor::new(args.config.evaluation.consistency);
    let consistency = if !args.no_audit && auditor.should_sample() {
        auditor.audit(&dispatcher, &args.request, &evaluations).await
    } else {
        Vec::new()
    };

    let result = aggregate(&args.request, evaluations, &configs);
    Ok(EvaluationReport {
        result,
        agreement,
        consistency,
    })
}

/// Print every rubric category with its weighted criteria.
pub fn rubrics(overrides: Option<&Path>) -> Result<()> {
    let registry = load_registry(overrides)?;
    for rubric in registry.categories() {
        println!("{}", rubric.category);
        for criterion in &rubric.criteria {
            println!(
                "  {:<24} {:.2}  {}",
                criterion.name, criterion.weight, criterion.description
            );
        }
    }
    Ok(())
}

/// Print the judge panel from a config file.
pub fn judges(config_path: &Path) -> Result<()> {
    let config = BenchConfig::load(config_path)?;
    for judge in config.judge_configs() {
        println!(
            "{:<16} type={:<10} model={:<32} weight={:.2} scale=[{}, {}] blind={}",
            judge.name,
            judge.kind,
            judge.model,
            judge.weight,
            judge.scale.min,
            judge.scale.max,
            judge.blind_evaluation
        );
    }
    Ok(())
}
