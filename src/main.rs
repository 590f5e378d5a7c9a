use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use llm_judge_bench::cli::{Cli, Commands};
use llm_judge_bench::commands::{self, EvaluateArgs};
use llm_judge_bench::config::BenchConfig;
use llm_judge_bench::judge::types::EvaluationRequest;

fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("LLM_JUDGE_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(format!("llm_judge_bench={default_level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Evaluate {
            config,
            category,
            prompt,
            output,
            model,
            test_name,
            sequential,
            no_audit,
            rubrics,
        } => {
            let config = BenchConfig::load(&config)?;
            let request = EvaluationRequest {
                test_name,
                category,
                prompt,
                output,
                model_name: model,
            };
            commands::evaluate(EvaluateArgs {
                config,
                request,
                sequential,
                no_audit,
                rubric_overrides: rubrics,
            })
            .await
        }
        Commands::Rubrics { rubrics } => commands::rubrics(rubrics.as_deref()),
        Commands::Judges { config } => commands::judges(&config),
    }
}
