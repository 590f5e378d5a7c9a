use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "llm-judge-bench", author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose logging (debug level)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate one candidate output with the configured judge panel
    Evaluate {
        /// Judge panel configuration (TOML)
        #[arg(long, short)]
        config: PathBuf,

        /// Test category selecting the rubric
        #[arg(long, default_value = "qa_simple")]
        category: String,

        /// Original prompt the candidate model answered
        #[arg(long)]
        prompt: String,

        /// Candidate output to judge
        #[arg(long)]
        output: String,

        /// Identifier of the model that produced the output
        #[arg(long, default_value = "unknown")]
        model: String,

        /// Test name recorded in the result
        #[arg(long, default_value = "adhoc")]
        test_name: String,

        /// Dispatch judges one at a time regardless of config
        #[arg(long)]
        sequential: bool,

        /// Disable consistency audit sampling
        #[arg(long)]
        no_audit: bool,

        /// YAML rubric overrides merged over the built-ins
        #[arg(long)]
        rubrics: Option<PathBuf>,
    },
    /// List rubric categories and their weighted criteria
    Rubrics {
        /// YAML rubric overrides merged over the built-ins
        #[arg(long)]
        rubrics: Option<PathBuf>,
    },
    /// Show the judge panel from a config file
    Judges {
        /// Judge panel configuration (TOML)
        #[arg(long, short)]
        config: PathBuf,
    },
}
