//! Judge evaluation pipeline: prompt construction, dispatch to the
//! configured judges, and tolerant parsing of their replies.

pub mod dispatch;
pub mod parser;
pub mod prompt;
pub mod types;

pub use dispatch::{DispatchMode, Judge, JudgeDispatcher};
pub use types::{CriterionScore, EvaluationRequest, JudgeConfig, JudgeEvaluation, Scale};
