//! Multi-judge quality benchmark engine for LLM endpoints.
//!
//! Candidate model output is blind-scored by several independent judge
//! models against a category-specific rubric, and the per-judge verdicts
//! are combined into a single normalized composite score with a discrete
//! grade. Judges are black boxes behind a chat interface; a failing judge
//! is excluded from aggregation instead of aborting the run.

pub mod audit;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod judge;
pub mod rubric;
pub mod scoring;
