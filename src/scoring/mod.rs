//! Score normalization, aggregation, and distribution statistics.

pub mod aggregate;
pub mod stats;

pub use aggregate::{aggregate, normalize, AggregatedResult, Grade};
pub use stats::{
    cohens_d, confidence_interval, describe, inter_rater_reliability, interpret_effect_size,
    ConfidenceInterval, Descriptive,
};
