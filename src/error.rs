use thiserror::Error;

/// Fatal pre-run configuration problems. These halt the run before any
/// evaluation begins; everything else is handled per judge.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rubric '{category}' criterion weights must sum to 1.0, got {total}")]
    RubricWeights { category: String, total: f64 },

    #[error("no judges enabled")]
    NoJudges,

    #[error("unknown judge type '{kind}' for judge '{judge}'")]
    UnknownJudgeType { judge: String, kind: String },

    #[error("judge '{judge}' weight {weight} is outside [0, 1]")]
    JudgeWeight { judge: String, weight: f64 },

    #[error("judge '{judge}' has invalid native scale [{min}, {max}]")]
    InvalidScale { judge: String, min: f64, max: f64 },
}

/// Failure at the chat-client boundary. Any of these makes the judge
/// unavailable for the current request; it is logged and the judge is
/// simply absent from the result mapping.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("api returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed api response: {0}")]
    MalformedResponse(String),

    #[error("judge unavailable: {0}")]
    Unavailable(String),
}
