use thiserror::Error;

pub type CubismResult<T> = Result<T, CubismError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CubismError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported event type `{0}`")]
    UnsupportedEventType(String),

    #[error("metrics belong to different contexts")]
    ContextMismatch,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("data source error: {0}")]
    Source(String),

    #[error("foreign runtime error: {0}")]
    Foreign(String),
}
