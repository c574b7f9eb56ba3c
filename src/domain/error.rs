// Error kinds surfaced by the chart core
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    /// Ingress received a request kind it does not know. Not retried.
    #[error("Invalid data type: {0}")]
    InvalidDataType(String),

    /// The worker failed or the channel to it broke.
    #[error("Data generation failed: {0}")]
    GenerationFailure(String),

    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    #[error("Drawing surface is unavailable")]
    SurfaceUnavailable,

    #[error("Draw failed: {0}")]
    Draw(String),
}

pub type ChartResult<T> = Result<T, ChartError>;
