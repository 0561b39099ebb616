use thiserror::Error;

pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
