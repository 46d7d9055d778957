//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(#[from] rpe_session::SessionError),

    #[error("Toxicity error: {0}")]
    Toxicity(#[from] rpe_toxicity::ToxicityError),

    #[error("Engine error: {0}")]
    Engine(#[from] rpe_engine::EngineError),

    #[error("Publish error: {0}")]
    Publish(#[from] rpe_publisher::PublishError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] rpe_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
