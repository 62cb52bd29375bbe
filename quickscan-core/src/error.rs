use quickscan_contracts::{CaptureError, EngineError};
use quickscan_model::{FailureKind, ModelError, ScanFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Engine initialization failed: {0}")]
    EngineInitialization(String),

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Serialization error: {0}")]
    Transport(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ModelError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl From<EngineError> for ScanError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unavailable(msg) => ScanError::EngineInitialization(msg),
            EngineError::Detection(msg) => ScanError::Detection(msg),
        }
    }
}

impl From<&ScanError> for ScanFailure {
    fn from(err: &ScanError) -> Self {
        let kind = match err {
            ScanError::EngineInitialization(_) => {
                FailureKind::EngineInitialization
            }
            ScanError::Capture(_) => FailureKind::Capture,
            ScanError::Detection(_)
            | ScanError::Transport(_)
            | ScanError::InvalidConfig(_)
            | ScanError::InvalidSettings(_) => FailureKind::Detection,
        };
        ScanFailure::new(kind, err.to_string())
    }
}

impl From<ScanError> for ScanFailure {
    fn from(err: ScanError) -> Self {
        ScanFailure::from(&err)
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
