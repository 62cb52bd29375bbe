use std::sync::Arc;

use async_trait::async_trait;
use quickscan_model::{BarcodeFormat, DetectionResult};
use thiserror::Error;

use crate::frame::FrameImage;

/// Errors surfaced by a detection engine or its factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine could not be set up in this environment.
    #[error("detection engine unavailable: {0}")]
    Unavailable(String),

    /// Analysis of a single frame failed.
    #[error("detection failed: {0}")]
    Detection(String),
}

/// Black-box barcode detector scoped to a fixed set of formats.
#[async_trait]
pub trait DetectionEngine: Send + Sync {
    /// Analyze one frame. An empty list means nothing was found; an error
    /// means the engine itself failed.
    async fn process(
        &self,
        image: &FrameImage,
    ) -> Result<Vec<DetectionResult>, EngineError>;
}

/// Builds a [`DetectionEngine`] for a format set. Construction happens once
/// per session and may fail.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        formats: &[BarcodeFormat],
    ) -> Result<Arc<dyn DetectionEngine>, EngineError>;
}

impl<F> EngineFactory for F
where
    F: Fn(&[BarcodeFormat]) -> Result<Arc<dyn DetectionEngine>, EngineError>
        + Send
        + Sync,
{
    fn create(
        &self,
        formats: &[BarcodeFormat],
    ) -> Result<Arc<dyn DetectionEngine>, EngineError> {
        self(formats)
    }
}
