//! Platform collaborators: permissions, capture hardware, error triage and
//! the presentation side channel.

use std::sync::Arc;

use async_trait::async_trait;
use quickscan_model::ScanFailure;
use thiserror::Error;

use crate::frame::CapturedFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Grants or denies camera access for the current scan.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn request_camera(&self) -> PermissionStatus;
}

/// Decides whether a failure can be resolved by the platform (the session
/// keeps running) or is fatal (the session ends with an error).
pub trait ErrorClassifier: Send + Sync {
    fn is_resolvable(&self, failure: &ScanFailure) -> bool;
}

/// Treats every failure as fatal.
#[derive(Debug, Default, Clone, Copy)]
pub struct FatalErrors;

impl ErrorClassifier for FatalErrors {
    fn is_resolvable(&self, _failure: &ScanFailure) -> bool {
        false
    }
}

impl<F> ErrorClassifier for F
where
    F: Fn(&ScanFailure) -> bool + Send + Sync,
{
    fn is_resolvable(&self, failure: &ScanFailure) -> bool {
        self(failure)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

/// Everything the capture source needs to start streaming for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CaptureRequest {
    pub facing: CameraFacing,
    pub target_width: u32,
    pub target_height: u32,
    pub show_torch_toggle: bool,
    pub show_close_button: bool,
}

/// Receives frames from a capture source. Implementations must not block.
pub trait FrameSink: Send + Sync {
    fn on_frame(&self, frame: CapturedFrame);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("camera provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("failed to bind camera: {0}")]
    Bind(String),
}

/// Camera hardware. Delivers frames to the sink on its own schedule and
/// holds back the next frame until the previous one is released.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn start(
        &self,
        request: CaptureRequest,
        sink: Arc<dyn FrameSink>,
    ) -> Result<(), CaptureError>;

    /// Stop delivering frames. Must be safe to call more than once.
    fn stop(&self);

    /// Torch control; a no-op for sources without a flash unit.
    fn set_torch(&self, _enabled: bool) {}
}

/// Presentation hooks driven by the session. All methods default to no-ops.
pub trait ScanSurface: Send + Sync {
    /// Busy/error indicator, toggled after every analysis pass.
    fn set_busy(&self, _busy: bool) {}

    /// A code was accepted.
    fn confirm_detection(&self, _haptic: bool) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSurface;

impl ScanSurface for NoopSurface {}
