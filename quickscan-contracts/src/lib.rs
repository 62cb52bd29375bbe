//! Trait surfaces that describe the collaborators around a scan session.

pub mod engine;
pub mod frame;
pub mod platform;

pub use engine::{DetectionEngine, EngineError, EngineFactory};
pub use frame::{CapturedFrame, FrameId, FrameImage, Rotation};
pub use platform::{
    CameraFacing, CaptureError, CaptureRequest, CaptureSource,
    ErrorClassifier, FatalErrors, FrameSink, NoopSurface, PermissionGate,
    PermissionStatus, ScanSurface,
};

/// Frequently used imports for engine and platform adapters.
pub mod prelude {
    pub use super::engine::{DetectionEngine, EngineError, EngineFactory};
    pub use super::frame::{CapturedFrame, FrameId, FrameImage};
    pub use super::platform::{
        CaptureSource, ErrorClassifier, FrameSink, PermissionGate,
        ScanSurface,
    };
}
