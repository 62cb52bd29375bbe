use std::fmt::{self, Display};

use crate::content::Content;

/// Category of a failure that ended (or interrupted) a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FailureKind {
    /// The detection engine could not be constructed.
    EngineInitialization,
    /// The detection engine failed while analyzing a frame.
    Detection,
    /// The capture source could not be started or failed while running.
    Capture,
    /// A response carried a result code nobody recognises.
    UnknownResultCode,
    /// An error response arrived without its cause.
    MissingCause,
    /// A response document could not be read at all.
    MalformedResponse,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::EngineInitialization => "engine_initialization",
            FailureKind::Detection => "detection",
            FailureKind::Capture => "capture",
            FailureKind::UnknownResultCode => "unknown_result_code",
            FailureKind::MissingCause => "missing_cause",
            FailureKind::MalformedResponse => "malformed_response",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable cause carried by [`ScanOutcome::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ScanFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_result_code(code: i32) -> Self {
        Self::new(
            FailureKind::UnknownResultCode,
            format!("unknown result code {code}"),
        )
    }

    pub fn malformed_response(reason: impl Display) -> Self {
        Self::new(
            FailureKind::MalformedResponse,
            format!("malformed response: {reason}"),
        )
    }

    pub fn missing_cause() -> Self {
        Self::new(
            FailureKind::MissingCause,
            "error result did not carry a cause",
        )
    }
}

impl Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ScanFailure {}

/// The single terminal result of a scan session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "outcome", content = "value", rename_all = "snake_case")
)]
pub enum ScanOutcome {
    /// A code was detected and classified.
    Success(Content),
    /// The user closed the scanner.
    UserCanceled,
    /// Camera permission was not granted; the camera never started.
    MissingPermission,
    /// The user picked the alternate text action instead of scanning.
    AlternateAction { text: String },
    /// Setup or analysis failed and the failure was not recoverable.
    Error(ScanFailure),
}

impl ScanOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::Success(_))
    }

    pub fn content(&self) -> Option<&Content> {
        match self {
            ScanOutcome::Success(content) => Some(content),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ScanFailure> {
        match self {
            ScanOutcome::Error(failure) => Some(failure),
            _ => None,
        }
    }

    /// Short human readable rendering of the outcome.
    pub fn summary(&self) -> String {
        match self {
            ScanOutcome::Success(content) => content.raw().display_text(),
            ScanOutcome::UserCanceled => "User canceled".to_string(),
            ScanOutcome::MissingPermission => "Missing permission".to_string(),
            ScanOutcome::AlternateAction { text } => text.clone(),
            ScanOutcome::Error(failure) => failure.to_string(),
        }
    }
}
