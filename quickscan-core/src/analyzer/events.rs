use quickscan_contracts::FrameId;
use quickscan_model::{DetectionResult, ScanFailure};

/// Notifications emitted by the frame analyzer, in emission order.
///
/// For an admitted frame the analyzer sends at most one of
/// [`Detected`](AnalyzerEvent::Detected) / [`Failed`](AnalyzerEvent::Failed)
/// followed by exactly one [`PassCompleted`](AnalyzerEvent::PassCompleted).
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerEvent {
    /// The first code found in a frame.
    Detected {
        frame: FrameId,
        result: DetectionResult,
    },
    /// Engine construction or frame analysis failed.
    Failed {
        frame: FrameId,
        failure: ScanFailure,
    },
    PassCompleted {
        frame: FrameId,
        failure_occurred: bool,
    },
}

impl AnalyzerEvent {
    pub fn frame(&self) -> FrameId {
        match self {
            AnalyzerEvent::Detected { frame, .. }
            | AnalyzerEvent::Failed { frame, .. }
            | AnalyzerEvent::PassCompleted { frame, .. } => *frame,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnalyzerEvent::Detected { .. } => "detected",
            AnalyzerEvent::Failed { .. } => "failed",
            AnalyzerEvent::PassCompleted { .. } => "pass_completed",
        }
    }
}
