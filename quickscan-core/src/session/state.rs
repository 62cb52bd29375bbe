//! Scan session state machine.
//!
//! Pure transition logic: no I/O, no timers. The async driver in
//! [`super::runtime`] feeds events in and acts on the returned
//! [`TransitionResult`]. The first terminal outcome wins; every later event
//! is reported as an invalid transition and leaves the session untouched.

use quickscan_contracts::{ErrorClassifier, PermissionStatus};
use quickscan_model::{ScanConfig, ScanFailure, ScanOutcome};

use crate::analyzer::AnalyzerEvent;
use crate::classify::classify_detection;

/// Lifecycle stage of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting on the camera permission prompt
    AwaitingPermission,

    /// Camera bound and frames flowing. `suspended` mirrors the busy
    /// indicator: true after a pass that ended in failure.
    Capturing { suspended: bool },

    /// A code was detected
    Succeeded,

    /// The user closed the scanner
    Canceled,

    /// Permission refused; the camera never started
    PermissionDenied,

    /// The user took the alternate text action
    ActionSelected,

    /// A fatal failure ended the session
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            SessionState::AwaitingPermission | SessionState::Capturing { .. }
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            SessionState::AwaitingPermission => "Awaiting camera permission",
            SessionState::Capturing { suspended: false } => "Scanning",
            SessionState::Capturing { suspended: true } => {
                "Scanning (last pass failed)"
            }
            SessionState::Succeeded => "Code detected",
            SessionState::Canceled => "Canceled by user",
            SessionState::PermissionDenied => "Camera permission denied",
            SessionState::ActionSelected => "Alternate action selected",
            SessionState::Failed => "Failed",
        }
    }
}

/// Inputs to the session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The permission prompt resolved
    PermissionResolved(PermissionStatus),

    /// Something the frame analyzer emitted
    Analyzer(AnalyzerEvent),

    /// The capture source failed to start
    CaptureFailed(ScanFailure),

    /// Close button or back navigation
    CloseRequested,

    /// The alternate text action was tapped
    AlternateActionSelected,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::PermissionResolved(_) => "permission_resolved",
            SessionEvent::Analyzer(event) => event.name(),
            SessionEvent::CaptureFailed(_) => "capture_failed",
            SessionEvent::CloseRequested => "close_requested",
            SessionEvent::AlternateActionSelected => {
                "alternate_action_selected"
            }
        }
    }
}

/// What the driver has to do after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionResult {
    /// Permission granted: build the analyzer and start the camera
    StartCapture,

    /// A pass completed; show or hide the busy indicator
    BusyChanged(bool),

    /// A resolvable failure; the platform shows it and scanning continues
    ErrorSurfaced(ScanFailure),

    /// The session ended with this outcome
    Finished(ScanOutcome),

    /// Event not valid in the current state
    InvalidTransition {
        from_state: &'static str,
        event: &'static str,
    },
}

/// State plus the request it serves.
#[derive(Debug, Clone)]
pub struct ScanSession {
    config: ScanConfig,
    state: SessionState,
    outcome: Option<ScanOutcome>,
    last_error: Option<ScanFailure>,
}

impl ScanSession {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            state: SessionState::AwaitingPermission,
            outcome: None,
            last_error: None,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The terminal outcome, once there is one.
    pub fn outcome(&self) -> Option<&ScanOutcome> {
        self.outcome.as_ref()
    }

    /// Most recent resolvable failure shown to the user.
    pub fn last_error(&self) -> Option<&ScanFailure> {
        self.last_error.as_ref()
    }

    /// Attempt to transition based on an event
    pub fn transition(
        &mut self,
        event: SessionEvent,
        classifier: &dyn ErrorClassifier,
    ) -> TransitionResult {
        let (next, result) = match (self.state, event) {
            (
                SessionState::AwaitingPermission,
                SessionEvent::PermissionResolved(status),
            ) => {
                if status.is_granted() {
                    (
                        SessionState::Capturing { suspended: false },
                        TransitionResult::StartCapture,
                    )
                } else {
                    (
                        SessionState::PermissionDenied,
                        TransitionResult::Finished(
                            ScanOutcome::MissingPermission,
                        ),
                    )
                }
            }

            (
                SessionState::AwaitingPermission | SessionState::Capturing { .. },
                SessionEvent::CloseRequested,
            ) => (
                SessionState::Canceled,
                TransitionResult::Finished(ScanOutcome::UserCanceled),
            ),

            (
                SessionState::Capturing { .. },
                SessionEvent::Analyzer(AnalyzerEvent::Detected { result, .. }),
            ) => (
                SessionState::Succeeded,
                TransitionResult::Finished(ScanOutcome::Success(
                    classify_detection(&result),
                )),
            ),

            (
                SessionState::Capturing { suspended },
                SessionEvent::Analyzer(AnalyzerEvent::Failed { failure, .. })
                | SessionEvent::CaptureFailed(failure),
            ) => {
                if classifier.is_resolvable(&failure) {
                    self.last_error = Some(failure.clone());
                    (
                        SessionState::Capturing { suspended },
                        TransitionResult::ErrorSurfaced(failure),
                    )
                } else {
                    (
                        SessionState::Failed,
                        TransitionResult::Finished(ScanOutcome::Error(
                            failure,
                        )),
                    )
                }
            }

            (
                SessionState::Capturing { .. },
                SessionEvent::Analyzer(AnalyzerEvent::PassCompleted {
                    failure_occurred,
                    ..
                }),
            ) => (
                SessionState::Capturing {
                    suspended: failure_occurred,
                },
                TransitionResult::BusyChanged(failure_occurred),
            ),

            (
                SessionState::Capturing { .. },
                SessionEvent::AlternateActionSelected,
            ) if self.config.text_action().is_some() => {
                let text = self
                    .config
                    .text_action()
                    .map(str::to_owned)
                    .unwrap_or_default();
                (
                    SessionState::ActionSelected,
                    TransitionResult::Finished(ScanOutcome::AlternateAction {
                        text,
                    }),
                )
            }

            (state, event) => {
                return TransitionResult::InvalidTransition {
                    from_state: state.description(),
                    event: event.name(),
                };
            }
        };

        self.state = next;
        if let TransitionResult::Finished(outcome) = &result {
            self.outcome = Some(outcome.clone());
        }
        result
    }
}
