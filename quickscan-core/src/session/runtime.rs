//! Async driver for a scan session.
//!
//! Owns the collaborators, requests permission, starts the analyzer and the
//! capture source, and feeds every input into the [`ScanSession`] state
//! machine until it reports a terminal outcome. Capture and analysis are
//! torn down on every exit path, including when the driving future is
//! dropped.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use quickscan_contracts::{
    CameraFacing, CaptureRequest, CaptureSource, EngineFactory,
    ErrorClassifier, FatalErrors, NoopSurface, PermissionGate, ScanSurface,
};
use quickscan_model::{FailureKind, ScanConfig, ScanFailure, ScanOutcome};
use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

use super::state::{ScanSession, SessionEvent, TransitionResult};
use crate::analyzer::{AnalyzerEvent, FrameAnalyzer};
use crate::error::ScanError;
use crate::settings::AnalyzerSettings;

/// External collaborators a session drives.
#[derive(Clone)]
pub struct SessionServices {
    pub permissions: Arc<dyn PermissionGate>,
    pub capture: Arc<dyn CaptureSource>,
    pub engines: Arc<dyn EngineFactory>,
    pub classifier: Arc<dyn ErrorClassifier>,
    pub surface: Arc<dyn ScanSurface>,
}

impl SessionServices {
    /// Services with every failure treated as fatal and no presentation
    /// hooks.
    pub fn new(
        permissions: Arc<dyn PermissionGate>,
        capture: Arc<dyn CaptureSource>,
        engines: Arc<dyn EngineFactory>,
    ) -> Self {
        Self {
            permissions,
            capture,
            engines,
            classifier: Arc::new(FatalErrors),
            surface: Arc::new(NoopSurface),
        }
    }

    pub fn with_classifier(
        mut self,
        classifier: Arc<dyn ErrorClassifier>,
    ) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_surface(mut self, surface: Arc<dyn ScanSurface>) -> Self {
        self.surface = surface;
        self
    }
}

impl fmt::Debug for SessionServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionServices").finish_non_exhaustive()
    }
}

/// Input from the scanner UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Close,
    AlternateAction,
    SetTorch(bool),
}

/// Sends user input to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    actions: mpsc::UnboundedSender<UserAction>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns false once the session has finished.
    pub fn send(&self, action: UserAction) -> bool {
        self.actions.send(action).is_ok()
    }

    pub fn close(&self) -> bool {
        self.send(UserAction::Close)
    }

    pub fn select_alternate_action(&self) -> bool {
        self.send(UserAction::AlternateAction)
    }

    pub fn set_torch(&self, enabled: bool) -> bool {
        self.send(UserAction::SetTorch(enabled))
    }
}

/// One scan, from permission prompt to outcome.
pub struct SessionRunner {
    id: Uuid,
    config: ScanConfig,
    settings: AnalyzerSettings,
    services: SessionServices,
    actions: mpsc::UnboundedReceiver<UserAction>,
}

impl SessionRunner {
    pub fn new(
        config: ScanConfig,
        settings: AnalyzerSettings,
        services: SessionServices,
    ) -> (Self, SessionHandle) {
        let id = Uuid::now_v7();
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let runner = Self {
            id,
            config,
            settings,
            services,
            actions: actions_rx,
        };
        let handle = SessionHandle {
            id,
            actions: actions_tx,
        };
        (runner, handle)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Drive the session to its single terminal outcome.
    pub async fn run(self) -> ScanOutcome {
        let span = tracing::info_span!(
            target: "scan::session",
            "scan_session",
            session_id = %self.id
        );
        self.drive().instrument(span).await
    }

    async fn drive(self) -> ScanOutcome {
        let SessionRunner {
            config,
            settings,
            services,
            mut actions,
            ..
        } = self;

        tracing::info!(
            target: "scan::session",
            formats = ?config.formats(),
            "scan session started"
        );

        let mut session = ScanSession::new(config);
        let mut teardown = Teardown::default();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut pending = VecDeque::new();

        let permissions = Arc::clone(&services.permissions);
        let permission = async move { permissions.request_camera().await };
        tokio::pin!(permission);
        let mut awaiting_permission = true;
        let mut actions_open = true;

        let outcome = loop {
            let event = match pending.pop_front() {
                Some(event) => event,
                None => tokio::select! {
                    status = &mut permission, if awaiting_permission => {
                        awaiting_permission = false;
                        SessionEvent::PermissionResolved(status)
                    }
                    Some(event) = events_rx.recv() => SessionEvent::Analyzer(event),
                    action = actions.recv(), if actions_open => match action {
                        Some(UserAction::Close) => SessionEvent::CloseRequested,
                        Some(UserAction::AlternateAction) => {
                            SessionEvent::AlternateActionSelected
                        }
                        Some(UserAction::SetTorch(enabled)) => {
                            services.capture.set_torch(enabled);
                            continue;
                        }
                        None => {
                            actions_open = false;
                            continue;
                        }
                    },
                    else => {
                        break ScanOutcome::Error(ScanFailure::new(
                            FailureKind::Capture,
                            "session inputs closed",
                        ));
                    }
                },
            };

            match session.transition(event, services.classifier.as_ref()) {
                TransitionResult::StartCapture => {
                    let started = start_capture(
                        session.config(),
                        &settings,
                        &services,
                        events_tx.clone(),
                        &mut teardown,
                    )
                    .await;
                    if let Err(failure) = started {
                        pending.push_back(SessionEvent::CaptureFailed(failure));
                    }
                }
                TransitionResult::BusyChanged(busy) => {
                    services.surface.set_busy(busy);
                }
                TransitionResult::ErrorSurfaced(failure) => {
                    tracing::warn!(
                        target: "scan::session",
                        error = %failure,
                        "resolvable failure; scanning continues"
                    );
                }
                TransitionResult::Finished(outcome) => break outcome,
                TransitionResult::InvalidTransition { from_state, event } => {
                    tracing::debug!(
                        target: "scan::session",
                        state = from_state,
                        event,
                        "ignoring event"
                    );
                }
            }
        };

        teardown.run();

        match &outcome {
            ScanOutcome::Success(content) => {
                services
                    .surface
                    .confirm_detection(session.config().haptic_on_success());
                tracing::info!(
                    target: "scan::session",
                    kind = ?content.kind(),
                    "scan session succeeded"
                );
            }
            ScanOutcome::Error(failure) => {
                tracing::error!(
                    target: "scan::session",
                    error = %failure,
                    "scan session failed"
                );
            }
            other => {
                tracing::info!(
                    target: "scan::session",
                    outcome = %other.summary(),
                    "scan session finished"
                );
            }
        }

        outcome
    }
}

impl fmt::Debug for SessionRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRunner")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Runs a session that takes no user input.
pub async fn run_session(
    config: ScanConfig,
    settings: AnalyzerSettings,
    services: SessionServices,
) -> ScanOutcome {
    let (runner, _handle) = SessionRunner::new(config, settings, services);
    runner.run().await
}

/// The capture parameters a session asks for.
pub fn capture_request(
    config: &ScanConfig,
    settings: &AnalyzerSettings,
) -> CaptureRequest {
    CaptureRequest {
        facing: if config.use_front_camera() {
            CameraFacing::Front
        } else {
            CameraFacing::Back
        },
        target_width: settings.target_resolution.width,
        target_height: settings.target_resolution.height,
        show_torch_toggle: config.show_torch_toggle(),
        show_close_button: config.show_close_button(),
    }
}

async fn start_capture(
    config: &ScanConfig,
    settings: &AnalyzerSettings,
    services: &SessionServices,
    events: mpsc::UnboundedSender<AnalyzerEvent>,
    teardown: &mut Teardown,
) -> Result<(), ScanFailure> {
    let analyzer = Arc::new(FrameAnalyzer::spawn(
        services.engines.as_ref(),
        config.formats(),
        settings,
        events,
    ));
    analyzer.deactivate_on_detection();
    teardown.analyzer = Some(Arc::clone(&analyzer));
    teardown.capture = Some(Arc::clone(&services.capture));

    let request = capture_request(config, settings);
    tracing::debug!(target: "scan::session", ?request, "starting capture");
    match services.capture.start(request, analyzer).await {
        Ok(()) => {
            tracing::info!(target: "scan::session", "capture started");
            Ok(())
        }
        Err(err) => {
            let failure = ScanFailure::from(ScanError::from(err));
            tracing::error!(
                target: "scan::session",
                error = %failure,
                "capture failed to start"
            );
            Err(failure)
        }
    }
}

/// Stops analysis, then capture. Runs at most once.
#[derive(Default)]
struct Teardown {
    analyzer: Option<Arc<FrameAnalyzer>>,
    capture: Option<Arc<dyn CaptureSource>>,
}

impl Teardown {
    fn run(&mut self) {
        if let Some(analyzer) = self.analyzer.take() {
            analyzer.shutdown();
        }
        if let Some(capture) = self.capture.take() {
            capture.stop();
        }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.run();
    }
}
