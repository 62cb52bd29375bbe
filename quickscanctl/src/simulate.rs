//! Runs a [`Script`] through a real session with scripted collaborators in
//! place of the camera, the permission prompt and the detection engine.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::Context;
use async_trait::async_trait;
use quickscan_contracts::{
    CaptureError, CaptureRequest, CaptureSource, CapturedFrame,
    DetectionEngine, EngineError, EngineFactory, FrameId, FrameImage,
    FrameSink, PermissionGate, PermissionStatus,
};
use quickscan_core::{
    AnalyzerSettings, ResponsePayload, SessionHandle, SessionRunner,
    SessionServices, decode_request, encode_response,
};
use quickscan_model::{
    BarcodeFormat, DetectionResult, FailureKind, ScanFailure, ScanOutcome,
};
use serde::Serialize;
use tokio::sync::{oneshot, watch};

use crate::script::{Script, ScriptStep};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frame accounting for one simulated session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub delivered: usize,
    pub analyzed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub result: ScanOutcome,
    pub response: ResponsePayload,
    pub frames: FrameStats,
    pub torch: Vec<bool>,
    pub capture_started: bool,
}

#[derive(Debug, Clone)]
enum EngineStep {
    Detect(DetectionResult),
    Fail(String),
    Empty,
}

/// Engine that answers each frame with the step staged for its id.
#[derive(Debug, Default)]
struct StagedEngine {
    staged: Mutex<HashMap<FrameId, EngineStep>>,
    calls: AtomicUsize,
}

impl StagedEngine {
    fn stage(&self, frame: FrameId, step: EngineStep) {
        lock(&self.staged).insert(frame, step);
    }

    /// Drops a step the engine never consumed; true when one was pending.
    fn unstage(&self, frame: FrameId) -> bool {
        lock(&self.staged).remove(&frame).is_some()
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DetectionEngine for StagedEngine {
    async fn process(
        &self,
        image: &FrameImage,
    ) -> Result<Vec<DetectionResult>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.staged).remove(&image.id);
        match step {
            Some(EngineStep::Detect(result)) => Ok(vec![result]),
            Some(EngineStep::Fail(reason)) => Err(EngineError::Detection(reason)),
            Some(EngineStep::Empty) | None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug)]
struct ScriptedPermission(PermissionStatus);

#[async_trait]
impl PermissionGate for ScriptedPermission {
    async fn request_camera(&self) -> PermissionStatus {
        self.0
    }
}

/// Capture source fed by the script driver.
struct ScriptedCapture {
    sink: Mutex<Option<Arc<dyn FrameSink>>>,
    started: watch::Sender<bool>,
    torch: Mutex<Vec<bool>>,
}

impl ScriptedCapture {
    fn new() -> Arc<Self> {
        let (started, _) = watch::channel(false);
        Arc::new(Self {
            sink: Mutex::new(None),
            started,
            torch: Mutex::new(Vec::new()),
        })
    }

    async fn wait_started(&self) {
        let mut started = self.started.subscribe();
        // The sender lives as long as `self`, so this only resolves on start.
        let _ = started.wait_for(|started| *started).await;
    }

    fn has_started(&self) -> bool {
        *self.started.borrow()
    }

    /// Returns the frame back when capture is not running.
    fn deliver(&self, frame: CapturedFrame) -> Result<(), CapturedFrame> {
        let sink = lock(&self.sink).clone();
        match sink {
            Some(sink) => {
                sink.on_frame(frame);
                Ok(())
            }
            None => Err(frame),
        }
    }

    fn torch_log(&self) -> Vec<bool> {
        lock(&self.torch).clone()
    }
}

#[async_trait]
impl CaptureSource for ScriptedCapture {
    async fn start(
        &self,
        request: CaptureRequest,
        sink: Arc<dyn FrameSink>,
    ) -> Result<(), CaptureError> {
        tracing::debug!(?request, "scripted capture started");
        *lock(&self.sink) = Some(sink);
        self.started.send_replace(true);
        Ok(())
    }

    fn stop(&self) {
        lock(&self.sink).take();
    }

    fn set_torch(&self, enabled: bool) {
        lock(&self.torch).push(enabled);
    }
}

fn engine_factory(
    script: &Script,
    engine: &Arc<StagedEngine>,
) -> Arc<dyn EngineFactory> {
    if script.engine_available {
        let engine = Arc::clone(engine);
        Arc::new(
            move |_: &[BarcodeFormat]| -> Result<Arc<dyn DetectionEngine>, EngineError> {
                Ok(Arc::clone(&engine) as Arc<dyn DetectionEngine>)
            },
        )
    } else {
        Arc::new(
            |_: &[BarcodeFormat]| -> Result<Arc<dyn DetectionEngine>, EngineError> {
                Err(EngineError::Unavailable(
                    "detection engine disabled by script".into(),
                ))
            },
        )
    }
}

fn resolvable_detection_failures(failure: &ScanFailure) -> bool {
    failure.kind == FailureKind::Detection
}

/// Runs `script` to completion. Once the script runs out of steps the
/// session is closed, so every run ends with an outcome.
pub async fn simulate(
    script: &Script,
    settings: &AnalyzerSettings,
) -> anyhow::Result<SimulationReport> {
    let config = decode_request(script.config.as_ref());
    let engine = Arc::new(StagedEngine::default());
    let capture = ScriptedCapture::new();

    let mut services = SessionServices::new(
        Arc::new(ScriptedPermission(script.permission.into())),
        capture.clone(),
        engine_factory(script, &engine),
    );
    if script.resolvable_errors {
        services =
            services.with_classifier(Arc::new(resolvable_detection_failures));
    }

    let (runner, handle) = SessionRunner::new(config, settings.clone(), services);
    tracing::info!(
        session_id = %runner.id(),
        steps = script.steps.len(),
        "running scan script"
    );
    let mut session = tokio::spawn(runner.run());

    let mut frames = FrameStats::default();
    let finished_early = {
        let driver = drive(script, &capture, &engine, &handle, &mut frames);
        tokio::pin!(driver);
        tokio::select! {
            biased;
            finished = &mut session => Some(finished),
            () = &mut driver => None,
        }
    };
    let outcome = match finished_early {
        Some(finished) => finished,
        None => {
            handle.close();
            session.await
        }
    }
    .context("scan session task failed")?;

    frames.analyzed = engine.calls();
    let report = SimulationReport {
        response: encode_response(&outcome),
        result: outcome,
        frames,
        torch: capture.torch_log(),
        capture_started: capture.has_started(),
    };
    tracing::info!(
        outcome = %report.result.summary(),
        delivered = report.frames.delivered,
        analyzed = report.frames.analyzed,
        skipped = report.frames.skipped,
        "scan script finished"
    );
    Ok(report)
}

async fn drive(
    script: &Script,
    capture: &ScriptedCapture,
    engine: &StagedEngine,
    handle: &SessionHandle,
    frames: &mut FrameStats,
) {
    capture.wait_started().await;
    let interval = Duration::from_millis(script.frame_interval_ms);
    let mut next_id = 0u64;

    for step in &script.steps {
        let staged = match step {
            ScriptStep::Detect(detection) => {
                EngineStep::Detect(detection.to_result())
            }
            ScriptStep::Fail(reason) => EngineStep::Fail(reason.clone()),
            ScriptStep::Empty => EngineStep::Empty,
            ScriptStep::WaitMs(millis) => {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
                continue;
            }
            ScriptStep::Close => {
                handle.close();
                continue;
            }
            ScriptStep::AlternateAction => {
                handle.select_alternate_action();
                continue;
            }
            ScriptStep::Torch(enabled) => {
                handle.set_torch(*enabled);
                continue;
            }
        };

        next_id += 1;
        let id = FrameId(next_id);
        engine.stage(id, staged);

        let (released_tx, released_rx) = oneshot::channel();
        let frame = CapturedFrame::new(FrameImage::empty(id), move |_| {
            let _ = released_tx.send(());
        });
        if capture.deliver(frame).is_err() {
            tracing::debug!(frame = %id, "capture stopped, ending script");
            engine.unstage(id);
            return;
        }
        frames.delivered += 1;

        let _ = released_rx.await;
        if engine.unstage(id) {
            tracing::debug!(frame = %id, "frame skipped by the analyzer");
            frames.skipped += 1;
        }
        tokio::time::sleep(interval).await;
    }
}
