//! Frame analyzer.
//!
//! Sits between the capture source and the detection engine. Frames arrive
//! on the capture callback ([`FrameSink::on_frame`]); at most one is under
//! analysis at any time, and after a hard engine failure frames are dropped
//! until the cool-down window closes. Every frame handed in is released
//! exactly once, whichever path it takes, and released before the next
//! frame can be admitted. An owner that ends on the first detection asks
//! for [`FrameAnalyzer::deactivate_on_detection`], which closes admission
//! before that frame is released.
//!
//! Analysis runs on a dedicated worker task fed through a one-slot channel.
//! Results leave the analyzer as [`AnalyzerEvent`]s on an unbounded channel
//! owned by the session.

mod events;
mod throttle;

pub use events::AnalyzerEvent;
pub use throttle::FailureThrottle;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use quickscan_contracts::{
    CapturedFrame, DetectionEngine, EngineFactory, FrameSink,
};
use quickscan_model::{BarcodeFormat, ScanFailure};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;
use crate::settings::AnalyzerSettings;

/// Snapshot of admission counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzerStats {
    /// Frames handed to the detection engine.
    pub admitted: u64,
    /// Frames dropped inside the failure cool-down.
    pub throttled: u64,
    /// Frames dropped because another frame was still under analysis.
    pub dropped_busy: u64,
    /// Frames dropped after deactivation or engine setup failure.
    pub dropped_inactive: u64,
}

#[derive(Debug, Default)]
struct Counters {
    admitted: AtomicU64,
    throttled: AtomicU64,
    dropped_busy: AtomicU64,
    dropped_inactive: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> AnalyzerStats {
        AnalyzerStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            dropped_busy: self.dropped_busy.load(Ordering::Relaxed),
            dropped_inactive: self.dropped_inactive.load(Ordering::Relaxed),
        }
    }
}

struct Shared {
    engine: Result<Arc<dyn DetectionEngine>, ScanFailure>,
    init_reported: AtomicBool,
    active: AtomicBool,
    deactivate_on_detection: AtomicBool,
    busy: AtomicBool,
    throttle: FailureThrottle,
    events: mpsc::UnboundedSender<AnalyzerEvent>,
    counters: Counters,
}

impl Shared {
    fn emit(&self, event: AnalyzerEvent) {
        let name = event.name();
        if self.events.send(event).is_err() {
            tracing::trace!(
                target: "scan::analyzer",
                event = name,
                "event receiver gone; dropping analyzer event"
            );
        }
    }

    /// Hands the frame back, then reopens admission.
    fn finish(&self, frame: CapturedFrame) {
        frame.release();
        self.busy.store(false, Ordering::Release);
    }

    async fn analyze(
        &self,
        engine: Arc<dyn DetectionEngine>,
        frame: CapturedFrame,
        shutdown: &CancellationToken,
    ) {
        let frame_id = frame.id();
        tracing::trace!(target: "scan::analyzer", %frame_id, "analyzing frame");

        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            result = engine.process(frame.image()) => Some(result),
        };
        let Some(result) = outcome else {
            tracing::debug!(
                target: "scan::analyzer",
                %frame_id,
                "analysis abandoned on shutdown"
            );
            self.finish(frame);
            return;
        };

        let failure_occurred = match result {
            Ok(results) => {
                if let Some(result) = results.into_iter().next() {
                    tracing::debug!(
                        target: "scan::analyzer",
                        %frame_id,
                        value_type = result.value_type,
                        "code detected"
                    );
                    if self.deactivate_on_detection.load(Ordering::Acquire) {
                        self.active.store(false, Ordering::Release);
                    }
                    self.emit(AnalyzerEvent::Detected {
                        frame: frame_id,
                        result,
                    });
                } else {
                    tracing::trace!(target: "scan::analyzer", %frame_id, "no code in frame");
                }
                false
            }
            Err(err) => {
                self.throttle.trip(Instant::now());
                let failure = ScanFailure::from(ScanError::from(err));
                tracing::warn!(
                    target: "scan::analyzer",
                    %frame_id,
                    error = %failure,
                    cooldown_ms = self.throttle.cooldown().as_millis() as u64,
                    "detection failed; throttling analysis"
                );
                self.emit(AnalyzerEvent::Failed {
                    frame: frame_id,
                    failure,
                });
                true
            }
        };

        self.emit(AnalyzerEvent::PassCompleted {
            frame: frame_id,
            failure_occurred,
        });
        self.finish(frame);
    }
}

/// Single-flight gate in front of a [`DetectionEngine`].
pub struct FrameAnalyzer {
    shared: Arc<Shared>,
    frames: mpsc::Sender<CapturedFrame>,
    shutdown: CancellationToken,
}

impl FrameAnalyzer {
    /// Builds the engine for `formats` and starts the analysis worker.
    ///
    /// Engine construction failure does not fail the call: it is reported
    /// once, as a [`AnalyzerEvent::Failed`], when the first frame arrives.
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        factory: &dyn EngineFactory,
        formats: &[BarcodeFormat],
        settings: &AnalyzerSettings,
        events: mpsc::UnboundedSender<AnalyzerEvent>,
    ) -> Self {
        let engine = factory.create(formats).map_err(|err| {
            let failure = ScanFailure::from(ScanError::from(err));
            tracing::error!(
                target: "scan::analyzer",
                error = %failure,
                "detection engine initialization failed"
            );
            failure
        });

        let shared = Arc::new(Shared {
            engine,
            init_reported: AtomicBool::new(false),
            active: AtomicBool::new(true),
            deactivate_on_detection: AtomicBool::new(false),
            busy: AtomicBool::new(false),
            throttle: FailureThrottle::new(settings.failure_cooldown()),
            events,
            counters: Counters::default(),
        });

        let (frames_tx, frames_rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        tokio::spawn(run_worker(
            Arc::clone(&shared),
            frames_rx,
            shutdown.clone(),
        ));

        Self {
            shared,
            frames: frames_tx,
            shutdown,
        }
    }

    /// False after [`deactivate`](Self::deactivate), or after a detection
    /// once [`deactivate_on_detection`](Self::deactivate_on_detection) is set.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// True while a frame is under analysis.
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// True inside the cool-down that follows a hard engine failure.
    pub fn is_throttled(&self) -> bool {
        self.shared.throttle.is_throttled(Instant::now())
    }

    /// Admission counters so far.
    pub fn stats(&self) -> AnalyzerStats {
        self.shared.counters.snapshot()
    }

    /// Closes admission from the worker as soon as a code is detected,
    /// before the detecting frame is released or its event is delivered.
    pub fn deactivate_on_detection(&self) {
        self.shared
            .deactivate_on_detection
            .store(true, Ordering::Release);
    }

    /// Stops admitting frames. A pass already in flight still completes.
    pub fn deactivate(&self) {
        if self.shared.active.swap(false, Ordering::AcqRel) {
            tracing::debug!(target: "scan::analyzer", "analyzer deactivated");
        }
    }

    /// Deactivates and stops the worker, abandoning any pass in flight.
    pub fn shutdown(&self) {
        self.deactivate();
        self.shutdown.cancel();
    }

    fn drop_frame(&self, frame: CapturedFrame, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
        frame.release();
    }
}

impl FrameSink for FrameAnalyzer {
    fn on_frame(&self, frame: CapturedFrame) {
        let shared = &self.shared;
        let frame_id = frame.id();

        if !shared.active.load(Ordering::Acquire) {
            tracing::trace!(target: "scan::analyzer", %frame_id, "analyzer inactive; releasing frame");
            self.drop_frame(frame, &shared.counters.dropped_inactive);
            return;
        }

        if let Err(failure) = &shared.engine {
            if !shared.init_reported.swap(true, Ordering::AcqRel) {
                shared.emit(AnalyzerEvent::Failed {
                    frame: frame_id,
                    failure: failure.clone(),
                });
            }
            self.drop_frame(frame, &shared.counters.dropped_inactive);
            return;
        }

        if shared.throttle.is_throttled(Instant::now()) {
            tracing::trace!(target: "scan::analyzer", %frame_id, "inside failure cool-down; dropping frame");
            self.drop_frame(frame, &shared.counters.throttled);
            return;
        }

        if shared
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(target: "scan::analyzer", %frame_id, "analysis in flight; dropping frame");
            self.drop_frame(frame, &shared.counters.dropped_busy);
            return;
        }

        // A detection may have closed admission since the first check.
        if !shared.active.load(Ordering::Acquire) {
            shared.busy.store(false, Ordering::Release);
            self.drop_frame(frame, &shared.counters.dropped_inactive);
            return;
        }

        match self.frames.try_send(frame) {
            Ok(()) => {
                shared.counters.admitted.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(frame) | TrySendError::Closed(frame)) => {
                shared.busy.store(false, Ordering::Release);
                tracing::debug!(target: "scan::analyzer", %frame_id, "worker unavailable; releasing frame");
                self.drop_frame(frame, &shared.counters.dropped_inactive);
            }
        }
    }
}

impl Drop for FrameAnalyzer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for FrameAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameAnalyzer")
            .field("engine_ready", &self.shared.engine.is_ok())
            .field("active", &self.is_active())
            .field("busy", &self.is_busy())
            .field("throttle", &self.shared.throttle)
            .field("stats", &self.stats())
            .finish()
    }
}

async fn run_worker(
    shared: Arc<Shared>,
    mut frames: mpsc::Receiver<CapturedFrame>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            frame = frames.recv() => match frame {
                Some(frame) => match &shared.engine {
                    Ok(engine) => {
                        shared
                            .analyze(Arc::clone(engine), frame, &shutdown)
                            .await;
                    }
                    Err(_) => shared.finish(frame),
                },
                None => break,
            },
        }
    }

    frames.close();
    while let Ok(frame) = frames.try_recv() {
        frame.release();
    }
    shared.busy.store(false, Ordering::Release);
    tracing::debug!(target: "scan::analyzer", "analyzer worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quickscan_contracts::{EngineError, FrameId, FrameImage};
    use quickscan_model::{DetectionResult, FailureKind};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct ScriptedEngine {
        steps: Mutex<Vec<Result<Vec<DetectionResult>, EngineError>>>,
    }

    impl ScriptedEngine {
        fn new(
            steps: Vec<Result<Vec<DetectionResult>, EngineError>>,
        ) -> Arc<Self> {
            let mut steps = steps;
            steps.reverse();
            Arc::new(Self {
                steps: Mutex::new(steps),
            })
        }
    }

    #[async_trait]
    impl DetectionEngine for ScriptedEngine {
        async fn process(
            &self,
            _image: &FrameImage,
        ) -> Result<Vec<DetectionResult>, EngineError> {
            self.steps
                .lock()
                .expect("engine script")
                .pop()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn analyzer_for(
        engine: Arc<ScriptedEngine>,
    ) -> (FrameAnalyzer, mpsc::UnboundedReceiver<AnalyzerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let factory = move |_: &[BarcodeFormat]| -> Result<
            Arc<dyn DetectionEngine>,
            EngineError,
        > { Ok(Arc::clone(&engine) as Arc<dyn DetectionEngine>) };
        let analyzer = FrameAnalyzer::spawn(
            &factory,
            &[BarcodeFormat::QrCode],
            &AnalyzerSettings::default(),
            tx,
        );
        (analyzer, rx)
    }

    fn frame(id: u64, releases: &Arc<AtomicUsize>) -> CapturedFrame {
        let releases = Arc::clone(releases);
        CapturedFrame::new(FrameImage::empty(FrameId(id)), move |_| {
            releases.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn next_event(
        rx: &mut mpsc::UnboundedReceiver<AnalyzerEvent>,
    ) -> AnalyzerEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn detection_emits_result_then_pass_completed() {
        let engine = ScriptedEngine::new(vec![Ok(vec![
            DetectionResult::text(BarcodeFormat::QrCode, "hello"),
            DetectionResult::text(BarcodeFormat::QrCode, "ignored"),
        ])]);
        let (analyzer, mut rx) = analyzer_for(engine);
        let releases = Arc::new(AtomicUsize::new(0));

        analyzer.on_frame(frame(1, &releases));

        match next_event(&mut rx).await {
            AnalyzerEvent::Detected { frame, result } => {
                assert_eq!(frame, FrameId(1));
                assert_eq!(result.raw.text.as_deref(), Some("hello"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            next_event(&mut rx).await,
            AnalyzerEvent::PassCompleted {
                frame: FrameId(1),
                failure_occurred: false
            }
        );
        tokio::task::yield_now().await;
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(analyzer.stats().admitted, 1);
        assert!(analyzer.is_active());
    }

    #[tokio::test]
    async fn detection_closes_admission_when_asked() {
        let engine = ScriptedEngine::new(vec![Ok(vec![DetectionResult::text(
            BarcodeFormat::QrCode,
            "hello",
        )])]);
        let (analyzer, mut rx) = analyzer_for(engine);
        analyzer.deactivate_on_detection();
        let releases = Arc::new(AtomicUsize::new(0));

        analyzer.on_frame(frame(1, &releases));
        assert!(matches!(
            next_event(&mut rx).await,
            AnalyzerEvent::Detected { .. }
        ));
        assert!(!analyzer.is_active());

        analyzer.on_frame(frame(2, &releases));
        assert_eq!(analyzer.stats().admitted, 1);
        assert_eq!(analyzer.stats().dropped_inactive, 1);
        tokio::task::yield_now().await;
        assert_eq!(releases.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_result_completes_without_failure_or_throttle() {
        let engine = ScriptedEngine::new(vec![Ok(Vec::new())]);
        let (analyzer, mut rx) = analyzer_for(engine);
        let releases = Arc::new(AtomicUsize::new(0));

        analyzer.on_frame(frame(1, &releases));
        assert_eq!(
            next_event(&mut rx).await,
            AnalyzerEvent::PassCompleted {
                frame: FrameId(1),
                failure_occurred: false
            }
        );
        assert!(!analyzer.is_throttled());
    }

    #[tokio::test(start_paused = true)]
    async fn hard_failure_arms_cooldown() {
        let engine = ScriptedEngine::new(vec![Err(EngineError::Detection(
            "blurred".into(),
        ))]);
        let (analyzer, mut rx) = analyzer_for(engine);
        let releases = Arc::new(AtomicUsize::new(0));

        analyzer.on_frame(frame(1, &releases));
        match next_event(&mut rx).await {
            AnalyzerEvent::Failed { failure, .. } => {
                assert_eq!(failure.kind, FailureKind::Detection);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            next_event(&mut rx).await,
            AnalyzerEvent::PassCompleted {
                frame: FrameId(1),
                failure_occurred: true
            }
        );
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_millis(999)).await;
        analyzer.on_frame(frame(2, &releases));
        assert_eq!(analyzer.stats().throttled, 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        analyzer.on_frame(frame(3, &releases));
        assert_eq!(analyzer.stats().admitted, 2);
        assert_eq!(
            next_event(&mut rx).await,
            AnalyzerEvent::PassCompleted {
                frame: FrameId(3),
                failure_occurred: false
            }
        );
    }

    #[tokio::test]
    async fn engine_setup_failure_is_reported_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let factory = |_: &[BarcodeFormat]| -> Result<Arc<dyn DetectionEngine>, EngineError> {
            Err(EngineError::Unavailable("no context".into()))
        };
        let analyzer = FrameAnalyzer::spawn(
            &factory,
            &[BarcodeFormat::AllFormats],
            &AnalyzerSettings::default(),
            tx,
        );
        let releases = Arc::new(AtomicUsize::new(0));

        analyzer.on_frame(frame(1, &releases));
        analyzer.on_frame(frame(2, &releases));

        match next_event(&mut rx).await {
            AnalyzerEvent::Failed { frame, failure } => {
                assert_eq!(frame, FrameId(1));
                assert_eq!(failure.kind, FailureKind::EngineInitialization);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(releases.load(Ordering::SeqCst), 2);
        assert_eq!(analyzer.stats().admitted, 0);
    }

    #[tokio::test]
    async fn deactivated_analyzer_releases_frames_untouched() {
        let engine = ScriptedEngine::new(Vec::new());
        let (analyzer, mut rx) = analyzer_for(engine);
        let releases = Arc::new(AtomicUsize::new(0));

        analyzer.deactivate();
        analyzer.on_frame(frame(1, &releases));

        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(analyzer.stats().dropped_inactive, 1);
        assert!(rx.try_recv().is_err());
    }
}
