//! Stub collaborators shared by the integration tests.

// Not every test binary uses every helper
#![allow(unused)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quickscan_contracts::{
    CaptureError, CaptureRequest, CaptureSource, CapturedFrame,
    DetectionEngine, EngineError, EngineFactory, FrameId, FrameImage,
    FrameSink, PermissionGate, PermissionStatus, ScanSurface,
};
use quickscan_model::{BarcodeFormat, DetectionResult};
use tokio::sync::{oneshot, watch};

/// One scripted engine response.
#[derive(Debug, Clone)]
pub enum Step {
    Detect(DetectionResult),
    Fail(String),
    Empty,
}

/// What happened to a frame, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Processed(FrameId),
    Released(FrameId),
}

/// Shared record of engine calls and frame releases.
#[derive(Debug, Default)]
pub struct Timeline {
    marks: Mutex<Vec<Mark>>,
}

impl Timeline {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, mark: Mark) {
        self.marks.lock().expect("timeline").push(mark);
    }

    pub fn marks(&self) -> Vec<Mark> {
        self.marks.lock().expect("timeline").clone()
    }

    /// Panics if the engine saw a frame while an earlier one was on loan.
    pub fn assert_released_before_next_admission(&self) {
        let mut on_loan: Option<FrameId> = None;
        for mark in self.marks() {
            match mark {
                Mark::Processed(id) => {
                    assert_eq!(
                        on_loan, None,
                        "frame {id} processed while an earlier frame was on loan"
                    );
                    on_loan = Some(id);
                }
                Mark::Released(id) if on_loan == Some(id) => on_loan = None,
                Mark::Released(_) => {}
            }
        }
    }
}

/// Detection engine that replays a script and records re-entrancy.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    steps: Mutex<VecDeque<Step>>,
    delay: Option<Duration>,
    timeline: Option<Arc<Timeline>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn slow(
        steps: impl IntoIterator<Item = Step>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn traced(
        steps: impl IntoIterator<Item = Step>,
        timeline: &Arc<Timeline>,
    ) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            timeline: Some(Arc::clone(timeline)),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn factory(self: &Arc<Self>) -> Arc<dyn EngineFactory> {
        let engine = Arc::clone(self);
        Arc::new(
            move |_: &[BarcodeFormat]| -> Result<Arc<dyn DetectionEngine>, EngineError> {
                Ok(Arc::clone(&engine) as Arc<dyn DetectionEngine>)
            },
        )
    }
}

#[async_trait]
impl DetectionEngine for ScriptedEngine {
    async fn process(
        &self,
        image: &FrameImage,
    ) -> Result<Vec<DetectionResult>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(timeline) = &self.timeline {
            timeline.record(Mark::Processed(image.id));
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let step = self
            .steps
            .lock()
            .expect("engine script")
            .pop_front()
            .unwrap_or(Step::Empty);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match step {
            Step::Detect(result) => Ok(vec![result]),
            Step::Fail(reason) => Err(EngineError::Detection(reason)),
            Step::Empty => Ok(Vec::new()),
        }
    }
}

/// Factory whose engine can never be built.
pub fn broken_factory() -> Arc<dyn EngineFactory> {
    Arc::new(
        |_: &[BarcodeFormat]| -> Result<Arc<dyn DetectionEngine>, EngineError> {
            Err(EngineError::Unavailable("ml context missing".into()))
        },
    )
}

#[derive(Debug)]
pub struct FixedPermission(pub PermissionStatus);

#[async_trait]
impl PermissionGate for FixedPermission {
    async fn request_camera(&self) -> PermissionStatus {
        self.0
    }
}

/// Counts releases per frame id.
#[derive(Debug, Default)]
pub struct ReleaseLedger {
    releases: Mutex<HashMap<FrameId, usize>>,
    timeline: Option<Arc<Timeline>>,
}

impl ReleaseLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn traced(timeline: &Arc<Timeline>) -> Arc<Self> {
        Arc::new(Self {
            timeline: Some(Arc::clone(timeline)),
            ..Self::default()
        })
    }

    pub fn frame(self: &Arc<Self>, id: u64) -> CapturedFrame {
        let ledger = Arc::clone(self);
        CapturedFrame::new(FrameImage::empty(FrameId(id)), move |id| {
            if let Some(timeline) = &ledger.timeline {
                timeline.record(Mark::Released(id));
            }
            *ledger
                .releases
                .lock()
                .expect("release ledger")
                .entry(id)
                .or_default() += 1;
        })
    }

    pub fn count(&self, id: u64) -> usize {
        self.releases
            .lock()
            .expect("release ledger")
            .get(&FrameId(id))
            .copied()
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.releases.lock().expect("release ledger").values().sum()
    }
}

/// Capture source driven by the test: frames are pushed by hand once the
/// session has started it.
pub struct ManualCapture {
    sink: Mutex<Option<Arc<dyn FrameSink>>>,
    request: Mutex<Option<CaptureRequest>>,
    start_error: Option<CaptureError>,
    started: watch::Sender<bool>,
    stops: AtomicUsize,
    torch: Mutex<Vec<bool>>,
    pub ledger: Arc<ReleaseLedger>,
}

impl ManualCapture {
    pub fn new() -> Arc<Self> {
        Self::build(None)
    }

    pub fn failing(error: CaptureError) -> Arc<Self> {
        Self::build(Some(error))
    }

    fn build(start_error: Option<CaptureError>) -> Arc<Self> {
        let (started, _) = watch::channel(false);
        Arc::new(Self {
            sink: Mutex::new(None),
            request: Mutex::new(None),
            start_error,
            started,
            stops: AtomicUsize::new(0),
            torch: Mutex::new(Vec::new()),
            ledger: ReleaseLedger::new(),
        })
    }

    pub async fn wait_started(&self) {
        let mut started = self.started.subscribe();
        started
            .wait_for(|started| *started)
            .await
            .expect("capture source alive");
    }

    /// Delivers a frame; returns false when no sink is attached.
    pub fn push_frame(&self, id: u64) -> bool {
        let sink = self.sink.lock().expect("capture sink").clone();
        match sink {
            Some(sink) => {
                sink.on_frame(self.ledger.frame(id));
                true
            }
            None => false,
        }
    }

    pub fn request(&self) -> Option<CaptureRequest> {
        self.request.lock().expect("capture request").clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn torch_log(&self) -> Vec<bool> {
        self.torch.lock().expect("torch log").clone()
    }
}

#[async_trait]
impl CaptureSource for ManualCapture {
    async fn start(
        &self,
        request: CaptureRequest,
        sink: Arc<dyn FrameSink>,
    ) -> Result<(), CaptureError> {
        *self.request.lock().expect("capture request") = Some(request);
        if let Some(error) = &self.start_error {
            return Err(error.clone());
        }
        *self.sink.lock().expect("capture sink") = Some(sink);
        self.started.send_replace(true);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.sink.lock().expect("capture sink").take();
    }

    fn set_torch(&self, enabled: bool) {
        self.torch.lock().expect("torch log").push(enabled);
    }
}

/// Capture source that behaves like a live camera: as soon as a frame is
/// released the next one is delivered, until the session stops it.
#[derive(Debug, Default)]
pub struct StreamingCapture {
    stopped: Arc<AtomicBool>,
    delivered: Arc<AtomicUsize>,
}

impl StreamingCapture {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureSource for StreamingCapture {
    async fn start(
        &self,
        _request: CaptureRequest,
        sink: Arc<dyn FrameSink>,
    ) -> Result<(), CaptureError> {
        let stopped = Arc::clone(&self.stopped);
        let delivered = Arc::clone(&self.delivered);
        tokio::spawn(async move {
            let mut next = 0;
            while !stopped.load(Ordering::SeqCst) {
                let (released_tx, released_rx) = oneshot::channel();
                let frame =
                    CapturedFrame::new(FrameImage::empty(FrameId(next)), move |_| {
                        let _ = released_tx.send(());
                    });
                next += 1;
                delivered.fetch_add(1, Ordering::SeqCst);
                sink.on_frame(frame);
                if released_rx.await.is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn set_torch(&self, _enabled: bool) {}
}

/// Records presentation calls.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub busy: Mutex<Vec<bool>>,
    pub confirmations: Mutex<Vec<bool>>,
    pub confirmed: AtomicBool,
}

impl ScanSurface for RecordingSurface {
    fn set_busy(&self, busy: bool) {
        self.busy.lock().expect("busy log").push(busy);
    }

    fn confirm_detection(&self, haptic: bool) {
        self.confirmed.store(true, Ordering::SeqCst);
        self.confirmations.lock().expect("confirmations").push(haptic);
    }
}
