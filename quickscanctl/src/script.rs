//! Scan scripts: a JSON description of what the simulated camera, engine and
//! user do during one session.

use std::{fs, path::Path};

use anyhow::{Context, anyhow};
use quickscan_contracts::PermissionStatus;
use quickscan_core::RequestPayload;
use quickscan_model::{
    BarcodeFormat, DetectionPayload, DetectionResult, RawValue, ValueType,
};
use serde::{Deserialize, Serialize};

const DEFAULT_FRAME_INTERVAL_MS: u64 = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPermission {
    #[default]
    Granted,
    Denied,
}

impl From<ScriptPermission> for PermissionStatus {
    fn from(value: ScriptPermission) -> Self {
        match value {
            ScriptPermission::Granted => PermissionStatus::Granted,
            ScriptPermission::Denied => PermissionStatus::Denied,
        }
    }
}

/// What the engine reports for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptDetection {
    /// Format id; absent when the engine does not report one.
    pub format: Option<i32>,
    pub value_type: i32,
    pub raw_text: Option<String>,
    pub raw_bytes: Option<Vec<u8>>,
    pub payload: Option<DetectionPayload>,
}

impl Default for ScriptDetection {
    fn default() -> Self {
        Self {
            format: Some(BarcodeFormat::QrCode.id()),
            value_type: ValueType::Text.code(),
            raw_text: None,
            raw_bytes: None,
            payload: None,
        }
    }
}

impl ScriptDetection {
    pub fn to_result(&self) -> DetectionResult {
        DetectionResult {
            format: self.format.and_then(BarcodeFormat::from_id),
            value_type: self.value_type,
            raw: RawValue::new(self.raw_bytes.clone(), self.raw_text.clone()),
            payload: self.payload.clone(),
        }
    }
}

/// One scripted step. Frame steps (`detect`, `fail`, `empty`) deliver a
/// frame and wait until the session hands it back; frames arriving inside a
/// failure cool-down are skipped and their step is consumed unused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Detect(ScriptDetection),
    Fail(String),
    Empty,
    WaitMs(u64),
    Close,
    AlternateAction,
    Torch(bool),
}

impl ScriptStep {
    pub fn is_frame(&self) -> bool {
        matches!(
            self,
            ScriptStep::Detect(_) | ScriptStep::Fail(_) | ScriptStep::Empty
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub permission: ScriptPermission,
    /// When false the engine factory refuses to build an engine.
    pub engine_available: bool,
    /// Treat detection failures as resolvable instead of fatal.
    pub resolvable_errors: bool,
    /// Request payload as a caller would send it; absent means QR only.
    pub config: Option<RequestPayload>,
    /// Pause between frames.
    pub frame_interval_ms: u64,
    pub steps: Vec<ScriptStep>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            permission: ScriptPermission::default(),
            engine_available: true,
            resolvable_errors: false,
            config: None,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            steps: Vec::new(),
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read scan script {}", path.display())
        })?;
        Self::from_json(&contents)
            .with_context(|| format!("invalid scan script {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| anyhow!("failed to parse scan script: {err}"))
    }

    pub fn frame_count(&self) -> usize {
        self.steps.iter().filter(|step| step.is_frame()).count()
    }
}
