use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Cool-down after a hard detection failure, in milliseconds.
pub const DEFAULT_FAILURE_COOLDOWN_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Resolution = Resolution {
        width: 1280,
        height: 720,
    };

    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD
    }
}

/// Host-side tuning for the frame analyzer and capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    pub failure_cooldown_ms: u64,
    pub target_resolution: Resolution,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            failure_cooldown_ms: DEFAULT_FAILURE_COOLDOWN_MS,
            target_resolution: Resolution::default(),
        }
    }
}

impl AnalyzerSettings {
    pub fn failure_cooldown(&self) -> Duration {
        Duration::from_millis(self.failure_cooldown_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.failure_cooldown_ms == 0 {
            return Err(ScanError::InvalidSettings(
                "failure_cooldown_ms must be greater than zero".into(),
            ));
        }
        if self.target_resolution.area() == 0 {
            return Err(ScanError::InvalidSettings(format!(
                "target_resolution {}x{} has no area",
                self.target_resolution.width, self.target_resolution.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_one_second_and_hd() {
        let settings = AnalyzerSettings::default();
        assert_eq!(settings.failure_cooldown(), Duration::from_secs(1));
        assert_eq!(settings.target_resolution, Resolution::HD);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let settings: AnalyzerSettings =
            serde_json::from_str(r#"{ "failure_cooldown_ms": 250 }"#)
                .expect("parse settings");
        assert_eq!(settings.failure_cooldown_ms, 250);
        assert_eq!(settings.target_resolution, Resolution::HD);
    }

    #[test]
    fn validation_rejects_degenerate_values() {
        let zero_cooldown = AnalyzerSettings {
            failure_cooldown_ms: 0,
            ..AnalyzerSettings::default()
        };
        assert!(matches!(
            zero_cooldown.validate(),
            Err(ScanError::InvalidSettings(_))
        ));

        let flat = AnalyzerSettings {
            target_resolution: Resolution {
                width: 1280,
                height: 0,
            },
            ..AnalyzerSettings::default()
        };
        assert!(flat.validate().is_err());
    }
}
