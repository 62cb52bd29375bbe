use quickscan_model::{BarcodeFormat, ScanConfig};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Wire form of a [`ScanConfig`]. Every field is optional; absent fields
/// take builder defaults on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_text: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_icon: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haptic_on_success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_torch_toggle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_close_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_front_camera: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_frame_ratio: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_text_action: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_text: Option<String>,
}

impl RequestPayload {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub fn encode_request(config: &ScanConfig) -> RequestPayload {
    RequestPayload {
        formats: Some(
            config.formats().iter().map(|format| format.id()).collect(),
        ),
        overlay_text: config.overlay_text(),
        overlay_icon: config.overlay_icon(),
        haptic_on_success: Some(config.haptic_on_success()),
        show_torch_toggle: Some(config.show_torch_toggle()),
        show_close_button: Some(config.show_close_button()),
        use_front_camera: Some(config.use_front_camera()),
        horizontal_frame_ratio: Some(config.horizontal_frame_ratio()),
        show_text_action: Some(config.show_text_action()),
        action_text: Some(config.action_text().to_owned()),
    }
}

/// Rebuilds the config on the receiving side. Never fails: no payload at
/// all means a QR-only scan, and unusable fields fall back to defaults.
pub fn decode_request(payload: Option<&RequestPayload>) -> ScanConfig {
    let Some(payload) = payload else {
        tracing::debug!(target: "scan::transport", "no request payload; scanning QR codes only");
        return ScanConfig::qr_only();
    };

    let mut builder = ScanConfig::builder()
        .overlay_text(payload.overlay_text)
        .overlay_icon(payload.overlay_icon);

    if let Some(ids) = &payload.formats {
        let mut formats = Vec::with_capacity(ids.len());
        for id in ids {
            match BarcodeFormat::from_id(*id) {
                Some(format) => formats.push(format),
                None => tracing::warn!(
                    target: "scan::transport",
                    format_id = id,
                    "dropping unknown barcode format"
                ),
            }
        }
        if formats.is_empty() {
            formats.push(BarcodeFormat::AllFormats);
        }
        builder = builder.formats(formats);
    }
    if let Some(enable) = payload.haptic_on_success {
        builder = builder.haptic_on_success(enable);
    }
    if let Some(enable) = payload.show_torch_toggle {
        builder = builder.show_torch_toggle(enable);
    }
    if let Some(enable) = payload.show_close_button {
        builder = builder.show_close_button(enable);
    }
    if let Some(enable) = payload.use_front_camera {
        builder = builder.use_front_camera(enable);
    }
    if let Some(ratio) = payload.horizontal_frame_ratio {
        if ratio.is_finite() && ratio > 0.0 {
            builder = builder.horizontal_frame_ratio(ratio);
        } else {
            tracing::warn!(
                target: "scan::transport",
                ratio,
                "ignoring invalid frame ratio"
            );
        }
    }

    let text = payload.action_text.clone().unwrap_or_default();
    let mut show_text_action = payload.show_text_action.unwrap_or(false);
    if show_text_action && text.trim().is_empty() {
        tracing::warn!(
            target: "scan::transport",
            "text action enabled without a label; disabling it"
        );
        show_text_action = false;
    }
    builder = builder.text_action(show_text_action, text);

    builder.build().unwrap_or_else(|err| {
        tracing::warn!(
            target: "scan::transport",
            error = %err,
            "request payload rejected; using defaults"
        );
        ScanConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_payload_means_qr_only() {
        let config = decode_request(None);
        assert_eq!(config.formats(), &[BarcodeFormat::QrCode]);
        assert!(config.haptic_on_success());
    }

    #[test]
    fn missing_formats_field_means_all_formats() {
        let payload = RequestPayload {
            show_torch_toggle: Some(true),
            ..RequestPayload::default()
        };
        let config = decode_request(Some(&payload));
        assert!(config.scans_all_formats());
        assert!(config.show_torch_toggle());
    }

    #[test]
    fn encoded_config_decodes_to_itself() {
        let config = ScanConfig::builder()
            .formats([BarcodeFormat::QrCode, BarcodeFormat::Ean13])
            .overlay_text(Some(7))
            .haptic_on_success(false)
            .show_close_button(true)
            .horizontal_frame_ratio(0.6)
            .text_action(true, "Enter Code")
            .build()
            .expect("valid config");

        let json = encode_request(&config).to_json().expect("encode");
        let payload = RequestPayload::from_json(&json).expect("decode");
        assert_eq!(decode_request(Some(&payload)), config);
    }

    #[test]
    fn unknown_format_ids_are_dropped() {
        let payload = RequestPayload {
            formats: Some(vec![3, 256, 99]),
            ..RequestPayload::default()
        };
        assert_eq!(
            decode_request(Some(&payload)).formats(),
            &[BarcodeFormat::QrCode]
        );

        let payload = RequestPayload {
            formats: Some(vec![3]),
            ..RequestPayload::default()
        };
        assert!(decode_request(Some(&payload)).scans_all_formats());
    }

    #[test]
    fn unusable_fields_fall_back() {
        let payload = RequestPayload {
            horizontal_frame_ratio: Some(-1.0),
            show_text_action: Some(true),
            action_text: Some("  ".into()),
            ..RequestPayload::default()
        };
        let config = decode_request(Some(&payload));
        assert_eq!(config.horizontal_frame_ratio(), 1.0);
        assert_eq!(config.text_action(), None);
    }
}
