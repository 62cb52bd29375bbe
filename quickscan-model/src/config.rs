use crate::error::{ModelError, Result};
use crate::format::BarcodeFormat;

/// Immutable description of a single scan request.
///
/// Only constructed through [`ScanConfigBuilder`], which validates every
/// field; there is no way to mutate a built config.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    formats: Vec<BarcodeFormat>,
    overlay_text: Option<i32>,
    overlay_icon: Option<i32>,
    haptic_on_success: bool,
    show_torch_toggle: bool,
    show_close_button: bool,
    use_front_camera: bool,
    horizontal_frame_ratio: f32,
    show_text_action: bool,
    action_text: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            formats: vec![BarcodeFormat::AllFormats],
            overlay_text: None,
            overlay_icon: None,
            haptic_on_success: true,
            show_torch_toggle: false,
            show_close_button: false,
            use_front_camera: false,
            horizontal_frame_ratio: ScanConfigBuilder::DEFAULT_FRAME_RATIO,
            show_text_action: false,
            action_text: String::new(),
        }
    }
}

impl ScanConfig {
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Config used when a caller asks for a scan without describing one:
    /// QR codes only, everything else at builder defaults.
    pub fn qr_only() -> Self {
        Self {
            formats: vec![BarcodeFormat::QrCode],
            ..Self::default()
        }
    }

    /// Ordered, duplicate-free, never empty.
    pub fn formats(&self) -> &[BarcodeFormat] {
        &self.formats
    }

    pub fn scans_all_formats(&self) -> bool {
        self.formats.contains(&BarcodeFormat::AllFormats)
    }

    pub fn overlay_text(&self) -> Option<i32> {
        self.overlay_text
    }

    pub fn overlay_icon(&self) -> Option<i32> {
        self.overlay_icon
    }

    pub fn haptic_on_success(&self) -> bool {
        self.haptic_on_success
    }

    pub fn show_torch_toggle(&self) -> bool {
        self.show_torch_toggle
    }

    pub fn show_close_button(&self) -> bool {
        self.show_close_button
    }

    pub fn use_front_camera(&self) -> bool {
        self.use_front_camera
    }

    pub fn horizontal_frame_ratio(&self) -> f32 {
        self.horizontal_frame_ratio
    }

    pub fn show_text_action(&self) -> bool {
        self.show_text_action
    }

    pub fn action_text(&self) -> &str {
        &self.action_text
    }

    /// The configured alternate action label, only when the action is
    /// enabled.
    pub fn text_action(&self) -> Option<&str> {
        self.show_text_action.then_some(self.action_text.as_str())
    }

    /// Builder pre-filled with this config's values.
    pub fn to_builder(&self) -> ScanConfigBuilder {
        ScanConfigBuilder {
            formats: self.formats.clone(),
            overlay_text: self.overlay_text,
            overlay_icon: self.overlay_icon,
            haptic_on_success: self.haptic_on_success,
            show_torch_toggle: self.show_torch_toggle,
            show_close_button: self.show_close_button,
            use_front_camera: self.use_front_camera,
            horizontal_frame_ratio: self.horizontal_frame_ratio,
            show_text_action: self.show_text_action,
            action_text: self.action_text.clone(),
        }
    }
}

/// Validating builder for [`ScanConfig`].
#[derive(Debug, Clone)]
pub struct ScanConfigBuilder {
    formats: Vec<BarcodeFormat>,
    overlay_text: Option<i32>,
    overlay_icon: Option<i32>,
    haptic_on_success: bool,
    show_torch_toggle: bool,
    show_close_button: bool,
    use_front_camera: bool,
    horizontal_frame_ratio: f32,
    show_text_action: bool,
    action_text: String,
}

impl Default for ScanConfigBuilder {
    fn default() -> Self {
        ScanConfig::default().to_builder()
    }
}

impl ScanConfigBuilder {
    pub const DEFAULT_FRAME_RATIO: f32 = 1.0;

    /// Interested formats. Must not be empty; fewer formats make detection
    /// cheaper.
    pub fn formats(
        mut self,
        formats: impl IntoIterator<Item = BarcodeFormat>,
    ) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    pub fn overlay_text(mut self, resource: Option<i32>) -> Self {
        self.overlay_text = resource;
        self
    }

    pub fn overlay_icon(mut self, resource: Option<i32>) -> Self {
        self.overlay_icon = resource;
        self
    }

    pub fn haptic_on_success(mut self, enable: bool) -> Self {
        self.haptic_on_success = enable;
        self
    }

    pub fn show_torch_toggle(mut self, enable: bool) -> Self {
        self.show_torch_toggle = enable;
        self
    }

    pub fn show_close_button(mut self, enable: bool) -> Self {
        self.show_close_button = enable;
        self
    }

    pub fn use_front_camera(mut self, enable: bool) -> Self {
        self.use_front_camera = enable;
        self
    }

    /// Width to height ratio of the scan frame; 1.0 is a square.
    pub fn horizontal_frame_ratio(mut self, ratio: f32) -> Self {
        self.horizontal_frame_ratio = ratio;
        self
    }

    pub fn text_action(
        mut self,
        enable: bool,
        text: impl Into<String>,
    ) -> Self {
        self.show_text_action = enable;
        self.action_text = text.into();
        self
    }

    pub fn build(self) -> Result<ScanConfig> {
        let mut formats = Vec::with_capacity(self.formats.len());
        for format in self.formats {
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        if formats.is_empty() {
            return Err(ModelError::EmptyFormats);
        }

        let ratio = self.horizontal_frame_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ModelError::InvalidFrameRatio(ratio));
        }

        if self.show_text_action && self.action_text.trim().is_empty() {
            return Err(ModelError::MissingActionText);
        }

        Ok(ScanConfig {
            formats,
            overlay_text: self.overlay_text,
            overlay_icon: self.overlay_icon,
            haptic_on_success: self.haptic_on_success,
            show_torch_toggle: self.show_torch_toggle,
            show_close_button: self.show_close_button,
            use_front_camera: self.use_front_camera,
            horizontal_frame_ratio: ratio,
            show_text_action: self.show_text_action,
            action_text: self.action_text,
        })
    }
}
