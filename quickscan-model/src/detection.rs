//! Raw detection output and the type-specific payload records that travel
//! with it.
//!
//! Payload records mirror what the detection engine hands out: subtype
//! fields are plain integer indices and text fields default to empty. The
//! typed view lives in [`crate::content`]; turning one into the other is the
//! classifier's job.

use crate::format::{BarcodeFormat, ValueType};

/// Raw bytes and raw text of a detected code. Either side may be absent
/// (binary codes often have no text, some engines drop bytes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RawValue {
    pub bytes: Option<Vec<u8>>,
    pub text: Option<String>,
}

impl RawValue {
    pub fn new(bytes: Option<Vec<u8>>, text: Option<String>) -> Self {
        Self { bytes, text }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            bytes: Some(text.as_bytes().to_vec()),
            text: Some(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_none() && self.text.is_none()
    }

    /// Raw text when present, otherwise the raw bytes decoded as lossy UTF-8.
    pub fn display_text(&self) -> String {
        match (&self.text, &self.bytes) {
            (Some(text), _) => text.clone(),
            (None, Some(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
            (None, None) => String::new(),
        }
    }
}

/// One code found by the detection engine in a single frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectionResult {
    /// Symbology the engine matched, when it reports one.
    pub format: Option<BarcodeFormat>,
    /// Numeric [`ValueType`] code. Kept raw so unknown engine codes survive
    /// the boundary untouched.
    pub value_type: i32,
    pub raw: RawValue,
    pub payload: Option<DetectionPayload>,
}

impl DetectionResult {
    pub fn new(
        value_type: ValueType,
        raw: RawValue,
        payload: Option<DetectionPayload>,
    ) -> Self {
        Self {
            format: None,
            value_type: value_type.code(),
            raw,
            payload,
        }
    }

    /// Plain text detection, the shape a QR code with no structured content
    /// produces.
    pub fn text(format: BarcodeFormat, text: impl Into<String>) -> Self {
        Self {
            format: Some(format),
            value_type: ValueType::Text.code(),
            raw: RawValue::from_text(text),
            payload: None,
        }
    }

    pub fn with_format(mut self, format: BarcodeFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn kind(&self) -> ValueType {
        ValueType::from_code(self.value_type)
    }
}

/// Type-specific structured payload, one case per structured value type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "kind", content = "data", rename_all = "snake_case")
)]
pub enum DetectionPayload {
    ContactInfo(ContactInfoPayload),
    Email(EmailPayload),
    Phone(PhonePayload),
    Sms(SmsPayload),
    Url(UrlBookmarkPayload),
    Wifi(WifiPayload),
    Geo(GeoPointPayload),
    CalendarEvent(CalendarEventPayload),
}

impl DetectionPayload {
    /// The value type this payload is meant to accompany.
    pub fn value_type(&self) -> ValueType {
        match self {
            DetectionPayload::ContactInfo(_) => ValueType::ContactInfo,
            DetectionPayload::Email(_) => ValueType::Email,
            DetectionPayload::Phone(_) => ValueType::Phone,
            DetectionPayload::Sms(_) => ValueType::Sms,
            DetectionPayload::Url(_) => ValueType::Url,
            DetectionPayload::Wifi(_) => ValueType::Wifi,
            DetectionPayload::Geo(_) => ValueType::Geo,
            DetectionPayload::CalendarEvent(_) => ValueType::CalendarEvent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PersonNamePayload {
    pub first: String,
    pub formatted_name: String,
    pub last: String,
    pub middle: String,
    pub prefix: String,
    pub pronunciation: String,
    pub suffix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AddressPayload {
    pub address_lines: Vec<String>,
    pub address_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EmailPayload {
    pub address: String,
    pub body: String,
    pub subject: String,
    pub email_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhonePayload {
    pub number: String,
    pub phone_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SmsPayload {
    pub message: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UrlBookmarkPayload {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WifiPayload {
    pub encryption_type: i32,
    pub password: String,
    pub ssid: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeoPointPayload {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContactInfoPayload {
    pub addresses: Vec<AddressPayload>,
    pub emails: Vec<EmailPayload>,
    pub name: PersonNamePayload,
    pub organization: String,
    pub phones: Vec<PhonePayload>,
    pub title: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalendarDateTimePayload {
    pub day: i32,
    pub hours: i32,
    pub minutes: i32,
    pub month: i32,
    pub seconds: i32,
    pub year: i32,
    pub utc: bool,
    pub raw_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalendarEventPayload {
    pub description: String,
    pub end: CalendarDateTimePayload,
    pub location: String,
    pub organizer: String,
    pub start: CalendarDateTimePayload,
    pub status: String,
    pub summary: String,
}
