//! Core data model definitions shared across quickscan crates.
#![allow(missing_docs)]

pub mod config;
pub mod content;
pub mod detection;
pub mod error;
pub mod format;
pub mod outcome;

pub use config::{ScanConfig, ScanConfigBuilder};
pub use content::{
    Address, AddressType, CalendarDateTime, CalendarEvent, ContactInfo,
    Content, ContentKind, Email, EmailType, GeoPoint, PersonName, Phone,
    PhoneType, PlainText, Sms, UrlBookmark, Wifi, WifiEncryption,
};
pub use detection::{
    AddressPayload, CalendarDateTimePayload, CalendarEventPayload,
    ContactInfoPayload, DetectionPayload, DetectionResult, EmailPayload,
    GeoPointPayload, PersonNamePayload, PhonePayload, RawValue, SmsPayload,
    UrlBookmarkPayload, WifiPayload,
};
pub use error::{ModelError, Result as ModelResult};
pub use format::{BarcodeFormat, ValueType};
pub use outcome::{FailureKind, ScanFailure, ScanOutcome};
