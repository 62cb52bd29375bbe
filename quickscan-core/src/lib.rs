//! # Quickscan Core
//!
//! The scanning pipeline behind a single "scan a code and return what it
//! says" request.
//!
//! ## Overview
//!
//! - **Classification** ([`classify`]): maps a raw detection onto a typed
//!   [`model::Content`] case, falling back to plain text.
//! - **Frame analysis** ([`analyzer`]): admits one frame at a time to the
//!   detection engine and backs off for a cool-down window after a hard
//!   failure.
//! - **Sessions** ([`session`]): a state machine from permission prompt to a
//!   single terminal [`model::ScanOutcome`], plus the async driver that
//!   wires capture, analysis and user input together.
//! - **Transport** ([`transport`]): request and response payloads with JSON
//!   framing.
//!
//! ## Example
//!
//! ```
//! use quickscan_core::{decode_request, encode_request};
//! use quickscan_core::model::{BarcodeFormat, ScanConfig};
//!
//! let config = ScanConfig::builder()
//!     .formats([BarcodeFormat::QrCode])
//!     .show_close_button(true)
//!     .build()
//!     .unwrap();
//! let payload = encode_request(&config);
//! assert_eq!(decode_request(Some(&payload)), config);
//! ```
#![allow(missing_docs)]

pub mod analyzer;
pub mod classify;
pub mod error;
pub mod session;
pub mod settings;
pub mod transport;

pub use analyzer::{AnalyzerEvent, AnalyzerStats, FrameAnalyzer};
pub use classify::{classify, classify_detection, describe};
pub use error::{Result, ScanError};
pub use session::{
    ScanSession, SessionEvent, SessionHandle, SessionRunner, SessionServices,
    SessionState, TransitionResult, UserAction, run_session,
};
pub use settings::{AnalyzerSettings, Resolution};
pub use transport::{
    RequestPayload, ResponsePayload, ResultCode, decode_request,
    decode_response, decode_response_json, encode_request, encode_response,
};

pub use quickscan_contracts as contracts;
pub use quickscan_model as model;
