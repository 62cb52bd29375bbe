//! Request/response framing across the process boundary.
//!
//! A caller sends a [`RequestPayload`] describing the scan and receives a
//! [`ResponsePayload`]: a platform result code with keyed extras. Both sides
//! serialize to JSON.

mod request;
mod response;

pub use request::{RequestPayload, decode_request, encode_request};
pub use response::{
    ResponseExtras, ResponsePayload, ResultCode, decode_response,
    decode_response_json, encode_detection, encode_response,
};
