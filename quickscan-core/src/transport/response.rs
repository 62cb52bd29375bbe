use quickscan_model::{
    Content, DetectionPayload, DetectionResult, RawValue, ScanFailure,
    ScanOutcome,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::classify::{classify, describe};
use crate::error::Result;

/// Platform result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Ok,
    Canceled,
    MissingPermission,
    Error,
}

impl ResultCode {
    pub const fn code(self) -> i32 {
        match self {
            ResultCode::Ok => -1,
            ResultCode::Canceled => 0,
            ResultCode::MissingPermission => 2,
            ResultCode::Error => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(ResultCode::Ok),
            0 => Some(ResultCode::Canceled),
            2 => Some(ResultCode::MissingPermission),
            3 => Some(ResultCode::Error),
            _ => None,
        }
    }
}

/// Keyed extras that travel with a result code. Every field decodes
/// leniently: a value of the wrong shape reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseExtras {
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes"
    )]
    pub raw_bytes: Option<Vec<u8>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub raw_text: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub value_type: Option<i32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub payload: Option<DetectionPayload>,
    /// Set on an Ok response when the user took the alternate text action.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub alternate_action: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub cause: Option<ScanFailure>,
}

/// Result code plus extras, the shape an outcome crosses the boundary in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub code: i32,
    #[serde(default)]
    pub extras: ResponseExtras,
}

impl ResponsePayload {
    pub fn new(code: ResultCode) -> Self {
        Self {
            code: code.code(),
            extras: ResponseExtras::default(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub fn encode_response(outcome: &ScanOutcome) -> ResponsePayload {
    match outcome {
        ScanOutcome::Success(content) => encode_content(content),
        ScanOutcome::AlternateAction { text } => {
            let mut response = ResponsePayload::new(ResultCode::Ok);
            response.extras.alternate_action = Some(text.clone());
            response
        }
        ScanOutcome::UserCanceled => ResponsePayload::new(ResultCode::Canceled),
        ScanOutcome::MissingPermission => {
            ResponsePayload::new(ResultCode::MissingPermission)
        }
        ScanOutcome::Error(failure) => {
            let mut response = ResponsePayload::new(ResultCode::Error);
            response.extras.cause = Some(failure.clone());
            response
        }
    }
}

/// Ok response for a raw detection, keeping the engine's own discriminator.
pub fn encode_detection(result: &DetectionResult) -> ResponsePayload {
    let mut response = ResponsePayload::new(ResultCode::Ok);
    response.extras.raw_bytes = result.raw.bytes.clone();
    response.extras.raw_text = result.raw.text.clone();
    response.extras.value_type = Some(result.value_type);
    response.extras.payload = result.payload.clone();
    response
}

fn encode_content(content: &Content) -> ResponsePayload {
    let (value_type, payload) = describe(content);
    let mut response = ResponsePayload::new(ResultCode::Ok);
    response.extras.raw_bytes = content.raw_bytes().map(<[u8]>::to_vec);
    response.extras.raw_text = content.raw_text().map(str::to_owned);
    response.extras.value_type = Some(value_type.code());
    response.extras.payload = payload;
    response
}

/// Interprets a response. Total: every input maps to some outcome.
pub fn decode_response(response: ResponsePayload) -> ScanOutcome {
    let ResponsePayload { code, extras } = response;
    match ResultCode::from_code(code) {
        Some(ResultCode::Ok) => match extras.alternate_action {
            Some(text) => ScanOutcome::AlternateAction { text },
            None => {
                let raw = RawValue::new(extras.raw_bytes, extras.raw_text);
                ScanOutcome::Success(classify(
                    extras.value_type.unwrap_or_default(),
                    raw,
                    extras.payload.as_ref(),
                ))
            }
        },
        Some(ResultCode::Canceled) => ScanOutcome::UserCanceled,
        Some(ResultCode::MissingPermission) => ScanOutcome::MissingPermission,
        Some(ResultCode::Error) => ScanOutcome::Error(
            extras.cause.unwrap_or_else(ScanFailure::missing_cause),
        ),
        None => {
            tracing::warn!(
                target: "scan::transport",
                code,
                "unknown result code"
            );
            ScanOutcome::Error(ScanFailure::unknown_result_code(code))
        }
    }
}

/// Decodes a serialized response document. A document that is not JSON or
/// lacks an integer `code` yields an error outcome.
pub fn decode_response_json(json: &str) -> ScanOutcome {
    let document: Value = match serde_json::from_str(json) {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(
                target: "scan::transport",
                error = %err,
                "response is not valid JSON"
            );
            return ScanOutcome::Error(ScanFailure::malformed_response(err));
        }
    };

    let Some(code) = document
        .get("code")
        .and_then(Value::as_i64)
        .and_then(|code| i32::try_from(code).ok())
    else {
        return ScanOutcome::Error(ScanFailure::malformed_response(
            "missing integer result code",
        ));
    };

    let extras = document
        .get("extras")
        .cloned()
        .and_then(|extras| serde_json::from_value(extras).ok())
        .unwrap_or_default();

    decode_response(ResponsePayload { code, extras })
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|encoded| STANDARD.decode(encoded).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickscan_model::{
        BarcodeFormat, ContentKind, FailureKind, ValueType, WifiPayload,
    };

    #[test]
    fn result_codes_match_platform_values() {
        for code in [
            ResultCode::Ok,
            ResultCode::Canceled,
            ResultCode::MissingPermission,
            ResultCode::Error,
        ] {
            assert_eq!(ResultCode::from_code(code.code()), Some(code));
        }
        assert_eq!(ResultCode::Ok.code(), -1);
        assert_eq!(ResultCode::from_code(1), None);
    }

    #[test]
    fn unknown_code_becomes_error_outcome() {
        let outcome = decode_response(ResponsePayload {
            code: 42,
            extras: ResponseExtras::default(),
        });
        assert_eq!(
            outcome,
            ScanOutcome::Error(ScanFailure::unknown_result_code(42))
        );
    }

    #[test]
    fn error_without_cause_is_missing_cause() {
        let outcome = decode_response(ResponsePayload::new(ResultCode::Error));
        assert_eq!(
            outcome.failure().map(|failure| failure.kind),
            Some(FailureKind::MissingCause)
        );
    }

    #[test]
    fn detection_keeps_engine_discriminator() {
        let result = DetectionResult::text(BarcodeFormat::Ean13, "9780306406157");
        let mut result = result;
        result.value_type = ValueType::Isbn.code();

        let response = encode_detection(&result);
        assert_eq!(response.extras.value_type, Some(3));
        let outcome = decode_response(response);
        assert_eq!(
            outcome.content().map(Content::kind),
            Some(ContentKind::Plain)
        );
    }

    #[test]
    fn raw_bytes_travel_as_base64() {
        let mut response = ResponsePayload::new(ResultCode::Ok);
        response.extras.raw_bytes = Some(vec![0, 159, 146, 150]);
        let json = response.to_json().expect("encode");
        assert!(json.contains("\"raw_bytes\":\"AJ+Slg==\""));
        assert_eq!(ResponsePayload::from_json(&json).expect("decode"), response);
    }

    #[test]
    fn wrongly_shaped_extras_read_as_absent() {
        let outcome = decode_response_json(
            r#"{"code":-1,"extras":{"raw_text":5,"raw_bytes":"%%%","value_type":"wifi","payload":{"kind":"wifi","data":{"ssid":"net"}}}}"#,
        );
        let Some(content) = outcome.content() else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(content.kind(), ContentKind::Plain);
        assert!(content.raw().is_empty());
    }

    #[test]
    fn partial_wifi_payload_decodes_with_defaults() {
        let outcome = decode_response_json(
            r#"{"code":-1,"extras":{"raw_text":"WIFI:S:net;;","value_type":9,"payload":{"kind":"wifi","data":{"ssid":"net"}}}}"#,
        );
        let Some(Content::Wifi(wifi)) = outcome.content() else {
            panic!("expected wifi, got {outcome:?}");
        };
        assert_eq!(
            (wifi.ssid.as_str(), wifi.password.as_str(), wifi.encryption_type),
            ("net", "", WifiPayload::default().encryption_type)
        );
    }

    #[test]
    fn malformed_documents_never_fail() {
        for document in ["", "not json", "[]", r#"{"code":"ok"}"#, r#"{"code":1e40}"#] {
            let outcome = decode_response_json(document);
            assert_eq!(
                outcome.failure().map(|failure| failure.kind),
                Some(FailureKind::MalformedResponse),
                "document {document:?}"
            );
        }
    }
}
