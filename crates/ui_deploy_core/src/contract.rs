use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const SQS_EVENT_SOURCE: &str = "aws:sqs";

/// Payload carried on the request channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployRequest {
    pub revision: String,
}

/// Payload carried on the result channel, correlated to a request by
/// `revision`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployResult {
    pub revision: String,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

impl DeployRequest {
    pub fn new(revision: impl Into<String>) -> Result<Self, ValidationError> {
        let request = Self {
            revision: revision.into(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn to_json(&self) -> String {
        json!({ "revision": self.revision }).to_string()
    }

    /// Wraps the JSON payload the way push-style transports deliver it:
    /// `{"data": "<base64 JSON>"}`.
    pub fn to_event(&self) -> Value {
        json!({ "data": BASE64.encode(self.to_json()) })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.revision.trim().is_empty() {
            return Err(ValidationError::new("revision cannot be empty"));
        }
        Ok(())
    }
}

impl DeployResult {
    pub fn succeeded(revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            ok: true,
        }
    }

    pub fn failed(revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            ok: false,
        }
    }

    pub fn to_json(&self) -> String {
        json!({ "revision": self.revision, "ok": self.ok }).to_string()
    }

    pub fn from_json(body: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(body)
            .map_err(|error| ValidationError::new(format!("Malformed deploy result: {error}")))
    }
}

pub fn parse_request_json(bytes: &[u8]) -> Result<DeployRequest, ValidationError> {
    let request: DeployRequest = serde_json::from_slice(bytes)
        .map_err(|error| ValidationError::new(format!("Malformed deploy request: {error}")))?;
    request.validate()?;
    Ok(request)
}

pub fn decode_request_data(data: &str) -> Result<DeployRequest, ValidationError> {
    let bytes = BASE64
        .decode(data.trim())
        .map_err(|error| ValidationError::new(format!("Malformed base64 data: {error}")))?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|error| ValidationError::new(format!("Request data is not UTF-8: {error}")))?;
    parse_request_json(text.as_bytes())
}

/// Extracts every deploy request from an inbound invocation event.
///
/// Accepts an SQS batch (`Records`), a base64 `data` envelope, or a bare
/// `{"revision": ...}` object.
pub fn decode_request_event(event: &Value) -> Result<Vec<DeployRequest>, ValidationError> {
    let Some(object) = event.as_object() else {
        return Err(ValidationError::new("Deploy event must be a JSON object"));
    };

    if let Some(records) = object.get("Records") {
        let records = records
            .as_array()
            .ok_or_else(|| ValidationError::new("Records must be an array"))?;
        if records.is_empty() {
            return Err(ValidationError::new("Records cannot be empty"));
        }
        return records.iter().map(decode_sqs_record).collect();
    }

    if let Some(data) = object.get("data") {
        let data = data
            .as_str()
            .ok_or_else(|| ValidationError::new("data must be a base64 string"))?;
        return decode_request_data(data).map(|request| vec![request]);
    }

    if object.contains_key("revision") {
        let request: DeployRequest = serde_json::from_value(event.clone())
            .map_err(|error| ValidationError::new(format!("Malformed deploy request: {error}")))?;
        request.validate()?;
        return Ok(vec![request]);
    }

    Err(ValidationError::new(
        "Deploy event must carry Records, data, or revision",
    ))
}

fn decode_sqs_record(record: &Value) -> Result<DeployRequest, ValidationError> {
    let source = record
        .get("eventSource")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if source != SQS_EVENT_SOURCE {
        return Err(ValidationError::new(format!(
            "Unsupported record source '{source}'"
        )));
    }

    let body = record
        .get("body")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::new("SQS record body must be a string"))?;

    if body.trim_start().starts_with('{') {
        parse_request_json(body.as_bytes())
    } else {
        decode_request_data(body)
    }
}
