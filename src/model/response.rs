use crate::error::{ParserError, Result};
use crate::model::headers::Headers;
use bytes::Bytes;
use serde_json::Value;
use uuid::Uuid;

/// Raw transport result before any parser has claimed it.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        RawResponse {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Strict JSON decode of the body.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ParserError::InvalidJson(e.to_string().into()).into())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body decoded as JSON when possible, as a string otherwise.
    pub fn body_value(&self) -> Value {
        match serde_json::from_slice(&self.body) {
            Ok(value) => value,
            Err(_) => Value::String(self.text()),
        }
    }
}

/// Typed success delivered to success listeners: parsed payload plus the
/// transport metadata and identity of the originating request.
#[derive(Debug, Clone)]
pub struct ResponseEntity {
    pub data: Value,
    pub status: u16,
    pub headers: Headers,
    pub request_id: Uuid,
    pub url: String,
    pub tag: String,
}

/// Structured failure delivered to fail listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub code: String,
    pub message: String,
    pub data: Option<Value>,
}

impl Failure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Failure {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Upload/download progress event, relayed from the transport verbatim.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub transferred: u64,
    pub total: Option<u64>,
}
