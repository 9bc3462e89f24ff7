use super::{ResponseParser, Verdict};
use crate::error::Error;
use crate::model::response::{Failure, RawResponse};
use serde_json::Value;

/// Catch-all parser: HTTP 200 yields the decoded body as success, any other
/// status becomes a failure keyed by the status code, and a transport error
/// becomes a `-1` failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultParser;

impl ResponseParser for DefaultParser {
    fn matches(&self, _raw: Option<&RawResponse>) -> bool {
        true
    }

    fn parse(&self, raw: Option<&RawResponse>, error: Option<&Error>) -> Verdict {
        match raw {
            Some(raw) if raw.status == 200 => Verdict::Success(raw.body_value()),
            Some(raw) => Verdict::Fail(Failure::new(raw.status.to_string(), "HTTP error")),
            None => {
                let message = error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "HTTP error".to_string());
                Verdict::Fail(Failure::new("-1", message))
            }
        }
    }
}

/// Like [`DefaultParser`] but surfaces the body verbatim as a string.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringParser;

impl ResponseParser for StringParser {
    fn matches(&self, _raw: Option<&RawResponse>) -> bool {
        true
    }

    fn parse(&self, raw: Option<&RawResponse>, error: Option<&Error>) -> Verdict {
        match raw {
            Some(raw) if raw.status == 200 => Verdict::Success(Value::String(raw.text())),
            Some(raw) => Verdict::Fail(Failure::new(raw.status.to_string(), "HTTP error")),
            None => {
                let message = error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "HTTP error".to_string());
                Verdict::Fail(Failure::new("-1", message))
            }
        }
    }
}
