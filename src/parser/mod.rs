pub mod default;

pub use default::{DefaultParser, StringParser};

use crate::error::Error;
use crate::model::response::{Failure, RawResponse};
use serde_json::Value;
use std::sync::Arc;

/// Terminal outcome a parser produces for the response it claimed.
///
/// Returning a single verdict is the chain's "at most one terminal callback"
/// guarantee: a parser cannot signal both success and failure.
#[derive(Debug, Clone)]
pub enum Verdict {
    Success(Value),
    Fail(Failure),
}

/// Interprets raw transport results into typed outcomes.
///
/// `raw` is `None` when the transport itself failed; `error` carries that
/// failure. Exactly one of the two is populated in practice.
pub trait ResponseParser: Send + Sync {
    /// Whether this parser claims the given raw result.
    fn matches(&self, raw: Option<&RawResponse>) -> bool;

    /// Resolves the claimed result into exactly one verdict.
    fn parse(&self, raw: Option<&RawResponse>, error: Option<&Error>) -> Verdict;
}

/// Ordered parser list; the first parser whose `matches` returns true owns
/// the response.
#[derive(Clone, Default)]
pub struct ParserChain {
    parsers: Vec<Arc<dyn ResponseParser>>,
}

impl ParserChain {
    pub fn new() -> Self {
        ParserChain {
            parsers: Vec::new(),
        }
    }

    pub fn push(&mut self, parser: Arc<dyn ResponseParser>) {
        self.parsers.push(parser);
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Scans in registration order and lets the first matching parser
    /// resolve the response.
    ///
    /// Returns `None` when no parser claims it; the caller drops the
    /// response silently in that case, firing neither success nor fail.
    pub fn resolve(&self, raw: Option<&RawResponse>, error: Option<&Error>) -> Option<Verdict> {
        for parser in &self.parsers {
            if parser.matches(raw) {
                return Some(parser.parse(raw, error));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::headers::Headers;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingParser {
        accept: bool,
        calls: Arc<AtomicU32>,
    }

    impl ResponseParser for CountingParser {
        fn matches(&self, _raw: Option<&RawResponse>) -> bool {
            self.accept
        }

        fn parse(&self, _raw: Option<&RawResponse>, _error: Option<&Error>) -> Verdict {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Verdict::Success(Value::Null)
        }
    }

    #[test]
    fn test_first_match_wins_past_non_matching_parsers() {
        let first_calls = Arc::new(AtomicU32::new(0));
        let second_calls = Arc::new(AtomicU32::new(0));

        let mut chain = ParserChain::new();
        chain.push(Arc::new(CountingParser {
            accept: false,
            calls: first_calls.clone(),
        }));
        chain.push(Arc::new(CountingParser {
            accept: true,
            calls: second_calls.clone(),
        }));

        let raw = RawResponse::new(200, Headers::new(), "{}");
        let verdict = chain.resolve(Some(&raw), None);

        assert!(matches!(verdict, Some(Verdict::Success(_))));
        assert_eq!(first_calls.load(Ordering::SeqCst), 0);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_match_drops_response() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut chain = ParserChain::new();
        chain.push(Arc::new(CountingParser {
            accept: false,
            calls: calls.clone(),
        }));

        let raw = RawResponse::new(200, Headers::new(), "{}");
        assert!(chain.resolve(Some(&raw), None).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
