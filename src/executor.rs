use crate::config::Configuration;
use crate::error::{Result, SetupError};
use crate::listener::{FailListener, FrontListener, SuccessListener};
use crate::model::headers::Headers;
use crate::model::method::RequestMethod;
use crate::model::response::{Failure, ResponseEntity};
use crate::parser::{ParserChain, Verdict};
use crate::spec::RequestSpec;
use crate::transport::Transport;
use log::{debug, info, warn};
use metrics::{counter, histogram};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::time::Instant;
use uuid::Uuid;

/// Lifecycle of one executor attempt. Monotonic per attempt: a retry
/// re-enters `Running` without an observable `Success` in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExecState {
    None = 0,
    Running = 1,
    Success = 2,
    Fail = 3,
}

impl ExecState {
    fn from_u8(value: u8) -> ExecState {
        match value {
            1 => ExecState::Running,
            2 => ExecState::Success,
            3 => ExecState::Fail,
            _ => ExecState::None,
        }
    }
}

/// Terminal result of [`Executor::run`], consumed by groups for sequencing.
///
/// `Dropped` means no parser claimed the response: by contract neither
/// success nor fail listeners fire and the executor never leaves `Running`.
#[derive(Debug)]
pub enum ExecOutcome {
    Success(ResponseEntity),
    Fail(Failure),
    Dropped,
}

/// Per-request state machine: drives one transport call, applies the retry
/// budget, and resolves the parser chain, fanning outcomes out to the
/// listeners wired in from the originating spec.
pub struct Executor {
    id: Uuid,
    url: String,
    method: RequestMethod,
    body: Option<Value>,
    headers: Headers,
    tag: String,
    retry: u32,
    parsers: ParserChain,
    transport: Box<dyn Transport>,
    state: AtomicU8,
    aborted: AtomicBool,
    current_retry: AtomicU32,
    success_listeners: Vec<SuccessListener>,
    fail_listeners: Vec<FailListener>,
    front_listener: Option<FrontListener>,
}

fn join_url(base: &str, url: &str) -> String {
    if base.is_empty() || url.contains("://") {
        url.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

/// Drops top-level nulls from object bodies so they are never serialized.
fn strip_nulls(body: Value) -> Value {
    match body {
        Value::Object(map) => {
            Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect())
        }
        other => other,
    }
}

impl Executor {
    /// Validates the configuration and assembles the executor, moving the
    /// spec's listeners into it. Fatal setup errors are raised here, before
    /// any I/O: empty URL, empty parser chain, missing transport factory.
    pub(crate) fn build(spec: &mut RequestSpec, config: &Configuration) -> Result<Executor> {
        if spec.url().trim().is_empty() {
            return Err(SetupError::EmptyUrl.into());
        }
        if config.parsers().is_empty() {
            return Err(SetupError::EmptyParserChain.into());
        }
        let factory = config
            .transport_factory()
            .ok_or(SetupError::MissingTransport)?;

        let mut transport = factory.create();
        transport.set_timeout(config.timeout());
        transport.set_credentials(config.credentials());
        transport.set_progress(spec.take_upload_progress(), spec.take_download_progress());

        // Request headers win over configuration defaults on collision.
        let mut headers = spec.request_headers().clone();
        headers.merge_under(config.headers());

        let url = join_url(config.base_url(), spec.url().trim());
        let tag = if spec.request_tag().is_empty() {
            url.clone()
        } else {
            spec.request_tag().to_string()
        };

        Ok(Executor {
            id: spec.id(),
            url,
            method: spec.method(),
            body: spec.request_body().cloned().map(strip_nulls),
            headers,
            tag,
            retry: config.retry(),
            parsers: config.parsers().clone(),
            transport,
            state: AtomicU8::new(ExecState::None as u8),
            aborted: AtomicBool::new(false),
            current_retry: AtomicU32::new(0),
            success_listeners: spec.take_success_listeners(),
            fail_listeners: spec.take_fail_listeners(),
            front_listener: spec.take_front_listener(),
        })
    }

    /// Runs the request to a terminal outcome, re-issuing identical sends
    /// while the retry budget allows and the executor is not aborted.
    pub async fn run(&self) -> ExecOutcome {
        loop {
            self.set_state(ExecState::Running);
            debug!(
                "dispatching {} {} (attempt {})",
                self.method,
                self.url,
                self.current_retry.load(Ordering::SeqCst) + 1
            );
            counter!("reqflow_send_attempts_total", "method" => self.method.as_str())
                .increment(1);

            let started = Instant::now();
            let result = self
                .transport
                .send(&self.url, self.method, self.body.as_ref(), &self.headers)
                .await;
            histogram!("reqflow_attempt_duration_seconds", "method" => self.method.as_str())
                .record(started.elapsed().as_secs_f64());

            let (raw, error) = match result {
                Ok(raw) => (Some(raw), None),
                Err(e) => (None, Some(e)),
            };

            match self.parsers.resolve(raw.as_ref(), error.as_ref()) {
                Some(Verdict::Success(data)) => {
                    self.set_state(ExecState::Success);
                    let entity = ResponseEntity {
                        data,
                        status: raw.as_ref().map(|r| r.status).unwrap_or(0),
                        headers: raw.map(|r| r.headers).unwrap_or_default(),
                        request_id: self.id,
                        url: self.url.clone(),
                        tag: self.tag.clone(),
                    };
                    info!("request succeeded: {} {}", self.method, self.url);
                    counter!("reqflow_outcomes_total", "outcome" => "success").increment(1);
                    for listener in &self.success_listeners {
                        listener(&entity);
                    }
                    return ExecOutcome::Success(entity);
                }
                Some(Verdict::Fail(failure)) => {
                    if !self.is_aborted() && self.current_retry.load(Ordering::SeqCst) < self.retry
                    {
                        let attempt = self.current_retry.fetch_add(1, Ordering::SeqCst) + 1;
                        counter!("reqflow_retries_total").increment(1);
                        info!(
                            "request failed, retrying ({}/{}): {} {}",
                            attempt, self.retry, self.method, self.url
                        );
                        continue;
                    }
                    self.set_state(ExecState::Fail);
                    warn!(
                        "request failed: {} {} (code {})",
                        self.method, self.url, failure.code
                    );
                    counter!("reqflow_outcomes_total", "outcome" => "fail").increment(1);
                    for listener in &self.fail_listeners {
                        listener(&failure);
                    }
                    return ExecOutcome::Fail(failure);
                }
                None => {
                    warn!(
                        "no parser matched response for {} {}; dropping it",
                        self.method, self.url
                    );
                    counter!("reqflow_outcomes_total", "outcome" => "dropped").increment(1);
                    return ExecOutcome::Dropped;
                }
            }
        }
    }

    /// Requests cooperative cancellation: flips the abort flag, asks the
    /// transport to drop in-flight I/O, and short-circuits remaining retries.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.transport.cancel();
    }

    pub fn state(&self) -> ExecState {
        ExecState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ExecState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Whether a pre-flight gate was attached to the originating spec. The
    /// gate is stored but not awaited before dispatch.
    pub fn has_front_gate(&self) -> bool {
        self.front_listener.is_some()
    }
}
