//! Shared mock transport for orchestration tests.

use crate::error::{Result, TransportError};
use crate::model::headers::Headers;
use crate::model::method::RequestMethod;
use crate::model::response::RawResponse;
use crate::transport::{Transport, TransportFactory};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Scripted response for one url; every send to that url replays it.
#[derive(Clone)]
pub struct Plan {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
    pub ignore_cancel: bool,
}

impl Plan {
    pub fn ok(body: &str) -> Self {
        Plan {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
            ignore_cancel: false,
        }
    }

    pub fn status(status: u16) -> Self {
        Plan {
            status,
            body: String::new(),
            delay: Duration::ZERO,
            ignore_cancel: false,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The transport keeps going even after a cancel, so the response still
    /// lands as a straggler.
    pub fn unstoppable(mut self) -> Self {
        self.ignore_cancel = true;
        self
    }
}

/// Observable handle for one created transport.
pub struct TransportProbe {
    pub canceled: Arc<AtomicBool>,
    pub url: Arc<Mutex<Option<String>>>,
}

/// Url-keyed fake network shared by every transport a factory creates.
#[derive(Default)]
pub struct MockNet {
    plans: Mutex<HashMap<String, Plan>>,
    send_log: Mutex<Vec<String>>,
    probes: Mutex<Vec<TransportProbe>>,
}

impl MockNet {
    pub fn new() -> Arc<Self> {
        Arc::new(MockNet::default())
    }

    pub fn plan(self: &Arc<Self>, url: &str, plan: Plan) -> Arc<Self> {
        self.plans.lock().unwrap().insert(url.to_string(), plan);
        self.clone()
    }

    pub fn factory(self: &Arc<Self>) -> Arc<MockFactory> {
        Arc::new(MockFactory { net: self.clone() })
    }

    pub fn sends(&self) -> Vec<String> {
        self.send_log.lock().unwrap().clone()
    }

    pub fn send_count(&self, url: &str) -> usize {
        self.send_log
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn all_canceled(&self) -> bool {
        let probes = self.probes.lock().unwrap();
        !probes.is_empty() && probes.iter().all(|p| p.canceled.load(Ordering::SeqCst))
    }
}

pub struct MockFactory {
    net: Arc<MockNet>,
}

impl TransportFactory for MockFactory {
    fn create(&self) -> Box<dyn Transport> {
        let canceled = Arc::new(AtomicBool::new(false));
        let url = Arc::new(Mutex::new(None));
        self.net.probes.lock().unwrap().push(TransportProbe {
            canceled: canceled.clone(),
            url: url.clone(),
        });
        Box::new(MockTransport {
            net: self.net.clone(),
            canceled,
            url_slot: url,
            cancel: Notify::new(),
        })
    }
}

struct MockTransport {
    net: Arc<MockNet>,
    canceled: Arc<AtomicBool>,
    url_slot: Arc<Mutex<Option<String>>>,
    cancel: Notify,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        url: &str,
        _method: RequestMethod,
        _body: Option<&Value>,
        _headers: &Headers,
    ) -> Result<RawResponse> {
        *self.url_slot.lock().unwrap() = Some(url.to_string());
        self.net.send_log.lock().unwrap().push(url.to_string());

        let plan = self
            .net
            .plans
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Plan::ok("{}"));

        if !plan.ignore_cancel && self.canceled.load(Ordering::SeqCst) {
            return Err(TransportError::Canceled.into());
        }

        if !plan.delay.is_zero() {
            if plan.ignore_cancel {
                tokio::time::sleep(plan.delay).await;
            } else {
                tokio::select! {
                    _ = tokio::time::sleep(plan.delay) => {}
                    _ = self.cancel.notified() => return Err(TransportError::Canceled.into()),
                }
                if self.canceled.load(Ordering::SeqCst) {
                    return Err(TransportError::Canceled.into());
                }
            }
        }

        Ok(RawResponse::new(plan.status, Headers::new(), plan.body))
    }

    fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
        self.cancel.notify_one();
    }
}
