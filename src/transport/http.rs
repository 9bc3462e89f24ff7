use super::Transport;
use crate::error::{Result, TransportError};
use crate::listener::ProgressListener;
use crate::model::headers::Headers;
use crate::model::method::RequestMethod;
use crate::model::response::{Progress, RawResponse};
use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

/// reqwest-backed transport with cooperative cancel.
///
/// One instance serves one executor; the shared pooled [`Client`] comes from
/// the factory. Cancellation flips a flag and wakes any pending await, so an
/// in-flight send or body stream bails out with a canceled error.
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
    canceled: AtomicBool,
    cancel: Notify,
    upload_progress: Option<ProgressListener>,
    download_progress: Option<ProgressListener>,
}

impl HttpTransport {
    fn new(client: Client, timeout: Duration) -> Self {
        HttpTransport {
            client,
            timeout,
            canceled: AtomicBool::new(false),
            cancel: Notify::new(),
            upload_progress: None,
            download_progress: None,
        }
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Relaxed)
    }
}

/// Flattens a JSON object into string pairs for query or form encoding.
fn encode_pairs(body: &Value) -> Vec<(String, String)> {
    match body {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn is_form(headers: &Headers) -> bool {
    headers
        .get("content-type")
        .map(|v| v.contains("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        url: &str,
        method: RequestMethod,
        body: Option<&Value>,
        headers: &Headers,
    ) -> Result<RawResponse> {
        if self.is_canceled() {
            return Err(TransportError::Canceled.into());
        }

        let parsed =
            Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let mut builder = self.client.request(method.into(), parsed);
        builder = builder.headers(HeaderMap::from(headers));
        builder = builder.timeout(self.timeout);

        if let Some(body) = body {
            if method.sends_query() {
                builder = builder.query(&encode_pairs(body));
            } else if is_form(headers) {
                builder = builder.form(&encode_pairs(body));
            } else {
                builder = builder.json(body);
            }

            if let Some(listener) = &self.upload_progress {
                let size = serde_json::to_vec(body).map(|v| v.len() as u64).unwrap_or(0);
                listener(&Progress {
                    transferred: size,
                    total: Some(size),
                });
            }
        }

        debug!("sending {} {}", method, url);

        let response = tokio::select! {
            res = builder.send() => res.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::SendFailed(e.into())
                }
            })?,
            _ = self.cancel.notified() => return Err(TransportError::Canceled.into()),
        };

        let status = response.status().as_u16();
        let response_headers = Headers::from(response.headers());
        let total = response.content_length();

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        loop {
            if self.is_canceled() {
                return Err(TransportError::Canceled.into());
            }
            tokio::select! {
                chunk = stream.next() => match chunk {
                    Some(Ok(chunk)) => {
                        body.extend_from_slice(&chunk);
                        if let Some(listener) = &self.download_progress {
                            listener(&Progress {
                                transferred: body.len() as u64,
                                total,
                            });
                        }
                    }
                    Some(Err(e)) => return Err(TransportError::SendFailed(e.into()).into()),
                    None => break,
                },
                _ = self.cancel.notified() => return Err(TransportError::Canceled.into()),
            }
        }

        Ok(RawResponse::new(status, response_headers, body))
    }

    fn cancel(&self) {
        self.canceled.store(true, Ordering::Relaxed);
        self.cancel.notify_one();
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn set_progress(
        &mut self,
        upload: Option<ProgressListener>,
        download: Option<ProgressListener>,
    ) {
        self.upload_progress = upload;
        self.download_progress = download;
    }
}

/// Factory sharing one pooled client across all transports it creates.
pub struct HttpTransportFactory {
    client: Client,
    timeout: Duration,
}

impl HttpTransportFactory {
    pub fn new() -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build http client");

        HttpTransportFactory {
            client,
            timeout: Duration::from_millis(1000),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpTransportFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl super::TransportFactory for HttpTransportFactory {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(HttpTransport::new(self.client.clone(), self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_pairs_skips_nulls_and_strips_quotes() {
        let body = serde_json::json!({
            "name": "ada",
            "age": 36,
            "ghost": null
        });
        let mut pairs = encode_pairs(&body);
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("age".to_string(), "36".to_string()),
                ("name".to_string(), "ada".to_string()),
            ]
        );
    }

    #[test]
    fn test_form_detection() {
        let headers = Headers::new().add("Content-Type", "application/x-www-form-urlencoded");
        assert!(is_form(&headers));
        assert!(!is_form(&Headers::new()));
    }

    #[tokio::test]
    async fn test_canceled_transport_rejects_send() {
        let factory = HttpTransportFactory::new();
        let transport = super::super::TransportFactory::create(&factory);
        transport.cancel();

        let err = transport
            .send("http://localhost:1/none", RequestMethod::Get, None, &Headers::new())
            .await
            .unwrap_err();
        assert!(err.is_canceled());
    }
}
