pub mod http;

pub use http::{HttpTransport, HttpTransportFactory};

use crate::error::Result;
use crate::listener::ProgressListener;
use crate::model::headers::Headers;
use crate::model::method::RequestMethod;
use crate::model::response::RawResponse;
use async_trait::async_trait;
use serde_json::Value;

/// Externally supplied capability that performs the actual network I/O.
///
/// One transport instance serves one executor; retries re-issue `send` on the
/// same instance. `cancel` is cooperative: it requests that in-flight I/O be
/// abandoned but does not guarantee a result already in delivery is dropped.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        url: &str,
        method: RequestMethod,
        body: Option<&Value>,
        headers: &Headers,
    ) -> Result<RawResponse>;

    fn cancel(&self);

    /// Applies the configured per-request timeout before the first `send`.
    /// Transports without a timeout concept may ignore this.
    fn set_timeout(&mut self, _timeout: std::time::Duration) {}

    /// Forwards the configured cross-site credential flag before the first
    /// `send`. Transports that do not manage cookies or ambient credentials
    /// may ignore this.
    fn set_credentials(&mut self, _with_credentials: bool) {}

    /// Installs optional progress hooks before the first `send`. Transports
    /// that cannot observe transfer progress may ignore this.
    fn set_progress(
        &mut self,
        _upload: Option<ProgressListener>,
        _download: Option<ProgressListener>,
    ) {
    }
}

/// Produces one transport per executor.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Box<dyn Transport>;
}
