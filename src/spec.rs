use crate::config::Configuration;
use crate::error::Result;
use crate::executor::Executor;
use crate::listener::{
    FailListener, FrontListener, IgnorePredicate, ProgressListener, SuccessListener,
};
use crate::model::headers::Headers;
use crate::model::method::RequestMethod;
use crate::model::response::{Failure, Progress, ResponseEntity};
use log::info;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Description of one request, created via a per-verb factory and configured
/// through fluent setters.
///
/// The spec is mutable only until a [`Configuration`] is bound: binding
/// builds the executor, moves the listeners into it, and freezes the spec.
/// Binding is idempotent; a second call is logged and ignored.
pub struct RequestSpec {
    id: Uuid,
    url: String,
    method: RequestMethod,
    body: Option<Value>,
    headers: Headers,
    tag: String,
    ignore: Option<IgnorePredicate>,
    front_listener: Option<FrontListener>,
    success_listeners: Vec<SuccessListener>,
    fail_listeners: Vec<FailListener>,
    upload_progress: Option<ProgressListener>,
    download_progress: Option<ProgressListener>,
    executor: Option<Arc<Executor>>,
}

impl RequestSpec {
    fn with_method(url: impl Into<String>, method: RequestMethod) -> Self {
        RequestSpec {
            id: Uuid::new_v4(),
            url: url.into(),
            method,
            body: None,
            headers: Headers::new(),
            tag: String::new(),
            ignore: None,
            front_listener: None,
            success_listeners: Vec::new(),
            fail_listeners: Vec::new(),
            upload_progress: None,
            download_progress: None,
            executor: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::with_method(url, RequestMethod::Get)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::with_method(url, RequestMethod::Post)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::with_method(url, RequestMethod::Put)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::with_method(url, RequestMethod::Delete)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::with_method(url, RequestMethod::Head)
    }

    pub fn options(url: impl Into<String>) -> Self {
        Self::with_method(url, RequestMethod::Options)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::with_method(url, RequestMethod::Patch)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn add_header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.headers.set(key, value);
        self
    }

    /// Marker used to tell requests apart; defaults to the resolved url.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Lets the queue decide at scheduling time whether to skip this request.
    pub fn ignore<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.ignore = Some(Box::new(predicate));
        self
    }

    /// Stores a pre-flight gate. The slot is carried through to the executor
    /// but not awaited before dispatch.
    pub fn front_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.front_listener = Some(Box::new(listener));
        self
    }

    pub fn on_success<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ResponseEntity) + Send + Sync + 'static,
    {
        self.success_listeners.push(Box::new(listener));
        self
    }

    pub fn on_fail<F>(mut self, listener: F) -> Self
    where
        F: Fn(&Failure) + Send + Sync + 'static,
    {
        self.fail_listeners.push(Box::new(listener));
        self
    }

    pub fn on_upload_progress<F>(mut self, listener: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.upload_progress = Some(Box::new(listener));
        self
    }

    pub fn on_download_progress<F>(mut self, listener: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.download_progress = Some(Box::new(listener));
        self
    }

    /// Binds the shared configuration and builds the executor.
    ///
    /// Idempotent: once an executor exists the call is a logged no-op, so a
    /// configuration can never be replaced after the fact.
    pub fn set_request_config(&mut self, config: &Configuration) -> Result<()> {
        if self.executor.is_some() {
            info!("request {} already configured, ignoring rebind", self.id);
            return Ok(());
        }
        let executor = Executor::build(self, config)?;
        self.executor = Some(Arc::new(executor));
        Ok(())
    }

    pub fn executor(&self) -> Option<&Arc<Executor>> {
        self.executor.as_ref()
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

    pub(crate) fn request_body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub(crate) fn request_headers(&self) -> &Headers {
        &self.headers
    }

    pub(crate) fn request_tag(&self) -> &str {
        &self.tag
    }

    pub(crate) fn should_ignore(&self) -> bool {
        self.ignore.as_ref().map(|p| p()).unwrap_or(false)
    }

    pub(crate) fn take_success_listeners(&mut self) -> Vec<SuccessListener> {
        std::mem::take(&mut self.success_listeners)
    }

    pub(crate) fn take_fail_listeners(&mut self) -> Vec<FailListener> {
        std::mem::take(&mut self.fail_listeners)
    }

    pub(crate) fn take_front_listener(&mut self) -> Option<FrontListener> {
        self.front_listener.take()
    }

    pub(crate) fn take_upload_progress(&mut self) -> Option<ProgressListener> {
        self.upload_progress.take()
    }

    pub(crate) fn take_download_progress(&mut self) -> Option<ProgressListener> {
        self.download_progress.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DefaultParser;
    use crate::transport::{Transport, TransportFactory};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn send(
            &self,
            _url: &str,
            _method: RequestMethod,
            _body: Option<&Value>,
            _headers: &Headers,
        ) -> Result<crate::model::response::RawResponse> {
            Err(crate::error::TransportError::Timeout.into())
        }

        fn cancel(&self) {}
    }

    struct CountingFactory {
        creates: Arc<AtomicU32>,
    }

    impl TransportFactory for CountingFactory {
        fn create(&self) -> Box<dyn Transport> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Box::new(NullTransport)
        }
    }

    fn config_with(creates: Arc<AtomicU32>) -> Configuration {
        Configuration::new()
            .add_parser(Arc::new(DefaultParser))
            .with_transport_factory(Arc::new(CountingFactory { creates }))
    }

    #[test]
    fn test_verb_factories() {
        assert_eq!(RequestSpec::get("/a").method(), RequestMethod::Get);
        assert_eq!(RequestSpec::post("/a").method(), RequestMethod::Post);
        assert_eq!(RequestSpec::put("/a").method(), RequestMethod::Put);
        assert_eq!(RequestSpec::delete("/a").method(), RequestMethod::Delete);
        assert_eq!(RequestSpec::head("/a").method(), RequestMethod::Head);
        assert_eq!(RequestSpec::options("/a").method(), RequestMethod::Options);
        assert_eq!(RequestSpec::patch("/a").method(), RequestMethod::Patch);
    }

    #[test]
    fn test_fluent_chain_accumulates() {
        let spec = RequestSpec::post("http://test/login")
            .body(serde_json::json!({"user": "ada"}))
            .add_header("Accept", "application/json")
            .tag("login")
            .on_success(|_| {})
            .on_success(|_| {})
            .on_fail(|_| {});

        assert_eq!(spec.request_tag(), "login");
        assert_eq!(spec.success_listeners.len(), 2);
        assert_eq!(spec.fail_listeners.len(), 1);
        assert!(spec.request_headers().contains("accept"));
    }

    #[test]
    fn test_config_binding_is_idempotent() {
        let creates = Arc::new(AtomicU32::new(0));
        let config = config_with(creates.clone());

        let mut spec = RequestSpec::get("http://test/u1");
        spec.set_request_config(&config).unwrap();
        let first = spec.executor().unwrap().clone();

        spec.set_request_config(&config).unwrap();
        let second = spec.executor().unwrap().clone();

        // The second bind builds nothing and replaces nothing.
        assert_eq!(creates.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_ignore_predicate() {
        let spec = RequestSpec::get("http://test/u1");
        assert!(!spec.should_ignore());

        let spec = RequestSpec::get("http://test/u1").ignore(|| true);
        assert!(spec.should_ignore());
    }
}
