/// Host application hooks invoked around queue execution.
///
/// Entirely best-effort: the queue never consumes a return value and never
/// changes behavior based on what the host does with these calls. Typical
/// implementations show a global loading indicator and surface error toasts.
pub trait HostContext: Send + Sync {
    /// The queue started issuing requests.
    fn notify_busy(&self) {}

    /// The queue reached a terminal signal and no work remains in flight.
    fn notify_idle(&self) {}

    /// A unit failed; `message` is `"{code}: {message}"` of the failure.
    fn notify_error(&self, _message: &str) {}
}

/// Context that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopContext;

impl HostContext for NoopContext {}
