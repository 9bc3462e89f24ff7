use crate::model::response::{Failure, Progress, ResponseEntity};

/// Invoked once per delivered success, in registration order.
pub type SuccessListener = Box<dyn Fn(&ResponseEntity) + Send + Sync>;

/// Invoked once per terminal failure, in registration order.
pub type FailListener = Box<dyn Fn(&Failure) + Send + Sync>;

/// Invoked when a unit produced its aggregate result. Completion and failure
/// are mutually exclusive terminal signals: a failed unit never completes.
pub type CompleteListener = Box<dyn Fn() + Send + Sync>;

/// Relayed transfer progress; the orchestrator never interprets it.
pub type ProgressListener = Box<dyn Fn(&Progress) + Send + Sync>;

/// Pre-flight gate slot. Accepted and stored on the spec, but not awaited
/// before dispatch; its gating semantics are deliberately left inert.
pub type FrontListener = Box<dyn Fn() + Send + Sync>;

/// Evaluated when the request is handed to the queue; `true` means the
/// request is skipped without being scheduled.
pub type IgnorePredicate = Box<dyn Fn() -> bool + Send + Sync>;
