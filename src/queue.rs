use crate::config::Configuration;
use crate::context::HostContext;
use crate::error::{QueueError, Result};
use crate::executor::{ExecOutcome, Executor};
use crate::group::{Group, GroupMode, GroupOutcome};
use crate::model::response::{Failure, ResponseEntity};
use crate::spec::RequestSpec;
use log::{debug, info, warn};
use metrics::counter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One schedulable step of a queue run.
pub enum Unit {
    Single(Arc<Executor>),
    Group(Group),
}

type SharedSuccessListener = Arc<dyn Fn(&ResponseEntity) + Send + Sync>;
type SharedFailListener = Arc<dyn Fn(&Failure) + Send + Sync>;
type SharedCompleteListener = Arc<dyn Fn() + Send + Sync>;

/// Ordered pipeline of units run strictly one after another. A unit does not
/// start until the previous one reached a terminal signal, and the first
/// failing unit ends the run: nothing scheduled after it is issued.
///
/// Requests are inserted into the group the cursor points at; a fresh queue
/// opens with one parallel group so `add_request` works immediately.
pub struct Queue {
    config: Arc<Configuration>,
    context: Option<Arc<dyn HostContext>>,
    units: Vec<Unit>,
    cursor: usize,
    canceled: Arc<AtomicBool>,
    show_loading: bool,
    show_error_message: bool,
    success_listener: Option<SharedSuccessListener>,
    fail_listener: Option<SharedFailListener>,
    complete_listener: Option<SharedCompleteListener>,
}

impl Queue {
    pub fn new(config: Arc<Configuration>) -> Self {
        Queue {
            config,
            context: None,
            units: vec![Unit::Group(Group::new(GroupMode::Parallel))],
            cursor: 0,
            canceled: Arc::new(AtomicBool::new(false)),
            show_loading: false,
            show_error_message: true,
            success_listener: None,
            fail_listener: None,
            complete_listener: None,
        }
    }

    pub fn with_context(mut self, context: Arc<dyn HostContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Drive the host's busy/idle indicator around the run. Off by default.
    pub fn show_loading(&mut self, on: bool) -> &mut Self {
        self.show_loading = on;
        self
    }

    /// Forward failure text to the host's error surface. On by default.
    pub fn show_error_message(&mut self, on: bool) -> &mut Self {
        self.show_error_message = on;
        self
    }

    /// Opens a serial group and moves the insertion cursor to it.
    pub fn open_serial(&mut self) -> &mut Self {
        self.units.push(Unit::Group(Group::new(GroupMode::Serial)));
        self.cursor = self.units.len() - 1;
        self
    }

    /// Opens a parallel group and moves the insertion cursor to it.
    pub fn open_parallel(&mut self) -> &mut Self {
        self.units.push(Unit::Group(Group::new(GroupMode::Parallel)));
        self.cursor = self.units.len() - 1;
        self
    }

    /// Binds the spec against the queue's configuration and inserts its
    /// executor into the group at the cursor. Specs whose ignore predicate
    /// holds are skipped without scheduling anything.
    pub fn add_request(&mut self, mut spec: RequestSpec) -> Result<&mut Self> {
        if spec.should_ignore() {
            info!("request {} ignored by predicate, skipping", spec.url());
            return Ok(self);
        }
        let executor = Self::bind(&mut spec, &self.config)?;
        match self.units.get_mut(self.cursor) {
            Some(Unit::Group(group)) => {
                group.add_executor(executor);
                Ok(self)
            }
            _ => Err(QueueError::NoOpenGroup.into()),
        }
    }

    /// Schedules the spec as a standalone step after the current groups,
    /// without touching the insertion cursor.
    pub fn add_single(&mut self, mut spec: RequestSpec) -> Result<&mut Self> {
        if spec.should_ignore() {
            info!("request {} ignored by predicate, skipping", spec.url());
            return Ok(self);
        }
        let executor = Self::bind(&mut spec, &self.config)?;
        self.units.push(Unit::Single(executor));
        Ok(self)
    }

    fn bind(spec: &mut RequestSpec, config: &Configuration) -> Result<Arc<Executor>> {
        spec.set_request_config(config)?;
        spec.executor()
            .cloned()
            .ok_or_else(|| QueueError::UnboundSpec.into())
    }

    pub fn set_success_listener<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&ResponseEntity) + Send + Sync + 'static,
    {
        self.success_listener = Some(Arc::new(listener));
        self
    }

    pub fn set_fail_listener<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&Failure) + Send + Sync + 'static,
    {
        self.fail_listener = Some(Arc::new(listener));
        self
    }

    pub fn set_complete_listener<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.complete_listener = Some(Arc::new(listener));
        self
    }

    /// Number of scheduled units, counting the auto-opened group.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units
            .iter()
            .all(|u| matches!(u, Unit::Group(g) if g.is_empty()))
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Runs every unit in order. Returns after the complete listener fired,
    /// after the first failing unit, or silently when a unit stalls.
    pub async fn run(&mut self) {
        if self.is_empty() {
            info!("queue has no requests, nothing to run");
            return;
        }
        let units = std::mem::take(&mut self.units);
        let total = units.len();
        self.notify_busy();

        for (index, unit) in units.into_iter().enumerate() {
            if self.is_canceled() {
                break;
            }
            let outcome = match unit {
                Unit::Group(mut group) => {
                    self.wire_group(&mut group);
                    group.run().await
                }
                Unit::Single(executor) => match executor.run().await {
                    ExecOutcome::Success(entity) => {
                        self.deliver_success(&entity);
                        GroupOutcome::Completed
                    }
                    ExecOutcome::Fail(failure) => {
                        self.deliver_fail(&failure);
                        GroupOutcome::Failed(failure)
                    }
                    ExecOutcome::Dropped => GroupOutcome::Stalled,
                },
            };
            match outcome {
                GroupOutcome::Completed => {
                    debug!("queue unit {}/{} completed", index + 1, total);
                }
                GroupOutcome::Failed(_) => {
                    counter!("reqflow_queue_runs_total", "outcome" => "fail").increment(1);
                    return;
                }
                GroupOutcome::Stalled => {
                    warn!(
                        "queue unit {}/{} stalled, terminating without a signal",
                        index + 1,
                        total
                    );
                    counter!("reqflow_queue_runs_total", "outcome" => "stalled").increment(1);
                    return;
                }
            }
        }

        if self.is_canceled() {
            return;
        }
        counter!("reqflow_queue_runs_total", "outcome" => "complete").increment(1);
        if let Some(listener) = &self.complete_listener {
            listener();
        }
        self.notify_idle();
    }

    /// Routes the group's deliveries through the queue's canceled gate so
    /// stragglers settling after a failure stay silent at this level.
    fn wire_group(&self, group: &mut Group) {
        if let Some(success) = self.success_listener.clone() {
            let canceled = self.canceled.clone();
            group.set_success_listener(move |entity| {
                if !canceled.load(Ordering::SeqCst) {
                    success(entity);
                }
            });
        }

        let canceled = self.canceled.clone();
        let fail = self.fail_listener.clone();
        let context = self.context.clone();
        let show_loading = self.show_loading;
        let show_error_message = self.show_error_message;
        group.set_fail_listener(move |failure| {
            Self::fail_once(
                failure,
                &canceled,
                fail.as_deref(),
                context.as_deref(),
                show_loading,
                show_error_message,
            );
        });
    }

    fn deliver_success(&self, entity: &ResponseEntity) {
        if self.is_canceled() {
            return;
        }
        if let Some(listener) = &self.success_listener {
            listener(entity);
        }
    }

    fn deliver_fail(&self, failure: &Failure) {
        Self::fail_once(
            failure,
            &self.canceled,
            self.fail_listener.as_deref(),
            self.context.as_deref(),
            self.show_loading,
            self.show_error_message,
        );
    }

    /// First failure flips the canceled flag and reports; any later failure
    /// in the same run is swallowed.
    fn fail_once(
        failure: &Failure,
        canceled: &AtomicBool,
        fail: Option<&(dyn Fn(&Failure) + Send + Sync)>,
        context: Option<&dyn HostContext>,
        show_loading: bool,
        show_error_message: bool,
    ) {
        if canceled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(fail) = fail {
            fail(failure);
        }
        if let Some(context) = context {
            if show_loading {
                context.notify_idle();
            }
            if show_error_message {
                context.notify_error(&format!("{}: {}", failure.code, failure.message));
            }
        }
    }

    fn notify_busy(&self) {
        if self.show_loading {
            if let Some(context) = &self.context {
                context.notify_busy();
            }
        }
    }

    fn notify_idle(&self) {
        if self.show_loading {
            if let Some(context) = &self.context {
                context.notify_idle();
            }
        }
    }
}
