use crate::executor::{ExecOutcome, ExecState, Executor};
use crate::listener::{CompleteListener, FailListener, SuccessListener};
use crate::model::response::{Failure, ResponseEntity};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info};
use std::sync::Arc;

/// Execution order for a group's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    Serial,
    Parallel,
}

/// Terminal signal of one group run.
///
/// `Completed` and `Failed` are mutually exclusive: a failed group has no
/// aggregate result to report and never fires its complete listener.
/// `Stalled` means a member's response was dropped by the parser chain, so
/// the group can reach neither terminal signal.
#[derive(Debug)]
pub enum GroupOutcome {
    Completed,
    Failed(Failure),
    Stalled,
}

/// Ordered collection of executors run with serial or parallel semantics,
/// exposing the same lifecycle surface as a single executor so the queue can
/// schedule it as one unit.
pub struct Group {
    mode: GroupMode,
    members: Vec<Arc<Executor>>,
    success_listener: Option<SuccessListener>,
    fail_listener: Option<FailListener>,
    complete_listener: Option<CompleteListener>,
}

impl Group {
    pub fn new(mode: GroupMode) -> Self {
        Group {
            mode,
            members: Vec::new(),
            success_listener: None,
            fail_listener: None,
            complete_listener: None,
        }
    }

    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    pub fn add_executor(&mut self, executor: Arc<Executor>) {
        self.members.push(executor);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn set_success_listener<F>(&mut self, listener: F)
    where
        F: Fn(&ResponseEntity) + Send + Sync + 'static,
    {
        self.success_listener = Some(Box::new(listener));
    }

    pub fn set_fail_listener<F>(&mut self, listener: F)
    where
        F: Fn(&Failure) + Send + Sync + 'static,
    {
        self.fail_listener = Some(Box::new(listener));
    }

    pub fn set_complete_listener<F>(&mut self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.complete_listener = Some(Box::new(listener));
    }

    /// True iff every member reached `Success`.
    pub fn is_all_finish(&self) -> bool {
        self.members
            .iter()
            .all(|m| m.state() == ExecState::Success)
    }

    /// Aborts every member, finished or not.
    pub fn abort(&self) {
        for member in &self.members {
            member.abort();
        }
    }

    /// Runs the group to its terminal signal. A group is run exactly once.
    pub async fn run(&self) -> GroupOutcome {
        if self.members.is_empty() {
            debug!("group has no members, completing immediately");
            self.fire_complete();
            return GroupOutcome::Completed;
        }
        match self.mode {
            GroupMode::Serial => self.run_serial().await,
            GroupMode::Parallel => self.run_parallel().await,
        }
    }

    /// Members run strictly one at a time; a failure stops the sequence and
    /// later members never start.
    async fn run_serial(&self) -> GroupOutcome {
        for member in &self.members {
            match member.run().await {
                ExecOutcome::Success(entity) => self.fire_success(&entity),
                ExecOutcome::Fail(failure) => {
                    info!("serial group member failed, halting sequence");
                    self.fire_fail(&failure);
                    return GroupOutcome::Failed(failure);
                }
                ExecOutcome::Dropped => return GroupOutcome::Stalled,
            }
        }
        self.fire_complete();
        GroupOutcome::Completed
    }

    /// Members are all issued without waiting. The first failure aborts every
    /// sibling; stragglers are still drained so their executors settle, but
    /// only the first failure is forwarded.
    async fn run_parallel(&self) -> GroupOutcome {
        let mut pending: FuturesUnordered<_> =
            self.members.iter().map(|m| m.run()).collect();

        let mut first_failure: Option<Failure> = None;
        let mut stalled = false;

        while let Some(outcome) = pending.next().await {
            match outcome {
                ExecOutcome::Success(entity) => self.fire_success(&entity),
                ExecOutcome::Fail(failure) => {
                    if first_failure.is_none() {
                        info!("parallel group member failed, aborting siblings");
                        self.abort();
                        self.fire_fail(&failure);
                        first_failure = Some(failure);
                    }
                }
                ExecOutcome::Dropped => stalled = true,
            }
        }

        if let Some(failure) = first_failure {
            return GroupOutcome::Failed(failure);
        }
        if stalled {
            return GroupOutcome::Stalled;
        }
        if self.is_all_finish() {
            self.fire_complete();
            GroupOutcome::Completed
        } else {
            GroupOutcome::Stalled
        }
    }

    fn fire_success(&self, entity: &ResponseEntity) {
        if let Some(listener) = &self.success_listener {
            listener(entity);
        }
    }

    fn fire_fail(&self, failure: &Failure) {
        if let Some(listener) = &self.fail_listener {
            listener(failure);
        }
    }

    fn fire_complete(&self) {
        if let Some(listener) = &self.complete_listener {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::parser::DefaultParser;
    use crate::spec::RequestSpec;
    use crate::test_support::{MockNet, Plan};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn config(net: &std::sync::Arc<MockNet>, retry: u32) -> Configuration {
        Configuration::new()
            .with_retry(retry)
            .add_parser(Arc::new(DefaultParser))
            .with_transport_factory(net.factory())
    }

    fn executor_for(url: &str, config: &Configuration) -> Arc<Executor> {
        let mut spec = RequestSpec::get(url);
        spec.set_request_config(config).unwrap();
        spec.executor().unwrap().clone()
    }

    #[tokio::test]
    async fn test_parallel_success_completes_after_all_members() {
        let net = MockNet::new()
            .plan("http://t/a", Plan::ok("{}"))
            .plan("http://t/b", Plan::ok("{}").delayed(Duration::from_millis(20)));
        let config = config(&net, 0);

        let successes = Arc::new(AtomicU32::new(0));
        let completes = Arc::new(AtomicU32::new(0));

        let mut group = Group::new(GroupMode::Parallel);
        group.add_executor(executor_for("http://t/a", &config));
        group.add_executor(executor_for("http://t/b", &config));

        let s = successes.clone();
        group.set_success_listener(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        let c = completes.clone();
        group.set_complete_listener(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = group.run().await;
        assert!(matches!(outcome, GroupOutcome::Completed));
        assert!(group.is_all_finish());
        assert_eq!(successes.load(Ordering::SeqCst), 2);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_parallel_failure_aborts_all_siblings() {
        let net = MockNet::new()
            .plan("http://t/fast-fail", Plan::status(500))
            .plan("http://t/slow-1", Plan::ok("{}").delayed(Duration::from_secs(5)))
            .plan("http://t/slow-2", Plan::ok("{}").delayed(Duration::from_secs(5)));
        let config = config(&net, 0);

        let fails = Arc::new(AtomicU32::new(0));
        let completes = Arc::new(AtomicU32::new(0));

        let mut group = Group::new(GroupMode::Parallel);
        group.add_executor(executor_for("http://t/slow-1", &config));
        group.add_executor(executor_for("http://t/fast-fail", &config));
        group.add_executor(executor_for("http://t/slow-2", &config));

        let f = fails.clone();
        group.set_fail_listener(move |failure| {
            assert_eq!(failure.code, "500");
            f.fetch_add(1, Ordering::SeqCst);
        });
        let c = completes.clone();
        group.set_complete_listener(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = group.run().await;
        assert!(matches!(outcome, GroupOutcome::Failed(_)));
        // Every member received abort, the failure forwarded exactly once,
        // and the complete listener never fired.
        assert!(net.all_canceled());
        assert_eq!(fails.load(Ordering::SeqCst), 1);
        assert_eq!(completes.load(Ordering::SeqCst), 0);
        assert!(!group.is_all_finish());
    }

    #[tokio::test]
    async fn test_serial_failure_stops_sequence() {
        let net = MockNet::new()
            .plan("http://t/a", Plan::status(404))
            .plan("http://t/b", Plan::ok("{}"));
        let config = config(&net, 0);

        let mut group = Group::new(GroupMode::Serial);
        group.add_executor(executor_for("http://t/a", &config));
        group.add_executor(executor_for("http://t/b", &config));

        let outcome = group.run().await;
        assert!(matches!(outcome, GroupOutcome::Failed(_)));
        // B never ran.
        assert_eq!(net.send_count("http://t/b"), 0);
    }

    #[tokio::test]
    async fn test_serial_runs_members_in_order() {
        let net = MockNet::new()
            .plan("http://t/a", Plan::ok("{}").delayed(Duration::from_millis(10)))
            .plan("http://t/b", Plan::ok("{}"));
        let config = config(&net, 0);

        let mut group = Group::new(GroupMode::Serial);
        group.add_executor(executor_for("http://t/a", &config));
        group.add_executor(executor_for("http://t/b", &config));

        let outcome = group.run().await;
        assert!(matches!(outcome, GroupOutcome::Completed));
        assert_eq!(net.sends(), vec!["http://t/a", "http://t/b"]);
    }

    #[tokio::test]
    async fn test_empty_group_completes_immediately() {
        let completes = Arc::new(AtomicU32::new(0));
        let mut group = Group::new(GroupMode::Parallel);
        let c = completes.clone();
        group.set_complete_listener(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = group.run().await;
        assert!(matches!(outcome, GroupOutcome::Completed));
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }
}
