// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Priority-ordered, time-budgeted execution of hydration tasks.
//!
//! The scheduler runs under two hard constraints: never occupy the UI
//! thread longer than the batch budget, and prefer higher-priority tasks
//! when time is scarce. Batches are granted by the platform
//! ([`BatchSource`]); pacing inside a batch is delegated to a
//! [`BatchPacer`](pacer::BatchPacer) chosen once at startup.
//!
//! State machine: `Idle → Scheduled` (on the first task scheduled while
//! idle) `→ Executing` (inside a granted batch) `→ Idle` if the queue
//! drains, else back to `Scheduled`.

pub mod pacer;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use rheo_core::dom::TargetId;
use rheo_core::platform::{BatchHandle, BatchSource, MonotonicClock, SchedulingCapabilities};
use rheo_core::Stopwatch;

use crate::config::SchedulerConfig;
use pacer::{pacer_for, BatchPacer};

// ─────────────────────────────────────────────────────────────────────────────
// Tasks
// ─────────────────────────────────────────────────────────────────────────────

/// Error type for hydration task execution.
#[derive(Debug)]
pub enum TaskError {
    /// The task's execute closure returned an error.
    ExecutionFailed(Box<dyn std::error::Error + Send + Sync>),
    /// The task's execute closure panicked. The panic is caught so one bad
    /// task never aborts the batch.
    Panicked(String),
}

impl TaskError {
    /// Convenience constructor wrapping any error as an execution failure.
    pub fn failed(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        TaskError::ExecutionFailed(err.into())
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::ExecutionFailed(e) => write!(f, "Task execution failed: {e}"),
            TaskError::Panicked(msg) => write!(f, "Task panicked: {msg}"),
        }
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TaskError::ExecutionFailed(e) => Some(e.as_ref()),
            TaskError::Panicked(_) => None,
        }
    }
}

/// Priority band of a hydration task.
///
/// Strict ordering across bands; ties within a band preserve submission
/// order (stable queue).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Hydrate whenever time allows.
    Low,
    /// The default band.
    #[default]
    Normal,
    /// Prefer over normal work.
    High,
    /// Above-the-fold, interaction-critical targets.
    Critical,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Normal => write!(f, "normal"),
            TaskPriority::High => write!(f, "high"),
            TaskPriority::Critical => write!(f, "critical"),
        }
    }
}

/// Identifier assigned to a task when it is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A unit of work making one target interactive.
///
/// A task is destroyed after exactly one execution attempt; there is no
/// automatic retry. The target id is an explicit field — the hydrated-set
/// and event-replay coupling is part of the task's identity contract, not
/// a naming convention.
pub struct HydrationTask {
    target: TargetId,
    priority: TaskPriority,
    execute: Box<dyn FnOnce() -> Result<(), TaskError>>,
    on_complete: Option<Box<dyn FnOnce()>>,
    on_error: Option<Box<dyn FnOnce(&TaskError)>>,
}

impl HydrationTask {
    /// Creates a task hydrating `target` with the given body.
    pub fn new(
        target: impl Into<TargetId>,
        priority: TaskPriority,
        execute: impl FnOnce() -> Result<(), TaskError> + 'static,
    ) -> Self {
        Self {
            target: target.into(),
            priority,
            execute: Box::new(execute),
            on_complete: None,
            on_error: None,
        }
    }

    /// Attaches a completion callback, invoked after a successful attempt.
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Attaches an error callback, invoked with the failure of an
    /// unsuccessful attempt.
    pub fn on_error(mut self, callback: impl FnOnce(&TaskError) + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// The target this task makes interactive.
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    /// The task's priority band.
    pub fn priority(&self) -> TaskPriority {
        self.priority
    }
}

impl fmt::Debug for HydrationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationTask")
            .field("target", &self.target)
            .field("priority", &self.priority)
            .finish()
    }
}

// Queue entry ordered by (priority, submission sequence). BinaryHeap is a
// max-heap: higher priority wins, and within a band the *lower* sequence
// (earlier submission) wins.
struct QueuedTask {
    id: TaskId,
    seq: u64,
    task: HydrationTask,
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.task
            .priority
            .cmp(&other.task.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// No queued work and no outstanding platform request.
    Idle,
    /// A platform batch has been requested and not yet granted.
    Scheduled(BatchHandle),
    /// Inside a granted batch, popping tasks.
    Executing,
}

/// What one granted batch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    /// Tasks attempted (each task gets exactly one attempt).
    pub executed: u64,
    /// Attempts that failed or panicked.
    pub failed: u64,
    /// Attempts whose duration exceeded the long-task threshold.
    pub long_tasks: u64,
    /// The batch stopped with work still queued and re-requested a slot.
    pub yielded: bool,
    /// The whole batch was deferred because scroll activity was fresh.
    pub deferred_by_scroll: bool,
    /// The queue drained during this batch.
    pub drained: bool,
    /// The grant did not match the outstanding request and was ignored.
    pub stale_grant: bool,
}

/// Priority-ordered, time-budgeted executor of hydration tasks.
///
/// Owned by the runtime context; mutated only by the UI thread.
pub struct HydrationScheduler {
    config: SchedulerConfig,
    queue: BinaryHeap<QueuedTask>,
    phase: SchedulerPhase,
    pacer: Box<dyn BatchPacer>,
    next_seq: u64,
    next_task_id: u64,
    paused_until: Option<Duration>,
    work_outstanding: bool,
    on_all_complete: Option<Box<dyn FnMut()>>,
}

impl HydrationScheduler {
    /// Creates a scheduler, choosing the pacing strategy once from the
    /// platform capability probe.
    pub fn new(config: SchedulerConfig, capabilities: SchedulingCapabilities) -> Self {
        let pacer = pacer_for(capabilities, &config);
        Self {
            config,
            queue: BinaryHeap::new(),
            phase: SchedulerPhase::Idle,
            pacer,
            next_seq: 0,
            next_task_id: 0,
            paused_until: None,
            work_outstanding: false,
            on_all_complete: None,
        }
    }

    /// Registers the callback fired when the queue transitions from
    /// non-empty to empty. Fires exactly once per transition.
    pub fn set_on_all_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_all_complete = Some(Box::new(callback));
    }

    /// Inserts a task, preserving priority order and FIFO within a band.
    ///
    /// If the scheduler was idle it transitions to `Scheduled` by
    /// requesting a platform batch.
    ///
    /// ## Returns
    /// The id assigned to the task.
    pub fn schedule(&mut self, task: HydrationTask, source: &mut dyn BatchSource) -> TaskId {
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;

        log::trace!(
            "Scheduling {id} for '{}' at {} priority",
            task.target,
            task.priority
        );
        self.queue.push(QueuedTask { id, seq, task });
        self.work_outstanding = true;

        if self.phase == SchedulerPhase::Idle {
            let handle = source.request_batch();
            self.phase = SchedulerPhase::Scheduled(handle);
            log::trace!("Scheduler idle -> scheduled ({handle})");
        }
        id
    }

    /// Executes a task immediately, bypassing the queue entirely.
    ///
    /// This is the synchronous mode used for deterministic tests. It
    /// defeats the non-blocking guarantee and must never run in
    /// production.
    pub fn execute_now(
        &mut self,
        task: HydrationTask,
        mut on_hydrated: impl FnMut(&TargetId),
    ) -> TaskId {
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;
        let target = task.target.clone();
        let (success, _duration) = Self::execute_task(id, task, self.config.long_task_threshold());
        if success {
            on_hydrated(&target);
        }
        id
    }

    /// Notes a scroll event: batches are deferred whole until the pause
    /// window after `timestamp` has passed.
    pub fn note_scroll(&mut self, timestamp: Duration) {
        self.paused_until = Some(timestamp + self.config.scroll_pause());
    }

    /// Returns `true` if scroll activity is still fresh at `now`.
    pub fn is_paused(&self, now: Duration) -> bool {
        self.paused_until.is_some_and(|until| now < until)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    /// Number of tasks waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Runs one granted batch.
    ///
    /// Pops and executes tasks in priority order while the pacer allows,
    /// invoking `on_hydrated` with each successfully hydrated target
    /// *immediately* after its task completes (the runtime replays
    /// buffered events there, before the next task runs). Yields by
    /// re-requesting a batch when the pacer says time is up; defers the
    /// whole batch without popping anything while scroll activity is
    /// fresh.
    ///
    /// Grants that do not match the outstanding request are stale and
    /// ignored.
    pub fn run_batch(
        &mut self,
        handle: BatchHandle,
        deadline: Option<Duration>,
        clock: &dyn MonotonicClock,
        source: &mut dyn BatchSource,
        mut on_hydrated: impl FnMut(&TargetId),
    ) -> BatchReport {
        let mut report = BatchReport::default();

        match self.phase {
            SchedulerPhase::Scheduled(expected) if expected == handle => {}
            _ => {
                log::trace!("Ignoring stale batch grant ({handle})");
                report.stale_grant = true;
                return report;
            }
        }

        if self.is_paused(clock.now()) {
            let next = source.request_batch();
            self.phase = SchedulerPhase::Scheduled(next);
            report.deferred_by_scroll = true;
            log::trace!("Batch deferred by scroll; re-requested as {next}");
            return report;
        }

        self.phase = SchedulerPhase::Executing;
        self.pacer.begin_batch(deadline);
        let long_threshold = self.config.long_task_threshold();

        loop {
            if self.is_paused(clock.now()) || self.pacer.should_yield() {
                if !self.queue.is_empty() {
                    report.yielded = true;
                }
                break;
            }
            let Some(queued) = self.queue.pop() else {
                break;
            };
            let target = queued.task.target.clone();
            let (success, duration) = Self::execute_task(queued.id, queued.task, long_threshold);
            report.executed += 1;
            if duration > long_threshold {
                report.long_tasks += 1;
            }
            if success {
                on_hydrated(&target);
            } else {
                report.failed += 1;
            }
        }

        if self.queue.is_empty() {
            self.phase = SchedulerPhase::Idle;
            report.drained = true;
            if self.work_outstanding {
                self.work_outstanding = false;
                log::info!("All hydration tasks complete");
                if let Some(callback) = self.on_all_complete.as_mut() {
                    callback();
                }
            }
        } else {
            let next = source.request_batch();
            self.phase = SchedulerPhase::Scheduled(next);
        }
        report
    }

    /// Cancels any outstanding platform request and drops all queued
    /// tasks. A task already mid-execution cannot be interrupted (there is
    /// none here: `stop` runs between batches on the owning thread).
    /// Idempotent.
    pub fn stop(&mut self, source: &mut dyn BatchSource) {
        if let SchedulerPhase::Scheduled(handle) = self.phase {
            source.cancel_batch(handle);
        }
        let dropped = self.queue.len();
        self.queue.clear();
        self.work_outstanding = false;
        self.phase = SchedulerPhase::Idle;
        if dropped > 0 {
            log::info!("Scheduler stopped; dropped {dropped} queued task(s)");
        }
    }

    // Runs one task with error isolation: an error return or a panic is
    // reported through `on_error` and never escapes to the batch.
    fn execute_task(id: TaskId, task: HydrationTask, long_threshold: Duration) -> (bool, Duration) {
        let HydrationTask {
            target,
            priority: _,
            execute,
            on_complete,
            on_error,
        } = task;

        let watch = Stopwatch::new();
        let outcome = catch_unwind(AssertUnwindSafe(execute));
        let duration = watch.elapsed();

        if duration > long_threshold {
            log::warn!(
                "Hydration {id} for '{target}' ran {duration:?} (> {long_threshold:?}); consider splitting the task"
            );
        }

        match outcome {
            Ok(Ok(())) => {
                log::debug!("Hydrated '{target}' in {duration:?}");
                if let Some(callback) = on_complete {
                    callback();
                }
                (true, duration)
            }
            Ok(Err(err)) => {
                log::warn!("Hydration {id} for '{target}' failed: {err}");
                if let Some(callback) = on_error {
                    callback(&err);
                }
                (false, duration)
            }
            Err(panic) => {
                let message = panic_message(panic);
                log::error!("Hydration {id} for '{target}' panicked: {message}");
                let err = TaskError::Panicked(message);
                if let Some(callback) = on_error {
                    callback(&err);
                }
                (false, duration)
            }
        }
    }
}

impl fmt::Debug for HydrationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationScheduler")
            .field("phase", &self.phase)
            .field("pending", &self.queue.len())
            .field("strategy", &self.pacer.strategy_name())
            .finish()
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Self-contained batch source counting requests and cancellations.
    #[derive(Debug, Default)]
    struct StubSource {
        next_handle: u64,
        requested: Vec<BatchHandle>,
        cancelled: Vec<BatchHandle>,
        idle_deadline: bool,
    }

    impl BatchSource for StubSource {
        fn request_batch(&mut self) -> BatchHandle {
            let handle = BatchHandle(self.next_handle);
            self.next_handle += 1;
            self.requested.push(handle);
            handle
        }

        fn cancel_batch(&mut self, handle: BatchHandle) {
            self.cancelled.push(handle);
        }

        fn capabilities(&self) -> SchedulingCapabilities {
            SchedulingCapabilities {
                idle_deadline: self.idle_deadline,
            }
        }
    }

    #[derive(Debug, Default)]
    struct FrozenClock {
        now: Duration,
    }

    impl MonotonicClock for FrozenClock {
        fn now(&self) -> Duration {
            self.now
        }
    }

    fn scheduler() -> HydrationScheduler {
        HydrationScheduler::new(
            SchedulerConfig::default(),
            SchedulingCapabilities { idle_deadline: true },
        )
    }

    fn recording_task(target: &str, priority: TaskPriority, ran: &Rc<RefCell<Vec<String>>>) -> HydrationTask {
        let ran = Rc::clone(ran);
        let name = target.to_string();
        HydrationTask::new(target, priority, move || {
            ran.borrow_mut().push(name);
            Ok(())
        })
    }

    #[test]
    fn scheduling_while_idle_requests_one_batch() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let ran = Rc::new(RefCell::new(Vec::new()));

        sched.schedule(recording_task("a", TaskPriority::Normal, &ran), &mut source);
        sched.schedule(recording_task("b", TaskPriority::Normal, &ran), &mut source);

        assert_eq!(source.requested.len(), 1, "only the idle->scheduled edge requests");
        assert_eq!(sched.phase(), SchedulerPhase::Scheduled(BatchHandle(0)));
        assert_eq!(sched.pending(), 2);
    }

    /// Tasks scheduled [Low, Critical, Normal] execute [Critical, Normal,
    /// Low]; within a band submission order is preserved.
    #[test]
    fn execution_order_is_priority_then_fifo() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let clock = FrozenClock::default();
        let ran = Rc::new(RefCell::new(Vec::new()));

        sched.schedule(recording_task("low-1", TaskPriority::Low, &ran), &mut source);
        sched.schedule(recording_task("crit-1", TaskPriority::Critical, &ran), &mut source);
        sched.schedule(recording_task("norm-1", TaskPriority::Normal, &ran), &mut source);
        sched.schedule(recording_task("norm-2", TaskPriority::Normal, &ran), &mut source);

        let report = sched.run_batch(
            BatchHandle(0),
            Some(Duration::from_secs(1)),
            &clock,
            &mut source,
            |_| {},
        );

        assert_eq!(report.executed, 4);
        assert!(report.drained);
        assert_eq!(
            *ran.borrow(),
            vec!["crit-1", "norm-1", "norm-2", "low-1"],
            "strict priority across bands, FIFO within"
        );
        assert_eq!(sched.phase(), SchedulerPhase::Idle);
    }

    #[test]
    fn hydrated_targets_are_reported_in_completion_order() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let clock = FrozenClock::default();
        let ran = Rc::new(RefCell::new(Vec::new()));

        sched.schedule(recording_task("a", TaskPriority::Normal, &ran), &mut source);
        sched.schedule(recording_task("b", TaskPriority::High, &ran), &mut source);

        let mut hydrated = Vec::new();
        sched.run_batch(
            BatchHandle(0),
            Some(Duration::from_secs(1)),
            &clock,
            &mut source,
            |target| hydrated.push(target.to_string()),
        );
        assert_eq!(hydrated, vec!["b", "a"]);
    }

    /// A failing task reports through on_error and never aborts the batch;
    /// the remaining tasks still run.
    #[test]
    fn task_failure_is_isolated_from_the_batch() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let clock = FrozenClock::default();
        let ran = Rc::new(RefCell::new(Vec::new()));
        let errors = Rc::new(RefCell::new(Vec::new()));

        let errors_in = Rc::clone(&errors);
        sched.schedule(
            HydrationTask::new("bad", TaskPriority::Critical, || {
                Err(TaskError::failed("render exploded"))
            })
            .on_error(move |err| errors_in.borrow_mut().push(err.to_string())),
            &mut source,
        );
        sched.schedule(recording_task("good", TaskPriority::Normal, &ran), &mut source);

        let mut hydrated = Vec::new();
        let report = sched.run_batch(
            BatchHandle(0),
            Some(Duration::from_secs(1)),
            &clock,
            &mut source,
            |target| hydrated.push(target.to_string()),
        );

        assert_eq!(report.executed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(hydrated, vec!["good"], "failed task is never marked hydrated");
        assert_eq!(errors.borrow().len(), 1);
        assert!(errors.borrow()[0].contains("render exploded"));
    }

    #[test]
    fn panicking_task_is_caught_and_reported() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let clock = FrozenClock::default();
        let errors = Rc::new(RefCell::new(Vec::new()));

        let errors_in = Rc::clone(&errors);
        sched.schedule(
            HydrationTask::new("boom", TaskPriority::Normal, || panic!("kaboom"))
                .on_error(move |err| errors_in.borrow_mut().push(err.to_string())),
            &mut source,
        );

        let report = sched.run_batch(
            BatchHandle(0),
            Some(Duration::from_secs(1)),
            &clock,
            &mut source,
            |_| {},
        );

        assert_eq!(report.failed, 1);
        assert!(report.drained);
        assert!(errors.borrow()[0].contains("kaboom"));
    }

    /// An exhausted deadline yields without popping anything and
    /// re-requests a batch; the queue is intact.
    #[test]
    fn exhausted_deadline_yields_and_rerequests() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let clock = FrozenClock::default();
        let ran = Rc::new(RefCell::new(Vec::new()));

        sched.schedule(recording_task("a", TaskPriority::Normal, &ran), &mut source);

        let report = sched.run_batch(
            BatchHandle(0),
            Some(Duration::ZERO),
            &clock,
            &mut source,
            |_| {},
        );

        assert!(report.yielded);
        assert_eq!(report.executed, 0);
        assert_eq!(sched.pending(), 1);
        assert_eq!(sched.phase(), SchedulerPhase::Scheduled(BatchHandle(1)));
    }

    #[test]
    fn scroll_defers_whole_batch() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let mut clock = FrozenClock::default();
        let ran = Rc::new(RefCell::new(Vec::new()));

        sched.schedule(recording_task("a", TaskPriority::Normal, &ran), &mut source);

        clock.now = Duration::from_millis(1_000);
        sched.note_scroll(Duration::from_millis(1_000));
        let report = sched.run_batch(
            BatchHandle(0),
            Some(Duration::from_secs(1)),
            &clock,
            &mut source,
            |_| {},
        );
        assert!(report.deferred_by_scroll);
        assert_eq!(report.executed, 0);
        assert!(ran.borrow().is_empty());

        // Past the pause window the re-requested batch runs normally.
        clock.now = Duration::from_millis(1_200);
        let report = sched.run_batch(
            BatchHandle(1),
            Some(Duration::from_secs(1)),
            &clock,
            &mut source,
            |_| {},
        );
        assert!(report.drained);
        assert_eq!(*ran.borrow(), vec!["a"]);
    }

    #[test]
    fn stale_grants_are_ignored() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let clock = FrozenClock::default();
        let ran = Rc::new(RefCell::new(Vec::new()));

        sched.schedule(recording_task("a", TaskPriority::Normal, &ran), &mut source);

        let report = sched.run_batch(
            BatchHandle(41),
            Some(Duration::from_secs(1)),
            &clock,
            &mut source,
            |_| {},
        );
        assert!(report.stale_grant);
        assert_eq!(sched.pending(), 1);
        assert_eq!(sched.phase(), SchedulerPhase::Scheduled(BatchHandle(0)));
    }

    /// on_all_complete fires exactly once when the queue drains, and not
    /// again on later empty batches.
    #[test]
    fn all_complete_fires_once_per_drain() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let clock = FrozenClock::default();
        let ran = Rc::new(RefCell::new(Vec::new()));
        let fired = Rc::new(RefCell::new(0u32));

        let fired_in = Rc::clone(&fired);
        sched.set_on_all_complete(move || *fired_in.borrow_mut() += 1);

        sched.schedule(recording_task("a", TaskPriority::Normal, &ran), &mut source);
        sched.run_batch(
            BatchHandle(0),
            Some(Duration::from_secs(1)),
            &clock,
            &mut source,
            |_| {},
        );
        assert_eq!(*fired.borrow(), 1);

        // A second registration drains again: the transition fires again,
        // but never twice for one drain.
        sched.schedule(recording_task("b", TaskPriority::Normal, &ran), &mut source);
        sched.run_batch(
            BatchHandle(1),
            Some(Duration::from_secs(1)),
            &clock,
            &mut source,
            |_| {},
        );
        assert_eq!(*fired.borrow(), 2);
    }

    #[test]
    fn stop_cancels_and_clears_idempotently() {
        let mut sched = scheduler();
        let mut source = StubSource::default();
        let ran = Rc::new(RefCell::new(Vec::new()));

        sched.schedule(recording_task("a", TaskPriority::Normal, &ran), &mut source);
        sched.stop(&mut source);

        assert_eq!(sched.pending(), 0);
        assert_eq!(sched.phase(), SchedulerPhase::Idle);
        assert_eq!(source.cancelled, vec![BatchHandle(0)]);

        // Second stop is a no-op.
        sched.stop(&mut source);
        assert_eq!(source.cancelled.len(), 1);
    }

    #[test]
    fn execute_now_bypasses_queue() {
        let mut sched = scheduler();
        let ran = Rc::new(RefCell::new(Vec::new()));
        let mut hydrated = Vec::new();

        sched.execute_now(
            recording_task("sync-1", TaskPriority::Low, &ran),
            |target| hydrated.push(target.to_string()),
        );

        assert_eq!(*ran.borrow(), vec!["sync-1"]);
        assert_eq!(hydrated, vec!["sync-1"]);
        assert_eq!(sched.pending(), 0);
        assert_eq!(sched.phase(), SchedulerPhase::Idle);
    }
}
