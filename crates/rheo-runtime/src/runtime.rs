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

//! The hydration runtime façade.
//!
//! [`HydrationRuntime`] is the explicit per-page-load context: it owns the
//! host page, the clock, the platform batch source, the event buffer, the
//! hydrated set, the scheduler, and the dispatcher. There are no global
//! singletons; tests construct fresh instances.
//!
//! The delegated listener is installed during construction — strictly
//! before any hydration task can execute — so no interaction is ever
//! silently lost.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde_json::Value;

use rheo_core::dom::{HostPage, TargetId, ATTR_ACTION};
use rheo_core::event::{InteractionEvent, InterestMask, PageSignal};
use rheo_core::platform::{BatchHandle, BatchSource, MonotonicClock};

use crate::buffer::EventBuffer;
use crate::config::RuntimeConfig;
use crate::dispatch::ClientDispatcher;
use crate::listener::{self, Disposition};
use crate::sched::{HydrationScheduler, HydrationTask, TaskError, TaskId, TaskPriority};
use crate::telemetry::{RuntimeTelemetry, TelemetrySnapshot};

/// One component registered against a hydration marker in the existing
/// DOM.
pub struct ComponentRegistration {
    /// Id of the marked element this component owns.
    pub marker_id: TargetId,
    /// Component kind name, for diagnostics.
    pub kind: String,
    /// Priority band of the hydration task created for this component.
    pub priority: TaskPriority,
    /// Props forwarded to the render function.
    pub props: Value,
    render: Box<dyn FnOnce(&Value) -> Result<(), TaskError>>,
}

impl ComponentRegistration {
    /// Creates a registration at [`TaskPriority::Normal`].
    pub fn new(
        marker_id: impl Into<TargetId>,
        kind: impl Into<String>,
        props: Value,
        render: impl FnOnce(&Value) -> Result<(), TaskError> + 'static,
    ) -> Self {
        Self {
            marker_id: marker_id.into(),
            kind: kind.into(),
            priority: TaskPriority::Normal,
            props,
            render: Box::new(render),
        }
    }

    /// Overrides the priority band.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}

impl fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("marker_id", &self.marker_id)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .finish()
    }
}

/// The runtime context consumed by the host.
///
/// Generic over the host page and clock so tests inject the in-memory
/// implementations; the batch source is a boxed strategy chosen by the
/// platform probe at startup.
pub struct HydrationRuntime<P: HostPage, C: MonotonicClock> {
    page: P,
    clock: C,
    source: Box<dyn BatchSource>,
    signals: flume::Receiver<PageSignal>,
    buffer: EventBuffer,
    hydrated: HashSet<TargetId>,
    scheduler: HydrationScheduler,
    dispatcher: ClientDispatcher,
    telemetry: RuntimeTelemetry,
    config: RuntimeConfig,
}

impl<P: HostPage, C: MonotonicClock> HydrationRuntime<P, C> {
    /// Builds the runtime and installs the delegated listener immediately.
    ///
    /// ## Arguments
    /// * `page` - The pre-rendered document, already carrying hydration
    ///   markers.
    /// * `clock` - The monotonic clock staleness and pauses are measured
    ///   against.
    /// * `source` - The platform batch source; its capability probe picks
    ///   the pacing strategy once, here.
    /// * `signals` - Receiver end of the page signal bus the platform
    ///   glue publishes into.
    /// * `config` - Runtime knobs.
    pub fn new(
        mut page: P,
        clock: C,
        source: Box<dyn BatchSource>,
        signals: flume::Receiver<PageSignal>,
        config: RuntimeConfig,
    ) -> Self {
        // Listener first: interactions must be observable before any task
        // executes.
        listener::ensure_installed(&mut page, InterestMask::default());

        let scheduler = HydrationScheduler::new(config.scheduler.clone(), source.capabilities());
        if config.scheduler.synchronous {
            log::warn!("Synchronous scheduling enabled; this is a test-only mode");
        }

        Self {
            page,
            clock,
            source,
            signals,
            buffer: EventBuffer::new(config.buffer.clone()),
            hydrated: HashSet::new(),
            scheduler,
            dispatcher: ClientDispatcher::new(),
            telemetry: RuntimeTelemetry::new(),
            config,
        }
    }

    /// Registers a component against its marker and schedules its
    /// hydration task.
    ///
    /// ## Returns
    /// The id of the scheduled task.
    pub fn register_component(&mut self, registration: ComponentRegistration) -> TaskId {
        let ComponentRegistration {
            marker_id,
            kind,
            priority,
            props,
            render,
        } = registration;

        if !self.page.contains(&marker_id) {
            log::warn!("Registering {kind} component on missing marker '{marker_id}'");
        }
        log::debug!("Registering {kind} component on '{marker_id}' ({priority})");

        let task = HydrationTask::new(marker_id, priority, move || render(&props));

        if self.config.scheduler.synchronous {
            let Self {
                page,
                clock,
                buffer,
                hydrated,
                scheduler,
                dispatcher,
                telemetry,
                ..
            } = self;
            let clock_ref: &C = clock;
            scheduler.execute_now(task, |target| {
                hydrate_target(
                    page,
                    buffer,
                    hydrated,
                    dispatcher,
                    telemetry,
                    clock_ref.now(),
                    target,
                )
            })
        } else {
            self.scheduler.schedule(task, &mut *self.source)
        }
    }

    /// Drains and processes every pending page signal, in publication
    /// order.
    ///
    /// ## Returns
    /// The number of signals processed.
    pub fn pump(&mut self) -> usize {
        let signals: Vec<PageSignal> = self.signals.try_iter().collect();
        let count = signals.len();
        for signal in signals {
            match signal {
                PageSignal::Interaction(event) => {
                    self.observe_interaction(event);
                }
                PageSignal::Scrolled { timestamp } => {
                    log::trace!("Scroll at {timestamp:?}; deferring batches");
                    self.scheduler.note_scroll(timestamp);
                }
                PageSignal::BatchGranted { handle, deadline } => {
                    self.run_granted_batch(handle, deadline);
                }
            }
        }
        count
    }

    /// Observes one interaction from the delegated listener and decides
    /// its fate: buffered (target not yet hydrated), dispatched
    /// immediately (target hydrated), or ignored (no marked owner).
    ///
    /// Hosts that need the suppress-default decision synchronously call
    /// this directly from the listener callback instead of going through
    /// the bus.
    pub fn observe_interaction(&mut self, event: InteractionEvent) -> Disposition {
        let Some(resolved) = listener::resolve_target(&self.page, &event.target) else {
            log::trace!("No marked owner for '{}'; ignoring {}", event.target, event.kind);
            return Disposition::Ignore;
        };

        let disposition = listener::dispose(resolved, &self.hydrated);
        match &disposition {
            Disposition::Buffer { target } => {
                log::debug!("Buffering {} for not-yet-hydrated '{target}'", event.kind);
                let record = InteractionEvent::new(event.kind, target.clone(), event.timestamp);
                let evicted = self.buffer.capture(record);
                self.telemetry.record_buffered(evicted);
            }
            Disposition::Dispatch { target, action } => match action {
                Some(payload) => {
                    let outcome = self.dispatcher.dispatch(&mut self.page, payload);
                    self.telemetry.record_dispatch(outcome.is_dropped());
                }
                None => {
                    log::trace!("'{target}' is hydrated with no direct action; component handlers own it");
                }
            },
            Disposition::Ignore => {}
        }
        disposition
    }

    /// Marks a target hydrated and then replays its buffered events, in
    /// that order, so replays are treated as live dispatches and never
    /// re-buffered.
    ///
    /// Public so alternative hydration drivers (not only the built-in
    /// scheduler) can participate in the buffering/replay guarantee.
    pub fn mark_hydrated(&mut self, target: &TargetId) {
        let Self {
            page,
            clock,
            buffer,
            hydrated,
            dispatcher,
            telemetry,
            ..
        } = self;
        hydrate_target(page, buffer, hydrated, dispatcher, telemetry, clock.now(), target);
    }

    /// Whether a target is in the hydrated set.
    pub fn is_hydrated(&self, target: &TargetId) -> bool {
        self.hydrated.contains(target)
    }

    /// Registers the host-visible signal that the page has become fully
    /// interactive. Fires exactly once per queue drain.
    pub fn set_on_all_complete(&mut self, callback: impl FnMut() + 'static) {
        self.scheduler.set_on_all_complete(callback);
    }

    /// Sweeps expired entries out of the event buffer, covering targets
    /// that will never hydrate (e.g. conditionally removed elements).
    pub fn prune_stale(&mut self) {
        let pruned = self.buffer.prune_stale(self.clock.now());
        self.telemetry.record_pruned(pruned);
    }

    /// Cancels any outstanding batch request and drops all queued tasks.
    /// Idempotent; a task already mid-execution cannot be interrupted.
    pub fn stop(&mut self) {
        self.scheduler.stop(&mut *self.source);
    }

    /// A point-in-time copy of the runtime counters.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    /// Number of hydration tasks still queued.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Read access to the event buffer, for host diagnostics.
    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    /// Read access to the host page.
    pub fn page(&self) -> &P {
        &self.page
    }

    /// Mutable access to the host page (demo and test fixtures).
    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    // Runs one granted batch, replaying buffered events for each target
    // the moment its task completes.
    fn run_granted_batch(&mut self, handle: BatchHandle, deadline: Option<Duration>) {
        let Self {
            page,
            clock,
            source,
            buffer,
            hydrated,
            scheduler,
            dispatcher,
            telemetry,
            ..
        } = self;
        let clock_ref: &C = clock;

        let report = scheduler.run_batch(handle, deadline, clock_ref, &mut **source, |target| {
            hydrate_target(
                page,
                buffer,
                hydrated,
                dispatcher,
                telemetry,
                clock_ref.now(),
                target,
            )
        });

        if report.stale_grant {
            return;
        }
        if report.deferred_by_scroll {
            telemetry.record_scroll_deferral();
        } else {
            telemetry.record_batch(
                report.executed,
                report.failed,
                report.long_tasks,
                report.yielded,
            );
        }
    }
}

impl<P: HostPage, C: MonotonicClock> fmt::Debug for HydrationRuntime<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationRuntime")
            .field("hydrated", &self.hydrated.len())
            .field("buffered", &self.buffer.total_count())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

// Inserts into the hydrated set first, then replays: replayed events go
// through the same dispatch path as live ones.
fn hydrate_target<P: HostPage>(
    page: &mut P,
    buffer: &mut EventBuffer,
    hydrated: &mut HashSet<TargetId>,
    dispatcher: &ClientDispatcher,
    telemetry: &mut RuntimeTelemetry,
    now: Duration,
    target: &TargetId,
) {
    if !hydrated.insert(target.clone()) {
        log::trace!("'{target}' was already hydrated");
    }

    let report = buffer.replay_for(target, now, |event| {
        deliver_replayed(page, dispatcher, telemetry, event);
    });
    if report.replayed > 0 || report.dropped_stale > 0 {
        log::debug!(
            "Replayed {} event(s) for '{target}', dropped {} stale",
            report.replayed,
            report.dropped_stale
        );
    }
    telemetry.record_replay(report.replayed, report.dropped_stale);
}

// Delivers one replayed event exactly as a live dispatch would have.
fn deliver_replayed<P: HostPage>(
    page: &mut P,
    dispatcher: &ClientDispatcher,
    telemetry: &mut RuntimeTelemetry,
    event: InteractionEvent,
) {
    match page.attribute(&event.target, ATTR_ACTION) {
        Some(payload) => {
            let outcome = dispatcher.dispatch(page, &payload);
            telemetry.record_dispatch(outcome.is_dropped());
        }
        None => {
            log::trace!(
                "Replayed {} for '{}' has no direct action; component handlers own it",
                event.kind,
                event.target
            );
        }
    }
}
