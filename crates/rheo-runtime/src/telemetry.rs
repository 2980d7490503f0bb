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

//! Runtime counters and snapshots.
//!
//! Counters only ever increase for the life of the page. The snapshot is
//! serde-serializable so hosts can forward it to whatever observability
//! pipeline they run; richer diagnostics stay on the `log` facade.

use serde::Serialize;

/// Monotonic counters describing what the runtime has done so far.
#[derive(Debug, Default)]
pub struct RuntimeTelemetry {
    tasks_executed: u64,
    tasks_failed: u64,
    long_tasks: u64,
    batches_run: u64,
    batches_yielded: u64,
    batches_deferred_by_scroll: u64,
    events_buffered: u64,
    events_replayed: u64,
    events_evicted: u64,
    events_dropped_stale: u64,
    dispatches_completed: u64,
    dispatches_dropped: u64,
}

impl RuntimeTelemetry {
    /// Creates a zeroed telemetry record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome counts of one executed batch.
    pub fn record_batch(&mut self, executed: u64, failed: u64, long: u64, yielded: bool) {
        self.batches_run += 1;
        self.tasks_executed += executed;
        self.tasks_failed += failed;
        self.long_tasks += long;
        if yielded {
            self.batches_yielded += 1;
        }
    }

    /// Records a batch deferred whole because scroll activity was fresh.
    pub fn record_scroll_deferral(&mut self) {
        self.batches_deferred_by_scroll += 1;
    }

    /// Records one event buffered, and whether capturing it evicted the
    /// oldest entry of a full queue.
    pub fn record_buffered(&mut self, evicted: bool) {
        self.events_buffered += 1;
        if evicted {
            self.events_evicted += 1;
        }
    }

    /// Records the result of one replay drain.
    pub fn record_replay(&mut self, replayed: u64, dropped_stale: u64) {
        self.events_replayed += replayed;
        self.events_dropped_stale += dropped_stale;
    }

    /// Records events dropped by a staleness sweep.
    pub fn record_pruned(&mut self, pruned: u64) {
        self.events_dropped_stale += pruned;
    }

    /// Records one dispatch attempt.
    pub fn record_dispatch(&mut self, dropped: bool) {
        if dropped {
            self.dispatches_dropped += 1;
        } else {
            self.dispatches_completed += 1;
        }
    }

    /// Takes a serializable copy of every counter.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            tasks_executed: self.tasks_executed,
            tasks_failed: self.tasks_failed,
            long_tasks: self.long_tasks,
            batches_run: self.batches_run,
            batches_yielded: self.batches_yielded,
            batches_deferred_by_scroll: self.batches_deferred_by_scroll,
            events_buffered: self.events_buffered,
            events_replayed: self.events_replayed,
            events_evicted: self.events_evicted,
            events_dropped_stale: self.events_dropped_stale,
            dispatches_completed: self.dispatches_completed,
            dispatches_dropped: self.dispatches_dropped,
        }
    }
}

/// A point-in-time copy of the runtime counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    /// Hydration tasks that ran to completion.
    pub tasks_executed: u64,
    /// Hydration tasks that returned an error or panicked.
    pub tasks_failed: u64,
    /// Tasks whose individual duration exceeded the long-task threshold.
    pub long_tasks: u64,
    /// Platform batches in which at least the budget check ran.
    pub batches_run: u64,
    /// Batches that ended by yielding with work still queued.
    pub batches_yielded: u64,
    /// Batches deferred whole because of fresh scroll activity.
    pub batches_deferred_by_scroll: u64,
    /// Interactions buffered for not-yet-hydrated targets.
    pub events_buffered: u64,
    /// Buffered interactions replayed after hydration.
    pub events_replayed: u64,
    /// Buffered interactions evicted by per-target overflow.
    pub events_evicted: u64,
    /// Buffered interactions discarded as stale.
    pub events_dropped_stale: u64,
    /// Actions dispatched successfully.
    pub dispatches_completed: u64,
    /// Dispatch attempts dropped at a boundary (malformed payload, missing
    /// target, unknown kind).
    pub dispatches_dropped: u64,
}
