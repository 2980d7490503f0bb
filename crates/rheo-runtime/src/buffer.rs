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

//! Pre-hydration event buffering.
//!
//! The buffer guarantees that no interaction targeting a not-yet-hydrated
//! element is lost: events queue per target, bounded and in capture order,
//! until the target hydrates and drains them. Entries that outlive the
//! configured maximum age are discarded rather than replayed — a stale
//! replay is considered unsafe, and discarding is the expected outcome,
//! not an error.

use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use rheo_core::dom::TargetId;
use rheo_core::event::InteractionEvent;

use crate::config::EventBufferConfig;

/// What a replay drain did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayReport {
    /// Events handed to the replay handler.
    pub replayed: u64,
    /// Events discarded because their age exceeded the maximum.
    pub dropped_stale: u64,
    /// Handler invocations that panicked (isolated, never propagated).
    pub handler_failures: u64,
}

/// Per-target bounded queues of interaction events.
///
/// Owned by the runtime context and mutated only on the UI thread.
#[derive(Debug)]
pub struct EventBuffer {
    queues: HashMap<TargetId, VecDeque<InteractionEvent>>,
    config: EventBufferConfig,
}

impl EventBuffer {
    /// Creates an empty buffer with the given limits.
    pub fn new(config: EventBufferConfig) -> Self {
        Self {
            queues: HashMap::new(),
            config,
        }
    }

    /// Appends an event to its target's queue.
    ///
    /// When the queue is at capacity the oldest entry is evicted first, so
    /// memory stays bounded under event storms while the most recent
    /// interactions survive.
    ///
    /// ## Returns
    /// `true` if capturing evicted an older entry.
    pub fn capture(&mut self, event: InteractionEvent) -> bool {
        let queue = self.queues.entry(event.target.clone()).or_default();
        let mut evicted = false;
        while queue.len() >= self.config.max_events_per_target {
            let dropped = queue.pop_front();
            evicted = true;
            if let Some(dropped) = dropped {
                log::debug!(
                    "Event buffer full for '{}'; evicting oldest {} event",
                    dropped.target,
                    dropped.kind
                );
            }
        }
        queue.push_back(event);
        evicted
    }

    /// Removes and replays every queued event for `target`, in original
    /// capture order.
    ///
    /// Entries whose age at `now` exceeds the configured maximum are
    /// discarded silently. A panic inside the handler is isolated per
    /// entry: one bad replay never blocks the rest of the queue.
    pub fn replay_for<F>(&mut self, target: &TargetId, now: Duration, mut handler: F) -> ReplayReport
    where
        F: FnMut(InteractionEvent),
    {
        let mut report = ReplayReport::default();
        let Some(queue) = self.queues.remove(target) else {
            return report;
        };

        let max_age = self.config.max_age();
        for event in queue {
            if event.age(now) > max_age {
                log::trace!(
                    "Discarding stale {} event for '{}' (age {:?})",
                    event.kind,
                    event.target,
                    event.age(now)
                );
                report.dropped_stale += 1;
                continue;
            }
            report.replayed += 1;
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(event)));
            if outcome.is_err() {
                report.handler_failures += 1;
                log::error!("Replay handler panicked for '{target}'; continuing with remaining events");
            }
        }
        report
    }

    /// Sweeps every target's queue, discarding expired entries.
    ///
    /// Covers elements that never hydrate (e.g. conditionally removed from
    /// the page) so their queues cannot pin memory forever.
    ///
    /// ## Returns
    /// The number of entries discarded.
    pub fn prune_stale(&mut self, now: Duration) -> u64 {
        let max_age = self.config.max_age();
        let mut pruned = 0;
        for queue in self.queues.values_mut() {
            let before = queue.len();
            queue.retain(|event| event.age(now) <= max_age);
            pruned += (before - queue.len()) as u64;
        }
        self.queues.retain(|_, queue| !queue.is_empty());
        if pruned > 0 {
            log::debug!("Pruned {pruned} stale buffered event(s)");
        }
        pruned
    }

    /// Returns `true` if any events are queued for `target`.
    pub fn has_events_for(&self, target: &TargetId) -> bool {
        self.queues.get(target).is_some_and(|q| !q.is_empty())
    }

    /// Number of events queued for `target`.
    pub fn count_for(&self, target: &TargetId) -> usize {
        self.queues.get(target).map_or(0, VecDeque::len)
    }

    /// Total number of events queued across all targets.
    pub fn total_count(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rheo_core::event::InteractionKind;

    fn event_at(target: &str, ms: u64) -> InteractionEvent {
        InteractionEvent::new(
            InteractionKind::PointerActivate,
            target,
            Duration::from_millis(ms),
        )
    }

    fn small_buffer(max_per_target: usize) -> EventBuffer {
        EventBuffer::new(EventBufferConfig {
            max_events_per_target: max_per_target,
            max_age_ms: 1_000,
        })
    }

    #[test]
    fn capture_and_query() {
        let mut buffer = small_buffer(4);
        assert!(!buffer.has_events_for(&TargetId::from("btn-1")));

        buffer.capture(event_at("btn-1", 10));
        buffer.capture(event_at("btn-1", 20));
        buffer.capture(event_at("row-5", 30));

        assert!(buffer.has_events_for(&TargetId::from("btn-1")));
        assert_eq!(buffer.count_for(&TargetId::from("btn-1")), 2);
        assert_eq!(buffer.count_for(&TargetId::from("row-5")), 1);
        assert_eq!(buffer.total_count(), 3);
    }

    /// Capturing 3 events with a capacity of 2 keeps exactly the 2 most
    /// recent.
    #[test]
    fn overflow_evicts_oldest_first() {
        let mut buffer = small_buffer(2);
        let target = TargetId::from("btn-1");

        assert!(!buffer.capture(event_at("btn-1", 10)));
        assert!(!buffer.capture(event_at("btn-1", 20)));
        assert!(buffer.capture(event_at("btn-1", 30)));

        assert_eq!(buffer.count_for(&target), 2);
        let mut replayed = Vec::new();
        buffer.replay_for(&target, Duration::from_millis(40), |ev| {
            replayed.push(ev.timestamp)
        });
        assert_eq!(
            replayed,
            vec![Duration::from_millis(20), Duration::from_millis(30)]
        );
    }

    #[test]
    fn replay_preserves_capture_order_and_consumes() {
        let mut buffer = small_buffer(8);
        let target = TargetId::from("row-5");
        for ms in [5, 6, 7] {
            buffer.capture(event_at("row-5", ms));
        }

        let mut seen = Vec::new();
        let report = buffer.replay_for(&target, Duration::from_millis(10), |ev| {
            seen.push(ev.timestamp.as_millis() as u64)
        });

        assert_eq!(seen, vec![5, 6, 7]);
        assert_eq!(report.replayed, 3);
        assert_eq!(report.dropped_stale, 0);
        // Consumed exactly once: a second drain finds nothing.
        assert!(!buffer.has_events_for(&target));
        let report = buffer.replay_for(&target, Duration::from_millis(10), |_| {
            panic!("queue should be empty")
        });
        assert_eq!(report.replayed, 0);
    }

    #[test]
    fn stale_entries_are_discarded_not_replayed() {
        let mut buffer = small_buffer(8);
        let target = TargetId::from("btn-1");
        buffer.capture(event_at("btn-1", 0)); // stale at now=2000
        buffer.capture(event_at("btn-1", 1_500)); // fresh at now=2000

        let mut seen = Vec::new();
        let report = buffer.replay_for(&target, Duration::from_millis(2_000), |ev| {
            seen.push(ev.timestamp.as_millis() as u64)
        });

        assert_eq!(seen, vec![1_500]);
        assert_eq!(report.replayed, 1);
        assert_eq!(report.dropped_stale, 1);
    }

    /// One panicking handler invocation must not block the rest of the
    /// queue.
    #[test]
    fn handler_panic_is_isolated_per_entry() {
        let mut buffer = small_buffer(8);
        let target = TargetId::from("btn-1");
        for ms in [1, 2, 3] {
            buffer.capture(event_at("btn-1", ms));
        }

        let mut seen = Vec::new();
        let report = buffer.replay_for(&target, Duration::from_millis(10), |ev| {
            if ev.timestamp == Duration::from_millis(2) {
                panic!("bad handler");
            }
            seen.push(ev.timestamp.as_millis() as u64);
        });

        assert_eq!(seen, vec![1, 3]);
        assert_eq!(report.replayed, 3);
        assert_eq!(report.handler_failures, 1);
    }

    #[test]
    fn prune_stale_sweeps_all_targets() {
        let mut buffer = small_buffer(8);
        buffer.capture(event_at("a", 0));
        buffer.capture(event_at("a", 1_900));
        buffer.capture(event_at("b", 10));

        let pruned = buffer.prune_stale(Duration::from_millis(2_000));
        assert_eq!(pruned, 2);
        assert_eq!(buffer.count_for(&TargetId::from("a")), 1);
        assert!(!buffer.has_events_for(&TargetId::from("b")));
        assert_eq!(buffer.total_count(), 1);
    }
}
