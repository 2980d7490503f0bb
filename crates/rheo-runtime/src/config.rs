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

//! Runtime configuration.
//!
//! All knobs live here, serde-deserializable so a host can ship tuning as
//! data. Every field has a documented default; `#[serde(default)]` keeps
//! partial configs valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the hydration scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum UI-thread occupancy per batch, in milliseconds. Used by the
    /// fixed-budget fallback strategy when the platform supplies no
    /// deadline hints.
    pub batch_budget_ms: u64,
    /// Minimum time-remaining below which a deadline-aware batch yields
    /// instead of popping another task, in milliseconds.
    pub min_deadline_slack_ms: u64,
    /// Individual task durations above this are flagged as a signal of
    /// coarse task granularity, in milliseconds.
    pub long_task_threshold_ms: u64,
    /// How long after the latest scroll event whole batches stay deferred,
    /// in milliseconds. Trades hydration latency for scroll smoothness.
    pub scroll_pause_ms: u64,
    /// Execute tasks immediately on scheduling, bypassing the queue.
    ///
    /// Strictly for deterministic tests. Never enable in production: it
    /// defeats the non-blocking guarantee the scheduler exists to provide.
    pub synchronous: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_budget_ms: 50,
            min_deadline_slack_ms: 5,
            long_task_threshold_ms: 10,
            scroll_pause_ms: 125,
            synchronous: false,
        }
    }
}

impl SchedulerConfig {
    /// The fixed batch budget as a [`Duration`].
    pub fn batch_budget(&self) -> Duration {
        Duration::from_millis(self.batch_budget_ms)
    }

    /// The minimum deadline slack as a [`Duration`].
    pub fn min_deadline_slack(&self) -> Duration {
        Duration::from_millis(self.min_deadline_slack_ms)
    }

    /// The long-task threshold as a [`Duration`].
    pub fn long_task_threshold(&self) -> Duration {
        Duration::from_millis(self.long_task_threshold_ms)
    }

    /// The scroll pause window as a [`Duration`].
    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }
}

/// Configuration for the pre-hydration event buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBufferConfig {
    /// Bounded queue depth per target; the oldest entry is evicted first
    /// on overflow. Bounds memory under event storms.
    pub max_events_per_target: usize,
    /// Buffered events older than this are stale and never replayed, in
    /// milliseconds.
    pub max_age_ms: u64,
}

impl Default for EventBufferConfig {
    fn default() -> Self {
        Self {
            max_events_per_target: 10,
            max_age_ms: 30_000,
        }
    }
}

impl EventBufferConfig {
    /// The maximum buffered-event age as a [`Duration`].
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Scheduler knobs.
    pub scheduler: SchedulerConfig,
    /// Event buffer knobs.
    pub buffer: EventBufferConfig,
}
