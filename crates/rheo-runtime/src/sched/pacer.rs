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

//! Batch pacing strategies.
//!
//! A **pacer** is a swappable strategy deciding when a batch must yield
//! the UI thread. Two implementations exist, chosen once at startup from
//! the platform capability probe, with an identical external contract:
//!
//! 1. [`DeadlinePacer`] — the platform supplies a time-remaining hint with
//!    each granted slot; the batch yields once the remaining time drops
//!    below a minimum slack.
//! 2. [`FixedBudgetPacer`] — no hints available; the batch tracks elapsed
//!    wall-clock time since it started and yields once the configured
//!    budget is spent.
//!
//! The scheduler's batch loop only ever talks to [`BatchPacer`], staying
//! agnostic to the underlying primitive.

use std::time::Duration;

use rheo_core::platform::SchedulingCapabilities;
use rheo_core::Stopwatch;

use crate::config::SchedulerConfig;

/// Strategy interface consulted by the batch loop.
pub trait BatchPacer {
    /// Human-readable name identifying this pacing strategy.
    ///
    /// Used for logging and diagnostics.
    fn strategy_name(&self) -> &'static str;

    /// Called once when a granted batch starts executing.
    ///
    /// ## Arguments
    /// * `deadline` - The grant's time-remaining hint, if the platform
    ///   provided one.
    fn begin_batch(&mut self, deadline: Option<Duration>);

    /// Returns `true` if the batch must stop popping tasks and yield.
    ///
    /// Consulted between tasks, never within one: a task already in
    /// flight always runs to completion.
    fn should_yield(&self) -> bool;
}

/// Pacer for platforms with idle-time scheduling (deadline hints).
///
/// If a grant unexpectedly arrives without a hint, the pacer degrades to
/// the fixed budget for that one batch rather than running unbounded.
#[derive(Debug)]
pub struct DeadlinePacer {
    min_slack: Duration,
    fallback_budget: Duration,
    deadline: Option<Duration>,
    watch: Stopwatch,
}

impl DeadlinePacer {
    /// Creates a deadline-aware pacer from the scheduler config.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            min_slack: config.min_deadline_slack(),
            fallback_budget: config.batch_budget(),
            deadline: None,
            watch: Stopwatch::new(),
        }
    }
}

impl BatchPacer for DeadlinePacer {
    fn strategy_name(&self) -> &'static str {
        "Deadline"
    }

    fn begin_batch(&mut self, deadline: Option<Duration>) {
        self.deadline = deadline;
        self.watch = Stopwatch::new();
    }

    fn should_yield(&self) -> bool {
        match self.deadline {
            Some(deadline) => deadline.saturating_sub(self.watch.elapsed()) < self.min_slack,
            None => self.watch.elapsed() >= self.fallback_budget,
        }
    }
}

/// Pacer for platforms without deadline hints: a fixed wall-clock budget
/// per batch, measured from batch start.
#[derive(Debug)]
pub struct FixedBudgetPacer {
    budget: Duration,
    watch: Stopwatch,
}

impl FixedBudgetPacer {
    /// Creates a fixed-budget pacer from the scheduler config.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            budget: config.batch_budget(),
            watch: Stopwatch::new(),
        }
    }
}

impl BatchPacer for FixedBudgetPacer {
    fn strategy_name(&self) -> &'static str {
        "FixedBudget"
    }

    fn begin_batch(&mut self, _deadline: Option<Duration>) {
        self.watch = Stopwatch::new();
    }

    fn should_yield(&self) -> bool {
        self.watch.elapsed() >= self.budget
    }
}

/// Chooses the pacing strategy for the probed platform capabilities.
///
/// Called once at startup; the choice is stable for the life of the page.
pub fn pacer_for(
    capabilities: SchedulingCapabilities,
    config: &SchedulerConfig,
) -> Box<dyn BatchPacer> {
    let pacer: Box<dyn BatchPacer> = if capabilities.idle_deadline {
        Box::new(DeadlinePacer::new(config))
    } else {
        Box::new(FixedBudgetPacer::new(config))
    };
    log::info!("Batch pacing strategy selected: {}", pacer.strategy_name());
    pacer
}
