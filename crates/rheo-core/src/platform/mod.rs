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

//! Provides abstractions over platform-specific scheduling facilities.
//!
//! A browser offers two ways to get a callback without blocking the UI
//! thread: idle-time scheduling (with a time-remaining hint) and plain
//! frame-based scheduling (no hint). This module defines the common
//! interface the runtime drives — request a batch slot, cancel it, probe
//! capabilities — keeping the batch loop agnostic to which primitive is
//! underneath.

pub mod clock;

pub use clock::{MonotonicClock, SystemClock};

/// Handle identifying one outstanding batch request.
///
/// Returned by [`BatchSource::request_batch`] and echoed back in the
/// matching `BatchGranted` signal so stale grants can be told apart from
/// the one currently awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchHandle(
    /// Monotonic request counter value.
    pub u64,
);

impl std::fmt::Display for BatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch#{}", self.0)
    }
}

/// What the platform's scheduling primitives can do, probed once at
/// startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulingCapabilities {
    /// The platform supplies a time-remaining hint with each granted batch
    /// (idle-time scheduling). When `false`, grants carry no deadline and
    /// the runtime falls back to fixed wall-clock budgets.
    pub idle_deadline: bool,
}

/// A source of non-blocking scheduling slots.
///
/// Implementations wrap `requestIdleCallback`/`requestAnimationFrame`-like
/// primitives (or a manual pump, in tests). Grants are delivered
/// asynchronously as `BatchGranted` signals on the page's signal bus; a
/// request here never runs work inline.
///
/// The timeout semantics of the underlying primitive apply to the *request*
/// (a maximum wait before the platform forces the callback), never to task
/// bodies — the runtime enforces its own budget between tasks.
pub trait BatchSource {
    /// Requests one scheduling slot.
    ///
    /// ## Returns
    /// A handle identifying the request; the eventual grant echoes it.
    fn request_batch(&mut self) -> BatchHandle;

    /// Cancels an outstanding request. Unknown or already-granted handles
    /// are ignored.
    fn cancel_batch(&mut self, handle: BatchHandle);

    /// Reports what the underlying primitive can do. Stable for the life
    /// of the page; the runtime probes it once at startup.
    fn capabilities(&self) -> SchedulingCapabilities;
}
