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

//! Provides foundational primitives for page-event communication.
//!
//! This module defines the interaction event record captured by the
//! delegated listener, the [`PageSignal`] enum the platform publishes onto
//! the [`SignalBus`], and the interest mask used when subscribing the
//! listener. The bus is a generic, thread-safe MPSC channel; the runtime
//! drains it on the single thread that owns all mutable state.

mod bus;

pub use self::bus::SignalBus;

use std::time::Duration;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::dom::TargetId;
use crate::platform::BatchHandle;

/// The kinds of user interaction the delegated listener observes.
///
/// This is a closed set: pre-hydration elements cannot carry their own
/// handlers, so the runtime covers the common interaction kinds centrally
/// and everything else passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Pointer activation (click / tap / keyboard activation).
    PointerActivate,
    /// Text or value input.
    Input,
    /// Committed value change.
    Change,
    /// Form submission.
    Submit,
}

impl InteractionKind {
    /// Returns the interest-mask bit corresponding to this kind.
    pub fn mask(self) -> InterestMask {
        match self {
            InteractionKind::PointerActivate => InterestMask::POINTER_ACTIVATE,
            InteractionKind::Input => InterestMask::INPUT,
            InteractionKind::Change => InterestMask::CHANGE,
            InteractionKind::Submit => InterestMask::SUBMIT,
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionKind::PointerActivate => write!(f, "pointer-activate"),
            InteractionKind::Input => write!(f, "input"),
            InteractionKind::Change => write!(f, "change"),
            InteractionKind::Submit => write!(f, "submit"),
        }
    }
}

bitflags! {
    /// Which interaction kinds the delegated listener subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterestMask: u8 {
        /// Pointer activation events.
        const POINTER_ACTIVATE = 1 << 0;
        /// Input events.
        const INPUT = 1 << 1;
        /// Change events.
        const CHANGE = 1 << 2;
        /// Submit events.
        const SUBMIT = 1 << 3;
    }
}

impl Default for InterestMask {
    fn default() -> Self {
        InterestMask::all()
    }
}

/// An immutable record of one user interaction.
///
/// Timestamps are monotonic durations from the runtime clock's origin,
/// never wall-clock time. Within one target's buffered queue timestamps
/// are non-decreasing (FIFO capture order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionEvent {
    /// What kind of interaction occurred.
    pub kind: InteractionKind,
    /// The id of the element the event targets. For signals coming off the
    /// platform this is the *raw* event target; the listener resolves it to
    /// the owning marked element before buffering or dispatching.
    pub target: TargetId,
    /// Capture time, relative to the runtime clock origin.
    pub timestamp: Duration,
}

impl InteractionEvent {
    /// Creates a new interaction event record.
    pub fn new(kind: InteractionKind, target: impl Into<TargetId>, timestamp: Duration) -> Self {
        Self {
            kind,
            target: target.into(),
            timestamp,
        }
    }

    /// Age of this event at `now`. Saturates to zero if `now` predates the
    /// capture timestamp (the clock is monotonic, so that only happens in
    /// hand-built test fixtures).
    pub fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.timestamp)
    }
}

/// Everything the platform side publishes onto the [`SignalBus`].
///
/// The delegated-listener glue publishes `Interaction`, the passive scroll
/// subscription publishes `Scrolled`, and the batch source publishes
/// `BatchGranted` when a previously requested scheduling slot is granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSignal {
    /// A user interaction observed by the document-level delegated listener.
    Interaction(InteractionEvent),
    /// A platform scheduling slot was granted.
    BatchGranted {
        /// The handle returned by the matching `request_batch` call.
        handle: BatchHandle,
        /// Time remaining in the slot, if the platform can say (idle-time
        /// scheduling). `None` means the fixed-budget fallback applies.
        deadline: Option<Duration>,
    },
    /// The page scrolled. The scheduler defers whole batches while scroll
    /// activity is fresh.
    Scrolled {
        /// When the scroll was observed, relative to the clock origin.
        timestamp: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interest_mask_default_covers_all_kinds() {
        let mask = InterestMask::default();
        for kind in [
            InteractionKind::PointerActivate,
            InteractionKind::Input,
            InteractionKind::Change,
            InteractionKind::Submit,
        ] {
            assert!(mask.contains(kind.mask()), "{kind} missing from default mask");
        }
    }

    #[test]
    fn event_age_is_relative_to_capture() {
        let ev = InteractionEvent::new(
            InteractionKind::Input,
            "field-1",
            Duration::from_millis(100),
        );
        assert_eq!(ev.age(Duration::from_millis(250)), Duration::from_millis(150));
    }

    /// A clock running "before" the capture time must not panic the age
    /// computation.
    #[test]
    fn event_age_saturates_at_zero() {
        let ev = InteractionEvent::new(
            InteractionKind::Change,
            "field-2",
            Duration::from_millis(500),
        );
        assert_eq!(ev.age(Duration::from_millis(100)), Duration::ZERO);
    }
}
