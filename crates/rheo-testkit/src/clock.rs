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

//! A monotonic clock stepped by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rheo_core::platform::MonotonicClock;

/// [`MonotonicClock`] whose reading only moves when a test advances it.
///
/// Clones share the same reading, so a test can keep one handle while the
/// runtime owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the reading by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.nanos
            .fetch_add(delta.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Sets the reading to an absolute value. Never moves backwards: a
    /// smaller value than the current reading is ignored, preserving
    /// monotonicity.
    pub fn set(&self, to: Duration) {
        self.nanos.fetch_max(to.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_set_move_the_reading() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(Duration::from_millis(40));
        assert_eq!(clock.now(), Duration::from_millis(40));

        clock.set(Duration::from_millis(100));
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn set_never_moves_backwards() {
        let clock = ManualClock::new();
        clock.set(Duration::from_millis(50));
        clock.set(Duration::from_millis(10));
        assert_eq!(clock.now(), Duration::from_millis(50));
    }

    #[test]
    fn clones_share_the_reading() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        clock.advance(Duration::from_secs(1));
        assert_eq!(handle.now(), Duration::from_secs(1));
    }
}
