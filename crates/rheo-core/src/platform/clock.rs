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

//! Monotonic clock abstraction.
//!
//! Event staleness and scroll-pause windows are measured against a
//! monotonic clock, never wall-clock time. The trait exists so tests can
//! step time by hand; production uses [`SystemClock`].

use std::time::{Duration, Instant};

/// A monotonic clock reporting durations since an arbitrary fixed origin.
pub trait MonotonicClock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// [`MonotonicClock`] backed by [`std::time::Instant`], anchored at
/// construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn system_clock_starts_near_zero() {
        let clock = SystemClock::new();
        assert!(
            clock.now() < Duration::from_millis(15),
            "Fresh clock should read near zero"
        );
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        thread::sleep(Duration::from_millis(5));
        let second = clock.now();
        assert!(second >= first, "Clock went backwards: {first:?} -> {second:?}");
    }
}
