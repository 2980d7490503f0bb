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

//! A batch source whose grants are fired by hand.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rheo_core::event::PageSignal;
use rheo_core::platform::{BatchHandle, BatchSource, SchedulingCapabilities};

#[derive(Debug, Default)]
struct Inner {
    next_handle: u64,
    pending: VecDeque<BatchHandle>,
    cancelled: Vec<BatchHandle>,
}

/// [`BatchSource`] for tests: requests queue up, and the test decides
/// when (and with what deadline hint) each one is granted.
///
/// Clones share state, so a test keeps one handle to fire grants while
/// the runtime owns the boxed other.
#[derive(Debug, Clone)]
pub struct ManualBatchSource {
    inner: Arc<Mutex<Inner>>,
    sender: flume::Sender<PageSignal>,
    idle_deadline: bool,
}

impl ManualBatchSource {
    /// Creates a source publishing grants onto `sender`.
    ///
    /// ## Arguments
    /// * `sender` - The page signal bus sender grants are published on.
    /// * `idle_deadline` - Whether the source reports idle-time deadline
    ///   hints in its capability probe.
    pub fn new(sender: flume::Sender<PageSignal>, idle_deadline: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            sender,
            idle_deadline,
        }
    }

    /// Grants the oldest pending request, publishing a `BatchGranted`
    /// signal with the given deadline hint.
    ///
    /// ## Returns
    /// `false` if no request was pending.
    pub fn grant_next(&self, deadline: Option<Duration>) -> bool {
        let handle = {
            let mut inner = self.inner.lock().expect("testkit batch state poisoned");
            inner.pending.pop_front()
        };
        match handle {
            Some(handle) => {
                if self
                    .sender
                    .send(PageSignal::BatchGranted { handle, deadline })
                    .is_err()
                {
                    log::error!("Granting {handle} failed: signal receiver dropped");
                    return false;
                }
                true
            }
            None => false,
        }
    }

    /// Number of requests awaiting a grant.
    pub fn pending_count(&self) -> usize {
        self.inner
            .lock()
            .expect("testkit batch state poisoned")
            .pending
            .len()
    }

    /// Handles cancelled so far, in cancellation order.
    pub fn cancelled(&self) -> Vec<BatchHandle> {
        self.inner
            .lock()
            .expect("testkit batch state poisoned")
            .cancelled
            .clone()
    }
}

impl BatchSource for ManualBatchSource {
    fn request_batch(&mut self) -> BatchHandle {
        let mut inner = self.inner.lock().expect("testkit batch state poisoned");
        let handle = BatchHandle(inner.next_handle);
        inner.next_handle += 1;
        inner.pending.push_back(handle);
        handle
    }

    fn cancel_batch(&mut self, handle: BatchHandle) {
        let mut inner = self.inner.lock().expect("testkit batch state poisoned");
        inner.pending.retain(|pending| *pending != handle);
        inner.cancelled.push(handle);
    }

    fn capabilities(&self) -> SchedulingCapabilities {
        SchedulingCapabilities {
            idle_deadline: self.idle_deadline,
        }
    }
}
