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

//! # Rheo Runtime
//!
//! The client-side hydration runtime: converts statically server-rendered
//! markup into an interactive page without blocking the UI thread and
//! without losing interactions that land before an element is ready.
//!
//! The runtime is single-threaded and cooperative. All state lives in one
//! explicit [`HydrationRuntime`] context constructed per page load; there
//! are no global singletons. Work interleaves with the host's event loop
//! through platform batch grants; "yielding" means returning between
//! tasks, never preempting inside one.

#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod listener;
pub mod runtime;
pub mod sched;
pub mod telemetry;

pub use buffer::EventBuffer;
pub use config::{EventBufferConfig, RuntimeConfig, SchedulerConfig};
pub use dispatch::{ClientDispatcher, DispatchOutcome};
pub use runtime::{ComponentRegistration, HydrationRuntime};
pub use sched::{HydrationScheduler, HydrationTask, TaskError, TaskPriority};
pub use telemetry::{RuntimeTelemetry, TelemetrySnapshot};
