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

//! # Rheo Core
//!
//! Foundational crate containing traits, core types, and interface contracts
//! that define the hydration runtime's architecture.
//!
//! Nothing in this crate knows about the concrete scheduler or any concrete
//! platform. Higher-level crates (`rheo-runtime`, `rheo-testkit`) implement
//! and drive these contracts.

#![warn(missing_docs)]

pub mod action;
pub mod dom;
pub mod event;
pub mod platform;
pub mod utils;

pub use action::ClientAction;
pub use dom::{HostPage, TargetId};
pub use event::{InteractionEvent, InteractionKind, PageSignal, SignalBus};
pub use platform::{BatchHandle, BatchSource, MonotonicClock, SchedulingCapabilities};
pub use utils::timer::Stopwatch;
