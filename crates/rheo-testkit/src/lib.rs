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

//! # Rheo Testkit
//!
//! Concrete, fully deterministic implementations of the runtime's external
//! dependencies: an in-memory [`InMemoryPage`] standing in for the
//! pre-rendered document, a hand-stepped [`ManualClock`], and a
//! [`ManualBatchSource`] whose grants tests (or the demo) fire explicitly.
//!
//! Nothing here is wall-clock dependent; every test drives time, scroll
//! activity, and batch grants by hand.

#![warn(missing_docs)]

pub mod batch;
pub mod clock;
pub mod page;

pub use batch::ManualBatchSource;
pub use clock::ManualClock;
pub use page::InMemoryPage;
