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

// Rheo sandbox
// Drives a small server-rendered page through buffering, hydration, and
// replay, entirely in memory. Run with RUST_LOG=debug for the full story.

use std::time::Duration;

use anyhow::Result;
use rheo_core::dom::TargetId;
use rheo_core::event::{InteractionEvent, InteractionKind, PageSignal, SignalBus};
use rheo_core::{HostPage, MonotonicClock};
use rheo_runtime::{ComponentRegistration, HydrationRuntime, RuntimeConfig, TaskPriority};
use rheo_testkit::{InMemoryPage, ManualBatchSource, ManualClock};

fn build_page() -> InMemoryPage {
    let mut page = InMemoryPage::new();
    page.add_element("root", None)
        .add_action_element(
            "menu-btn",
            Some("root"),
            r#"{"kind":"toggle_visibility","target":"menu-1"}"#,
        )
        .add_trigger("menu-btn-proxy", Some("root"), "menu-1")
        .add_marked("menu-1", Some("root"))
        .add_action_element(
            "checkout-link",
            Some("root"),
            r#"{"kind":"navigate","url":"/checkout"}"#,
        )
        .add_marked("search-box", Some("root"))
        .hide("menu-1");
    page
}

fn main() -> Result<()> {
    env_logger::init();

    let bus = SignalBus::<PageSignal>::new();
    let clock = ManualClock::new();
    let source = ManualBatchSource::new(bus.sender(), true);

    let mut runtime = HydrationRuntime::new(
        build_page(),
        clock.clone(),
        Box::new(source.clone()),
        bus.receiver().clone(),
        RuntimeConfig::default(),
    );
    runtime.set_on_all_complete(|| log::info!("Page is fully interactive"));

    // The user clicks the menu button before anything has hydrated; the
    // interaction is buffered, not lost.
    bus.publish(PageSignal::Interaction(InteractionEvent::new(
        InteractionKind::PointerActivate,
        "menu-btn",
        clock.now(),
    )));
    runtime.pump();
    log::info!(
        "Buffered interactions before hydration: {}",
        runtime.buffer().total_count()
    );

    // The host registers one component per marked element.
    runtime.register_component(
        ComponentRegistration::new("menu-btn", "menu-toggle", serde_json::json!({}), |_| Ok(()))
            .with_priority(TaskPriority::Critical),
    );
    runtime.register_component(ComponentRegistration::new(
        "checkout-link",
        "nav-link",
        serde_json::json!({ "prefetch": false }),
        |props| {
            log::debug!("nav-link hydrating with props {props}");
            Ok(())
        },
    ));
    runtime.register_component(
        ComponentRegistration::new("search-box", "search", serde_json::json!({}), |_| Ok(()))
            .with_priority(TaskPriority::Low),
    );

    // Drive the platform loop by hand until the queue drains.
    while runtime.pending_tasks() > 0 {
        clock.advance(Duration::from_millis(16));
        if !source.grant_next(Some(Duration::from_millis(10))) {
            break;
        }
        runtime.pump();
    }

    let menu = TargetId::from("menu-1");
    log::info!(
        "menu-1 visible after replayed click: {}",
        runtime.page().is_visible(&menu)
    );

    // A post-hydration click dispatches immediately.
    bus.publish(PageSignal::Interaction(InteractionEvent::new(
        InteractionKind::PointerActivate,
        "checkout-link",
        clock.now(),
    )));
    runtime.pump();
    log::info!("navigations: {:?}", runtime.page().navigations());

    println!(
        "{}",
        serde_json::to_string_pretty(&runtime.telemetry())?
    );
    Ok(())
}
