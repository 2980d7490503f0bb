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

//! Decoding and execution of serialized client actions.
//!
//! The dispatcher runs inside the page-wide delegated listener, where an
//! uncaught error would permanently disable all further interaction on
//! the page — the single highest-severity failure this design exists to
//! prevent. Every boundary failure (malformed payload, unknown kind,
//! missing DOM target) therefore degrades to a logged no-op; `dispatch`
//! never propagates an error.

use rheo_core::action::ClientAction;
use rheo_core::dom::{HostPage, TargetId, ATTR_EXPANDED, ATTR_LABEL, ATTR_SWAP_LABEL};

/// What one dispatch attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action's effect was applied.
    Completed {
        /// Kind name of the completed action, for diagnostics.
        kind: &'static str,
    },
    /// The payload was not valid JSON for the vocabulary. Logged and
    /// dropped.
    MalformedPayload,
    /// The action kind is not in this build's vocabulary. Logged and
    /// dropped.
    UnknownKind,
    /// The action referenced an element that is not in the document.
    /// Logged and treated as a no-op.
    MissingTarget,
    /// A reserved action kind with no effect yet (`server_rpc`). A
    /// documented no-op, not a defect.
    ReservedNoOp,
}

impl DispatchOutcome {
    /// `true` when the attempt was dropped at a boundary rather than
    /// applied (or deliberately reserved).
    pub fn is_dropped(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::MalformedPayload
                | DispatchOutcome::UnknownKind
                | DispatchOutcome::MissingTarget
        )
    }
}

/// Decodes the closed action vocabulary and performs DOM-level effects.
#[derive(Debug, Default)]
pub struct ClientDispatcher;

impl ClientDispatcher {
    /// Creates a dispatcher.
    pub fn new() -> Self {
        Self
    }

    /// Decodes `payload` and applies the action to `page`.
    ///
    /// Never returns an error and never panics on bad input: malformed or
    /// unrecognized payloads are logged and dropped.
    pub fn dispatch<P: HostPage>(&self, page: &mut P, payload: &str) -> DispatchOutcome {
        match ClientAction::decode(payload) {
            Ok(action) => self.dispatch_action(page, action),
            Err(err) => {
                log::warn!("Dropping malformed action payload: {err}");
                DispatchOutcome::MalformedPayload
            }
        }
    }

    /// Applies an already-decoded action to `page`.
    pub fn dispatch_action<P: HostPage>(&self, page: &mut P, action: ClientAction) -> DispatchOutcome {
        match action {
            ClientAction::ToggleVisibility { target } => self.toggle_visibility(page, &target),
            ClientAction::Navigate { url } => {
                log::debug!("Navigating to '{url}'");
                page.navigate(&url);
                DispatchOutcome::Completed { kind: "navigate" }
            }
            ClientAction::ServerRpc { endpoint, .. } => {
                // Reserved for a future network round-trip.
                log::debug!("server_rpc for '{endpoint}' is reserved; ignoring");
                DispatchOutcome::ReservedNoOp
            }
            ClientAction::Unknown => {
                log::warn!("Dropping action with unknown kind");
                DispatchOutcome::UnknownKind
            }
        }
    }

    // Flips the element's visibility, then synchronizes the expanded state
    // and optional swap label of every trigger back-referencing it.
    fn toggle_visibility<P: HostPage>(&self, page: &mut P, target: &TargetId) -> DispatchOutcome {
        if !page.contains(target) {
            log::warn!("toggle_visibility: no element '{target}' in document");
            return DispatchOutcome::MissingTarget;
        }

        let now_visible = !page.is_visible(target);
        page.set_visible(target, now_visible);
        log::debug!(
            "Toggled '{target}' to {}",
            if now_visible { "visible" } else { "hidden" }
        );

        let expanded = if now_visible { "true" } else { "false" };
        for trigger in page.controllers_of(target) {
            page.set_attribute(&trigger, ATTR_EXPANDED, expanded);
            if let Some(swap) = page.attribute(&trigger, ATTR_SWAP_LABEL) {
                let current = page.attribute(&trigger, ATTR_LABEL).unwrap_or_default();
                page.set_attribute(&trigger, ATTR_LABEL, &swap);
                page.set_attribute(&trigger, ATTR_SWAP_LABEL, &current);
            }
        }
        DispatchOutcome::Completed {
            kind: "toggle_visibility",
        }
    }
}
