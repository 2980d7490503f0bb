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

//! The serialized client-action vocabulary.
//!
//! Pre-rendered markup carries small action payloads in the
//! [`ATTR_ACTION`](crate::dom::ATTR_ACTION) attribute: a closed, versionless
//! tagged union understood only by the dispatcher. The vocabulary is modeled
//! as a sum type with an explicit serializer; unrecognized discriminants
//! deserialize into [`ClientAction::Unknown`] rather than failing, because
//! the dispatcher must never turn a decode problem into an exception.

use serde::{Deserialize, Serialize};

use crate::dom::TargetId;

/// One decoded client action.
///
/// The wire form is JSON with a `kind` discriminator, e.g.
/// `{"kind":"toggle_visibility","target":"menu-1"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientAction {
    /// Flip the visibility of the referenced element and synchronize the
    /// expanded state of any trigger controlling it. A pure DOM-state
    /// transition, no network call.
    ToggleVisibility {
        /// The element whose visibility flips.
        target: TargetId,
    },
    /// Whole-page navigation. Client-side route transitions are out of
    /// scope for this runtime.
    Navigate {
        /// Absolute or relative destination URL.
        url: String,
    },
    /// Reserved for a future network round-trip. Dispatching it is a
    /// documented no-op today, not a defect.
    ServerRpc {
        /// Server endpoint the future round-trip will hit.
        endpoint: String,
        /// Opaque payload forwarded as-is.
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// Any discriminant this build does not know. Kept as a designated
    /// variant so newer markup degrades to a logged no-op on older
    /// runtimes.
    #[serde(other)]
    Unknown,
}

impl ClientAction {
    /// Decodes an action from its serialized wire form.
    ///
    /// Unknown `kind` discriminants succeed as [`ClientAction::Unknown`];
    /// only malformed payloads (bad JSON, missing fields) produce an error.
    pub fn decode(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Serializes the action to its wire form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Short name of the action kind, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ClientAction::ToggleVisibility { .. } => "toggle_visibility",
            ClientAction::Navigate { .. } => "navigate",
            ClientAction::ServerRpc { .. } => "server_rpc",
            ClientAction::Unknown => "unknown",
        }
    }
}
