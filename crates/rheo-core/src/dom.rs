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

//! Provides abstractions over the host page (the pre-rendered DOM).
//!
//! This module contains the trait and types that define a common interface
//! for interacting with the document the out-of-scope rendering pipeline
//! produced. The runtime never touches a real DOM API directly; it goes
//! through [`HostPage`], which concrete platform crates implement (the
//! testkit ships an in-memory implementation).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::InterestMask;

/// Attribute marking an element as a hydration target. Its value is the
/// element's [`TargetId`].
pub const ATTR_MARKER: &str = "data-rheo-id";

/// Attribute carrying a serialized [`ClientAction`](crate::action::ClientAction)
/// payload directly on an element.
pub const ATTR_ACTION: &str = "data-rheo-action";

/// Attribute on a trigger element back-referencing the [`TargetId`] of the
/// element it controls (visibility toggles keep the trigger's expanded
/// state in sync through this reference).
pub const ATTR_CONTROLS: &str = "data-rheo-controls";

/// Expanded-state attribute the dispatcher synchronizes on trigger elements.
pub const ATTR_EXPANDED: &str = "aria-expanded";

/// Accessible label attribute swapped on trigger elements that carry a
/// [`ATTR_SWAP_LABEL`].
pub const ATTR_LABEL: &str = "aria-label";

/// Optional attribute naming the label a trigger swaps to while its
/// controlled element is visible.
pub const ATTR_SWAP_LABEL: &str = "data-rheo-swap-label";

/// Identifier of the DOM element an event or action refers to.
///
/// Target ids come out of the pre-rendered markup's marker attributes and
/// are opaque to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a target id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TargetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Error type for delegated-listener installation.
#[derive(Debug, PartialEq, Eq)]
pub enum ListenerError {
    /// A delegated listener is already attached to this page. Installation
    /// is idempotent; callers short-circuit on this rather than failing.
    AlreadyInstalled,
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::AlreadyInstalled => {
                write!(f, "a delegated listener is already installed on this page")
            }
        }
    }
}

impl std::error::Error for ListenerError {}

/// The capabilities the runtime needs from the host page.
///
/// This is deliberately narrow: containment and ancestry lookups for the
/// delegated listener's target resolution, attribute access and visibility
/// flips for the dispatcher, delegated-listener attachment, and whole-page
/// navigation. Anything the runtime does not need is not here.
///
/// All methods take ids rather than element handles; the page owns the
/// element representation.
pub trait HostPage {
    /// Returns `true` if an element with this id exists in the document.
    fn contains(&self, id: &TargetId) -> bool;

    /// Returns the id of the element's parent, or `None` at the document
    /// root (or if `id` is unknown).
    fn parent_of(&self, id: &TargetId) -> Option<TargetId>;

    /// Reads an attribute off an element. `None` if the element or the
    /// attribute is missing.
    fn attribute(&self, id: &TargetId, name: &str) -> Option<String>;

    /// Writes an attribute on an element. Returns `false` if the element
    /// is missing (the write is then a no-op).
    fn set_attribute(&mut self, id: &TargetId, name: &str, value: &str) -> bool;

    /// Returns `true` if the element is currently visible.
    fn is_visible(&self, id: &TargetId) -> bool;

    /// Shows or hides an element. Returns `false` if the element is
    /// missing (the write is then a no-op).
    fn set_visible(&mut self, id: &TargetId, visible: bool) -> bool;

    /// Returns the ids of every element whose [`ATTR_CONTROLS`] attribute
    /// back-references `id`.
    fn controllers_of(&self, id: &TargetId) -> Vec<TargetId>;

    /// Attaches the document-level delegated listener for the given
    /// interaction kinds. At most one listener may be active per page;
    /// a second attachment fails with [`ListenerError::AlreadyInstalled`].
    fn attach_delegated_listener(&mut self, interest: InterestMask) -> Result<(), ListenerError>;

    /// Returns `true` if a delegated listener is currently attached.
    fn has_delegated_listener(&self) -> bool;

    /// Performs a whole-page navigation. Client-side route transitions are
    /// out of scope; this hands control back to the browser.
    fn navigate(&mut self, url: &str);
}
