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

//! Delegated-listener resolution and disposition.
//!
//! One document-level listener covers the whole page, since pre-hydration
//! elements cannot carry their own handlers. This module holds the pure
//! decision logic behind that listener: resolving a raw event target to
//! the marked element that owns it, and deciding whether the interaction
//! is buffered (target not yet hydrated) or dispatched immediately.
//!
//! The core correctness invariant lives here: every interaction on a
//! marked element is observed exactly once, either immediately dispatched
//! or buffered for later replay, never dropped and never
//! double-processed.

use std::collections::HashSet;

use rheo_core::dom::{HostPage, ListenerError, TargetId, ATTR_ACTION, ATTR_MARKER};
use rheo_core::event::InterestMask;

/// Safety bound on ancestor walks. Real documents are nowhere near this
/// deep; hitting it means a corrupted parent chain.
const MAX_ANCESTOR_HOPS: usize = 256;

/// The marked element a raw event target resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Id of the owning marked element.
    pub target: TargetId,
    /// The serialized action payload, when the element carries one
    /// directly.
    pub action: Option<String>,
}

/// What the listener decided to do with one observed interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Target not yet hydrated: the event is buffered for replay.
    Buffer {
        /// The resolved target to buffer under.
        target: TargetId,
    },
    /// Target already hydrated: dispatch immediately.
    Dispatch {
        /// The resolved target.
        target: TargetId,
        /// The element's serialized action payload, if it carries one.
        action: Option<String>,
    },
    /// No marked element owns the raw target: the runtime stays out of
    /// the browser's way entirely.
    Ignore,
}

impl Disposition {
    /// Whether the platform glue should suppress the browser's default
    /// behavior. `true` exactly when the runtime took responsibility for
    /// the interaction.
    pub fn suppress_default(&self) -> bool {
        !matches!(self, Disposition::Ignore)
    }
}

/// Attaches the document-level delegated listener, tolerating repeats.
///
/// Initialization is idempotent: if a listener is already attached (for
/// example because two runtime instances loaded on one page), the second
/// attach short-circuits with a log line instead of failing; duplicate
/// listeners would dispatch single interactions twice.
///
/// ## Returns
/// `true` if this call attached the listener, `false` if one was already
/// active.
pub fn ensure_installed<P: HostPage>(page: &mut P, interest: InterestMask) -> bool {
    match page.attach_delegated_listener(interest) {
        Ok(()) => {
            log::info!("Delegated listener installed ({interest:?})");
            true
        }
        Err(ListenerError::AlreadyInstalled) => {
            log::info!("Delegated listener already installed; skipping");
            false
        }
    }
}

/// Resolves a raw event target to the marked element owning it.
///
/// Walks up from the target through its ancestors looking first for an
/// element carrying a direct serialized action, then (only if none is
/// found) for the nearest element carrying a hydration marker. Returns
/// `None` when neither exists; such events are none of the runtime's
/// business.
pub fn resolve_target<P: HostPage>(page: &P, raw: &TargetId) -> Option<ResolvedTarget> {
    if let Some(found) = walk_up(page, raw, |id| {
        page.attribute(id, ATTR_ACTION)
            .map(|payload| ResolvedTarget {
                target: id.clone(),
                action: Some(payload),
            })
    }) {
        return Some(found);
    }
    walk_up(page, raw, |id| {
        page.attribute(id, ATTR_MARKER).map(|_| ResolvedTarget {
            target: id.clone(),
            action: None,
        })
    })
}

fn walk_up<P, F>(page: &P, from: &TargetId, mut probe: F) -> Option<ResolvedTarget>
where
    P: HostPage,
    F: FnMut(&TargetId) -> Option<ResolvedTarget>,
{
    let mut cursor = Some(from.clone());
    let mut hops = 0;
    while let Some(id) = cursor {
        if let Some(found) = probe(&id) {
            return Some(found);
        }
        hops += 1;
        if hops > MAX_ANCESTOR_HOPS {
            log::warn!("Ancestor walk from '{from}' exceeded {MAX_ANCESTOR_HOPS} hops; giving up");
            return None;
        }
        cursor = page.parent_of(&id);
    }
    None
}

/// Decides what to do with an interaction that resolved to `resolved`.
pub fn dispose(resolved: ResolvedTarget, hydrated: &HashSet<TargetId>) -> Disposition {
    if hydrated.contains(&resolved.target) {
        Disposition::Dispatch {
            target: resolved.target,
            action: resolved.action,
        }
    } else {
        Disposition::Buffer {
            target: resolved.target,
        }
    }
}
