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

//! An in-memory stand-in for the pre-rendered document.

use std::collections::HashMap;

use rheo_core::dom::{
    HostPage, ListenerError, TargetId, ATTR_ACTION, ATTR_CONTROLS, ATTR_MARKER,
};
use rheo_core::event::InterestMask;

#[derive(Debug, Default)]
struct Element {
    parent: Option<TargetId>,
    attributes: HashMap<String, String>,
    visible: bool,
}

/// A tiny in-memory document: elements with ids, parents, attributes, and
/// a visibility bit.
///
/// Ids double as the hydration-marker values, matching what the rendering
/// pipeline emits. The page records delegated-listener installation and
/// whole-page navigations so tests can assert on them.
#[derive(Debug, Default)]
pub struct InMemoryPage {
    elements: HashMap<TargetId, Element>,
    listener: Option<InterestMask>,
    navigations: Vec<String>,
}

impl InMemoryPage {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain, visible element.
    pub fn add_element(&mut self, id: &str, parent: Option<&str>) -> &mut Self {
        self.elements.insert(
            TargetId::from(id),
            Element {
                parent: parent.map(TargetId::from),
                attributes: HashMap::new(),
                visible: true,
            },
        );
        self
    }

    /// Adds a visible element carrying a hydration marker (its own id).
    pub fn add_marked(&mut self, id: &str, parent: Option<&str>) -> &mut Self {
        self.add_element(id, parent);
        self.set_attr(id, ATTR_MARKER, id);
        self
    }

    /// Adds a marked element that also carries a serialized action payload.
    pub fn add_action_element(&mut self, id: &str, parent: Option<&str>, action: &str) -> &mut Self {
        self.add_marked(id, parent);
        self.set_attr(id, ATTR_ACTION, action);
        self
    }

    /// Adds a marked trigger element back-referencing the element it
    /// controls.
    pub fn add_trigger(&mut self, id: &str, parent: Option<&str>, controls: &str) -> &mut Self {
        self.add_marked(id, parent);
        self.set_attr(id, ATTR_CONTROLS, controls);
        self
    }

    /// Sets an attribute directly (panics on unknown elements — a test
    /// fixture bug, not a runtime condition).
    pub fn set_attr(&mut self, id: &str, name: &str, value: &str) -> &mut Self {
        let element = self
            .elements
            .get_mut(&TargetId::from(id))
            .unwrap_or_else(|| panic!("no element '{id}' in fixture"));
        element.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Hides an element (fixtures start visible).
    pub fn hide(&mut self, id: &str) -> &mut Self {
        if let Some(element) = self.elements.get_mut(&TargetId::from(id)) {
            element.visible = false;
        }
        self
    }

    /// Removes an element, e.g. to model conditionally removed markup.
    pub fn remove_element(&mut self, id: &str) -> &mut Self {
        self.elements.remove(&TargetId::from(id));
        self
    }

    /// Whole-page navigations performed so far, in order.
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// The interest mask the delegated listener was installed with, if any.
    pub fn listener_interest(&self) -> Option<InterestMask> {
        self.listener
    }
}

impl HostPage for InMemoryPage {
    fn contains(&self, id: &TargetId) -> bool {
        self.elements.contains_key(id)
    }

    fn parent_of(&self, id: &TargetId) -> Option<TargetId> {
        self.elements.get(id)?.parent.clone()
    }

    fn attribute(&self, id: &TargetId, name: &str) -> Option<String> {
        self.elements.get(id)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, id: &TargetId, name: &str, value: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(element) => {
                element
                    .attributes
                    .insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn is_visible(&self, id: &TargetId) -> bool {
        self.elements.get(id).is_some_and(|e| e.visible)
    }

    fn set_visible(&mut self, id: &TargetId, visible: bool) -> bool {
        match self.elements.get_mut(id) {
            Some(element) => {
                element.visible = visible;
                true
            }
            None => false,
        }
    }

    fn controllers_of(&self, id: &TargetId) -> Vec<TargetId> {
        let mut controllers: Vec<TargetId> = self
            .elements
            .iter()
            .filter(|(_, element)| {
                element.attributes.get(ATTR_CONTROLS).map(String::as_str) == Some(id.as_str())
            })
            .map(|(trigger_id, _)| trigger_id.clone())
            .collect();
        controllers.sort();
        controllers
    }

    fn attach_delegated_listener(&mut self, interest: InterestMask) -> Result<(), ListenerError> {
        if self.listener.is_some() {
            return Err(ListenerError::AlreadyInstalled);
        }
        self.listener = Some(interest);
        log::debug!("Delegated listener attached ({interest:?})");
        Ok(())
    }

    fn has_delegated_listener(&self) -> bool {
        self.listener.is_some()
    }

    fn navigate(&mut self, url: &str) {
        log::debug!("Whole-page navigation to '{url}'");
        self.navigations.push(url.to_string());
    }
}
