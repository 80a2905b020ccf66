//! Identity types for listener bindings and the element host contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an addressable page element (button, canvas, tool selector).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        ElementId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        ElementId::new(id)
    }
}

/// Input events the core listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    Click,
    PointerDown,
    PointerMove,
    PointerUp,
}

impl EventKind {
    /// DOM event name.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::PointerDown => "mousedown",
            EventKind::PointerMove => "mousemove",
            EventKind::PointerUp => "mouseup",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Token grouping the bindings of one owner lifetime (a session, or the
/// controller itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeToken(pub(crate) u64);

impl ScopeToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Arena slot reference of a binding.
///
/// The key doubles as the handler reference given to the [`ElementHost`], so
/// the exact same identity is used to add and to remove a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

/// One `(element, event) -> handler` association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerBinding<H> {
    pub scope: ScopeToken,
    pub target: ElementId,
    pub event: EventKind,
    pub handler: H,
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// The page hosting the controls and the drawing surface.
///
/// The core does not own the elements; it only needs them to exist and to
/// accept listener registrations.
pub trait ElementHost {
    fn has_element(&self, id: &ElementId) -> bool;

    fn add_event_listener(&mut self, id: &ElementId, event: EventKind, listener: BindingKey);

    fn remove_event_listener(&mut self, id: &ElementId, event: EventKind, listener: BindingKey);

    fn viewport(&self) -> Viewport;
}
