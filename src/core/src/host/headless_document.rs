use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use log::warn;

use crate::listener_registry::{BindingKey, ElementHost, ElementId, EventKind, Viewport};

struct DocumentInner {
    viewport: Viewport,
    elements: BTreeSet<ElementId>,
    listeners: BTreeMap<(ElementId, EventKind), Vec<BindingKey>>,
}

/// In-memory page: a set of element ids, a viewport and the listeners
/// registered on each element.
///
/// Clones share the same page.
#[derive(Clone)]
pub struct HeadlessDocument {
    inner: Rc<RefCell<DocumentInner>>,
}

impl HeadlessDocument {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                viewport: Viewport { width, height },
                elements: BTreeSet::new(),
                listeners: BTreeMap::new(),
            })),
        }
    }

    pub fn with_element(self, id: impl Into<ElementId>) -> Self {
        self.add_element(id);
        self
    }

    pub fn add_element(&self, id: impl Into<ElementId>) {
        self.inner.borrow_mut().elements.insert(id.into());
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.inner.borrow_mut().viewport = Viewport { width, height };
    }

    /// Listeners currently registered on `id`, all events combined.
    pub fn listener_count(&self, id: &ElementId) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|((element, _), _)| element == id)
            .map(|(_, keys)| keys.len())
            .sum()
    }

    pub fn total_listeners(&self) -> usize {
        self.inner.borrow().listeners.values().map(Vec::len).sum()
    }

    /// Every `(element, event, listener)` triple, in a stable order.
    pub fn snapshot(&self) -> Vec<(ElementId, EventKind, BindingKey)> {
        self.inner
            .borrow()
            .listeners
            .iter()
            .flat_map(|((element, event), keys)| {
                keys.iter().map(move |key| (element.clone(), *event, *key))
            })
            .collect()
    }
}

impl ElementHost for HeadlessDocument {
    fn has_element(&self, id: &ElementId) -> bool {
        self.inner.borrow().elements.contains(id)
    }

    fn add_event_listener(&mut self, id: &ElementId, event: EventKind, listener: BindingKey) {
        let mut inner = self.inner.borrow_mut();
        if !inner.elements.contains(id) {
            warn!("Ignoring '{}' listener on missing element '{}'", event, id);
            return;
        }
        let keys = inner.listeners.entry((id.clone(), event)).or_default();
        if !keys.contains(&listener) {
            keys.push(listener);
        }
    }

    fn remove_event_listener(&mut self, id: &ElementId, event: EventKind, listener: BindingKey) {
        let mut inner = self.inner.borrow_mut();
        let entry = (id.clone(), event);
        let now_empty = match inner.listeners.get_mut(&entry) {
            Some(keys) => {
                keys.retain(|key| *key != listener);
                keys.is_empty()
            }
            None => false,
        };
        if now_empty {
            inner.listeners.remove(&entry);
        }
    }

    fn viewport(&self) -> Viewport {
        self.inner.borrow().viewport
    }
}
