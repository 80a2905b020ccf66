use std::collections::HashSet;

use log::{debug, warn};

use crate::error_handling::types::ListenerError;

use super::types::{BindingKey, ElementHost, ElementId, EventKind, ListenerBinding, ScopeToken};

struct Slot<H> {
    generation: u32,
    entry: Option<Entry<H>>,
}

struct Entry<H> {
    sequence: u64,
    binding: ListenerBinding<H>,
}

/// Arena of listener bindings indexed by scope token.
///
/// Every binding is added through [`ListenerRegistry::attach`], which also
/// registers it on the [`ElementHost`], and removed through
/// [`ListenerRegistry::detach`] or [`ListenerRegistry::release_scope`], which
/// unregister it with the same [`BindingKey`]. Removing a binding that is not
/// live is a no-op.
pub struct ListenerRegistry<H> {
    slots: Vec<Slot<H>>,
    free: Vec<usize>,
    open_scopes: HashSet<u64>,
    next_scope: u64,
    next_sequence: u64,
}

impl<H: Clone> ListenerRegistry<H> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            open_scopes: HashSet::new(),
            next_scope: 1,
            next_sequence: 0,
        }
    }

    /// Opens a fresh scope. Tokens are never reused.
    pub fn open_scope(&mut self) -> ScopeToken {
        let token = ScopeToken(self.next_scope);
        self.next_scope += 1;
        self.open_scopes.insert(token.0);
        debug!("Opened listener scope {}", token.0);
        token
    }

    pub fn is_open(&self, scope: ScopeToken) -> bool {
        self.open_scopes.contains(&scope.0)
    }

    /// Binds `handler` to `(target, event)` under `scope` and registers it on `host`.
    ///
    /// Fails if the scope is closed or if a live binding already exists for
    /// the same element and event.
    pub fn attach(
        &mut self,
        host: &mut dyn ElementHost,
        scope: ScopeToken,
        target: &ElementId,
        event: EventKind,
        handler: H,
    ) -> Result<BindingKey, ListenerError> {
        if !self.is_open(scope) {
            return Err(ListenerError::ScopeClosed(scope.0));
        }
        if self.lookup(target, event).is_some() {
            return Err(ListenerError::AlreadyBound {
                target: target.to_string(),
                event: event.to_string(),
            });
        }

        let entry = Entry {
            sequence: self.next_sequence,
            binding: ListenerBinding {
                scope,
                target: target.clone(),
                event,
                handler,
            },
        };
        self.next_sequence += 1;

        let key = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.entry = Some(entry);
                BindingKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                BindingKey {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };

        host.add_event_listener(target, event, key);
        debug!("Bound '{}' on '{}' in scope {}", event, target, scope.0);
        Ok(key)
    }

    /// Removes the binding behind `key` and unregisters it from `host`.
    ///
    /// Returns `false` when the key is stale or unknown.
    pub fn detach(&mut self, host: &mut dyn ElementHost, key: BindingKey) -> bool {
        let Some(slot) = self.slots.get_mut(key.index) else {
            return false;
        };
        if slot.generation != key.generation {
            return false;
        }
        let Some(entry) = slot.entry.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);

        let binding = entry.binding;
        host.remove_event_listener(&binding.target, binding.event, key);
        debug!(
            "Unbound '{}' on '{}' from scope {}",
            binding.event, binding.target, binding.scope.0
        );
        true
    }

    /// Removes every binding still live in `scope`, newest first, and closes it.
    ///
    /// Returns the number of bindings removed. Releasing an unknown or already
    /// released scope removes nothing.
    pub fn release_scope(&mut self, host: &mut dyn ElementHost, scope: ScopeToken) -> usize {
        let mut keys: Vec<(u64, BindingKey)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.entry
                    .as_ref()
                    .filter(|entry| entry.binding.scope == scope)
                    .map(|entry| {
                        (
                            entry.sequence,
                            BindingKey {
                                index,
                                generation: slot.generation,
                            },
                        )
                    })
            })
            .collect();
        keys.sort_by(|a, b| b.0.cmp(&a.0));

        let removed = keys
            .into_iter()
            .filter(|(_, key)| self.detach(host, *key))
            .count();

        if self.open_scopes.remove(&scope.0) {
            debug!("Released listener scope {} ({} bindings)", scope.0, removed);
        } else if removed > 0 {
            warn!("Removed {} bindings from an already closed scope {}", removed, scope.0);
        }
        removed
    }

    pub fn lookup(&self, target: &ElementId, event: EventKind) -> Option<&ListenerBinding<H>> {
        self.live()
            .find(|binding| binding.event == event && &binding.target == target)
    }

    pub fn get(&self, key: BindingKey) -> Option<&ListenerBinding<H>> {
        self.slots
            .get(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_ref())
            .map(|entry| &entry.binding)
    }

    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count_for(&self, target: &ElementId) -> usize {
        self.live().filter(|binding| &binding.target == target).count()
    }

    pub fn count_in(&self, scope: ScopeToken) -> usize {
        self.live().filter(|binding| binding.scope == scope).count()
    }

    fn live(&self) -> impl Iterator<Item = &ListenerBinding<H>> {
        self.slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref().map(|entry| &entry.binding))
    }
}

impl<H: Clone> Default for ListenerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener_registry::types::Viewport;
    use std::collections::HashMap;

    #[derive(Default)]
    struct CountingHost {
        listeners: HashMap<(ElementId, EventKind), Vec<BindingKey>>,
        removals: usize,
    }

    impl CountingHost {
        fn total(&self) -> usize {
            self.listeners.values().map(Vec::len).sum()
        }
    }

    impl ElementHost for CountingHost {
        fn has_element(&self, _id: &ElementId) -> bool {
            true
        }

        fn add_event_listener(&mut self, id: &ElementId, event: EventKind, listener: BindingKey) {
            self.listeners
                .entry((id.clone(), event))
                .or_default()
                .push(listener);
        }

        fn remove_event_listener(&mut self, id: &ElementId, event: EventKind, listener: BindingKey) {
            if let Some(keys) = self.listeners.get_mut(&(id.clone(), event)) {
                keys.retain(|k| *k != listener);
            }
            self.removals += 1;
        }

        fn viewport(&self) -> Viewport {
            Viewport {
                width: 800,
                height: 600,
            }
        }
    }

    fn canvas() -> ElementId {
        ElementId::new("annotationCanvas")
    }

    #[test]
    fn attach_then_release_restores_the_host() {
        let mut host = CountingHost::default();
        let mut registry: ListenerRegistry<&'static str> = ListenerRegistry::new();
        let scope = registry.open_scope();

        registry
            .attach(&mut host, scope, &canvas(), EventKind::PointerDown, "down")
            .unwrap();
        registry
            .attach(&mut host, scope, &canvas(), EventKind::PointerMove, "move")
            .unwrap();
        registry
            .attach(&mut host, scope, &canvas(), EventKind::PointerUp, "up")
            .unwrap();
        assert_eq!(host.total(), 3);
        assert_eq!(registry.count_for(&canvas()), 3);

        assert_eq!(registry.release_scope(&mut host, scope), 3);
        assert_eq!(host.total(), 0);
        assert!(registry.is_empty());
        assert!(!registry.is_open(scope));
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let mut host = CountingHost::default();
        let mut registry: ListenerRegistry<u8> = ListenerRegistry::new();
        let scope = registry.open_scope();

        registry
            .attach(&mut host, scope, &canvas(), EventKind::PointerDown, 1)
            .unwrap();
        let err = registry
            .attach(&mut host, scope, &canvas(), EventKind::PointerDown, 2)
            .unwrap_err();
        assert!(matches!(err, ListenerError::AlreadyBound { .. }));
        assert_eq!(host.total(), 1);
    }

    #[test]
    fn detaching_twice_is_a_no_op() {
        let mut host = CountingHost::default();
        let mut registry: ListenerRegistry<u8> = ListenerRegistry::new();
        let scope = registry.open_scope();
        let key = registry
            .attach(&mut host, scope, &canvas(), EventKind::Click, 1)
            .unwrap();

        assert!(registry.detach(&mut host, key));
        assert!(!registry.detach(&mut host, key));
        assert_eq!(host.removals, 1);
    }

    #[test]
    fn stale_key_does_not_remove_a_newer_binding_in_the_same_slot() {
        let mut host = CountingHost::default();
        let mut registry: ListenerRegistry<u8> = ListenerRegistry::new();
        let first = registry.open_scope();
        let old = registry
            .attach(&mut host, first, &canvas(), EventKind::PointerDown, 1)
            .unwrap();
        registry.release_scope(&mut host, first);

        let second = registry.open_scope();
        let fresh = registry
            .attach(&mut host, second, &canvas(), EventKind::PointerDown, 2)
            .unwrap();
        assert_eq!(old.index, fresh.index);

        assert!(!registry.detach(&mut host, old));
        assert_eq!(registry.get(fresh).map(|b| b.handler), Some(2));
        assert_eq!(registry.count_in(second), 1);
    }

    #[test]
    fn closed_scope_rejects_new_bindings() {
        let mut host = CountingHost::default();
        let mut registry: ListenerRegistry<u8> = ListenerRegistry::new();
        let scope = registry.open_scope();
        registry.release_scope(&mut host, scope);

        let err = registry
            .attach(&mut host, scope, &canvas(), EventKind::Click, 1)
            .unwrap_err();
        assert_eq!(err, ListenerError::ScopeClosed(scope.value()));
    }

    #[test]
    fn releasing_one_scope_leaves_the_other_alone() {
        let mut host = CountingHost::default();
        let mut registry: ListenerRegistry<u8> = ListenerRegistry::new();
        let controls = registry.open_scope();
        let session = registry.open_scope();
        let start = ElementId::new("startScreenShare");

        registry
            .attach(&mut host, controls, &start, EventKind::Click, 0)
            .unwrap();
        registry
            .attach(&mut host, session, &canvas(), EventKind::PointerMove, 1)
            .unwrap();

        assert_eq!(registry.release_scope(&mut host, session), 1);
        assert_eq!(registry.release_scope(&mut host, session), 0);
        assert!(registry.lookup(&start, EventKind::Click).is_some());
        assert_eq!(host.total(), 1);
    }
}
