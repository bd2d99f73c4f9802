use indexmap::IndexMap;

use super::{EventKind, EventType};

/// Listener table keyed by event kind, then by namespace.
///
/// Registering an existing type replaces its listener and moves it to the
/// end of the invocation order; registering `None` removes it.
#[derive(Debug, Clone)]
pub struct Dispatch<L> {
    kinds: &'static [EventKind],
    table: IndexMap<EventKind, IndexMap<String, L>>,
}

impl<L: Clone> Dispatch<L> {
    /// Creates a table accepting only `kinds`.
    #[must_use]
    pub fn new(kinds: &'static [EventKind]) -> Self {
        Self {
            kinds,
            table: kinds.iter().map(|kind| (*kind, IndexMap::new())).collect(),
        }
    }

    #[must_use]
    pub fn accepts(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Sets or clears the listener for `event`.
    ///
    /// Returns `false` if the table does not accept the event kind.
    pub fn on(&mut self, event: &EventType, listener: Option<L>) -> bool {
        let Some(listeners) = self.table.get_mut(&event.kind()) else {
            return false;
        };
        let key = event.namespace().unwrap_or_default();
        listeners.shift_remove(key);
        if let Some(listener) = listener {
            listeners.insert(key.to_owned(), listener);
        }
        true
    }

    #[must_use]
    pub fn get(&self, event: &EventType) -> Option<&L> {
        self.table
            .get(&event.kind())?
            .get(event.namespace().unwrap_or_default())
    }

    /// Snapshot of listeners for `kind` in registration order.
    ///
    /// Callers invoke the snapshot so listeners may re-register while running.
    #[must_use]
    pub fn listeners(&self, kind: EventKind) -> Vec<L> {
        self.table
            .get(&kind)
            .map(|listeners| listeners.values().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self, kind: EventKind) -> usize {
        self.table.get(&kind).map_or(0, IndexMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.values().all(IndexMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT_KINDS: &[EventKind] = &EventKind::ALL;

    #[test]
    fn namespaces_coexist_and_replacement_moves_to_end() {
        let mut dispatch = Dispatch::new(CONTEXT_KINDS);
        dispatch.on(&EventType::change(), Some("a"));
        dispatch.on(&EventType::change().with_namespace("x"), Some("b"));
        dispatch.on(&EventType::change(), Some("c"));

        assert_eq!(dispatch.listeners(EventKind::Change), vec!["b", "c"]);
        assert_eq!(dispatch.get(&EventType::change()), Some(&"c"));
    }

    #[test]
    fn none_removes_listener() {
        let mut dispatch = Dispatch::new(CONTEXT_KINDS);
        dispatch.on(&EventType::focus(), Some(1));
        dispatch.on(&EventType::focus(), None);
        assert!(dispatch.is_empty());
    }

    #[test]
    fn restricted_table_refuses_other_kinds() {
        let mut dispatch = Dispatch::new(&[EventKind::Change]);
        assert!(!dispatch.on(&EventType::focus(), Some(1)));
        assert!(!dispatch.accepts(EventKind::Focus));
        assert_eq!(dispatch.len(EventKind::Focus), 0);
    }
}
