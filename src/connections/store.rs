//! In-memory connection store
//!
//! Ordered collection of connection definitions, the single source of truth
//! for desired configuration. Mutations are synchronous and ordering-stable:
//! unaffected entries keep their index except where a removal shifts later
//! entries up. When shared between the UI thread and the status poller the
//! store sits behind one coarse `Mutex`.

use anyhow::{bail, Result};

use crate::connections::definition::{ConnectionDefinition, ConnectionId};

#[derive(Debug, Clone)]
struct Entry {
    id: ConnectionId,
    def: ConnectionDefinition,
}

/// Ordered store of connection definitions keyed by stable id.
#[derive(Debug, Default)]
pub struct ConnectionStore {
    entries: Vec<Entry>,
    next_id: u64,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded definitions, assigning fresh ids in order.
    pub fn from_definitions(defs: Vec<ConnectionDefinition>) -> Self {
        let mut store = Self::new();
        for def in defs {
            store.add(def);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions in stored order.
    pub fn list(&self) -> Vec<ConnectionDefinition> {
        self.entries.iter().map(|e| e.def.clone()).collect()
    }

    /// `(id, definition)` pairs in stored order, for callers that dispatch
    /// actions by identity rather than position.
    pub fn list_with_ids(&self) -> Vec<(ConnectionId, ConnectionDefinition)> {
        self.entries.iter().map(|e| (e.id, e.def.clone())).collect()
    }

    /// Append a definition and return its assigned id.
    pub fn add(&mut self, def: ConnectionDefinition) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, def });
        id
    }

    pub fn get(&self, index: usize) -> Option<&ConnectionDefinition> {
        self.entries.get(index).map(|e| &e.def)
    }

    pub fn id_at(&self, index: usize) -> Option<ConnectionId> {
        self.entries.get(index).map(|e| e.id)
    }

    pub fn by_id(&self, id: ConnectionId) -> Option<&ConnectionDefinition> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.def)
    }

    pub fn index_of(&self, id: ConnectionId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// First definition with the given name. Names are not unique; callers
    /// wanting an unambiguous handle should use [`ConnectionId`].
    pub fn find_by_name(&self, name: &str) -> Option<(ConnectionId, &ConnectionDefinition)> {
        self.entries
            .iter()
            .find(|e| e.def.name == name)
            .map(|e| (e.id, &e.def))
    }

    /// Replace the definition at `index`, keeping its id.
    pub fn update(&mut self, index: usize, def: ConnectionDefinition) -> Result<()> {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.def = def;
                Ok(())
            }
            None => bail!("Connection index {} out of range", index),
        }
    }

    /// Remove and return the definition at `index`.
    pub fn remove(&mut self, index: usize) -> Result<ConnectionDefinition> {
        if index >= self.entries.len() {
            bail!("Connection index {} out of range", index);
        }
        Ok(self.entries.remove(index).def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> ConnectionDefinition {
        ConnectionDefinition {
            name: name.to_string(),
            host: "example.com".to_string(),
            username: "user".to_string(),
            local_mount_point: format!("/mnt/{}", name),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_list_preserves_order() {
        let mut store = ConnectionStore::new();
        store.add(named("a"));
        store.add(named("b"));
        store.add(named("c"));

        let names: Vec<String> = store.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ids_stable_across_removal() {
        let mut store = ConnectionStore::new();
        let a = store.add(named("a"));
        let b = store.add(named("b"));
        let c = store.add(named("c"));

        store.remove(1).unwrap();

        assert_eq!(store.index_of(a), Some(0));
        assert_eq!(store.index_of(b), None);
        assert_eq!(store.index_of(c), Some(1));
        assert_eq!(store.by_id(c).unwrap().name, "c");
    }

    #[test]
    fn test_update_keeps_id() {
        let mut store = ConnectionStore::new();
        let id = store.add(named("old"));
        store.update(0, named("new")).unwrap();
        assert_eq!(store.by_id(id).unwrap().name, "new");
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut store = ConnectionStore::new();
        store.add(named("only"));
        assert!(store.update(1, named("x")).is_err());
        assert!(store.remove(1).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_by_name_first_match() {
        let mut store = ConnectionStore::new();
        let first = store.add(named("dup"));
        store.add(named("dup"));

        let (id, _) = store.find_by_name("dup").unwrap();
        assert_eq!(id, first);
        assert!(store.find_by_name("missing").is_none());
    }
}
