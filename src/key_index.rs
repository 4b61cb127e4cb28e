use crate::model::SongKey;
use crate::sequence::NodeId;
use std::collections::HashMap;

/// Composite key to sequence handle.
///
/// `put` overwrites an existing entry; the engine checks `contains_key`
/// before inserting.
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: HashMap<SongKey, NodeId>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: SongKey, id: NodeId) -> Option<NodeId> {
        self.entries.insert(key, id)
    }

    pub fn get(&self, key: &SongKey) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    pub fn remove(&mut self, key: &SongKey) -> Option<NodeId> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &SongKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
