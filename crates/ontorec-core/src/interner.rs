//! URI interning: every identifier seen by the core is mapped once to a
//! dense `NodeId` and referenced by that id from then on.

use ahash::AHashMap;

/// Interned identifier (4 bytes instead of a heap string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bidirectional URI <-> `NodeId` cache. Ids are assigned densely in
/// first-seen order, so `uri_by_id` doubles as the reverse map.
#[derive(Debug, Default)]
pub struct Interner {
    id_by_uri: AHashMap<String, NodeId>,
    uri_by_id: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `uri`, assigning the next dense id on first sight.
    pub fn intern(&mut self, uri: &str) -> NodeId {
        if let Some(&id) = self.id_by_uri.get(uri) {
            return id;
        }
        let id = NodeId::new(self.uri_by_id.len() as u32);
        self.id_by_uri.insert(uri.to_string(), id);
        self.uri_by_id.push(uri.to_string());
        id
    }

    /// Looks up an already-assigned id without interning.
    pub fn get(&self, uri: &str) -> Option<NodeId> {
        self.id_by_uri.get(uri).copied()
    }

    pub fn resolve(&self, id: NodeId) -> Option<&str> {
        self.uri_by_id.get(id.index()).map(String::as_str)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.id_by_uri.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.uri_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uri_by_id.is_empty()
    }

    /// Ids of every interned identifier starting with `prefix`. Used by
    /// diagnostics; linear over the cache.
    pub fn ids_with_prefix(&self, prefix: &str) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .id_by_uri
            .iter()
            .filter(|(uri, _)| uri.starts_with(prefix))
            .map(|(_, &id)| id)
            .collect();
        ids.sort();
        ids
    }
}
