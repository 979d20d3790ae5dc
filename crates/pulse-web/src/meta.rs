//! Side metadata tracked for every rendered element (§3 invariants: "Every
//! element in the React tree has associated metadata ... tracked outside
//! React props; the metadata moves with the element through
//! reconciliation").
//!
//! React elements produced by the FFI boundary are opaque `JsValue`s, so
//! metadata can't be hung off object identity the way a native DOM node
//! could carry an expando. Instead it's keyed by [`Path`] — the same
//! identity the server already uses to address callbacks and patches.

use std::collections::HashMap;

use pulse_core::Path;

#[derive(Debug, Clone, Default)]
pub struct NodeMeta {
    pub eval: Vec<String>,
    pub cb_keys: Vec<String>,
    pub path: Path,
}

#[derive(Default)]
pub struct MetaStore {
    entries: HashMap<String, NodeMeta>,
}

impl MetaStore {
    pub fn new() -> MetaStore {
        MetaStore::default()
    }

    pub fn insert(&mut self, meta: NodeMeta) {
        self.entries.insert(meta.path.to_string(), meta);
    }

    pub fn get(&self, path: &Path) -> Option<&NodeMeta> {
        self.entries.get(&path.to_string())
    }

    pub fn remove(&mut self, path: &Path) -> Option<NodeMeta> {
        self.entries.remove(&path.to_string())
    }

    /// Every entry whose path lies within (or equals) `ancestor`, e.g. for
    /// tearing down callbacks in a subtree being replaced or removed.
    pub fn remove_subtree(&mut self, ancestor: &Path) -> Vec<NodeMeta> {
        let doomed: Vec<String> = self
            .entries
            .values()
            .filter(|meta| meta.path.is_within(ancestor))
            .map(|meta| meta.path.to_string())
            .collect();
        doomed.into_iter().filter_map(|key| self.entries.remove(&key)).collect()
    }

    /// Re-key every entry under `old_prefix` to the same relative position
    /// under `new_prefix` (§4.3 "Rebinding on move").
    pub fn rebind_subtree(&mut self, old_prefix: &Path, new_prefix: &Path) {
        let moved: Vec<(String, NodeMeta)> = self
            .entries
            .iter()
            .filter(|(_, meta)| meta.path.is_within(old_prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (old_key, mut meta) in moved {
            self.entries.remove(&old_key);
            let suffix = &meta.path.segments()[old_prefix.segments().len()..];
            let mut rebased = new_prefix.clone();
            for seg in suffix {
                rebased = match seg {
                    pulse_core::PathSegment::Index(i) => rebased.child_index(*i),
                    pulse_core::PathSegment::Key(k) => rebased.child_key(k.clone()),
                };
            }
            meta.path = rebased;
            self.entries.insert(meta.path.to_string(), meta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_subtree_only_takes_descendants() {
        let mut store = MetaStore::new();
        store.insert(NodeMeta { path: Path::root().child_index(0), ..Default::default() });
        store.insert(NodeMeta { path: Path::root().child_index(0).child_key("footer"), ..Default::default() });
        store.insert(NodeMeta { path: Path::root().child_index(1), ..Default::default() });

        let removed = store.remove_subtree(&Path::root().child_index(0));
        assert_eq!(removed.len(), 2);
        assert!(store.get(&Path::root().child_index(1)).is_some());
    }

    #[test]
    fn rebind_subtree_moves_paths_preserving_suffix() {
        let mut store = MetaStore::new();
        let old = Path::root().child_index(0);
        store.insert(NodeMeta { eval: vec!["onClick".into()], path: old.child_key("onClick"), ..Default::default() });

        let new = Path::root().child_index(2);
        store.rebind_subtree(&old, &new);

        assert!(store.get(&old.child_key("onClick")).is_none());
        assert!(store.get(&new.child_key("onClick")).is_some());
    }
}
