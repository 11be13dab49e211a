//! Catalog tree container and the cached builder that fills it.

use std::collections::HashMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::fold::FoldedPath;
use crate::node::{DatNode, DigestResult, NodeId, NodeKind};

/// Summary statistics for a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total size of all leaves in bytes.
    pub total_size: u64,
    /// Number of leaf records.
    pub leaves: u64,
    /// Number of group nodes.
    pub groups: u64,
    /// Number of directory nodes.
    pub directories: u64,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, kind: &NodeKind) {
        match kind {
            NodeKind::Directory { .. } => self.directories += 1,
            NodeKind::Group { .. } => self.groups += 1,
            NodeKind::Leaf(digest) => {
                self.leaves += 1;
                self.total_size += digest.size;
            }
        }
    }
}

/// One leaf with the names of the nodes above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry<'a> {
    /// Directory names followed by the group name.
    pub group_path: Vec<&'a str>,
    /// Leaf name.
    pub name: &'a str,
    /// Leaf digest.
    pub digest: &'a DigestResult,
}

/// The directory / group / leaf hierarchy of one run.
///
/// Nodes live in an arena and refer to each other by [`NodeId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatTree {
    nodes: Vec<DatNode>,
    roots: Vec<NodeId>,
    stats: TreeStats,
}

impl DatTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level nodes, in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&DatNode> {
        self.nodes.get(id.index())
    }

    /// Iterate over the children of `id`.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &DatNode> {
        self.get(id)
            .map(DatNode::children)
            .unwrap_or_default()
            .iter()
            .filter_map(move |child| self.get(*child))
    }

    /// Iterate over the top-level nodes.
    pub fn top_level(&self) -> impl Iterator<Item = &DatNode> {
        self.roots.iter().filter_map(move |id| self.get(*id))
    }

    /// Summary statistics.
    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    /// Total number of nodes of every kind.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All leaves in document order.
    pub fn leaf_entries(&self) -> Vec<LeafEntry<'_>> {
        let mut entries = Vec::new();
        let mut path = Vec::new();
        for root in &self.roots {
            self.collect_leaves(*root, &mut path, &mut entries);
        }
        entries
    }

    fn collect_leaves<'a>(
        &'a self,
        id: NodeId,
        path: &mut Vec<&'a str>,
        entries: &mut Vec<LeafEntry<'a>>,
    ) {
        let Some(node) = self.get(id) else {
            return;
        };

        match &node.kind {
            NodeKind::Leaf(digest) => entries.push(LeafEntry {
                group_path: path.clone(),
                name: node.name.as_str(),
                digest,
            }),
            NodeKind::Directory { children } | NodeKind::Group { children } => {
                path.push(node.name.as_str());
                for child in children {
                    self.collect_leaves(*child, path, entries);
                }
                path.pop();
            }
        }
    }

    fn push(&mut self, parent: Option<NodeId>, make: impl FnOnce(NodeId) -> DatNode) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64);
        let node = make(id);
        self.stats.record(&node.kind);
        self.nodes.push(node);

        match parent.and_then(|p| self.nodes.get_mut(p.index())) {
            Some(parent) => parent.push_child(id),
            None => self.roots.push(id),
        }
        id
    }
}

/// Builds a [`DatTree`], reusing nodes for repeated path prefixes.
///
/// Directories are cached by `(level, prefix)` and groups by
/// `(dir count, dirs + group)`, so every file that shares a prefix lands
/// under the same node regardless of insertion order.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: DatTree,
    dir_cache: HashMap<(usize, String), NodeId>,
    group_cache: HashMap<(usize, String), NodeId>,
    global_group: Option<NodeId>,
}

impl TreeBuilder {
    /// Create a builder that folds into directories and groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder whose leaves all go into one group.
    pub fn with_global_group(name: impl Into<CompactString>) -> Self {
        let mut tree = DatTree::new();
        let name = name.into();
        let id = tree.push(None, |id| DatNode::new_group(id, name));
        Self {
            tree,
            global_group: Some(id),
            ..Self::default()
        }
    }

    /// Create the builder matching a run's fold depth.
    pub fn for_config(config: &RunConfig) -> Self {
        if config.fold_depth == 0 {
            Self::with_global_group(config.fallback_group())
        } else {
            Self::new()
        }
    }

    /// Insert a folded path's leaf record.
    pub fn insert_folded(&mut self, folded: &FoldedPath, digest: DigestResult) -> NodeId {
        self.insert(
            folded.dirs.as_slice(),
            folded.group.as_str(),
            folded.leaf.as_str(),
            digest,
        )
    }

    /// Insert a leaf under `dirs` / `group`, creating missing nodes.
    ///
    /// Returns the id of the new leaf.
    pub fn insert<S: AsRef<str>>(
        &mut self,
        dirs: &[S],
        group: &str,
        leaf: &str,
        digest: DigestResult,
    ) -> NodeId {
        let group_id = match self.global_group {
            Some(id) => id,
            None => {
                let parent = self.resolve_dirs(dirs);
                self.resolve_group(parent, dirs, group)
            }
        };

        self.tree
            .push(Some(group_id), |id| DatNode::new_leaf(id, leaf, digest))
    }

    fn resolve_dirs<S: AsRef<str>>(&mut self, dirs: &[S]) -> Option<NodeId> {
        let mut parent = None;
        let mut prefix = String::new();

        for (level, dir) in dirs.iter().enumerate() {
            let dir = dir.as_ref();
            if level > 0 {
                prefix.push('/');
            }
            prefix.push_str(dir);

            let key = (level + 1, prefix.clone());
            let id = match self.dir_cache.get(&key) {
                Some(id) => *id,
                None => {
                    let id = self
                        .tree
                        .push(parent, |id| DatNode::new_directory(id, dir));
                    self.dir_cache.insert(key, id);
                    id
                }
            };
            parent = Some(id);
        }
        parent
    }

    fn resolve_group<S: AsRef<str>>(
        &mut self,
        parent: Option<NodeId>,
        dirs: &[S],
        group: &str,
    ) -> NodeId {
        let key = (dirs.len(), group_key(dirs, group));
        if let Some(id) = self.group_cache.get(&key) {
            return *id;
        }

        let id = self.tree.push(parent, |id| DatNode::new_group(id, group));
        self.group_cache.insert(key, id);
        id
    }

    /// Cached directory node for a directory chain, if it exists.
    pub fn directory_id<S: AsRef<str>>(&self, dirs: &[S]) -> Option<NodeId> {
        let prefix = dirs.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("/");
        self.dir_cache.get(&(dirs.len(), prefix)).copied()
    }

    /// Cached group node for a directory chain and group name, if it exists.
    pub fn group_id<S: AsRef<str>>(&self, dirs: &[S], group: &str) -> Option<NodeId> {
        if let Some(id) = self.global_group {
            return Some(id);
        }
        self.group_cache
            .get(&(dirs.len(), group_key(dirs, group)))
            .copied()
    }

    /// The tree built so far.
    pub fn tree(&self) -> &DatTree {
        &self.tree
    }

    /// Consume the builder, returning the tree.
    pub fn finish(self) -> DatTree {
        self.tree
    }
}

fn group_key<S: AsRef<str>>(dirs: &[S], group: &str) -> String {
    let mut key = String::new();
    for dir in dirs {
        key.push_str(dir.as_ref());
        key.push('/');
    }
    key.push_str(group);
    key
}
