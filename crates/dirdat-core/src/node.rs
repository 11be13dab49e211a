//! Hierarchy node types: directories, groups and leaf records.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Unique identifier for a node within a tree.
///
/// Two lookups that resolve to the same `NodeId` refer to the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new NodeId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Digests and size of one file's full content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DigestResult {
    /// Number of bytes hashed.
    pub size: u64,
    /// CRC-32 (ISO polynomial, initial value 0).
    pub crc32: u32,
    /// MD5 digest.
    pub md5: [u8; 16],
    /// SHA-1 digest.
    pub sha1: [u8; 20],
}

impl DigestResult {
    /// CRC-32 as 8 lowercase hex digits.
    pub fn crc32_hex(&self) -> String {
        format!("{:08x}", self.crc32)
    }

    /// MD5 as 32 lowercase hex digits.
    pub fn md5_hex(&self) -> String {
        hex::encode(self.md5)
    }

    /// SHA-1 as 40 lowercase hex digits.
    pub fn sha1_hex(&self) -> String {
        hex::encode(self.sha1)
    }
}

/// Type of hierarchy node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    /// A folder in the output, holding further directories or groups.
    Directory {
        /// Child directories and groups, in insertion order.
        children: Vec<NodeId>,
    },
    /// A group ("game") holding leaf records.
    Group {
        /// Leaf records, in insertion order.
        children: Vec<NodeId>,
    },
    /// A single file record. Never has children.
    Leaf(DigestResult),
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory { .. })
    }

    /// Check if this is a group.
    pub fn is_group(&self) -> bool {
        matches!(self, NodeKind::Group { .. })
    }

    /// Check if this is a leaf record.
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Leaf(_))
    }
}

/// A single node of the catalog hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatNode {
    /// Unique identifier for this node.
    pub id: NodeId,

    /// Directory name, group name, or folded leaf name.
    pub name: CompactString,

    /// Node type and associated data.
    pub kind: NodeKind,
}

impl DatNode {
    /// Create a new, empty directory node.
    pub fn new_directory(id: NodeId, name: impl Into<CompactString>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: NodeKind::Directory {
                children: Vec::new(),
            },
        }
    }

    /// Create a new, empty group node.
    pub fn new_group(id: NodeId, name: impl Into<CompactString>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: NodeKind::Group {
                children: Vec::new(),
            },
        }
    }

    /// Create a new leaf record.
    pub fn new_leaf(id: NodeId, name: impl Into<CompactString>, digest: DigestResult) -> Self {
        Self {
            id,
            name: name.into(),
            kind: NodeKind::Leaf(digest),
        }
    }

    /// Children of a directory or group; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children } | NodeKind::Group { children } => children,
            NodeKind::Leaf(_) => &[],
        }
    }

    /// Digest of a leaf record.
    pub fn digest(&self) -> Option<&DigestResult> {
        match &self.kind {
            NodeKind::Leaf(digest) => Some(digest),
            _ => None,
        }
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        match &mut self.kind {
            NodeKind::Directory { children } | NodeKind::Group { children } => {
                children.push(child)
            }
            NodeKind::Leaf(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_digest() -> DigestResult {
        DigestResult {
            size: 3,
            crc32: 0x352441c2,
            md5: [0x90; 16],
            sha1: [0x0a; 20],
        }
    }

    #[test]
    fn test_crc_is_zero_padded() {
        let digest = DigestResult {
            crc32: 0x1f,
            ..sample_digest()
        };
        assert_eq!(digest.crc32_hex(), "0000001f");
    }

    #[test]
    fn test_hex_lengths() {
        let digest = sample_digest();
        assert_eq!(digest.md5_hex().len(), 32);
        assert_eq!(digest.sha1_hex().len(), 40);
        assert!(digest.sha1_hex().starts_with("0a0a"));
    }

    #[test]
    fn test_leaf_has_no_children() {
        let mut leaf = DatNode::new_leaf(NodeId::new(3), "a.bin", sample_digest());
        leaf.push_child(NodeId::new(4));
        assert!(leaf.children().is_empty());
        assert!(leaf.digest().is_some());
    }

    #[test]
    fn test_group_collects_children() {
        let mut group = DatNode::new_group(NodeId::new(1), "game");
        group.push_child(NodeId::new(2));
        group.push_child(NodeId::new(5));
        assert!(group.kind.is_group());
        assert_eq!(group.children(), &[NodeId::new(2), NodeId::new(5)]);
    }
}
