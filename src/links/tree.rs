use crate::document::{DocKey, DocStatus};
use ahash::AHashMap;
use serde::Serialize;

pub type NodeId = usize;

/// One document in a `DocumentTree`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub key: DocKey,
    pub docstatus: DocStatus,
    pub children: Vec<NodeId>,
    pub is_current: bool,
    pub is_in_path: bool,
    pub is_submitted: bool,
}

/// Documents reachable over source references, stored in an arena.
///
/// Node 0 is the root. Each document appears once; `index` maps a key back to its node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentTree {
    nodes: Vec<FlowNode>,
    #[serde(skip)]
    index: AHashMap<DocKey, NodeId>,
}

impl DocumentTree {
    pub(crate) fn add(&mut self, key: DocKey, docstatus: DocStatus) -> NodeId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.nodes.len();
        self.index.insert(key.clone(), id);
        self.nodes.push(FlowNode {
            key,
            docstatus,
            children: Vec::new(),
            is_current: false,
            is_in_path: false,
            is_submitted: docstatus == DocStatus::Submitted,
        });
        id
    }

    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent) {
            if !node.children.contains(&child) {
                node.children.push(child);
            }
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut FlowNode> {
        self.nodes.get_mut(id)
    }

    pub fn root(&self) -> Option<&FlowNode> {
        self.nodes.first()
    }

    pub fn node(&self, id: NodeId) -> Option<&FlowNode> {
        self.nodes.get(id)
    }

    pub fn find(&self, key: &DocKey) -> Option<&FlowNode> {
        self.index.get(key).and_then(|&id| self.nodes.get(id))
    }

    pub(crate) fn find_id(&self, key: &DocKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &DocKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    /// Pre-order traversal from the root as `(node, depth)` pairs.
    pub fn walk(&self) -> Vec<(&FlowNode, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            out.push((node, depth));
            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

/// The full chain around one document, rooted at its furthest ancestor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFlow {
    pub root: DocKey,
    pub current: DocKey,
    pub tree: DocumentTree,
}
