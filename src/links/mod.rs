//! The document link graph: persisted forward edges plus walks over source references.

use crate::document::{DocKey, DocType, LinkEdge, ProcurementDocument};
use crate::error::{StoreError, ValidationError};
use crate::schema::SchemaRegistry;
use crate::store::{DocumentFilter, DocumentStore};
use ahash::AHashSet;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, warn};

mod tree;

pub use tree::*;

/// Upper bound on backward hops when following source references.
pub const MAX_ANCESTOR_HOPS: usize = 20;

/// Ancestors (root first) and direct forward links of one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentChain {
    pub backward: Vec<DocKey>,
    pub forward: Vec<LinkEdge>,
}

/// Documents of one type related to a given document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkedGroup {
    pub count: usize,
    pub documents: Vec<String>,
}

/// Related documents grouped by type, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkedDocuments {
    pub backward: IndexMap<DocType, LinkedGroup>,
    pub forward: IndexMap<DocType, LinkedGroup>,
}

impl LinkedDocuments {
    pub fn backward_count(&self) -> usize {
        self.backward.values().map(|g| g.count).sum()
    }

    pub fn forward_count(&self) -> usize {
        self.forward.values().map(|g| g.count).sum()
    }
}

fn push_grouped(groups: &mut IndexMap<DocType, LinkedGroup>, key: &DocKey) {
    let group = groups.entry(key.doctype).or_default();
    group.count += 1;
    group.documents.push(key.id.clone());
}

/// Builds and walks the link graph over a store.
pub struct LinkGraph<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    schema: &'a SchemaRegistry,
}

impl<'a, S: DocumentStore + ?Sized> LinkGraph<'a, S> {
    pub fn new(store: &'a S, schema: &'a SchemaRegistry) -> Self {
        Self { store, schema }
    }

    /// Appends a `source -> target` edge to the source record, once.
    ///
    /// Failures never propagate: a missing link-storage field or a store error is logged
    /// and `false` is returned, leaving the target's submission untouched.
    pub fn record_link(&self, source: &DocKey, target: &DocKey) -> bool {
        if !self.schema.supports_links(source.doctype) {
            warn!(
                "{} has no link storage, skipping link to {}",
                source.doctype, target
            );
            return false;
        }

        let existing = match self.store.get(source.doctype, &source.id) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Could not record link {} -> {}: {}", source, target, e);
                return false;
            }
        };
        if existing.has_link_to(target) {
            debug!("Link {} -> {} already recorded", source, target);
            return true;
        }

        match self
            .store
            .append_link(&LinkEdge::new(source.clone(), target.clone()))
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not record link {} -> {}: {}", source, target, e);
                false
            }
        }
    }

    /// Rejects cancellation while any forward link exists.
    pub fn can_cancel(&self, doc: &ProcurementDocument) -> Result<(), ValidationError> {
        if doc.forward_links.is_empty() {
            return Ok(());
        }
        let mut grouped: IndexMap<DocType, Vec<String>> = IndexMap::new();
        for edge in &doc.forward_links {
            let ids = grouped.entry(edge.target.doctype).or_default();
            if !ids.contains(&edge.target.id) {
                ids.push(edge.target.id.clone());
            }
        }
        Err(ValidationError::CancelBlocked {
            doctype: doc.doctype,
            id: doc.id.clone(),
            blocking: grouped.into_iter().collect(),
        })
    }

    /// Follows source references backward, root first, excluding `doc` itself.
    ///
    /// Stops quietly at a missing record, a revisited node or after `MAX_ANCESTOR_HOPS`.
    pub fn ancestor_chain(&self, doc: &ProcurementDocument) -> Result<Vec<DocKey>, StoreError> {
        let mut chain = Vec::new();
        let mut seen = AHashSet::new();
        seen.insert(doc.key());
        let mut next = doc.source_key();

        while let Some(key) = next.take() {
            if chain.len() >= MAX_ANCESTOR_HOPS || !seen.insert(key.clone()) {
                break;
            }
            match self.store.get(key.doctype, &key.id) {
                Ok(parent) => {
                    next = parent.source_key();
                    chain.push(key);
                }
                Err(e) if e.is_not_found() => {
                    debug!("Ancestor walk stopped at missing {}", key);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        chain.reverse();
        Ok(chain)
    }

    pub fn document_chain(&self, doctype: DocType, id: &str) -> Result<DocumentChain, StoreError> {
        let doc = self.store.get(doctype, id)?;
        Ok(DocumentChain {
            backward: self.ancestor_chain(&doc)?,
            forward: doc.forward_links.clone(),
        })
    }

    /// Ancestors plus every non-cancelled descendant, found through source references.
    ///
    /// Drafts count as descendants. Each document is reported once.
    pub fn linked_documents_with_counts(
        &self,
        doctype: DocType,
        id: &str,
    ) -> Result<LinkedDocuments, StoreError> {
        let doc = self.store.get(doctype, id)?;
        let mut linked = LinkedDocuments::default();

        for key in self.ancestor_chain(&doc)? {
            push_grouped(&mut linked.backward, &key);
        }

        for key in self.descendants(&doc.key())? {
            push_grouped(&mut linked.forward, &key);
        }
        Ok(linked)
    }

    /// Breadth-first walk over source references across all document types.
    pub fn descendants(&self, start: &DocKey) -> Result<Vec<DocKey>, StoreError> {
        let mut visited = AHashSet::new();
        visited.insert(start.clone());
        let mut queue = VecDeque::from([start.clone()]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            let filter = DocumentFilter::sourced_from(current).not_cancelled();
            for doctype in DocType::ALL {
                for child in self.store.query(doctype, &filter)? {
                    let key = child.key();
                    if visited.insert(key.clone()) {
                        found.push(key.clone());
                        queue.push_back(key);
                    }
                }
            }
        }
        Ok(found)
    }

    /// Builds the tree of non-cancelled documents below `root`, drafts included, by
    /// following source references level by level.
    pub fn descendant_tree(&self, root: &ProcurementDocument) -> Result<DocumentTree, StoreError> {
        let mut tree = DocumentTree::default();
        let root_id = tree.add(root.key(), root.docstatus);
        let mut queue = VecDeque::from([(root_id, root.key())]);

        while let Some((parent, key)) = queue.pop_front() {
            let filter = DocumentFilter::sourced_from(key).not_cancelled();
            for doctype in DocType::ALL {
                for child in self.store.query(doctype, &filter)? {
                    let child_key = child.key();
                    if tree.contains(&child_key) {
                        continue;
                    }
                    let child_id = tree.add(child_key.clone(), child.docstatus);
                    tree.attach(parent, child_id);
                    queue.push_back((child_id, child_key));
                }
            }
        }
        Ok(tree)
    }

    /// The whole flow around a document: its root ancestor's tree, with the current
    /// document and the root-to-current path marked.
    pub fn document_flow(&self, doctype: DocType, id: &str) -> Result<DocumentFlow, StoreError> {
        let current = self.store.get(doctype, id)?;
        let ancestors = self.ancestor_chain(&current)?;

        let root = match ancestors.first() {
            Some(key) => self.store.get(key.doctype, &key.id)?,
            None => current.clone(),
        };
        let mut tree = self.descendant_tree(&root)?;

        let current_key = current.key();
        if !tree.contains(&current_key) {
            // Cancelled documents are left out of the walk but still get a node when viewed.
            let parent = ancestors
                .last()
                .and_then(|key| tree.find_id(key))
                .unwrap_or(0);
            let node = tree.add(current_key.clone(), current.docstatus);
            tree.attach(parent, node);
        }
        let path: AHashSet<DocKey> = ancestors
            .into_iter()
            .chain(std::iter::once(current_key.clone()))
            .collect();

        let keys: Vec<(NodeId, DocKey)> = tree
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (i, n.key.clone()))
            .collect();
        for (node_id, key) in keys {
            if let Some(node) = tree.node_mut(node_id) {
                node.is_current = key == current_key;
                node.is_in_path = path.contains(&key);
            }
        }

        Ok(DocumentFlow {
            root: root.key(),
            current: current_key,
            tree,
        })
    }
}
