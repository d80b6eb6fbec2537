use super::{DocumentFilter, DocumentStore, WriteMode};
use crate::document::{DocKey, DocStatus, DocType, LinkEdge, ProcurementDocument};
use crate::error::StoreError;
use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct State {
    documents: IndexMap<DocKey, ProcurementDocument>,
    counters: AHashMap<DocType, u64>,
}

/// An in-process `DocumentStore`. Records keep insertion order, so queries are deterministic.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    no_link_storage: AHashSet<DocType>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `documents`, bypassing lifecycle checks.
    pub fn with_documents(documents: impl IntoIterator<Item = ProcurementDocument>) -> Self {
        let mut store = Self::new();
        let state = store.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state
            .documents
            .extend(documents.into_iter().map(|doc| (doc.key(), doc)));
        store
    }

    /// Simulates a host whose records of `doctype` have no link-storage field.
    pub fn without_link_storage(mut self, doctype: DocType) -> Self {
        self.no_link_storage.insert(doctype);
        self
    }

    /// Writes a record as-is, whatever its status. Intended for fixtures and data loading.
    pub fn insert(&self, doc: ProcurementDocument) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.documents.insert(doc.key(), doc);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().map(|s| s.documents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored record, in insertion order.
    pub fn documents(&self) -> Result<Vec<ProcurementDocument>, StoreError> {
        Ok(self.read()?.documents.values().cloned().collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn transition(
        &self,
        doctype: DocType,
        id: &str,
        from: DocStatus,
        to: DocStatus,
    ) -> Result<ProcurementDocument, StoreError> {
        let mut state = self.write()?;
        let doc = state
            .documents
            .get_mut(&DocKey::new(doctype, id))
            .ok_or_else(|| StoreError::not_found(doctype, id))?;
        if doc.docstatus != from {
            return Err(StoreError::ReadOnly {
                doctype,
                id: id.to_string(),
                status: doc.docstatus.to_string(),
            });
        }
        doc.docstatus = to;
        Ok(doc.clone())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, doctype: DocType, id: &str) -> Result<ProcurementDocument, StoreError> {
        self.read()?
            .documents
            .get(&DocKey::new(doctype, id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(doctype, id))
    }

    fn query(
        &self,
        doctype: DocType,
        filter: &DocumentFilter,
    ) -> Result<Vec<ProcurementDocument>, StoreError> {
        Ok(self
            .read()?
            .documents
            .values()
            .filter(|d| d.doctype == doctype && filter.matches(d))
            .cloned()
            .collect())
    }

    fn exists(&self, doctype: DocType, id: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.documents.contains_key(&DocKey::new(doctype, id)))
    }

    fn save(&self, doc: &ProcurementDocument, mode: WriteMode) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let key = doc.key();
        if let Some(existing) = state.documents.get(&key) {
            let locked = match mode {
                WriteMode::Normal => existing.docstatus != DocStatus::Draft,
                WriteMode::AllowSubmittedUpdate => existing.docstatus == DocStatus::Cancelled,
            };
            if locked {
                return Err(StoreError::ReadOnly {
                    doctype: doc.doctype,
                    id: doc.id.clone(),
                    status: existing.docstatus.to_string(),
                });
            }
        }
        state.documents.insert(key, doc.clone());
        Ok(())
    }

    fn submit(&self, doctype: DocType, id: &str) -> Result<ProcurementDocument, StoreError> {
        self.transition(doctype, id, DocStatus::Draft, DocStatus::Submitted)
    }

    fn cancel(&self, doctype: DocType, id: &str) -> Result<ProcurementDocument, StoreError> {
        self.transition(doctype, id, DocStatus::Submitted, DocStatus::Cancelled)
    }

    fn append_link(&self, edge: &LinkEdge) -> Result<(), StoreError> {
        if self.no_link_storage.contains(&edge.source.doctype) {
            return Err(StoreError::Unsupported {
                doctype: edge.source.doctype,
                capability: "link storage",
            });
        }
        let mut state = self.write()?;
        let source = state
            .documents
            .get_mut(&edge.source)
            .ok_or_else(|| StoreError::not_found(edge.source.doctype, &edge.source.id))?;
        source.forward_links.push(edge.clone());
        Ok(())
    }

    fn allocate_id(&self, doctype: DocType) -> Result<String, StoreError> {
        let mut state = self.write()?;
        loop {
            let counter = state.counters.entry(doctype).or_insert(0);
            *counter += 1;
            let id = format!("{}-{:05}", doctype.prefix(), *counter);
            if !state.documents.contains_key(&DocKey::new(doctype, id.clone())) {
                return Ok(id);
            }
        }
    }
}
