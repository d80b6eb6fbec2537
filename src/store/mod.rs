use crate::document::{DocKey, DocStatus, DocType, LinkEdge, ProcurementDocument};
use crate::error::StoreError;

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::StoreSnapshot;

/// How a `save` may treat an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Only drafts may be overwritten.
    Normal,
    /// Submitted records may be updated in place (cached counters, link tables).
    AllowSubmittedUpdate,
}

/// Record selection for `DocumentStore::query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub source: Option<DocKey>,
    pub status: Option<DocStatus>,
    pub exclude_cancelled: bool,
    pub supplier: Option<String>,
}

impl DocumentFilter {
    pub fn sourced_from(source: DocKey) -> Self {
        Self {
            source: Some(source),
            ..Default::default()
        }
    }

    pub fn not_cancelled(mut self) -> Self {
        self.exclude_cancelled = true;
        self
    }

    pub fn submitted(mut self) -> Self {
        self.status = Some(DocStatus::Submitted);
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn matches(&self, doc: &ProcurementDocument) -> bool {
        if let Some(source) = &self.source {
            if doc.source_doctype != Some(source.doctype)
                || doc.source_id.as_deref() != Some(source.id.as_str())
            {
                return false;
            }
        }
        if let Some(status) = self.status {
            if doc.docstatus != status {
                return false;
            }
        }
        if self.exclude_cancelled && doc.is_cancelled() {
            return false;
        }
        if let Some(supplier) = &self.supplier {
            if doc.supplier.as_deref() != Some(supplier.as_str()) {
                return false;
            }
        }
        true
    }
}

/// The host platform's document store.
///
/// Every method is a synchronous, atomic round-trip. Implementations own their locking, which
/// is why all methods take `&self`.
pub trait DocumentStore: Send + Sync {
    /// Fetches a record, failing with `StoreError::NotFound` when it is absent.
    fn get(&self, doctype: DocType, id: &str) -> Result<ProcurementDocument, StoreError>;

    /// Returns every record of `doctype` matching `filter`, in the store's natural order.
    fn query(
        &self,
        doctype: DocType,
        filter: &DocumentFilter,
    ) -> Result<Vec<ProcurementDocument>, StoreError>;

    fn exists(&self, doctype: DocType, id: &str) -> Result<bool, StoreError> {
        match self.get(doctype, id) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Inserts or overwrites a record.
    fn save(&self, doc: &ProcurementDocument, mode: WriteMode) -> Result<(), StoreError>;

    /// Moves a draft to `Submitted` and returns the stored record.
    fn submit(&self, doctype: DocType, id: &str) -> Result<ProcurementDocument, StoreError>;

    /// Moves a submitted record to `Cancelled` and returns the stored record.
    fn cancel(&self, doctype: DocType, id: &str) -> Result<ProcurementDocument, StoreError>;

    /// Appends a link edge to the source record's forward-link collection.
    fn append_link(&self, edge: &LinkEdge) -> Result<(), StoreError>;

    /// Reserves a fresh id for a new record of `doctype`.
    fn allocate_id(&self, doctype: DocType) -> Result<String, StoreError>;
}
