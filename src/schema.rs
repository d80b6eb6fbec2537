//! Static per-document-type descriptors.
//!
//! The host platform decides which fields a record type carries. Instead of probing a record
//! for a field on every call, the workflow resolves one `DocTypeSchema` per type when it is
//! built and consults it from then on.

use crate::document::DocType;
use ahash::AHashMap;

/// What the workflow may assume about the records of one document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocTypeSchema {
    /// Name of the line-item collection on the host record.
    pub items_field: &'static str,
    /// Whether the record can hold forward link edges.
    pub supports_links: bool,
    /// Whether the record has a single `supplier` field.
    pub has_supplier: bool,
    /// Whether the record carries a list of invited suppliers.
    pub has_supplier_list: bool,
}

impl DocTypeSchema {
    pub fn standard(doctype: DocType) -> Self {
        Self {
            items_field: "items",
            supports_links: true,
            has_supplier: matches!(
                doctype,
                DocType::SupplierQuotation
                    | DocType::PurchaseOrder
                    | DocType::PurchaseReceipt
                    | DocType::PurchaseInvoice
            ),
            has_supplier_list: doctype == DocType::RequestForQuotation,
        }
    }

    pub fn without_links(mut self) -> Self {
        self.supports_links = false;
        self
    }
}

/// The resolved descriptors for all seven document types.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: AHashMap<DocType, DocTypeSchema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let schemas = DocType::ALL
            .into_iter()
            .map(|dt| (dt, DocTypeSchema::standard(dt)))
            .collect();
        Self { schemas }
    }
}

impl SchemaRegistry {
    pub fn with_override(mut self, doctype: DocType, schema: DocTypeSchema) -> Self {
        self.schemas.insert(doctype, schema);
        self
    }

    pub fn get(&self, doctype: DocType) -> DocTypeSchema {
        self.schemas
            .get(&doctype)
            .copied()
            .unwrap_or_else(|| DocTypeSchema::standard(doctype))
    }

    /// Maps a document type to its line-item collection name.
    pub fn items_field(&self, doctype: DocType) -> &'static str {
        self.get(doctype).items_field
    }

    pub fn supports_links(&self, doctype: DocType) -> bool {
        self.get(doctype).supports_links
    }
}
