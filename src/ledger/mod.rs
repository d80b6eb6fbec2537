//! Consumed and available quantities per item code.
//!
//! Every figure is recomputed from the store on demand. Nothing here keeps a running counter,
//! so a partially failed earlier write can never leave the ledger out of step.

use crate::document::{DocKey, DocType, ProcurementDocument};
use crate::error::StoreError;
use crate::store::{DocumentFilter, DocumentStore};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One sibling document's share of a consumed quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    pub doc_id: String,
    pub qty: Decimal,
}

/// Total consumption of one item code, with the documents that make it up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedQuantity {
    pub total: Decimal,
    pub breakdown: Vec<Consumer>,
}

impl ConsumedQuantity {
    /// Negative quantities count as zero, so a bad record can never free up quantity.
    fn add(&mut self, doc_id: &str, qty: Decimal) {
        let qty = qty.max(Decimal::ZERO);
        self.total = self.total.saturating_add(qty);
        self.breakdown.push(Consumer {
            doc_id: doc_id.to_string(),
            qty,
        });
    }
}

/// Item code -> consumption, in the order item codes were first seen.
pub type ConsumptionMap = IndexMap<String, ConsumedQuantity>;

/// Source, consumed and remaining quantity of one source item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub source_qty: Decimal,
    pub consumed_qty: Decimal,
    pub available_qty: Decimal,
}

/// The document whose quantities a new document draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSource {
    /// The document quantities are compared against.
    pub document: ProcurementDocument,
    /// Whether consumption is counted through the RFQ's Supplier Quotations.
    pub via_quotations: bool,
}

impl TrackingSource {
    pub fn key(&self) -> DocKey {
        self.document.key()
    }
}

/// Recomputes consumption over the descendants of a source document.
pub struct QuantityLedger<'s, S: DocumentStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: DocumentStore + ?Sized> QuantityLedger<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Sums line-item quantities of all non-cancelled `target` documents sourced from
    /// `source`, skipping `exclude_id`.
    pub fn consumed(
        &self,
        source: &DocKey,
        target: DocType,
        exclude_id: Option<&str>,
    ) -> Result<ConsumptionMap, StoreError> {
        let children = self.store.query(
            target,
            &DocumentFilter::sourced_from(source.clone()).not_cancelled(),
        )?;
        debug!("Found {} {} documents from {}", children.len(), target, source);

        let mut consumed = ConsumptionMap::new();
        accumulate(&mut consumed, &children, exclude_id);
        Ok(consumed)
    }

    /// Purchase Order consumption of an RFQ, counted through every non-cancelled Supplier
    /// Quotation raised against it.
    pub fn consumed_via_quotations(
        &self,
        rfq_id: &str,
        exclude_id: Option<&str>,
    ) -> Result<ConsumptionMap, StoreError> {
        let rfq = DocKey::new(DocType::RequestForQuotation, rfq_id);
        let quotations = self.store.query(
            DocType::SupplierQuotation,
            &DocumentFilter::sourced_from(rfq).not_cancelled(),
        )?;

        let mut consumed = ConsumptionMap::new();
        for quotation in &quotations {
            let orders = self.store.query(
                DocType::PurchaseOrder,
                &DocumentFilter::sourced_from(quotation.key()).not_cancelled(),
            )?;
            accumulate(&mut consumed, &orders, exclude_id);
        }
        Ok(consumed)
    }

    /// Resolves the document `doc` draws its quantities from.
    ///
    /// A Purchase Order raised from a Supplier Quotation that itself came from an RFQ is
    /// re-rooted to that RFQ, so competing quotations share one allocation. Returns `None`
    /// when `doc` declares no complete source.
    pub fn tracking_source(
        &self,
        doc: &ProcurementDocument,
    ) -> Result<Option<TrackingSource>, StoreError> {
        let Some(source_key) = doc.source_key() else {
            return Ok(None);
        };
        let source = self.store.get(source_key.doctype, &source_key.id)?;

        if doc.doctype == DocType::PurchaseOrder && source.doctype == DocType::SupplierQuotation {
            if let Some(rfq_key) = source
                .source_key()
                .filter(|k| k.doctype == DocType::RequestForQuotation)
            {
                let rfq = self.store.get(rfq_key.doctype, &rfq_key.id)?;
                info!(
                    "{}: tracking quantities against {} instead of {}",
                    doc.key(),
                    rfq_key,
                    source_key
                );
                return Ok(Some(TrackingSource {
                    document: rfq,
                    via_quotations: true,
                }));
            }
        }

        Ok(Some(TrackingSource {
            document: source,
            via_quotations: false,
        }))
    }

    /// Consumption of `tracking` by documents of `target`, honouring re-rooting.
    pub fn consumed_for(
        &self,
        tracking: &TrackingSource,
        target: DocType,
        exclude_id: Option<&str>,
    ) -> Result<ConsumptionMap, StoreError> {
        if tracking.via_quotations {
            self.consumed_via_quotations(&tracking.document.id, exclude_id)
        } else {
            self.consumed(&tracking.key(), target, exclude_id)
        }
    }

    /// Per source item: declared quantity, consumed by `target` documents, and what is left.
    pub fn available_quantities(
        &self,
        source: &DocKey,
        target: DocType,
    ) -> Result<IndexMap<String, Availability>, StoreError> {
        let source_doc = self.store.get(source.doctype, &source.id)?;
        let consumed = if source.doctype == DocType::RequestForQuotation
            && target == DocType::PurchaseOrder
        {
            self.consumed_via_quotations(&source.id, None)?
        } else {
            self.consumed(source, target, None)?
        };
        Ok(availability(&source_doc, &consumed))
    }
}

fn accumulate(
    consumed: &mut ConsumptionMap,
    documents: &[ProcurementDocument],
    exclude_id: Option<&str>,
) {
    for doc in documents {
        if exclude_id == Some(doc.id.as_str()) {
            debug!("Excluding current document: {}", doc.id);
            continue;
        }
        for item in &doc.line_items {
            consumed
                .entry(item.item_code.clone())
                .or_default()
                .add(&doc.id, item.quantity);
        }
    }
}

/// Joins a source document's declared quantities with a consumption map.
pub fn availability(
    source: &ProcurementDocument,
    consumed: &ConsumptionMap,
) -> IndexMap<String, Availability> {
    let mut result: IndexMap<String, Availability> = IndexMap::new();
    for item in &source.line_items {
        if result.contains_key(&item.item_code) {
            continue;
        }
        let source_qty = source.quantity_of(&item.item_code);
        let consumed_qty = consumed
            .get(&item.item_code)
            .map(|c| c.total)
            .unwrap_or(Decimal::ZERO);
        result.insert(
            item.item_code.clone(),
            Availability {
                source_qty,
                consumed_qty,
                available_qty: source_qty - consumed_qty,
            },
        );
    }
    result
}
