//! Purchase Order controls against the Request for Quotation behind its Supplier Quotation.
//!
//! The RFQ's `ordered_qty` and `remaining_qty` fields are a display cache. Gating decisions are
//! made by the quantity ledger; this module keeps the cache in step and reports drift.

use crate::document::{DocKey, DocType, ProcurementDocument};
use crate::error::{StoreError, ValidationError, WorkflowError};
use crate::store::{DocumentFilter, DocumentStore, WriteMode};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

/// A cached RFQ ordered quantity that disagrees with the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheDiscrepancy {
    pub rfq: String,
    pub item_code: String,
    pub cached: Decimal,
    pub computed: Decimal,
}

/// Cached quantity figures of one RFQ item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RfqItemQuantities {
    pub qty: Decimal,
    pub ordered_qty: Decimal,
    pub remaining_qty: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheAction {
    Add,
    Subtract,
}

pub struct RfqPoController<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> RfqPoController<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Fills or checks a Purchase Order's supplier against its Supplier Quotation, then
    /// cross-checks the RFQ cache.
    ///
    /// Discrepancies are returned and logged; they never reject the document.
    pub fn validate(
        &self,
        doc: &mut ProcurementDocument,
    ) -> Result<Vec<CacheDiscrepancy>, WorkflowError> {
        let Some(quotation) = self.source_quotation(doc)? else {
            return Ok(Vec::new());
        };

        if let Some(expected) = quotation.supplier.as_deref().filter(|s| !s.is_empty()) {
            let current = doc.supplier.clone().filter(|s| !s.is_empty());
            match current.as_deref() {
                None => {
                    info!(
                        "{}: supplier set to '{}' from {}",
                        doc.key(),
                        expected,
                        quotation.id
                    );
                    doc.supplier = Some(expected.to_string());
                }
                Some(actual) if actual != expected => {
                    return Err(ValidationError::SupplierMismatch {
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                        quotation: quotation.id.clone(),
                    }
                    .into());
                }
                Some(_) => {}
            }
        }

        let Some(rfq) = self.rfq_of(&quotation)? else {
            return Ok(Vec::new());
        };
        self.cross_check(&rfq, &doc.id)
    }

    /// Adds a submitted Purchase Order's quantities to its RFQ's cache.
    ///
    /// Returns whether the RFQ was updated. Failures are logged, never raised.
    pub fn on_submit(&self, po: &ProcurementDocument) -> bool {
        self.update_cache(po, CacheAction::Add)
    }

    /// Removes a cancelled Purchase Order's quantities from its RFQ's cache, floored at zero.
    pub fn on_cancel(&self, po: &ProcurementDocument) -> bool {
        self.update_cache(po, CacheAction::Subtract)
    }

    /// The cached `qty`, `ordered_qty` and `remaining_qty` of every RFQ item.
    pub fn cached_quantities(
        &self,
        rfq_id: &str,
    ) -> Result<IndexMap<String, RfqItemQuantities>, StoreError> {
        let rfq = self.store.get(DocType::RequestForQuotation, rfq_id)?;
        let mut result = IndexMap::new();
        for item in &rfq.line_items {
            result
                .entry(item.item_code.clone())
                .or_insert_with(|| RfqItemQuantities {
                    qty: item.quantity,
                    ordered_qty: item.ordered_qty,
                    remaining_qty: item.quantity - item.ordered_qty,
                });
        }
        Ok(result)
    }

    /// Per-item quantity of every non-cancelled Purchase Order raised from a submitted
    /// Supplier Quotation of the RFQ.
    pub fn dynamic_ordered_quantities(
        &self,
        rfq_id: &str,
    ) -> Result<IndexMap<String, Decimal>, StoreError> {
        self.ordered_totals(rfq_id, None, false)
    }

    fn ordered_totals(
        &self,
        rfq_id: &str,
        exclude_id: Option<&str>,
        submitted_only: bool,
    ) -> Result<IndexMap<String, Decimal>, StoreError> {
        let rfq = DocKey::new(DocType::RequestForQuotation, rfq_id);
        let quotations = self.store.query(
            DocType::SupplierQuotation,
            &DocumentFilter::sourced_from(rfq).submitted(),
        )?;

        let mut totals: IndexMap<String, Decimal> = IndexMap::new();
        for quotation in &quotations {
            let mut filter = DocumentFilter::sourced_from(quotation.key()).not_cancelled();
            if submitted_only {
                filter = filter.submitted();
            }
            for po in self.store.query(DocType::PurchaseOrder, &filter)? {
                if exclude_id == Some(po.id.as_str()) {
                    continue;
                }
                for item in &po.line_items {
                    let total = totals.entry(item.item_code.clone()).or_default();
                    *total = total.saturating_add(item.quantity);
                }
            }
        }
        Ok(totals)
    }

    fn cross_check(
        &self,
        rfq: &ProcurementDocument,
        exclude_id: &str,
    ) -> Result<Vec<CacheDiscrepancy>, WorkflowError> {
        // The cache only ever reflects submitted orders.
        let computed = self.ordered_totals(&rfq.id, Some(exclude_id), true)?;
        let mut discrepancies = Vec::new();
        for (item_code, cached) in self.cached_quantities(&rfq.id)? {
            let computed_qty = computed.get(&item_code).copied().unwrap_or(Decimal::ZERO);
            if cached.ordered_qty != computed_qty {
                warn!(
                    "RFQ {} item {}: cached ordered quantity {} differs from computed {}",
                    rfq.id, item_code, cached.ordered_qty, computed_qty
                );
                discrepancies.push(CacheDiscrepancy {
                    rfq: rfq.id.clone(),
                    item_code,
                    cached: cached.ordered_qty,
                    computed: computed_qty,
                });
            }
        }
        Ok(discrepancies)
    }

    fn update_cache(&self, po: &ProcurementDocument, action: CacheAction) -> bool {
        match self.try_update_cache(po, action) {
            Ok(updated) => updated,
            Err(e) => {
                warn!(
                    "Could not update RFQ ordered quantities for {} ({:?}): {}",
                    po.key(),
                    action,
                    e
                );
                false
            }
        }
    }

    fn try_update_cache(
        &self,
        po: &ProcurementDocument,
        action: CacheAction,
    ) -> Result<bool, StoreError> {
        let Some(quotation) = self.source_quotation(po)? else {
            return Ok(false);
        };
        let Some(mut rfq) = self.rfq_of(&quotation)? else {
            return Ok(false);
        };

        for po_item in &po.line_items {
            let Some(rfq_item) = rfq
                .line_items
                .iter_mut()
                .find(|i| i.item_code == po_item.item_code)
            else {
                continue;
            };
            rfq_item.ordered_qty = match action {
                CacheAction::Add => rfq_item.ordered_qty + po_item.quantity,
                CacheAction::Subtract => {
                    (rfq_item.ordered_qty - po_item.quantity).max(Decimal::ZERO)
                }
            };
            rfq_item.remaining_qty = Some(rfq_item.quantity - rfq_item.ordered_qty);
            info!(
                "Updated RFQ {} item {}: ordered_qty={}, remaining_qty={}",
                rfq.id,
                rfq_item.item_code,
                rfq_item.ordered_qty,
                rfq_item.quantity - rfq_item.ordered_qty
            );
        }

        self.store.save(&rfq, WriteMode::AllowSubmittedUpdate)?;
        Ok(true)
    }

    fn source_quotation(
        &self,
        doc: &ProcurementDocument,
    ) -> Result<Option<ProcurementDocument>, StoreError> {
        if doc.doctype != DocType::PurchaseOrder {
            return Ok(None);
        }
        match doc.source_key() {
            Some(key) if key.doctype == DocType::SupplierQuotation => {
                self.store.get(key.doctype, &key.id).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn rfq_of(
        &self,
        quotation: &ProcurementDocument,
    ) -> Result<Option<ProcurementDocument>, StoreError> {
        match quotation.source_key() {
            Some(key) if key.doctype == DocType::RequestForQuotation => {
                self.store.get(key.doctype, &key.id).map(Some)
            }
            _ => Ok(None),
        }
    }
}
