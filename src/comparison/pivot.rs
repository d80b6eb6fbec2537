use crate::document::{DocType, LineItem, ProcurementDocument};
use crate::error::WorkflowError;
use crate::store::DocumentStore;
use crate::workflow::{BatchOutcome, Workflow, today};
use chrono::{Days, NaiveDate};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One RFQ item as offered to the pivot grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotItem {
    pub item_code: String,
    pub item_name: String,
    pub qty: Decimal,
    pub uom: String,
}

/// Everything needed to lay out an item x supplier price grid for an RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotData {
    pub rfq: String,
    pub items: Vec<PivotItem>,
    pub suppliers: Vec<String>,
    pub company: Option<String>,
    pub transaction_date: NaiveDate,
    pub schedule_date: NaiveDate,
}

/// A price typed into one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PivotEntry {
    #[serde(default)]
    pub rate: Decimal,
    #[serde(default)]
    pub qty: Decimal,
}

impl PivotEntry {
    pub fn new(rate: Decimal, qty: Decimal) -> Self {
        Self { rate, qty }
    }
}

/// Supplier -> item code -> entry.
pub type PivotMatrix = IndexMap<String, IndexMap<String, PivotEntry>>;

pub fn rfq_pivot_data<S: DocumentStore + ?Sized>(
    store: &S,
    rfq_id: &str,
) -> Result<PivotData, WorkflowError> {
    let rfq = store.get(DocType::RequestForQuotation, rfq_id)?;
    let now = today();
    let items = rfq
        .line_items
        .iter()
        .map(|item| PivotItem {
            item_code: item.item_code.clone(),
            item_name: item
                .item_name
                .clone()
                .unwrap_or_else(|| item.item_code.clone()),
            qty: item.quantity,
            uom: item.uom.clone(),
        })
        .collect();

    Ok(PivotData {
        rfq: rfq.id.clone(),
        items,
        suppliers: rfq.suppliers.clone(),
        company: rfq.company.clone(),
        transaction_date: rfq.transaction_date.unwrap_or(now),
        schedule_date: rfq.schedule_date.unwrap_or(now + Days::new(7)),
    })
}

/// Creates one draft Supplier Quotation per supplier in `matrix` that priced at least one
/// RFQ item.
///
/// Each supplier is handled on its own: a rejected quotation lands in `errors` and the
/// rest of the batch carries on. Suppliers without any priced item land in `skipped`.
pub fn create_supplier_quotations_from_pivot<S: DocumentStore + ?Sized>(
    workflow: &Workflow,
    store: &S,
    rfq_id: &str,
    matrix: &PivotMatrix,
) -> Result<BatchOutcome, WorkflowError> {
    let rfq = store.get(DocType::RequestForQuotation, rfq_id)?;
    let mut outcome = BatchOutcome::default();

    for (supplier, entries) in matrix {
        let items = priced_items(&rfq, entries);
        if items.is_empty() {
            outcome.skipped.push(supplier.clone());
            continue;
        }

        match build_and_save(workflow, store, &rfq, supplier, items) {
            Ok(id) => {
                info!("Created Supplier Quotation {} for {}", id, supplier);
                outcome.succeeded.push(id);
            }
            Err(e) => {
                warn!("Could not create Supplier Quotation for {}: {}", supplier, e);
                outcome.fail(supplier, e);
            }
        }
    }
    Ok(outcome)
}

fn priced_items(rfq: &ProcurementDocument, entries: &IndexMap<String, PivotEntry>) -> Vec<LineItem> {
    entries
        .iter()
        .filter(|(_, entry)| entry.rate > Decimal::ZERO)
        .filter_map(|(code, entry)| {
            let rfq_item = rfq.item(code)?;
            let qty = if entry.qty > Decimal::ZERO {
                entry.qty
            } else {
                rfq_item.quantity
            };
            let mut line = LineItem::new(code.clone(), qty, rfq_item.uom.clone()).with_rate(entry.rate);
            line.item_name = rfq_item.item_name.clone();
            Some(line)
        })
        .collect()
}

fn build_and_save<S: DocumentStore + ?Sized>(
    workflow: &Workflow,
    store: &S,
    rfq: &ProcurementDocument,
    supplier: &str,
    items: Vec<LineItem>,
) -> Result<String, WorkflowError> {
    let id = store.allocate_id(DocType::SupplierQuotation)?;
    let mut sq = ProcurementDocument::new(DocType::SupplierQuotation, id)
        .with_source(DocType::RequestForQuotation, rfq.id.clone())
        .with_supplier(supplier);
    sq.company = rfq.company.clone();
    sq.transaction_date = Some(today());
    sq.schedule_date = rfq.schedule_date;
    sq.line_items = items;

    let saved = workflow.save(store, sq)?;
    Ok(saved.id)
}

/// Submits each quotation through the workflow, independently of the others.
pub fn submit_supplier_quotations<S: DocumentStore + ?Sized>(
    workflow: &Workflow,
    store: &S,
    ids: &[String],
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for id in ids {
        match workflow.submit(store, DocType::SupplierQuotation, id) {
            Ok(doc) => outcome.succeeded.push(doc.id),
            Err(e) => {
                warn!("Could not submit Supplier Quotation {}: {}", id, e);
                outcome.fail(id, e);
            }
        }
    }
    outcome
}
