//! Common test utilities for building procurement chains in a memory store.
use kobai::prelude::*;
use rust_decimal::Decimal;

/// Suppliers invited on every RFQ built by `rfq_chain`.
#[allow(dead_code)]
pub const SUPPLIERS: [&str; 3] = ["SUP-A", "SUP-B", "SUP-C"];

/// A line item with the default unit.
#[allow(dead_code)]
pub fn line(code: &str, qty: Decimal) -> LineItem {
    LineItem::new(code, qty, "Nos")
}

/// A priced line item with the default unit.
#[allow(dead_code)]
pub fn priced(code: &str, qty: Decimal, rate: Decimal) -> LineItem {
    LineItem::new(code, qty, "Nos").with_rate(rate)
}

/// Saves and submits `doc` through the workflow, failing the test on rejection.
#[allow(dead_code)]
pub fn submit_new(workflow: &Workflow, store: &MemoryStore, doc: ProcurementDocument) -> ProcurementDocument {
    let saved = workflow.save(store, doc).expect("Failed to save document");
    workflow
        .submit(store, saved.doctype, &saved.id)
        .expect("Failed to submit document")
}

/// A submitted Material Request carrying `items`.
#[allow(dead_code)]
pub fn submitted_mr(workflow: &Workflow, store: &MemoryStore, items: Vec<LineItem>) -> ProcurementDocument {
    let id = store
        .allocate_id(DocType::MaterialRequest)
        .expect("Failed to allocate id");
    let mut mr = ProcurementDocument::new(DocType::MaterialRequest, id);
    mr.company = Some("Test Company".to_string());
    mr.line_items = items;
    submit_new(workflow, store, mr)
}

/// A draft of `target` created from `source_id`, with every line quantity replaced by `qty`.
#[allow(dead_code)]
pub fn draft_with_qty(
    workflow: &Workflow,
    store: &MemoryStore,
    source_id: &str,
    target: DocType,
    qty: Decimal,
) -> ProcurementDocument {
    let mut draft = workflow
        .make_procurement_document(store, source_id, target)
        .expect("Failed to make document");
    for item in &mut draft.line_items {
        item.quantity = qty;
    }
    draft
}

/// MR -> PREQ -> RFQ for a single item, all submitted, the RFQ inviting `SUPPLIERS`.
#[allow(dead_code)]
pub fn rfq_chain(
    workflow: &Workflow,
    store: &MemoryStore,
    item_code: &str,
    qty: Decimal,
) -> (ProcurementDocument, ProcurementDocument, ProcurementDocument) {
    let mr = submitted_mr(workflow, store, vec![line(item_code, qty)]);
    let preq = draft_with_qty(workflow, store, &mr.id, DocType::PurchaseRequisition, qty);
    let preq = submit_new(workflow, store, preq);
    let mut rfq = draft_with_qty(workflow, store, &preq.id, DocType::RequestForQuotation, qty);
    rfq.suppliers = SUPPLIERS.iter().map(|s| s.to_string()).collect();
    let rfq = submit_new(workflow, store, rfq);
    (mr, preq, rfq)
}

/// A submitted Supplier Quotation against `rfq_id` with the given priced lines.
#[allow(dead_code)]
pub fn submitted_quotation(
    workflow: &Workflow,
    store: &MemoryStore,
    rfq_id: &str,
    supplier: &str,
    items: Vec<LineItem>,
) -> ProcurementDocument {
    let id = store
        .allocate_id(DocType::SupplierQuotation)
        .expect("Failed to allocate id");
    let mut sq = ProcurementDocument::new(DocType::SupplierQuotation, id)
        .with_source(DocType::RequestForQuotation, rfq_id)
        .with_supplier(supplier);
    sq.line_items = items;
    submit_new(workflow, store, sq)
}

/// A draft Purchase Order against a Supplier Quotation, supplier left for autofill.
#[allow(dead_code)]
pub fn po_draft(store: &MemoryStore, sq_id: &str, items: Vec<LineItem>) -> ProcurementDocument {
    let id = store
        .allocate_id(DocType::PurchaseOrder)
        .expect("Failed to allocate id");
    let mut po = ProcurementDocument::new(DocType::PurchaseOrder, id)
        .with_source(DocType::SupplierQuotation, sq_id);
    po.line_items = items;
    po
}

/// Extracts the validation rejection from a workflow result, failing the test otherwise.
#[allow(dead_code)]
pub fn rejection<T: std::fmt::Debug>(result: std::result::Result<T, WorkflowError>) -> ValidationError {
    match result {
        Err(WorkflowError::Validation(e)) => e,
        other => panic!("Expected a validation error, got {:?}", other),
    }
}
