use super::{Workflow, today};
use crate::document::{DocType, LineItem, ProcurementDocument};
use crate::error::{ValidationError, WorkflowError};
use crate::store::DocumentStore;
use chrono::Days;
use rust_decimal::Decimal;
use tracing::info;

impl Workflow {
    /// Drafts the next document of the chain from a submitted source.
    ///
    /// The source is looked up by id across all document types. Every source line is copied,
    /// the source fields are set, and the draft is returned unsaved.
    pub fn make_procurement_document<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        source_id: &str,
        target: DocType,
    ) -> Result<ProcurementDocument, WorkflowError> {
        let source = find_by_id(store, source_id)?;
        if !source.is_submitted() {
            return Err(ValidationError::DraftSource(source.id.clone(), target).into());
        }

        if let Some(next) = self
            .flows()
            .active()
            .and_then(|flow| flow.next_step(source.doctype))
        {
            if next.doctype != target {
                return Err(ValidationError::UnexpectedTarget {
                    target,
                    expected: next.doctype,
                    source_doctype: source.doctype,
                }
                .into());
            }
        }

        if source.line_items.is_empty() {
            return Err(ValidationError::EmptySource(source.id.clone()).into());
        }
        info!(
            "Creating {} from {} with {} items",
            target,
            source.key(),
            source.line_items.len()
        );

        let id = store.allocate_id(target)?;
        let mut draft =
            ProcurementDocument::new(target, id).with_source(source.doctype, source.id.clone());
        draft.company = source.company.clone();

        let now = today();
        match target {
            DocType::PurchaseRequisition | DocType::RequestForQuotation => {
                draft.transaction_date = Some(now);
                draft.schedule_date = source.schedule_date;
            }
            DocType::PurchaseOrder => {
                draft.transaction_date = Some(now);
                draft.schedule_date = Some(source.schedule_date.unwrap_or(now + Days::new(7)));
            }
            _ => draft.transaction_date = Some(now),
        }

        draft.line_items = source
            .line_items
            .iter()
            .map(|item| {
                let mut line = LineItem::new(item.item_code.clone(), item.quantity, item.uom.clone())
                    .with_rate(item.rate.unwrap_or(Decimal::ZERO));
                line.item_name = item.item_name.clone();
                line
            })
            .collect();
        Ok(draft)
    }
}

fn find_by_id<S: DocumentStore + ?Sized>(
    store: &S,
    id: &str,
) -> Result<ProcurementDocument, WorkflowError> {
    for doctype in DocType::ALL {
        match store.get(doctype, id) {
            Ok(doc) => return Ok(doc),
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(ValidationError::SourceNotFound(id.to_string()).into())
}
