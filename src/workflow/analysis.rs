use super::Workflow;
use crate::document::{DocKey, DocType};
use crate::error::WorkflowError;
use crate::ledger::QuantityLedger;
use crate::store::{DocumentFilter, DocumentStore};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemProgress {
    pub item_code: String,
    pub source_qty: Decimal,
    pub consumed: Decimal,
    pub available: Decimal,
}

/// How far a source document has been processed by its direct children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcurementAnalysis {
    pub total_children: usize,
    pub total_items: usize,
    pub total_quantity: Decimal,
    /// Percentage of the source quantity consumed, rounded to one decimal place.
    pub completion_rate: Decimal,
    pub items: Vec<ItemProgress>,
}

impl Workflow {
    /// Child counts and per-line consumption of a document, over every child type.
    pub fn procurement_analysis<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        doctype: DocType,
        id: &str,
    ) -> Result<ProcurementAnalysis, WorkflowError> {
        let source = store.get(doctype, id)?;
        let key = DocKey::new(doctype, id);
        let ledger = QuantityLedger::new(store);

        let filter = DocumentFilter::sourced_from(key.clone()).not_cancelled();
        let mut total_children = 0;
        let mut consumed_by_type = Vec::with_capacity(DocType::ALL.len());
        for child_type in DocType::ALL {
            total_children += store.query(child_type, &filter)?.len();
            consumed_by_type.push(ledger.consumed(&key, child_type, None)?);
        }

        let mut items = Vec::with_capacity(source.line_items.len());
        let mut total_consumed = Decimal::ZERO;
        for line in &source.line_items {
            let consumed: Decimal = consumed_by_type
                .iter()
                .filter_map(|c| c.get(&line.item_code))
                .map(|c| c.total)
                .fold(Decimal::ZERO, Decimal::saturating_add);
            total_consumed = total_consumed.saturating_add(consumed);
            items.push(ItemProgress {
                item_code: line.item_code.clone(),
                source_qty: line.quantity,
                consumed,
                available: line.quantity.saturating_sub(consumed),
            });
        }

        let total_quantity = source
            .line_items
            .iter()
            .fold(Decimal::ZERO, |acc, l| acc.saturating_add(l.quantity));
        let completion_rate = if total_quantity > Decimal::ZERO {
            total_consumed
                .checked_div(total_quantity)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::MAX)
                .round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven)
        } else {
            Decimal::ZERO
        };

        Ok(ProcurementAnalysis {
            total_children,
            total_items: source.line_items.len(),
            total_quantity,
            completion_rate,
            items,
        })
    }
}
