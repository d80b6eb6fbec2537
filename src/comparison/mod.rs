//! Price comparison across the submitted Supplier Quotations of one RFQ.

use crate::document::{DocKey, DocType, ProcurementDocument};
use crate::error::{ComparisonError, WorkflowError};
use crate::store::{DocumentFilter, DocumentStore};
use chrono::NaiveDate;
use indexmap::IndexMap;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

mod pivot;

pub use pivot::*;

/// One supplier's offer for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierQuote {
    pub rate: Decimal,
    pub qty: Decimal,
    pub amount: Decimal,
}

/// Row of the item x supplier matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemComparison {
    pub item_code: String,
    pub item_name: Option<String>,
    pub qty: Decimal,
    pub uom: String,
    /// Every compared supplier, `None` where the supplier did not quote the item.
    pub suppliers: IndexMap<String, Option<SupplierQuote>>,
    pub best_rate: Option<Decimal>,
    pub best_supplier: Option<String>,
    pub avg_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierTotal {
    pub quotation: String,
    pub total: Decimal,
    pub items_count: usize,
    /// 1 is the lowest total.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotationSummary {
    pub id: String,
    pub supplier: String,
    pub transaction_date: Option<NaiveDate>,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    pub total_suppliers: usize,
    pub total_items: usize,
    pub best_total_price: Decimal,
    pub worst_total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub rfq: String,
    pub company: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub quotations: Vec<QuotationSummary>,
    pub items: Vec<ItemComparison>,
    /// Supplier totals, ordered by rank.
    pub supplier_totals: IndexMap<String, SupplierTotal>,
    pub winner_by_total: Option<String>,
    pub winner_by_items: Option<String>,
    pub summary: ComparisonSummary,
}

/// How a supplier was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AwardType {
    #[default]
    Total,
    ItemWise,
}

impl fmt::Display for AwardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwardType::Total => write!(f, "total"),
            AwardType::ItemWise => write!(f, "itemwise"),
        }
    }
}

impl FromStr for AwardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "total" => Ok(AwardType::Total),
            "itemwise" | "item-wise" | "item_wise" => Ok(AwardType::ItemWise),
            other => Err(format!("Unknown award type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Award {
    pub rfq: String,
    pub supplier: String,
    pub supplier_quotation: String,
    pub award_type: AwardType,
    pub message: String,
}

/// Builds the live comparison of every submitted Supplier Quotation raised from `rfq_id`.
///
/// Ties on rate, total or items won go to the lexicographically smallest supplier id. A
/// supplier with several submitted quotations is represented by the last one the store
/// returns.
pub fn compare<S: DocumentStore + ?Sized>(
    store: &S,
    rfq_id: &str,
) -> Result<ComparisonResult, WorkflowError> {
    let rfq = store.get(DocType::RequestForQuotation, rfq_id)?;
    let quotations = submitted_quotations(store, rfq_id)?;
    if quotations.is_empty() {
        return Err(ComparisonError::NoSubmittedQuotations(rfq_id.to_string()).into());
    }

    let mut summaries = Vec::with_capacity(quotations.len());
    let mut latest: IndexMap<String, &ProcurementDocument> = IndexMap::new();
    for sq in &quotations {
        let Some(supplier) = sq.supplier.as_deref().filter(|s| !s.is_empty()) else {
            warn!("Supplier Quotation {} has no supplier, leaving it out", sq.id);
            continue;
        };
        summaries.push(QuotationSummary {
            id: sq.id.clone(),
            supplier: supplier.to_string(),
            transaction_date: sq.transaction_date,
            grand_total: sq.grand_total(),
        });
        latest.insert(supplier.to_string(), sq);
    }
    if latest.is_empty() {
        return Err(ComparisonError::NoSubmittedQuotations(rfq_id.to_string()).into());
    }

    let items = compare_items(&latest);

    let ranked: Vec<(&String, &&ProcurementDocument)> = latest
        .iter()
        .sorted_by(|(a_sup, a), (b_sup, b)| {
            a.grand_total()
                .cmp(&b.grand_total())
                .then_with(|| a_sup.cmp(b_sup))
        })
        .collect();
    let supplier_totals: IndexMap<String, SupplierTotal> = ranked
        .iter()
        .enumerate()
        .map(|(i, (supplier, sq))| {
            (
                (*supplier).clone(),
                SupplierTotal {
                    quotation: sq.id.clone(),
                    total: sq.grand_total(),
                    items_count: sq.line_items.len(),
                    rank: i + 1,
                },
            )
        })
        .collect();

    let mut wins: IndexMap<&str, usize> = IndexMap::new();
    for best in items.iter().filter_map(|i| i.best_supplier.as_deref()) {
        *wins.entry(best).or_default() += 1;
    }
    let winner_by_items = wins
        .into_iter()
        .min_by(|(a_sup, a), (b_sup, b)| b.cmp(a).then_with(|| a_sup.cmp(b_sup)))
        .map(|(supplier, _)| supplier.to_string());

    let summary = ComparisonSummary {
        total_suppliers: supplier_totals.len(),
        total_items: items.len(),
        best_total_price: supplier_totals
            .first()
            .map(|(_, t)| t.total)
            .unwrap_or(Decimal::ZERO),
        worst_total_price: supplier_totals
            .last()
            .map(|(_, t)| t.total)
            .unwrap_or(Decimal::ZERO),
    };

    Ok(ComparisonResult {
        rfq: rfq.id,
        company: rfq.company,
        transaction_date: rfq.transaction_date,
        quotations: summaries,
        items,
        winner_by_total: supplier_totals.keys().next().cloned(),
        winner_by_items,
        supplier_totals,
        summary,
    })
}

fn compare_items(latest: &IndexMap<String, &ProcurementDocument>) -> Vec<ItemComparison> {
    let mut rows: IndexMap<String, ItemComparison> = IndexMap::new();
    for sq in latest.values() {
        for item in &sq.line_items {
            rows.entry(item.item_code.clone())
                .or_insert_with(|| ItemComparison {
                    item_code: item.item_code.clone(),
                    item_name: item.item_name.clone(),
                    qty: item.quantity,
                    uom: item.uom.clone(),
                    suppliers: IndexMap::new(),
                    best_rate: None,
                    best_supplier: None,
                    avg_rate: Decimal::ZERO,
                });
        }
    }

    for row in rows.values_mut() {
        for (supplier, sq) in latest {
            let quote = sq.item(&row.item_code).map(|item| SupplierQuote {
                rate: item.rate.unwrap_or(Decimal::ZERO),
                qty: item.quantity,
                amount: item.amount(),
            });
            row.suppliers.insert(supplier.clone(), quote);
        }

        let quoted: Vec<(&String, &SupplierQuote)> = row
            .suppliers
            .iter()
            .filter_map(|(s, q)| q.as_ref().map(|q| (s, q)))
            .collect();
        if let Some((supplier, quote)) = quoted
            .iter()
            .min_by(|(a_sup, a), (b_sup, b)| a.rate.cmp(&b.rate).then_with(|| a_sup.cmp(b_sup)))
        {
            row.best_rate = Some(quote.rate);
            row.best_supplier = Some((*supplier).clone());
        }
        if !quoted.is_empty() {
            let sum = quoted
                .iter()
                .fold(Decimal::ZERO, |acc, (_, q)| acc.saturating_add(q.rate));
            row.avg_rate = sum / Decimal::from(quoted.len());
        }
    }
    rows.into_values().collect()
}

fn submitted_quotations<S: DocumentStore + ?Sized>(
    store: &S,
    rfq_id: &str,
) -> Result<Vec<ProcurementDocument>, WorkflowError> {
    let filter =
        DocumentFilter::sourced_from(DocKey::new(DocType::RequestForQuotation, rfq_id)).submitted();
    Ok(store.query(DocType::SupplierQuotation, &filter)?)
}

/// Selects `supplier`'s submitted quotation on `rfq_id` as the award.
pub fn award_supplier<S: DocumentStore + ?Sized>(
    store: &S,
    rfq_id: &str,
    supplier: &str,
    award_type: AwardType,
) -> Result<Award, WorkflowError> {
    let filter = DocumentFilter::sourced_from(DocKey::new(DocType::RequestForQuotation, rfq_id))
        .submitted()
        .with_supplier(supplier);
    let quotation = store
        .query(DocType::SupplierQuotation, &filter)?
        .pop()
        .ok_or_else(|| ComparisonError::NoQuotationForSupplier {
            supplier: supplier.to_string(),
            rfq: rfq_id.to_string(),
        })?;

    Ok(Award {
        rfq: rfq_id.to_string(),
        supplier: supplier.to_string(),
        supplier_quotation: quotation.id,
        award_type,
        message: format!("Supplier {} awarded for RFQ {}", supplier, rfq_id),
    })
}
