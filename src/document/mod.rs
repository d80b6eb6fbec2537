use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod conversion;

pub use conversion::*;

/// The seven document types of the procurement chain, in their conventional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "Material Request")]
    MaterialRequest,
    #[serde(rename = "Purchase Requisition")]
    PurchaseRequisition,
    #[serde(rename = "Request for Quotation")]
    RequestForQuotation,
    #[serde(rename = "Supplier Quotation")]
    SupplierQuotation,
    #[serde(rename = "Purchase Order")]
    PurchaseOrder,
    #[serde(rename = "Purchase Receipt")]
    PurchaseReceipt,
    #[serde(rename = "Purchase Invoice")]
    PurchaseInvoice,
}

impl DocType {
    pub const ALL: [DocType; 7] = [
        DocType::MaterialRequest,
        DocType::PurchaseRequisition,
        DocType::RequestForQuotation,
        DocType::SupplierQuotation,
        DocType::PurchaseOrder,
        DocType::PurchaseReceipt,
        DocType::PurchaseInvoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::MaterialRequest => "Material Request",
            DocType::PurchaseRequisition => "Purchase Requisition",
            DocType::RequestForQuotation => "Request for Quotation",
            DocType::SupplierQuotation => "Supplier Quotation",
            DocType::PurchaseOrder => "Purchase Order",
            DocType::PurchaseReceipt => "Purchase Receipt",
            DocType::PurchaseInvoice => "Purchase Invoice",
        }
    }

    /// Short prefix used for generated document ids.
    pub fn prefix(&self) -> &'static str {
        match self {
            DocType::MaterialRequest => "MR",
            DocType::PurchaseRequisition => "PREQ",
            DocType::RequestForQuotation => "RFQ",
            DocType::SupplierQuotation => "SQ",
            DocType::PurchaseOrder => "PO",
            DocType::PurchaseReceipt => "PR",
            DocType::PurchaseInvoice => "PI",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', '_'], " ");
        DocType::ALL
            .into_iter()
            .find(|dt| dt.as_str().to_lowercase() == wanted || dt.prefix().to_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown procurement document type: {}", s))
    }
}

/// Lifecycle state of a document in the host store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DocStatus {
    #[default]
    Draft,
    Submitted,
    Cancelled,
}

impl DocStatus {
    /// The numeric code the host platform uses (0, 1, 2).
    pub fn code(&self) -> u8 {
        match self {
            DocStatus::Draft => 0,
            DocStatus::Submitted => 1,
            DocStatus::Cancelled => 2,
        }
    }
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocStatus::Draft => write!(f, "Draft"),
            DocStatus::Submitted => write!(f, "Submitted"),
            DocStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Identity of a document: its type plus its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocKey {
    pub doctype: DocType,
    pub id: String,
}

impl DocKey {
    pub fn new(doctype: DocType, id: impl Into<String>) -> Self {
        Self {
            doctype,
            id: id.into(),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.doctype, self.id)
    }
}

/// A single line of a procurement document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_code: String,
    #[serde(default)]
    pub item_name: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub rate: Option<Decimal>,
    #[serde(default)]
    pub uom: String,
    /// Quantity already ordered through Purchase Orders (Request for Quotation items only).
    #[serde(default)]
    pub ordered_qty: Decimal,
    #[serde(default)]
    pub remaining_qty: Option<Decimal>,
}

impl LineItem {
    pub fn new(item_code: impl Into<String>, quantity: Decimal, uom: impl Into<String>) -> Self {
        Self {
            item_code: item_code.into(),
            item_name: None,
            quantity,
            rate: None,
            uom: uom.into(),
            ordered_qty: Decimal::ZERO,
            remaining_qty: None,
        }
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = Some(rate);
        self
    }

    /// `quantity * rate`, or `None` when the product overflows.
    pub fn checked_amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.rate.unwrap_or(Decimal::ZERO))
    }

    /// Saturating form of `checked_amount`.
    pub fn amount(&self) -> Decimal {
        self.quantity.saturating_mul(self.rate.unwrap_or(Decimal::ZERO))
    }
}

/// A persisted record that `target` was created from `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub source: DocKey,
    pub target: DocKey,
    pub linked_at: DateTime<Utc>,
}

impl LinkEdge {
    pub fn new(source: DocKey, target: DocKey) -> Self {
        Self {
            source,
            target,
            linked_at: Utc::now(),
        }
    }

    pub fn connects(&self, source: &DocKey, target: &DocKey) -> bool {
        &self.source == source && &self.target == target
    }
}

/// Any document of the procurement chain, as seen by the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementDocument {
    pub doctype: DocType,
    pub id: String,
    #[serde(default)]
    pub docstatus: DocStatus,
    #[serde(default)]
    pub source_doctype: Option<DocType>,
    #[serde(default)]
    pub source_id: Option<String>,
    /// The quoting or ordering supplier (Supplier Quotation, Purchase Order).
    #[serde(default)]
    pub supplier: Option<String>,
    /// Suppliers invited to quote (Request for Quotation).
    #[serde(default)]
    pub suppliers: Vec<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
    #[serde(default)]
    pub schedule_date: Option<NaiveDate>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub forward_links: Vec<LinkEdge>,
}

impl ProcurementDocument {
    pub fn new(doctype: DocType, id: impl Into<String>) -> Self {
        Self {
            doctype,
            id: id.into(),
            docstatus: DocStatus::Draft,
            source_doctype: None,
            source_id: None,
            supplier: None,
            suppliers: Vec::new(),
            company: None,
            transaction_date: None,
            schedule_date: None,
            line_items: Vec::new(),
            forward_links: Vec::new(),
        }
    }

    pub fn with_source(mut self, doctype: DocType, id: impl Into<String>) -> Self {
        self.source_doctype = Some(doctype);
        self.source_id = Some(id.into());
        self
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn with_invited(mut self, suppliers: &[&str]) -> Self {
        self.suppliers = suppliers.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn key(&self) -> DocKey {
        DocKey::new(self.doctype, self.id.clone())
    }

    /// The declared source, only when both halves of the pair are present.
    pub fn source_key(&self) -> Option<DocKey> {
        match (&self.source_doctype, &self.source_id) {
            (Some(doctype), Some(id)) if !id.is_empty() => Some(DocKey::new(*doctype, id.clone())),
            _ => None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.docstatus == DocStatus::Submitted
    }

    pub fn is_cancelled(&self) -> bool {
        self.docstatus == DocStatus::Cancelled
    }

    /// First line item carrying `item_code`.
    pub fn item(&self, item_code: &str) -> Option<&LineItem> {
        self.line_items.iter().find(|i| i.item_code == item_code)
    }

    /// Declared quantity for `item_code`, summed over every line carrying it.
    pub fn quantity_of(&self, item_code: &str) -> Decimal {
        self.line_items
            .iter()
            .filter(|i| i.item_code == item_code)
            .map(|i| i.quantity)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Sum of line amounts, or `None` if any product or the running total overflows.
    pub fn checked_grand_total(&self) -> Option<Decimal> {
        self.line_items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.checked_amount()?))
    }

    /// Saturates at `Decimal::MAX` / `Decimal::MIN`. Validated documents never reach either.
    pub fn grand_total(&self) -> Decimal {
        self.line_items
            .iter()
            .map(LineItem::amount)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn has_link_to(&self, target: &DocKey) -> bool {
        let me = self.key();
        self.forward_links.iter().any(|l| l.connects(&me, target))
    }
}
