use crate::document::DocType;
use crate::ledger::Consumer;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by a `DocumentStore` implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{doctype} '{id}' not found")]
    NotFound { doctype: DocType, id: String },

    #[error("{doctype} '{id}' is {status} and cannot be modified")]
    ReadOnly {
        doctype: DocType,
        id: String,
        status: String,
    },

    #[error("{doctype} does not support {capability}")]
    Unsupported {
        doctype: DocType,
        capability: &'static str,
    },

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(doctype: DocType, id: &str) -> Self {
        StoreError::NotFound {
            doctype,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// User-correctable rejections. Each one blocks the triggering save, submit or cancel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error(
        "Both source document type and id must be provided together, or neither should be set"
    )]
    PartialSource,

    #[error("Invalid source document. Expected {expected}, but got {actual}")]
    WrongSourceType { expected: DocType, actual: DocType },

    #[error("{doctype} '{id}' cannot be its own source")]
    SelfReference { doctype: DocType, id: String },

    #[error("Source {doctype} '{id}' must be submitted (currently {status})")]
    SourceNotSubmitted {
        doctype: DocType,
        id: String,
        status: String,
    },

    #[error("Quantity for item '{item_code}' cannot be negative (got {quantity})")]
    NegativeQuantity { item_code: String, quantity: Decimal },

    #[error("{doctype} '{id}': item amounts exceed the representable range")]
    AmountOverflow { doctype: DocType, id: String },

    #[error("Item '{item_code}' does not exist in source {source_doctype} '{source_id}'")]
    ItemNotInSource {
        item_code: String,
        source_doctype: DocType,
        source_id: String,
    },

    #[error(
        "Quantity for item '{item_code}' exceeds what is available in {tracking_doctype} '{tracking_id}': requested {requested}, available {available} (source {source_qty}, already processed {consumed})"
    )]
    QuantityExceeded {
        item_code: String,
        tracking_doctype: DocType,
        tracking_id: String,
        source_qty: Decimal,
        consumed: Decimal,
        available: Decimal,
        requested: Decimal,
        breakdown: Vec<Consumer>,
    },

    #[error("Supplier '{supplier}' was not invited on Request for Quotation '{rfq}'")]
    SupplierNotInvited {
        supplier: String,
        rfq: String,
        invited: Vec<String>,
    },

    #[error(
        "Purchase Order supplier '{actual}' does not match supplier '{expected}' of Supplier Quotation '{quotation}'"
    )]
    SupplierMismatch {
        expected: String,
        actual: String,
        quotation: String,
    },

    #[error("{doctype} '{id}' has {} child document(s) that must be cancelled first", count_blocking(.blocking))]
    CancelBlocked {
        doctype: DocType,
        id: String,
        blocking: Vec<(DocType, Vec<String>)>,
    },

    #[error("Source document {0} must be submitted before creating {1}")]
    DraftSource(String, DocType),

    #[error("Invalid target document type {target}. Expected {expected} after {source_doctype}")]
    UnexpectedTarget {
        target: DocType,
        expected: DocType,
        source_doctype: DocType,
    },

    #[error("Source document '{0}' has no items to copy")]
    EmptySource(String),

    #[error("Source document '{0}' not found")]
    SourceNotFound(String),
}

fn count_blocking(blocking: &[(DocType, Vec<String>)]) -> usize {
    blocking.iter().map(|(_, ids)| ids.len()).sum()
}

/// Errors in flow or supplier rule configuration records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Flow '{flow}': step numbers must be unique (step {step_no} repeats)")]
    DuplicateStep { flow: String, step_no: u32 },

    #[error("Flow '{flow}': step numbers must be sequential starting from 1")]
    NonContiguousSteps { flow: String },

    #[error(
        "Flow '{flow}': step {step_no} ({doctype}) cannot require a source as it is the first step"
    )]
    FirstStepRequiresSource {
        flow: String,
        step_no: u32,
        doctype: DocType,
    },

    #[error("Flow '{flow}': {doctype} appears in more than one step")]
    RepeatedDocType { flow: String, doctype: DocType },

    #[error("Only one flow may be active, found: {}", .0.join(", "))]
    MultipleActiveFlows(Vec<String>),

    #[error("Rule '{rule}': amount from ({from}) must be less than amount to ({to})")]
    InvalidAmountRange {
        rule: String,
        from: Decimal,
        to: Decimal,
    },

    #[error("Rule '{rule}': minimum suppliers must be at least 1")]
    InvalidMinSuppliers { rule: String },

    #[error("Rule '{rule}' overlaps with active rule(s): {}", .conflicts.join(", "))]
    OverlappingRules { rule: String, conflicts: Vec<String> },
}

/// Errors of the supplier comparison and award operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComparisonError {
    #[error("No submitted Supplier Quotations found for Request for Quotation '{0}'")]
    NoSubmittedQuotations(String),

    #[error("No submitted Supplier Quotation found for supplier '{supplier}' on '{rfq}'")]
    NoQuotationForSupplier { supplier: String, rfq: String },
}

/// The umbrella error returned by workflow operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Comparison(#[from] ComparisonError),
}

impl WorkflowError {
    /// Returns the validation rejection, if this error is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            WorkflowError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors that can occur when converting a host record into a `ProcurementDocument`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordConversionError {
    #[error("Invalid record: {0}")]
    ValidationError(String),
}
