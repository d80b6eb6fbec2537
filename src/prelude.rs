//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the kobai crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use kobai::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let dataset = Dataset::from_file("path/to/dataset.json")?;
//! let store = dataset.to_store()?;
//! let workflow = Workflow::builder()
//!     .with_flows(dataset.catalog()?)
//!     .with_rules(dataset.rulebook()?)
//!     .build();
//!
//! let comparison = compare(&store, "RFQ-00001")?;
//! println!("{}", DiagnosticFormatter::format_comparison(&comparison));
//! # let _ = workflow;
//! # Ok(())
//! # }
//! ```

// Documents and the store seam
pub use crate::document::{
    DocKey, DocStatus, DocType, IntoDocument, LineItem, LinkEdge, ProcurementDocument,
};
pub use crate::store::{DocumentFilter, DocumentStore, MemoryStore, StoreSnapshot, WriteMode};

// Configuration
pub use crate::config::{FlowCatalog, FlowStep, ProcurementFlow, RuleBook, SupplierRule};
pub use crate::schema::{DocTypeSchema, SchemaRegistry};

// Engine components
pub use crate::chain::{ChainValidator, SourceState};
pub use crate::comparison::{
    AwardType, ComparisonResult, PivotEntry, PivotMatrix, award_supplier, compare,
    create_supplier_quotations_from_pivot, rfq_pivot_data, submit_supplier_quotations,
};
pub use crate::ledger::{Availability, QuantityLedger};
pub use crate::links::{DocumentFlow, LinkGraph};
pub use crate::rfq_po::RfqPoController;
pub use crate::workflow::{BatchOutcome, ValidationReport, Workflow};

// Data and rendering
pub use crate::data::Dataset;
pub use crate::diagnostics::DiagnosticFormatter;

// Error types
pub use crate::error::{
    ComparisonError, ConfigError, StoreError, ValidationError, WorkflowError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
