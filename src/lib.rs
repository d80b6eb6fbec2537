//! # Kobai - Procurement Document Chain Engine
//!
//! **Kobai** enforces a sequential procurement workflow on top of a generic document store:
//! Material Request, Purchase Requisition, Request for Quotation, Supplier Quotation,
//! Purchase Order, Purchase Receipt and Purchase Invoice. Each document may name the
//! document it was created from, and Kobai makes sure that link respects the configured
//! step order and never draws more quantity than its source holds.
//!
//! ## Core Workflow
//!
//! The engine is storage-agnostic. It talks to the host platform through the
//! `DocumentStore` trait and operates on a canonical `ProcurementDocument` model. The
//! primary workflow is:
//!
//! 1.  **Provide a Store**: Implement `DocumentStore` over your records, or use the bundled
//!     `MemoryStore`. Host-specific record types convert through the `IntoDocument` trait.
//! 2.  **Configure**: Build a `Workflow` with `Workflow::builder()`, injecting the validated
//!     `FlowCatalog` and `RuleBook`.
//! 3.  **Drive the Lifecycle**: Call `save`, `submit` and `cancel` on the workflow, or fire
//!     the individual hooks (`on_validate`, `on_submit`, `before_cancel`, `on_cancel`) from
//!     your own host events.
//! 4.  **Inspect**: Query availability, document chains, flow trees and supplier
//!     comparisons. Render any of them with `DiagnosticFormatter`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kobai::prelude::*;
//! use rust_decimal::Decimal;
//!
//! fn main() -> Result<()> {
//!     let store = MemoryStore::new();
//!     let workflow = Workflow::builder().build();
//!
//!     // 1. A Material Request needs no source.
//!     let mr = ProcurementDocument::new(DocType::MaterialRequest, "MR-0001")
//!         .with_item(LineItem::new("BOLT-M8", Decimal::from(100), "Nos"));
//!     workflow.save(&store, mr)?;
//!     workflow.submit(&store, DocType::MaterialRequest, "MR-0001")?;
//!
//!     // 2. Draft the next step from it and take only part of the quantity.
//!     let mut preq = workflow.make_procurement_document(
//!         &store,
//!         "MR-0001",
//!         DocType::PurchaseRequisition,
//!     )?;
//!     preq.line_items[0].quantity = Decimal::from(60);
//!     let preq = workflow.save(&store, preq)?;
//!     workflow.submit(&store, preq.doctype, &preq.id)?;
//!
//!     // 3. Ask what is left.
//!     let left = QuantityLedger::new(&store).available_quantities(
//!         &DocKey::new(DocType::MaterialRequest, "MR-0001"),
//!         DocType::PurchaseRequisition,
//!     )?;
//!     println!("{}", DiagnosticFormatter::format_availability(&left));
//!
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod comparison;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod ledger;
pub mod links;
pub mod prelude;
pub mod rfq_po;
pub mod schema;
pub mod store;
pub mod workflow;
