//! The lifecycle hooks and the save, submit and cancel drivers built on them.

use crate::chain::{ChainValidator, SourceState};
use crate::config::{FlowCatalog, RuleBook, SupplierRequirement};
use crate::document::{DocKey, DocType, ProcurementDocument};
use crate::error::{StoreError, WorkflowError};
use crate::ledger::QuantityLedger;
use crate::links::LinkGraph;
use crate::rfq_po::{CacheDiscrepancy, RfqPoController};
use crate::schema::SchemaRegistry;
use crate::store::{DocumentStore, WriteMode};
use chrono::{NaiveDate, Utc};
use std::fmt;
use tracing::debug;

mod analysis;
mod builder;
mod factory;
mod locks;

pub use analysis::*;
pub use builder::WorkflowBuilder;
pub use locks::{TrackingGuard, TrackingLocks};

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// What `on_validate` established about an accepted document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub state: SourceState,
    /// The document quantities were checked against, if any.
    pub tracking: Option<DocKey>,
    /// RFQ cache drift noticed while validating a Purchase Order.
    pub discrepancies: Vec<CacheDiscrepancy>,
}

/// Side effects of `on_submit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitEffects {
    pub link_recorded: bool,
    pub cache_updated: bool,
}

/// One failed entry of a batch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub subject: String,
    pub error: WorkflowError,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.error)
    }
}

/// Result of a batch where every entry succeeds or fails on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub succeeded: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub(crate) fn fail(&mut self, subject: &str, error: WorkflowError) {
        self.errors.push(BatchFailure {
            subject: subject.to_string(),
            error,
        });
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The procurement workflow: configuration plus the hooks a host fires on its records.
pub struct Workflow {
    flows: FlowCatalog,
    rules: RuleBook,
    schema: SchemaRegistry,
    locks: TrackingLocks,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Workflow {
    pub fn builder() -> WorkflowBuilder {
        WorkflowBuilder::new()
    }

    pub fn flows(&self) -> &FlowCatalog {
        &self.flows
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn links<'a, S: DocumentStore + ?Sized>(&'a self, store: &'a S) -> LinkGraph<'a, S> {
        LinkGraph::new(store, &self.schema)
    }

    /// Validate hook. May fill in a Purchase Order's supplier from its quotation.
    pub fn on_validate<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        doc: &mut ProcurementDocument,
    ) -> Result<ValidationReport, WorkflowError> {
        let check = ChainValidator::new(&self.flows).validate(store, doc)?;
        let discrepancies = if doc.doctype == DocType::PurchaseOrder {
            RfqPoController::new(store).validate(doc)?
        } else {
            Vec::new()
        };
        Ok(ValidationReport {
            state: check.state,
            tracking: check.tracking.map(|t| t.key()),
            discrepancies,
        })
    }

    /// Submit hook: records the link from the source and updates the RFQ cache.
    ///
    /// Never fails; both effects log and swallow their own errors.
    pub fn on_submit<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        doc: &ProcurementDocument,
    ) -> SubmitEffects {
        let link_recorded = match doc.source_key() {
            Some(source) => self.links(store).record_link(&source, &doc.key()),
            None => false,
        };
        let cache_updated =
            doc.doctype == DocType::PurchaseOrder && RfqPoController::new(store).on_submit(doc);
        SubmitEffects {
            link_recorded,
            cache_updated,
        }
    }

    /// Before-cancel hook: blocks while the document has linked children.
    pub fn before_cancel<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        doc: &ProcurementDocument,
    ) -> Result<(), WorkflowError> {
        Ok(self.links(store).can_cancel(doc)?)
    }

    /// Cancel hook: reverses a Purchase Order's RFQ cache contribution.
    pub fn on_cancel<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        doc: &ProcurementDocument,
    ) -> bool {
        doc.doctype == DocType::PurchaseOrder && RfqPoController::new(store).on_cancel(doc)
    }

    /// Validates and stores a draft.
    pub fn save<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        mut doc: ProcurementDocument,
    ) -> Result<ProcurementDocument, WorkflowError> {
        let _guard = self.lock_for(store, &doc);
        self.on_validate(store, &mut doc)?;
        store.save(&doc, WriteMode::Normal)?;
        Ok(doc)
    }

    /// Validates a stored draft again, submits it and runs the submit hook.
    pub fn submit<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        doctype: DocType,
        id: &str,
    ) -> Result<ProcurementDocument, WorkflowError> {
        let mut doc = store.get(doctype, id)?;
        let _guard = self.lock_for(store, &doc);
        let before = doc.clone();
        self.on_validate(store, &mut doc)?;
        if doc != before {
            store.save(&doc, WriteMode::Normal)?;
        }
        let submitted = store.submit(doctype, id)?;
        self.on_submit(store, &submitted);
        Ok(submitted)
    }

    /// Cancels a submitted document unless it still has children.
    pub fn cancel<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        doctype: DocType,
        id: &str,
    ) -> Result<ProcurementDocument, WorkflowError> {
        let doc = store.get(doctype, id)?;
        self.before_cancel(store, &doc)?;
        let cancelled = store.cancel(doctype, id)?;
        self.on_cancel(store, &cancelled);
        Ok(cancelled)
    }

    /// Checks an RFQ's invited supplier count against the supplier rules.
    pub fn check_rfq_suppliers<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        rfq_id: &str,
    ) -> Result<SupplierRequirement, StoreError> {
        let rfq = store.get(DocType::RequestForQuotation, rfq_id)?;
        Ok(self.rules.check_supplier_count(&rfq))
    }

    fn lock_for<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        doc: &ProcurementDocument,
    ) -> Option<TrackingGuard<'_>> {
        // An unresolvable source is reported by validation itself.
        let key = QuantityLedger::new(store)
            .tracking_source(doc)
            .ok()
            .flatten()?
            .key();
        debug!("{}: holding tracking lock on {}", doc.key(), key);
        Some(self.locks.acquire(key))
    }
}
