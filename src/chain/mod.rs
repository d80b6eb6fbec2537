//! Step ordering and source containment for documents of the procurement chain.

use crate::config::FlowCatalog;
use crate::document::{DocType, ProcurementDocument};
use crate::error::{ValidationError, WorkflowError};
use crate::ledger::{QuantityLedger, TrackingSource};
use crate::store::DocumentStore;
use itertools::Itertools;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Where a document stands with respect to its source linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// The active flow does not gate this document type.
    NoSource,
    /// A source is required but none was given; manual creation is allowed.
    SourceRequired,
    /// A complete source of the expected type is declared.
    SourceValid,
    /// The declared source is partial or of the wrong type.
    SourceInvalid,
}

/// What a successful chain validation established about a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainCheck {
    pub state: SourceState,
    /// Set whenever the document declares a source.
    pub tracking: Option<TrackingSource>,
}

/// Enforces the active flow's step order and containment against the source document.
pub struct ChainValidator<'w> {
    flows: &'w FlowCatalog,
}

impl<'w> ChainValidator<'w> {
    pub fn new(flows: &'w FlowCatalog) -> Self {
        Self { flows }
    }

    /// Classifies a document against the active flow without touching the store.
    pub fn check_step(&self, doc: &ProcurementDocument) -> Result<SourceState, ValidationError> {
        let Some(flow) = self.flows.active() else {
            return Ok(SourceState::NoSource);
        };
        let Some(step) = flow.step_for(doc.doctype) else {
            return Ok(SourceState::NoSource);
        };
        if !step.requires_source {
            return Ok(SourceState::NoSource);
        }

        let has_type = doc.source_doctype.is_some();
        let has_id = doc.source_id.as_deref().is_some_and(|id| !id.is_empty());
        if has_type != has_id {
            return Err(ValidationError::PartialSource);
        }
        let Some(actual) = doc.source_doctype.filter(|_| has_id) else {
            info!(
                "{}: no source document, created manually at step {}",
                doc.key(),
                step.step_no
            );
            return Ok(SourceState::SourceRequired);
        };

        if let Some(previous) = flow.previous_step(doc.doctype) {
            if previous.doctype != actual {
                return Err(ValidationError::WrongSourceType {
                    expected: previous.doctype,
                    actual,
                });
            }
        }
        Ok(SourceState::SourceValid)
    }

    /// Like `check_step`, but folds rejections into `SourceState::SourceInvalid`.
    pub fn state(&self, doc: &ProcurementDocument) -> SourceState {
        self.check_step(doc).unwrap_or(SourceState::SourceInvalid)
    }

    /// Runs every chain rule: step order, source status, quantity containment, item
    /// containment and the invited-supplier rule for quotations.
    pub fn validate<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        doc: &ProcurementDocument,
    ) -> Result<ChainCheck, WorkflowError> {
        let state = self.check_step(doc)?;
        check_line_values(doc)?;

        let Some(source_key) = doc.source_key() else {
            return Ok(ChainCheck {
                state,
                tracking: None,
            });
        };
        if source_key == doc.key() {
            return Err(ValidationError::SelfReference {
                doctype: doc.doctype,
                id: doc.id.clone(),
            }
            .into());
        }

        let source = store.get(source_key.doctype, &source_key.id)?;
        if !source.is_submitted() {
            return Err(ValidationError::SourceNotSubmitted {
                doctype: source.doctype,
                id: source.id.clone(),
                status: source.docstatus.to_string(),
            }
            .into());
        }

        let ledger = QuantityLedger::new(store);
        let tracking = ledger.tracking_source(doc)?;

        if let Some(tracking) = &tracking {
            if enforces_consumption(doc, tracking) {
                self.check_quantities(&ledger, doc, tracking)?;
            } else {
                debug!("{}: quantity consumption not tracked against {}", doc.key(), tracking.key());
            }
        }
        check_items(doc, &source)?;
        check_invited_supplier(doc, &source)?;

        Ok(ChainCheck {
            state: if state == SourceState::NoSource {
                SourceState::SourceValid
            } else {
                state
            },
            tracking,
        })
    }

    fn check_quantities<S: DocumentStore + ?Sized>(
        &self,
        ledger: &QuantityLedger<'_, S>,
        doc: &ProcurementDocument,
        tracking: &TrackingSource,
    ) -> Result<(), WorkflowError> {
        let source = &tracking.document;
        // The document's own stored version never counts against itself.
        let consumed = ledger.consumed_for(tracking, doc.doctype, Some(&doc.id))?;

        for item_code in doc.line_items.iter().map(|i| &i.item_code).unique() {
            if source.item(item_code).is_none() {
                return Err(ValidationError::ItemNotInSource {
                    item_code: item_code.clone(),
                    source_doctype: source.doctype,
                    source_id: source.id.clone(),
                }
                .into());
            }

            let source_qty = source.quantity_of(item_code);
            let (already, breakdown) = consumed
                .get(item_code)
                .map(|c| (c.total, c.breakdown.clone()))
                .unwrap_or((Decimal::ZERO, Vec::new()));
            let available = source_qty.saturating_sub(already);
            let requested = doc.quantity_of(item_code);
            debug!(
                "{}: item {} requested {} of {} (source {}, consumed {})",
                doc.key(),
                item_code,
                requested,
                available,
                source_qty,
                already
            );

            if requested > available {
                return Err(ValidationError::QuantityExceeded {
                    item_code: item_code.clone(),
                    tracking_doctype: source.doctype,
                    tracking_id: source.id.clone(),
                    source_qty,
                    consumed: already,
                    available,
                    requested,
                    breakdown,
                }
                .into());
            }
        }
        Ok(())
    }
}

fn check_line_values(doc: &ProcurementDocument) -> Result<(), ValidationError> {
    if let Some(line) = doc.line_items.iter().find(|l| l.quantity.is_sign_negative()) {
        return Err(ValidationError::NegativeQuantity {
            item_code: line.item_code.clone(),
            quantity: line.quantity,
        });
    }
    if doc.checked_grand_total().is_none() {
        return Err(ValidationError::AmountOverflow {
            doctype: doc.doctype,
            id: doc.id.clone(),
        });
    }
    Ok(())
}

/// RFQs and the quotations answering an RFQ never consume quantity. Orders re-rooted to
/// the RFQ do.
fn enforces_consumption(doc: &ProcurementDocument, tracking: &TrackingSource) -> bool {
    match doc.doctype {
        DocType::RequestForQuotation => false,
        DocType::SupplierQuotation => {
            tracking.document.doctype != DocType::RequestForQuotation
        }
        _ => true,
    }
}

fn check_items(
    doc: &ProcurementDocument,
    source: &ProcurementDocument,
) -> Result<(), ValidationError> {
    match doc
        .line_items
        .iter()
        .find(|item| source.item(&item.item_code).is_none())
    {
        Some(item) => Err(ValidationError::ItemNotInSource {
            item_code: item.item_code.clone(),
            source_doctype: source.doctype,
            source_id: source.id.clone(),
        }),
        None => Ok(()),
    }
}

fn check_invited_supplier(
    doc: &ProcurementDocument,
    source: &ProcurementDocument,
) -> Result<(), ValidationError> {
    if doc.doctype != DocType::SupplierQuotation || source.doctype != DocType::RequestForQuotation
    {
        return Ok(());
    }
    let Some(supplier) = doc.supplier.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    if source.suppliers.iter().any(|s| s == supplier) {
        Ok(())
    } else {
        Err(ValidationError::SupplierNotInvited {
            supplier: supplier.to_string(),
            rfq: source.id.clone(),
            invited: source.suppliers.clone(),
        })
    }
}
