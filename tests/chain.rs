//! Chain validation: step order, source state and containment checks.
mod common;
use common::*;
use kobai::prelude::*;
use rust_decimal_macros::dec;

#[cfg(test)]
mod step_tests {
    use super::*;

    #[test]
    fn test_partial_source_is_rejected() {
        let catalog = FlowCatalog::standard();
        let validator = ChainValidator::new(&catalog);

        let mut preq = ProcurementDocument::new(DocType::PurchaseRequisition, "PREQ-1");
        preq.source_doctype = Some(DocType::MaterialRequest);
        assert_eq!(
            validator.check_step(&preq),
            Err(ValidationError::PartialSource)
        );
        assert_eq!(validator.state(&preq), SourceState::SourceInvalid);

        let mut preq = ProcurementDocument::new(DocType::PurchaseRequisition, "PREQ-2");
        preq.source_id = Some("MR-1".to_string());
        assert_eq!(
            validator.check_step(&preq),
            Err(ValidationError::PartialSource)
        );
    }

    #[test]
    fn test_wrong_source_type_names_expected_and_actual() {
        let catalog = FlowCatalog::standard();
        let validator = ChainValidator::new(&catalog);

        let rfq = ProcurementDocument::new(DocType::RequestForQuotation, "RFQ-1")
            .with_source(DocType::MaterialRequest, "MR-1");
        let err = validator.check_step(&rfq).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongSourceType {
                expected: DocType::PurchaseRequisition,
                actual: DocType::MaterialRequest,
            }
        );
        assert!(err.to_string().contains("Expected Purchase Requisition"));
    }

    #[test]
    fn test_manual_creation_without_source_is_allowed() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();

        let preq = ProcurementDocument::new(DocType::PurchaseRequisition, "PREQ-MANUAL")
            .with_item(line("ITEM-1", dec!(5)));
        let mut doc = preq.clone();
        let report = workflow
            .on_validate(&store, &mut doc)
            .expect("Manual creation should pass");
        assert_eq!(report.state, SourceState::SourceRequired);
        assert_eq!(report.tracking, None);

        workflow.save(&store, preq).expect("Failed to save manual document");
    }

    #[test]
    fn test_first_step_and_unlisted_types_pass_through() {
        let catalog = FlowCatalog::new(vec![ProcurementFlow::new(
            "Short",
            vec![
                FlowStep::new(1, DocType::MaterialRequest, false),
                FlowStep::new(2, DocType::PurchaseRequisition, true),
            ],
        )])
        .expect("Failed to build catalog");
        let validator = ChainValidator::new(&catalog);

        let mr = ProcurementDocument::new(DocType::MaterialRequest, "MR-1");
        assert_eq!(validator.check_step(&mr), Ok(SourceState::NoSource));

        // Not part of the flow: even a partial source is not inspected.
        let mut po = ProcurementDocument::new(DocType::PurchaseOrder, "PO-1");
        po.source_doctype = Some(DocType::SupplierQuotation);
        assert_eq!(validator.check_step(&po), Ok(SourceState::NoSource));
    }

    #[test]
    fn test_no_active_flow_skips_step_checks() {
        let catalog = FlowCatalog::new(vec![ProcurementFlow::standard().inactive()])
            .expect("Failed to build catalog");
        let validator = ChainValidator::new(&catalog);

        let rfq = ProcurementDocument::new(DocType::RequestForQuotation, "RFQ-1")
            .with_source(DocType::MaterialRequest, "MR-1");
        assert_eq!(validator.check_step(&rfq), Ok(SourceState::NoSource));
    }
}

#[cfg(test)]
mod source_tests {
    use super::*;

    #[test]
    fn test_draft_source_is_rejected() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();

        let mr = ProcurementDocument::new(DocType::MaterialRequest, "MR-DRAFT")
            .with_item(line("ITEM-1", dec!(10)));
        workflow.save(&store, mr).expect("Failed to save draft");

        let preq = ProcurementDocument::new(DocType::PurchaseRequisition, "PREQ-1")
            .with_source(DocType::MaterialRequest, "MR-DRAFT")
            .with_item(line("ITEM-1", dec!(10)));
        let err = rejection(workflow.save(&store, preq));
        assert_eq!(
            err,
            ValidationError::SourceNotSubmitted {
                doctype: DocType::MaterialRequest,
                id: "MR-DRAFT".to_string(),
                status: "Draft".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_source_is_a_store_error() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();

        let preq = ProcurementDocument::new(DocType::PurchaseRequisition, "PREQ-1")
            .with_source(DocType::MaterialRequest, "MR-404")
            .with_item(line("ITEM-1", dec!(1)));
        match workflow.save(&store, preq) {
            Err(WorkflowError::Store(e)) => assert!(e.is_not_found()),
            other => panic!("Expected a not-found store error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let workflow = Workflow::builder()
            .with_flows(FlowCatalog::default())
            .build();
        let store = MemoryStore::new();

        let mr = ProcurementDocument::new(DocType::MaterialRequest, "MR-1")
            .with_source(DocType::MaterialRequest, "MR-1")
            .with_item(line("ITEM-1", dec!(1)));
        let err = rejection(workflow.save(&store, mr));
        assert!(matches!(err, ValidationError::SelfReference { .. }));
    }

    #[test]
    fn test_declared_source_outside_the_flow_still_validates() {
        let workflow = Workflow::builder()
            .with_flows(FlowCatalog::default())
            .build();
        let store = MemoryStore::new();
        let mr = submitted_mr(&workflow, &store, vec![line("ITEM-1", dec!(10))]);

        let mut preq = ProcurementDocument::new(DocType::PurchaseRequisition, "PREQ-1")
            .with_source(DocType::MaterialRequest, mr.id.clone())
            .with_item(line("ITEM-1", dec!(4)));
        let report = workflow
            .on_validate(&store, &mut preq)
            .expect("Validation should pass");
        assert_eq!(report.state, SourceState::SourceValid);
        assert_eq!(report.tracking, Some(mr.key()));
    }
}

#[cfg(test)]
mod containment_tests {
    use super::*;

    #[test]
    fn test_item_not_in_source_is_rejected() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let mr = submitted_mr(&workflow, &store, vec![line("ITEM-1", dec!(10))]);

        let preq = ProcurementDocument::new(DocType::PurchaseRequisition, "PREQ-1")
            .with_source(DocType::MaterialRequest, mr.id.clone())
            .with_item(line("ITEM-1", dec!(5)))
            .with_item(line("ITEM-2", dec!(1)));
        let err = rejection(workflow.save(&store, preq));
        assert_eq!(
            err,
            ValidationError::ItemNotInSource {
                item_code: "ITEM-2".to_string(),
                source_doctype: DocType::MaterialRequest,
                source_id: mr.id.clone(),
            }
        );
    }

    #[test]
    fn test_quantity_exceeded_reports_sibling_breakdown() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let mr = submitted_mr(&workflow, &store, vec![line("ITEM-1", dec!(100))]);

        let first = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(60));
        let first = submit_new(&workflow, &store, first);

        let second = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(50));
        let err = rejection(workflow.save(&store, second));
        match &err {
            ValidationError::QuantityExceeded {
                item_code,
                tracking_id,
                source_qty,
                consumed,
                available,
                requested,
                breakdown,
                ..
            } => {
                assert_eq!(item_code, "ITEM-1");
                assert_eq!(tracking_id, &mr.id);
                assert_eq!(*source_qty, dec!(100));
                assert_eq!(*consumed, dec!(60));
                assert_eq!(*available, dec!(40));
                assert_eq!(*requested, dec!(50));
                assert_eq!(breakdown.len(), 1);
                assert_eq!(breakdown[0].doc_id, first.id);
                assert_eq!(breakdown[0].qty, dec!(60));
            }
            other => panic!("Expected QuantityExceeded, got {:?}", other),
        }

        let message = DiagnosticFormatter::format_validation(&err);
        println!("{}", message);
        assert!(message.contains(&first.id));
        assert!(message.contains("Reduce the quantity of ITEM-1 to 40 or less."));
    }

    #[test]
    fn test_exact_remaining_quantity_is_accepted() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let mr = submitted_mr(&workflow, &store, vec![line("ITEM-1", dec!(100))]);

        let first = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(60));
        submit_new(&workflow, &store, first);
        let second = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(40));
        submit_new(&workflow, &store, second);
    }

    #[test]
    fn test_resaving_a_draft_does_not_count_itself() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let mr = submitted_mr(&workflow, &store, vec![line("ITEM-1", dec!(100))]);

        let preq = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(100));
        let saved = workflow.save(&store, preq).expect("Failed to save");
        let resaved = workflow.save(&store, saved).expect("Resave should not count itself");
        workflow
            .submit(&store, resaved.doctype, &resaved.id)
            .expect("Submit should not count itself");
    }

    #[test]
    fn test_cancelled_siblings_release_their_quantity() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let mr = submitted_mr(&workflow, &store, vec![line("ITEM-1", dec!(100))]);

        let first = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(100));
        let first = submit_new(&workflow, &store, first);
        workflow
            .cancel(&store, first.doctype, &first.id)
            .expect("Childless document should cancel");

        let second = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(100));
        submit_new(&workflow, &store, second);
    }

    #[test]
    fn test_rfqs_do_not_consume_their_source() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let (_, preq, _) = rfq_chain(&workflow, &store, "ITEM-1", dec!(100));

        let again = draft_with_qty(&workflow, &store, &preq.id, DocType::RequestForQuotation, dec!(100));
        submit_new(&workflow, &store, again);
    }

    #[test]
    fn test_competing_quotations_may_each_quote_the_full_quantity() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let (_, _, rfq) = rfq_chain(&workflow, &store, "ITEM-1", dec!(100));

        let sq1 = submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-A",
            vec![priced("ITEM-1", dec!(100), dec!(10))],
        );
        let sq2 = submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-B",
            vec![priced("ITEM-1", dec!(100), dec!(12))],
        );
        assert!(sq1.is_submitted());
        assert!(sq2.is_submitted());
    }

    #[test]
    fn test_uninvited_supplier_is_rejected() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let (_, _, rfq) = rfq_chain(&workflow, &store, "ITEM-1", dec!(100));

        let sq = ProcurementDocument::new(DocType::SupplierQuotation, "SQ-X")
            .with_source(DocType::RequestForQuotation, rfq.id.clone())
            .with_supplier("SUP-Z")
            .with_item(priced("ITEM-1", dec!(100), dec!(9)));
        let err = rejection(workflow.save(&store, sq));
        assert_eq!(
            err,
            ValidationError::SupplierNotInvited {
                supplier: "SUP-Z".to_string(),
                rfq: rfq.id.clone(),
                invited: SUPPLIERS.iter().map(|s| s.to_string()).collect(),
            }
        );
        assert!(DiagnosticFormatter::format_validation(&err).contains("SUP-A, SUP-B, SUP-C"));
    }

    #[test]
    fn test_negative_quantities_cannot_offset_siblings() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let mr = submitted_mr(&workflow, &store, vec![line("ITEM-1", dec!(100))]);

        let negative = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(-50));
        let negative_id = negative.id.clone();
        let err = rejection(workflow.save(&store, negative.clone()));
        assert_eq!(
            err,
            ValidationError::NegativeQuantity {
                item_code: "ITEM-1".to_string(),
                quantity: dec!(-50),
            }
        );
        assert!(!store
            .exists(DocType::PurchaseRequisition, &negative_id)
            .expect("Failed to query store"));

        // Records written around the workflow are still refused at submit.
        store.insert(negative).expect("Failed to insert");
        let err = rejection(workflow.submit(&store, DocType::PurchaseRequisition, &negative_id));
        assert!(matches!(err, ValidationError::NegativeQuantity { .. }));

        let over = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(150));
        let err = rejection(workflow.save(&store, over));
        match err {
            ValidationError::QuantityExceeded {
                consumed, available, ..
            } => {
                assert_eq!(consumed, dec!(0));
                assert_eq!(available, dec!(100));
            }
            other => panic!("Expected QuantityExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_amount_overflow_is_rejected() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let huge = dec!(1000000000000000);

        let mr = ProcurementDocument::new(DocType::MaterialRequest, "MR-HUGE")
            .with_item(priced("ITEM-1", huge, huge));
        assert_eq!(mr.checked_grand_total(), None);
        let err = rejection(workflow.save(&store, mr));
        assert_eq!(
            err,
            ValidationError::AmountOverflow {
                doctype: DocType::MaterialRequest,
                id: "MR-HUGE".to_string(),
            }
        );
        println!("{}", DiagnosticFormatter::format_validation(&err));
    }
}
