//! Supplier comparison, pivot entry and award selection.
mod common;
use common::*;
use kobai::prelude::*;
use rust_decimal_macros::dec;

/// An RFQ for 10 x ITEM-1 and 4 x ITEM-2, inviting `SUPPLIERS`.
fn two_item_rfq(workflow: &Workflow, store: &MemoryStore) -> ProcurementDocument {
    let mr = submitted_mr(
        workflow,
        store,
        vec![line("ITEM-1", dec!(10)), line("ITEM-2", dec!(4))],
    );
    let preq = workflow
        .make_procurement_document(store, &mr.id, DocType::PurchaseRequisition)
        .expect("Failed to make requisition");
    let preq = submit_new(workflow, store, preq);
    let mut rfq = workflow
        .make_procurement_document(store, &preq.id, DocType::RequestForQuotation)
        .expect("Failed to make RFQ");
    rfq.suppliers = SUPPLIERS.iter().map(|s| s.to_string()).collect();
    submit_new(workflow, store, rfq)
}

#[cfg(test)]
mod compare_tests {
    use super::*;

    #[test]
    fn test_compare_ranks_totals_and_picks_item_winners() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let rfq = two_item_rfq(&workflow, &store);

        // SUP-A: 10*5 + 4*20 = 130, SUP-B: 10*4 + 4*30 = 160, SUP-C: 10*6 = 60 (one item)
        submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-A",
            vec![priced("ITEM-1", dec!(10), dec!(5)), priced("ITEM-2", dec!(4), dec!(20))],
        );
        submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-B",
            vec![priced("ITEM-1", dec!(10), dec!(4)), priced("ITEM-2", dec!(4), dec!(30))],
        );
        submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-C",
            vec![priced("ITEM-1", dec!(10), dec!(6))],
        );

        let result = compare(&store, &rfq.id).expect("Failed to compare");
        println!("{}", DiagnosticFormatter::format_comparison(&result));

        let ranking: Vec<(&str, usize)> = result
            .supplier_totals
            .iter()
            .map(|(s, t)| (s.as_str(), t.rank))
            .collect();
        assert_eq!(ranking, vec![("SUP-C", 1), ("SUP-A", 2), ("SUP-B", 3)]);
        assert_eq!(result.winner_by_total.as_deref(), Some("SUP-C"));
        assert_eq!(result.summary.total_suppliers, 3);
        assert_eq!(result.summary.total_items, 2);
        assert_eq!(result.summary.best_total_price, dec!(60));
        assert_eq!(result.summary.worst_total_price, dec!(160));

        let item1 = &result.items[0];
        assert_eq!(item1.item_code, "ITEM-1");
        assert_eq!(item1.best_supplier.as_deref(), Some("SUP-B"));
        assert_eq!(item1.best_rate, Some(dec!(4)));
        assert_eq!(item1.avg_rate, dec!(5));

        let item2 = &result.items[1];
        assert_eq!(item2.best_supplier.as_deref(), Some("SUP-A"));
        assert_eq!(item2.suppliers["SUP-C"], None);

        // One item each for SUP-A and SUP-B; the tie goes to the smaller id.
        assert_eq!(result.winner_by_items.as_deref(), Some("SUP-A"));
    }

    #[test]
    fn test_equal_rates_go_to_smallest_supplier_id() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let (_, _, rfq) = rfq_chain(&workflow, &store, "ITEM-1", dec!(10));

        submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-C",
            vec![priced("ITEM-1", dec!(10), dec!(7))],
        );
        submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-B",
            vec![priced("ITEM-1", dec!(10), dec!(7))],
        );

        let result = compare(&store, &rfq.id).expect("Failed to compare");
        assert_eq!(result.items[0].best_supplier.as_deref(), Some("SUP-B"));
        assert_eq!(result.winner_by_total.as_deref(), Some("SUP-B"));
        assert_eq!(result.winner_by_items.as_deref(), Some("SUP-B"));
    }

    #[test]
    fn test_latest_quotation_per_supplier_is_compared() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let (_, _, rfq) = rfq_chain(&workflow, &store, "ITEM-1", dec!(10));

        submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-A",
            vec![priced("ITEM-1", dec!(10), dec!(9))],
        );
        let revised = submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-A",
            vec![priced("ITEM-1", dec!(10), dec!(8))],
        );

        let result = compare(&store, &rfq.id).expect("Failed to compare");
        assert_eq!(result.quotations.len(), 2);
        assert_eq!(result.summary.total_suppliers, 1);
        assert_eq!(result.supplier_totals["SUP-A"].quotation, revised.id);
        assert_eq!(result.items[0].best_rate, Some(dec!(8)));
    }

    #[test]
    fn test_draft_quotations_are_not_compared() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let (_, _, rfq) = rfq_chain(&workflow, &store, "ITEM-1", dec!(10));
        let draft = ProcurementDocument::new(DocType::SupplierQuotation, "SQ-DRAFT")
            .with_source(DocType::RequestForQuotation, rfq.id.clone())
            .with_supplier("SUP-A")
            .with_item(priced("ITEM-1", dec!(10), dec!(1)));
        workflow.save(&store, draft).expect("Failed to save draft");

        match compare(&store, &rfq.id) {
            Err(WorkflowError::Comparison(ComparisonError::NoSubmittedQuotations(id))) => {
                assert_eq!(id, rfq.id)
            }
            other => panic!("Expected NoSubmittedQuotations, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod pivot_tests {
    use super::*;
    use indexmap::IndexMap;

    fn entries(values: &[(&str, PivotEntry)]) -> IndexMap<String, PivotEntry> {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_pivot_data_lists_items_and_suppliers() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let rfq = two_item_rfq(&workflow, &store);

        let data = rfq_pivot_data(&store, &rfq.id).expect("Failed to load pivot data");
        assert_eq!(data.items.len(), 2);
        assert_eq!(data.items[0].item_name, "ITEM-1");
        assert_eq!(data.suppliers, SUPPLIERS.to_vec());
        assert_eq!(data.company.as_deref(), Some("Test Company"));
        assert!(data.schedule_date >= data.transaction_date);
    }

    #[test]
    fn test_create_from_pivot_handles_each_supplier_independently() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let rfq = two_item_rfq(&workflow, &store);

        let mut matrix = PivotMatrix::new();
        matrix.insert(
            "SUP-A".to_string(),
            entries(&[
                ("ITEM-1", PivotEntry::new(dec!(5), dec!(0))),
                ("ITEM-2", PivotEntry::new(dec!(0), dec!(4))),
            ]),
        );
        matrix.insert(
            "SUP-B".to_string(),
            entries(&[("ITEM-2", PivotEntry::new(dec!(0), dec!(0)))]),
        );
        matrix.insert(
            "SUP-Z".to_string(),
            entries(&[("ITEM-1", PivotEntry::new(dec!(3), dec!(10)))]),
        );
        matrix.insert(
            "SUP-C".to_string(),
            entries(&[
                ("ITEM-2", PivotEntry::new(dec!(12), dec!(2))),
                ("ITEM-9", PivotEntry::new(dec!(1), dec!(1))),
            ]),
        );

        let outcome = create_supplier_quotations_from_pivot(&workflow, &store, &rfq.id, &matrix)
            .expect("Batch should run");
        assert_eq!(outcome.succeeded.len(), 2);
        assert_eq!(outcome.skipped, vec!["SUP-B".to_string()]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].subject, "SUP-Z");
        assert!(matches!(
            outcome.errors[0].error.as_validation(),
            Some(ValidationError::SupplierNotInvited { .. })
        ));
        assert!(!outcome.is_clean());

        let sq_a = store
            .get(DocType::SupplierQuotation, &outcome.succeeded[0])
            .expect("Failed to load quotation");
        assert_eq!(sq_a.supplier.as_deref(), Some("SUP-A"));
        assert!(!sq_a.is_submitted());
        assert_eq!(sq_a.line_items.len(), 1);
        assert_eq!(sq_a.line_items[0].quantity, dec!(10));
        assert_eq!(sq_a.line_items[0].rate, Some(dec!(5)));

        let sq_c = store
            .get(DocType::SupplierQuotation, &outcome.succeeded[1])
            .expect("Failed to load quotation");
        assert_eq!(sq_c.line_items.len(), 1);
        assert_eq!(sq_c.line_items[0].quantity, dec!(2));

        let submitted = submit_supplier_quotations(&workflow, &store, &outcome.succeeded);
        assert!(submitted.is_clean());
        assert_eq!(submitted.succeeded, outcome.succeeded);

        let again = submit_supplier_quotations(&workflow, &store, &outcome.succeeded);
        assert!(again.succeeded.is_empty());
        assert_eq!(again.errors.len(), 2);
    }
}

#[cfg(test)]
mod award_tests {
    use super::*;

    #[test]
    fn test_award_selects_supplier_quotation() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let (_, _, rfq) = rfq_chain(&workflow, &store, "ITEM-1", dec!(10));
        let sq = submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-B",
            vec![priced("ITEM-1", dec!(10), dec!(2))],
        );

        let award = award_supplier(&store, &rfq.id, "SUP-B", AwardType::ItemWise)
            .expect("Failed to award");
        assert_eq!(award.supplier_quotation, sq.id);
        assert_eq!(award.award_type, AwardType::ItemWise);
        assert!(award.message.contains("SUP-B"));

        match award_supplier(&store, &rfq.id, "SUP-C", AwardType::Total) {
            Err(WorkflowError::Comparison(ComparisonError::NoQuotationForSupplier {
                supplier, ..
            })) => assert_eq!(supplier, "SUP-C"),
            other => panic!("Expected NoQuotationForSupplier, got {:?}", other),
        }
    }

    #[test]
    fn test_award_type_parsing() {
        assert_eq!("total".parse::<AwardType>(), Ok(AwardType::Total));
        assert_eq!("Item-Wise".parse::<AwardType>(), Ok(AwardType::ItemWise));
        assert!("cheapest".parse::<AwardType>().is_err());
        assert_eq!(AwardType::ItemWise.to_string(), "itemwise");
    }
}
