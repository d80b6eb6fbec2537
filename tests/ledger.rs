//! Quantity ledger: recomputed consumption, exclusion and re-rooting.
mod common;
use common::*;
use kobai::ledger::{ConsumptionMap, availability};
use kobai::prelude::*;
use rust_decimal_macros::dec;
use tracing_test::traced_test;

#[cfg(test)]
mod consumption_tests {
    use super::*;

    #[test]
    fn test_consumed_sums_per_item_with_breakdown() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let mr = submitted_mr(
            &workflow,
            &store,
            vec![line("ITEM-1", dec!(100)), line("ITEM-2", dec!(20))],
        );

        let mut first = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(30));
        first.line_items.retain(|l| l.item_code == "ITEM-1");
        let first = submit_new(&workflow, &store, first);
        let second = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(10));
        let second = workflow.save(&store, second).expect("Failed to save draft");

        let ledger = QuantityLedger::new(&store);
        let consumed = ledger
            .consumed(&mr.key(), DocType::PurchaseRequisition, None)
            .expect("Failed to compute consumption");

        let item1 = &consumed["ITEM-1"];
        assert_eq!(item1.total, dec!(40));
        let ids: Vec<&str> = item1.breakdown.iter().map(|c| c.doc_id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
        assert_eq!(consumed["ITEM-2"].total, dec!(10));

        let without_second = ledger
            .consumed(&mr.key(), DocType::PurchaseRequisition, Some(&second.id))
            .expect("Failed to compute consumption");
        assert_eq!(without_second["ITEM-1"].total, dec!(30));
        assert!(!without_second.contains_key("ITEM-2"));
    }

    #[test]
    fn test_consumed_ignores_other_target_types_and_cancelled() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let mr = submitted_mr(&workflow, &store, vec![line("ITEM-1", dec!(50))]);

        let preq = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(50));
        let preq = submit_new(&workflow, &store, preq);
        workflow
            .cancel(&store, preq.doctype, &preq.id)
            .expect("Failed to cancel");

        let ledger = QuantityLedger::new(&store);
        assert!(ledger
            .consumed(&mr.key(), DocType::PurchaseRequisition, None)
            .expect("Failed to compute consumption")
            .is_empty());
        assert!(ledger
            .consumed(&mr.key(), DocType::PurchaseOrder, None)
            .expect("Failed to compute consumption")
            .is_empty());
    }

    #[test]
    fn test_available_quantities_per_source_item() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let mr = submitted_mr(
            &workflow,
            &store,
            vec![line("ITEM-1", dec!(100)), line("ITEM-2", dec!(8))],
        );
        let mut preq = draft_with_qty(&workflow, &store, &mr.id, DocType::PurchaseRequisition, dec!(25));
        preq.line_items.retain(|l| l.item_code == "ITEM-1");
        submit_new(&workflow, &store, preq);

        let available = QuantityLedger::new(&store)
            .available_quantities(&mr.key(), DocType::PurchaseRequisition)
            .expect("Failed to compute availability");
        assert_eq!(available["ITEM-1"].consumed_qty, dec!(25));
        assert_eq!(available["ITEM-1"].available_qty, dec!(75));
        assert_eq!(available["ITEM-2"].consumed_qty, dec!(0));
        assert_eq!(available["ITEM-2"].available_qty, dec!(8));

        let text = DiagnosticFormatter::format_availability(&available);
        println!("{}", text);
        assert!(text.contains("ITEM-1: source 100, consumed 25, available 75"));
    }

    #[test]
    fn test_availability_sums_repeated_item_lines() {
        let source = ProcurementDocument::new(DocType::MaterialRequest, "MR-1")
            .with_item(line("ITEM-1", dec!(10)))
            .with_item(line("ITEM-1", dec!(5)));
        let mut consumed = ConsumptionMap::new();
        consumed.entry("ITEM-1".to_string()).or_default().total = dec!(12);

        let result = availability(&source, &consumed);
        assert_eq!(result.len(), 1);
        assert_eq!(result["ITEM-1"].source_qty, dec!(15));
        assert_eq!(result["ITEM-1"].available_qty, dec!(3));
    }
}

#[cfg(test)]
mod rerooting_tests {
    use super::*;

    #[test]
    #[traced_test]
    fn test_purchase_order_tracks_against_rfq() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let (_, _, rfq) = rfq_chain(&workflow, &store, "ITEM-1", dec!(100));
        let sq = submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-A",
            vec![priced("ITEM-1", dec!(100), dec!(3))],
        );

        let po = po_draft(&store, &sq.id, vec![line("ITEM-1", dec!(10))]);
        let tracking = QuantityLedger::new(&store)
            .tracking_source(&po)
            .expect("Failed to resolve tracking source")
            .expect("Purchase Order should have a tracking source");
        assert_eq!(tracking.key(), rfq.key());
        assert!(tracking.via_quotations);
        assert!(logs_contain("instead of"));
    }

    #[test]
    fn test_quotation_without_rfq_is_not_rerooted() {
        let workflow = Workflow::builder()
            .with_flows(FlowCatalog::default())
            .build();
        let store = MemoryStore::new();
        let sq = ProcurementDocument::new(DocType::SupplierQuotation, "SQ-LOOSE")
            .with_supplier("SUP-A")
            .with_item(priced("ITEM-1", dec!(5), dec!(2)));
        let sq = submit_new(&workflow, &store, sq);

        let po = po_draft(&store, &sq.id, vec![line("ITEM-1", dec!(5))]);
        let tracking = QuantityLedger::new(&store)
            .tracking_source(&po)
            .expect("Failed to resolve tracking source")
            .expect("Purchase Order should have a tracking source");
        assert_eq!(tracking.key(), sq.key());
        assert!(!tracking.via_quotations);
    }

    #[test]
    fn test_orders_across_quotations_share_rfq_availability() {
        let workflow = Workflow::default();
        let store = MemoryStore::new();
        let (_, _, rfq) = rfq_chain(&workflow, &store, "ITEM-1", dec!(100));
        let sq1 = submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-A",
            vec![priced("ITEM-1", dec!(100), dec!(3))],
        );
        let sq2 = submitted_quotation(
            &workflow,
            &store,
            &rfq.id,
            "SUP-B",
            vec![priced("ITEM-1", dec!(100), dec!(4))],
        );
        submit_new(&workflow, &store, po_draft(&store, &sq1.id, vec![line("ITEM-1", dec!(30))]));
        submit_new(&workflow, &store, po_draft(&store, &sq2.id, vec![line("ITEM-1", dec!(20))]));

        let ledger = QuantityLedger::new(&store);
        let consumed = ledger
            .consumed_via_quotations(&rfq.id, None)
            .expect("Failed to compute consumption");
        assert_eq!(consumed["ITEM-1"].total, dec!(50));
        assert_eq!(consumed["ITEM-1"].breakdown.len(), 2);

        let available = ledger
            .available_quantities(&rfq.key(), DocType::PurchaseOrder)
            .expect("Failed to compute availability");
        assert_eq!(available["ITEM-1"].available_qty, dec!(50));
    }
}
