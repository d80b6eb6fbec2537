use crate::comparison::ComparisonResult;
use crate::error::{ValidationError, WorkflowError};
use crate::ledger::Availability;
use crate::links::{DocumentFlow, LinkedDocuments};
use indexmap::IndexMap;
use itertools::Itertools;
use rust_decimal::Decimal;

/// Renders rejections and workflow reports as plain text.
pub struct DiagnosticFormatter;

impl DiagnosticFormatter {
    /// Explains a workflow error, with the structured payload spelled out where one exists.
    pub fn format_error(error: &WorkflowError) -> String {
        match error {
            WorkflowError::Validation(v) => Self::format_validation(v),
            other => other.to_string(),
        }
    }

    pub fn format_validation(error: &ValidationError) -> String {
        let mut result = error.to_string();
        match error {
            ValidationError::QuantityExceeded {
                item_code,
                available,
                breakdown,
                ..
            } => {
                if !breakdown.is_empty() {
                    result.push_str("\nAlready processed by:");
                    for consumer in breakdown {
                        result.push_str(&format!(
                            "\n  - {}: {}",
                            consumer.doc_id,
                            Self::format_qty(consumer.qty)
                        ));
                    }
                }
                if *available > Decimal::ZERO {
                    result.push_str(&format!(
                        "\nReduce the quantity of {} to {} or less.",
                        item_code,
                        Self::format_qty(*available)
                    ));
                } else {
                    result.push_str(&format!(
                        "\nAll of {} has been processed. Increase the source quantity to continue.",
                        item_code
                    ));
                }
            }
            ValidationError::CancelBlocked { blocking, .. } => {
                for (doctype, ids) in blocking {
                    result.push_str(&format!(
                        "\n  {} ({}): {}",
                        doctype,
                        ids.len(),
                        ids.iter().join(", ")
                    ));
                }
                result.push_str("\nCancel the child documents first.");
            }
            ValidationError::SupplierNotInvited { invited, .. } => {
                if invited.is_empty() {
                    result.push_str("\nThe RFQ invites no suppliers.");
                } else {
                    result.push_str(&format!("\nInvited suppliers: {}", invited.iter().join(", ")));
                }
            }
            _ => {}
        }
        result
    }

    /// Renders a document flow as an indented tree.
    ///
    /// `*` marks the current document, `>` the other documents on its path from the root.
    pub fn format_flow(flow: &DocumentFlow) -> String {
        flow.tree
            .walk()
            .into_iter()
            .map(|(node, depth)| {
                let marker = if node.is_current {
                    '*'
                } else if node.is_in_path {
                    '>'
                } else {
                    ' '
                };
                format!(
                    "{}{} {} [{}]",
                    "  ".repeat(depth),
                    marker,
                    node.key,
                    node.docstatus
                )
            })
            .join("\n")
    }

    pub fn format_linked(linked: &LinkedDocuments) -> String {
        let mut lines = vec![format!("Backward ({}):", linked.backward_count())];
        for (doctype, group) in &linked.backward {
            lines.push(format!("  {} x{}: {}", doctype, group.count, group.documents.iter().join(", ")));
        }
        lines.push(format!("Forward ({}):", linked.forward_count()));
        for (doctype, group) in &linked.forward {
            lines.push(format!("  {} x{}: {}", doctype, group.count, group.documents.iter().join(", ")));
        }
        lines.join("\n")
    }

    pub fn format_availability(availability: &IndexMap<String, Availability>) -> String {
        availability
            .iter()
            .map(|(code, a)| {
                format!(
                    "{}: source {}, consumed {}, available {}",
                    code,
                    Self::format_qty(a.source_qty),
                    Self::format_qty(a.consumed_qty),
                    Self::format_qty(a.available_qty)
                )
            })
            .join("\n")
    }

    /// Renders the supplier ranking followed by the per-item winners.
    pub fn format_comparison(result: &ComparisonResult) -> String {
        let mut lines = vec![format!(
            "RFQ {}: {} supplier(s), {} item(s)",
            result.rfq, result.summary.total_suppliers, result.summary.total_items
        )];
        for (supplier, total) in &result.supplier_totals {
            lines.push(format!(
                "  #{} {} ({}): {}",
                total.rank,
                supplier,
                total.quotation,
                Self::format_qty(total.total)
            ));
        }
        for item in &result.items {
            let best = match (&item.best_supplier, item.best_rate) {
                (Some(s), Some(r)) => format!("{} @ {}", s, Self::format_qty(r)),
                _ => "no quotes".to_string(),
            };
            lines.push(format!(
                "  {}: best {}, avg {}",
                item.item_code,
                best,
                Self::format_qty(item.avg_rate.round_dp(2))
            ));
        }
        if let Some(winner) = &result.winner_by_total {
            lines.push(format!("Winner by total: {}", winner));
        }
        if let Some(winner) = &result.winner_by_items {
            lines.push(format!("Winner by items: {}", winner));
        }
        lines.join("\n")
    }

    /// Format a decimal without trailing zeros.
    fn format_qty(value: Decimal) -> String {
        format!("{}", value.normalize())
    }
}
