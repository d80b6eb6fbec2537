use clap::{Parser, Subcommand};
use kobai::prelude::*;
use rust_decimal::Decimal;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Inspect a procurement dataset: chains, flows, availability, analysis and comparisons
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the dataset JSON file
    dataset_path: String,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the ancestors and direct children of a document
    Chain { doctype: String, id: String },
    /// Show the full document flow tree around a document
    Flow { doctype: String, id: String },
    /// Show what is still available on a source for a target document type
    Available {
        source_doctype: String,
        source_id: String,
        target_doctype: String,
    },
    /// Show child counts and completion of a source document
    Analysis { doctype: String, id: String },
    /// Compare the submitted Supplier Quotations of an RFQ
    Compare { rfq_id: String },
    /// Check an RFQ's invited suppliers against the supplier rules
    Rule { rfq_id: String },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let total_start = Instant::now();
    let dataset = Dataset::from_file(&cli.dataset_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to load dataset from '{}': {}",
            cli.dataset_path, e
        ))
    });
    let store = dataset
        .to_store()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid document: {}", e)));
    let flows = dataset
        .catalog()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid flow configuration: {}", e)));
    let rules = dataset
        .rulebook()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid supplier rules: {}", e)));
    let workflow = Workflow::builder().with_flows(flows).with_rules(rules).build();
    let load_duration = total_start.elapsed();

    match cli.command {
        Command::Chain { doctype, id } => {
            let doctype = parse_doctype(&doctype);
            let chain = workflow
                .links(&store)
                .document_chain(doctype, &id)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!("Backward:");
            for key in &chain.backward {
                println!("  {}", key);
            }
            println!("Forward:");
            for edge in &chain.forward {
                println!("  {} (linked {})", edge.target, edge.linked_at.format("%Y-%m-%d %H:%M"));
            }
            let linked = workflow
                .links(&store)
                .linked_documents_with_counts(doctype, &id)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!("\n{}", DiagnosticFormatter::format_linked(&linked));
        }
        Command::Flow { doctype, id } => {
            let flow = workflow
                .links(&store)
                .document_flow(parse_doctype(&doctype), &id)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!("{}", DiagnosticFormatter::format_flow(&flow));
        }
        Command::Available {
            source_doctype,
            source_id,
            target_doctype,
        } => {
            let source = DocKey::new(parse_doctype(&source_doctype), source_id);
            let available = QuantityLedger::new(&store)
                .available_quantities(&source, parse_doctype(&target_doctype))
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!("{}", DiagnosticFormatter::format_availability(&available));
        }
        Command::Analysis { doctype, id } => {
            let analysis = workflow
                .procurement_analysis(&store, parse_doctype(&doctype), &id)
                .unwrap_or_else(|e| exit_with_error(&DiagnosticFormatter::format_error(&e)));
            println!("Children:        {}", analysis.total_children);
            println!("Items:           {}", analysis.total_items);
            println!("Total quantity:  {}", analysis.total_quantity.normalize());
            println!("Completion:      {}%", analysis.completion_rate);
            for item in &analysis.items {
                println!(
                    "  {}: {} of {} consumed, {} available",
                    item.item_code,
                    item.consumed.normalize(),
                    item.source_qty.normalize(),
                    item.available.normalize()
                );
            }
        }
        Command::Compare { rfq_id } => {
            let result = compare(&store, &rfq_id)
                .unwrap_or_else(|e| exit_with_error(&DiagnosticFormatter::format_error(&e)));
            println!("{}", DiagnosticFormatter::format_comparison(&result));
        }
        Command::Rule { rfq_id } => {
            let requirement = workflow
                .check_rfq_suppliers(&store, &rfq_id)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            let status = if requirement.valid { "OK" } else { "FAIL" };
            println!("[{}] {}", status, requirement.message);
            if requirement.total_amount > Decimal::ZERO {
                println!("Estimated total: {}", requirement.total_amount.normalize());
            }
        }
    }

    println!("\n--- Summary ---");
    println!("Documents loaded:  {}", store.len());
    println!("Load time:         {:?}", load_duration);
    println!("Total time:        {:?}", total_start.elapsed());
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .init();
}

fn parse_doctype(value: &str) -> DocType {
    value
        .parse()
        .unwrap_or_else(|e: String| exit_with_error(&e))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
