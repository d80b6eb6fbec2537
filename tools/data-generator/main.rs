use clap::Parser;
use indexmap::IndexMap;
use kobai::prelude::*;
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use std::fs;

/// A CLI tool to generate consistent procurement datasets for kobai
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_dataset.json")]
    output: String,

    /// Number of independent Material Request chains to generate
    #[arg(long, default_value_t = 3)]
    chains: usize,

    /// Number of suppliers invited to each RFQ
    #[arg(long, default_value_t = 3)]
    suppliers: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

const ITEMS: [(&str, &str, &str); 6] = [
    ("BOLT-M8", "Hex bolt M8", "Nos"),
    ("NUT-M8", "Hex nut M8", "Nos"),
    ("PIPE-20", "Steel pipe 20mm", "Meter"),
    ("PAINT-W", "White primer", "Litre"),
    ("CABLE-3C", "3-core cable", "Meter"),
    ("GLOVE-L", "Work gloves L", "Pair"),
];

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.suppliers == 0 {
        eprintln!("Error: --suppliers must be at least 1");
        std::process::exit(1);
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    println!(
        "Generating {} chain(s) with {} supplier(s) per RFQ...",
        cli.chains, cli.suppliers
    );

    let store = MemoryStore::new();
    let workflow = Workflow::builder().build();
    let suppliers: Vec<String> = (1..=cli.suppliers)
        .map(|i| format!("SUP-{:03}", i))
        .collect();

    for chain in 0..cli.chains {
        generate_chain(&workflow, &store, &mut rng, &suppliers)?;
        println!("-> Generated chain {}.", chain + 1);
    }

    let dataset = Dataset {
        documents: store.documents()?,
        flows: vec![ProcurementFlow::standard()],
        rules: default_rules(),
    };
    fs::write(&cli.output, dataset.to_json()?)?;

    println!(
        "Successfully generated {} documents and saved them to '{}'",
        dataset.documents.len(),
        cli.output
    );
    Ok(())
}

/// Walks one Material Request down the chain, stopping at a random depth.
fn generate_chain(
    workflow: &Workflow,
    store: &MemoryStore,
    rng: &mut StdRng,
    suppliers: &[String],
) -> Result<()> {
    let mr_id = store.allocate_id(DocType::MaterialRequest)?;
    let mut mr = ProcurementDocument::new(DocType::MaterialRequest, mr_id.clone());
    mr.company = Some("Kobai Demo Ltd".to_string());
    let item_count = rng.random_range(1..=ITEMS.len());
    for (code, name, uom) in ITEMS.iter().take(item_count) {
        let mut line = LineItem::new(*code, Decimal::from(rng.random_range(10..=200i64)), *uom);
        line.item_name = Some(name.to_string());
        mr.line_items.push(line);
    }
    workflow.save(store, mr)?;
    workflow.submit(store, DocType::MaterialRequest, &mr_id)?;

    let mut preq = workflow.make_procurement_document(store, &mr_id, DocType::PurchaseRequisition)?;
    for line in &mut preq.line_items {
        line.quantity = portion(rng, line.quantity);
    }
    let preq = workflow.save(store, preq)?;
    workflow.submit(store, preq.doctype, &preq.id)?;

    let mut rfq = workflow.make_procurement_document(store, &preq.id, DocType::RequestForQuotation)?;
    rfq.suppliers = suppliers.to_vec();
    let rfq = workflow.save(store, rfq)?;
    workflow.submit(store, rfq.doctype, &rfq.id)?;

    let mut matrix = PivotMatrix::new();
    for supplier in suppliers {
        let mut entries = IndexMap::new();
        for line in &rfq.line_items {
            if rng.random_bool(0.85) {
                let rate = Decimal::new(rng.random_range(100..=5000), 2);
                entries.insert(line.item_code.clone(), PivotEntry::new(rate, Decimal::ZERO));
            }
        }
        matrix.insert(supplier.clone(), entries);
    }
    let created = create_supplier_quotations_from_pivot(workflow, store, &rfq.id, &matrix)?;
    let submitted = submit_supplier_quotations(workflow, store, &created.succeeded);
    if !rng.random_bool(0.8) || submitted.succeeded.is_empty() {
        return Ok(());
    }

    let Some(winner) = compare(store, &rfq.id)?.winner_by_total else {
        return Ok(());
    };
    let award = award_supplier(store, &rfq.id, &winner, AwardType::Total)?;

    let mut po = workflow.make_procurement_document(
        store,
        &award.supplier_quotation,
        DocType::PurchaseOrder,
    )?;
    for line in &mut po.line_items {
        line.quantity = portion(rng, line.quantity);
    }
    let po = workflow.save(store, po)?;
    workflow.submit(store, po.doctype, &po.id)?;

    if rng.random_bool(0.6) {
        let receipt = workflow.make_procurement_document(store, &po.id, DocType::PurchaseReceipt)?;
        let receipt = workflow.save(store, receipt)?;
        workflow.submit(store, receipt.doctype, &receipt.id)?;

        if rng.random_bool(0.5) {
            let invoice =
                workflow.make_procurement_document(store, &receipt.id, DocType::PurchaseInvoice)?;
            workflow.save(store, invoice)?;
        }
    }
    Ok(())
}

/// A random share (50% to 100%) of `qty`, at least one unit.
fn portion(rng: &mut StdRng, qty: Decimal) -> Decimal {
    let percent = Decimal::from(rng.random_range(50..=100i64));
    (qty * percent / Decimal::ONE_HUNDRED)
        .floor()
        .max(Decimal::ONE)
        .min(qty)
}

fn default_rules() -> Vec<SupplierRule> {
    vec![
        SupplierRule::new("Small purchase", Decimal::ZERO, Decimal::from(1000), 1, 1),
        SupplierRule::new("Medium purchase", Decimal::from(1000), Decimal::from(10000), 2, 1),
        SupplierRule::new("Large purchase", Decimal::from(10000), Decimal::from(1_000_000), 3, 1),
    ]
}
