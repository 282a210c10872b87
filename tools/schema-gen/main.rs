use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use tenkai::prelude::*;
use tenkai::schema::RESERVED_NAMES;

/// A CLI tool to generate random node graphs for exercising the lowering pipeline
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated document to (.json or binary)
    #[arg(short, long, default_value = "generated_graph.json")]
    output: String,

    /// Optional path for a matching item catalog
    #[arg(short, long)]
    catalog: Option<String>,

    /// Number of nodes to generate
    #[arg(short, long, default_value_t = 8)]
    nodes: usize,

    /// The minimum number of parameter slots per node
    #[arg(long, default_value_t = 0)]
    min: usize,

    /// The maximum number of parameter slots per node
    #[arg(long, default_value_t = 6)]
    max: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

const PATHS: [&str; 3] = ["UI", "HUD", "Menu"];
const ITEMS: [&str; 5] = ["Popup", "Toast", "Dialog", "Banner", "Tooltip"];
const NAMES: [&str; 8] = [
    "Title", "Message", "Seconds", "Count", "Visible", "Icon", "Body", "Path",
];

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) cannot be greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    println!(
        "Generating {} node(s) with {} to {} parameter slots each...",
        cli.nodes, cli.min, cli.max
    );

    let nodes = (0..cli.nodes)
        .map(|index| generate_node(&mut rng, index, cli.min, cli.max))
        .collect::<Result<Vec<_>>>()?;
    let document = GraphDocument::with_nodes(nodes);
    document.validate()?;
    document.save(&cli.output)?;
    println!("Successfully saved document to '{}'", cli.output);

    if let Some(path) = &cli.catalog {
        let catalog = generate_catalog(&mut rng);
        fs::write(path, serde_json::to_string_pretty(&catalog)?)?;
        println!("Successfully saved catalog to '{}'", path);
    }

    Ok(())
}

fn generate_node(
    rng: &mut StdRng,
    index: usize,
    min: usize,
    max: usize,
) -> Result<NodeSchema> {
    let mut node = NodeSchema::new(format!("node_{}", index));
    node.set_path(Some(PATHS[rng.random_range(0..PATHS.len())]));
    node.set_item_id(Some(ITEMS[rng.random_range(0..ITEMS.len())]));
    node.set_priority(Some(rng.random_range(0..100)));

    let count = rng.random_range(min..=max);
    for _ in 0..count {
        // May collide with an earlier slot or a fixed pin.
        let name = NAMES[rng.random_range(0..NAMES.len())];
        let slot_type = SlotType::ALL[rng.random_range(0..SlotType::ALL.len())];
        let id = node.add_slot(Some(name), slot_type);
        if rng.random_bool(0.5) {
            node.set_slot_default(id, random_literal(rng, slot_type))?;
        }
    }

    let reserved = node
        .slots()
        .iter()
        .filter(|s| RESERVED_NAMES.iter().any(|r| s.name.starts_with(r)))
        .count();
    if reserved > 0 {
        println!("-> {} got {} suffixed reserved name(s).", node.id(), reserved);
    }
    Ok(node)
}

fn random_literal(rng: &mut StdRng, slot_type: SlotType) -> Option<Value> {
    let value = match slot_type {
        SlotType::Boolean => Value::Bool(rng.random_bool(0.5)),
        SlotType::Integer => Value::Integer(rng.random_range(-10..1000)),
        SlotType::Float => Value::Float(rng.random_range(0.0..60.0)),
        SlotType::String => Value::String(format!("value_{}", rng.random_range(0..100))),
        SlotType::Text => Value::Text(format!("Text {}", rng.random_range(0..100))),
        SlotType::Object => return None,
    };
    Some(value)
}

/// Every path/item pair gets a type exposing a random subset of the known names.
fn generate_catalog(rng: &mut StdRng) -> Vec<CatalogEntry> {
    let mut entries = Vec::new();
    for path in PATHS {
        for item in ITEMS {
            let mut descriptor = TypeDescriptor::new(item);
            for name in NAMES {
                if rng.random_bool(0.6) {
                    let kind = SlotType::ALL[rng.random_range(0..SlotType::ALL.len())];
                    descriptor = descriptor.with_property(name, kind);
                }
            }
            entries.push(CatalogEntry {
                path: path.to_string(),
                item_id: item.to_string(),
                descriptor,
            });
        }
    }
    entries
}
