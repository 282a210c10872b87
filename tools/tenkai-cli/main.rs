use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::time::Instant;
use tenkai::error::ConversionError;
use tenkai::prelude::*;
use tenkai::runtime::UnresolvedReason;

// --- Authoring sheet (input format specific) ---
// A flat, hand-writable format that is converted into a `GraphDocument`.

#[derive(Deserialize)]
struct RawSheet {
    nodes: Vec<RawNode>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    path: Option<String>,
    #[serde(alias = "itemId")]
    item_id: Option<String>,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default)]
    params: Vec<RawParam>,
}

#[derive(Deserialize)]
struct RawParam {
    name: Option<String>,
    #[serde(rename = "type")]
    slot_type: String,
    default: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawInput {
    node: String,
    pin: String,
    value: Value,
}

impl IntoDocument for RawSheet {
    fn into_document(self) -> std::result::Result<GraphDocument, ConversionError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for raw in self.nodes {
            let mut node = NodeSchema::new(raw.id);
            node.set_path(raw.path.as_deref());
            node.set_item_id(raw.item_id.as_deref());
            if raw.priority.is_some() {
                node.set_priority(raw.priority);
            }
            for param in raw.params {
                let slot_type = SlotType::parse(&param.slot_type).ok_or_else(|| {
                    ConversionError::ValidationError(format!(
                        "unknown parameter type '{}'",
                        param.slot_type
                    ))
                })?;
                let id = node.add_slot(param.name.as_deref(), slot_type);
                if let Some(json) = param.default {
                    let value = literal(slot_type, &json).ok_or_else(|| {
                        ConversionError::ValidationError(format!(
                            "default {} does not fit type {}",
                            json, slot_type
                        ))
                    })?;
                    node.set_slot_default(id, Some(value))?;
                }
            }
            nodes.push(node);
        }
        Ok(GraphDocument::with_nodes(nodes))
    }
}

fn literal(slot_type: SlotType, json: &serde_json::Value) -> Option<Value> {
    match slot_type {
        SlotType::Boolean => json.as_bool().map(Value::Bool),
        SlotType::Integer => json.as_i64().map(Value::Integer),
        SlotType::Float => json.as_f64().map(Value::Float),
        SlotType::String => json.as_str().map(|s| Value::String(s.to_string())),
        SlotType::Text => json.as_str().map(|s| Value::Text(s.to_string())),
        SlotType::Object => None,
    }
}

/// Authoring, lowering and test-running tool for create-or-show node graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lower every node of a document and print the expansion plans
    Compile {
        /// Graph document (.json) or authoring sheet with --sheet
        document: String,
        /// Treat the input as a flat authoring sheet
        #[arg(long)]
        sheet: bool,
        /// Write the validated document to this path (.json or binary)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Lower a document and run every plan against an in-memory manager
    Run {
        document: String,
        /// JSON catalog of creatable items and their properties
        #[arg(short, long)]
        catalog: String,
        /// JSON list of upstream values: [{"node", "pin", "value"}]
        #[arg(short, long)]
        inputs: Option<String>,
        #[arg(long)]
        sheet: bool,
        /// Report properties that could not be bound
        #[arg(short, long)]
        diagnostics: bool,
    },
    /// Apply a JSON list of slot commands to one node and save the document
    Edit {
        document: String,
        /// Id of the node to edit
        node: String,
        /// JSON list of slot commands
        commands: String,
        /// Where to write the result (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    match cli.command {
        Command::Compile {
            document,
            sheet,
            output,
        } => run_compile(&document, sheet, output.as_deref()),
        Command::Run {
            document,
            catalog,
            inputs,
            sheet,
            diagnostics,
        } => run_chains(&document, sheet, &catalog, inputs.as_deref(), diagnostics),
        Command::Edit {
            document,
            node,
            commands,
            output,
        } => run_edit(&document, &node, &commands, output.as_deref()),
    }
}

fn load_document(path: &str, sheet: bool) -> GraphDocument {
    if !sheet {
        return GraphDocument::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load document '{}': {}", path, e))
        });
    }
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read sheet '{}': {}", path, e)));
    let raw: RawSheet = serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse sheet JSON: {}", e)));
    raw.into_document()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert sheet: {}", e)))
}

fn compile(document: GraphDocument) -> Vec<LoweredNode> {
    let start = Instant::now();
    let lowered = Compiler::builder(document)
        .build()
        .compile()
        .unwrap_or_else(|e| exit_with_error(&format!("Lowering failed: {}", e)));
    println!(
        "Lowered {} node(s) in {:?}",
        lowered.len(),
        start.elapsed()
    );
    lowered
}

fn run_compile(path: &str, sheet: bool, output: Option<&str>) {
    let document = load_document(path, sheet);
    if let Some(output) = output {
        document
            .save(output)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save '{}': {}", output, e)));
        println!("Saved document to '{}'", output);
    }

    for node in compile(document) {
        println!("\n{}", visualize_plan(&node.plan));
    }
}

fn run_chains(
    path: &str,
    sheet: bool,
    catalog_path: &str,
    inputs_path: Option<&str>,
    diagnostics: bool,
) {
    let document = load_document(path, sheet);
    let catalog = fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read catalog '{}': {}", catalog_path, e))
    });
    let mut manager = MemoryManager::from_catalog_json(&catalog)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse catalog: {}", e)));

    let mut external = ExternalValues::new();
    if let Some(inputs_path) = inputs_path {
        let json = fs::read_to_string(inputs_path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to read inputs '{}': {}", inputs_path, e))
        });
        let inputs: Vec<RawInput> = serde_json::from_str(&json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse inputs JSON: {}", e)));
        for input in inputs {
            external.insert(PinRef::new(input.node, input.pin), input.value);
        }
    }

    let lowered = compile(document);
    println!("\nRunning {} chain(s)...", lowered.len());
    let start = Instant::now();
    for node in &lowered {
        let outcome = ChainRunner::new(&node.plan)
            .with_diagnostics(diagnostics)
            .run(&mut manager, &external, ObjectHandle::INVALID)
            .unwrap_or_else(|e| {
                exit_with_error(&format!("Chain '{}' failed: {}", node.node_id, e))
            });

        println!("  -> {}", TraceFormatter::format_trace(&outcome.trace));
        for miss in &outcome.unresolved {
            let on = miss.object_type.as_deref().unwrap_or("<unavailable>");
            let reason = match &miss.reason {
                UnresolvedReason::Binding(failure) => format!("{:?}", failure),
                UnresolvedReason::ObjectUnavailable => "object unavailable".to_string(),
            };
            println!("     unresolved '{}' on {}: {}", miss.property, on, reason);
        }
    }

    println!("\n--- Summary ---");
    println!("Chains run:     {}", lowered.len());
    println!("Live objects:   {}", manager.live_objects());
    println!("Execution:      {:?}", start.elapsed());
}

fn run_edit(path: &str, node_id: &str, commands_path: &str, output: Option<&str>) {
    let mut document = load_document(path, false);
    let json = fs::read_to_string(commands_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read commands '{}': {}", commands_path, e))
    });
    let commands: Vec<SlotCommand> = serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse commands JSON: {}", e)));

    let node = document
        .node_mut(node_id)
        .unwrap_or_else(|| exit_with_error(&format!("No node '{}' in document", node_id)));
    for command in commands {
        let described = format!("{:?}", command);
        let outcome = apply_command(&mut *node, command)
            .unwrap_or_else(|e| exit_with_error(&format!("{} failed: {}", described, e)));
        for warning in outcome.warnings {
            println!("Warning: {}", warning);
        }
    }

    println!("\nSlots of '{}':", node_id);
    for slot in node.slot_list() {
        let wiring = if slot.connected { " (connected)" } else { "" };
        println!("  {}: {} {}{}", slot.position, slot.name, slot.slot_type, wiring);
    }

    let target = output.unwrap_or(path);
    document
        .save(target)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to save '{}': {}", target, e)));
    println!("Saved document to '{}'", target);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
