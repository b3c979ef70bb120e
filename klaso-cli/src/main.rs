//! Klaso CLI - Command line interface
//!
//! Loads JSON module files of normalized class requests and either checks
//! that they publish cleanly or dumps a published class's layout.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

mod logging;

use klaso_api::{KlasoError, ObjectModel};
use klaso_config::{EvalConfig, ModelConfig};
use klaso_core::{ClassDescriptor, Value};
use logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "klaso",
    about = "Klaso object-model compiler - class module tooling",
    version = "0.1.0"
)]
struct Cli {
    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, default_value = "warn", global = true)]
    log_level: LevelFilter,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    log_format: LogFormat,

    /// Override the nested method-call depth limit
    #[arg(long, global = true)]
    max_call_depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish every class of a module file, reporting the first failure
    Check {
        /// Module file (JSON)
        #[arg(value_name = "MODULE")]
        module: PathBuf,
    },
    /// Print the layout and slot table of one class from a module file
    Describe {
        /// Module file (JSON)
        #[arg(value_name = "MODULE")]
        module: PathBuf,
        /// Class name to describe
        #[arg(value_name = "CLASS")]
        class: String,
        /// Emit the description as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level, cli.log_format);

    let config = ModelConfig {
        eval: EvalConfig {
            max_call_depth: cli
                .max_call_depth
                .unwrap_or(EvalConfig::default().max_call_depth),
        },
        ..ModelConfig::default()
    };

    let result = match cli.command {
        Command::Check { module } => check(&module, config),
        Command::Describe {
            module,
            class,
            json,
        } => describe(&module, &class, json, config),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn load(path: &Path, config: ModelConfig) -> Result<ObjectModel, KlasoError> {
    let mut model = ObjectModel::with_config(config);
    model.load_module_file(path)?;
    Ok(model)
}

fn check(path: &Path, config: ModelConfig) -> Result<(), KlasoError> {
    let model = load(path, config)?;
    let mut names: Vec<&str> = model.registry().class_names().collect();
    names.sort_unstable();
    info!(target: "klaso::cli", module = %path.display(), classes = names.len(), "module checked");
    println!("{} class(es) published: {}", names.len(), names.join(", "));
    Ok(())
}

fn describe(path: &Path, class: &str, json: bool, config: ModelConfig) -> Result<(), KlasoError> {
    let model = load(path, config)?;
    let descriptor = model.class(class)?;
    let dump = ClassDump::from_descriptor(&descriptor);
    if json {
        println!("{}", serde_json::to_string_pretty(&dump)?);
    } else {
        dump.print();
    }
    Ok(())
}

/// Serializable view of one published class
#[derive(Debug, serde::Serialize)]
struct ClassDump {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    fields: Vec<FieldDump>,
    slots: Vec<SlotDump>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<(String, Value)>,
}

#[derive(Debug, serde::Serialize)]
struct FieldDump {
    index: usize,
    name: String,
    mutable: bool,
    defined_in: String,
}

#[derive(Debug, serde::Serialize)]
struct SlotDump {
    slot: usize,
    name: String,
    params: Vec<String>,
    defined_in: String,
    implemented_in: String,
}

impl ClassDump {
    fn from_descriptor(descriptor: &ClassDescriptor) -> Self {
        Self {
            name: descriptor.name().to_string(),
            parent: descriptor.parent().map(|p| p.name().to_string()),
            fields: descriptor
                .fields()
                .iter()
                .map(|f| FieldDump {
                    index: f.index,
                    name: f.name.clone(),
                    mutable: f.mutable,
                    defined_in: f.defined_in.clone(),
                })
                .collect(),
            slots: descriptor
                .slots()
                .iter()
                .map(|s| SlotDump {
                    slot: s.slot,
                    name: s.name.clone(),
                    params: s.params.clone(),
                    defined_in: s.defined_in.clone(),
                    implemented_in: s.implemented_in.clone(),
                })
                .collect(),
            properties: descriptor
                .properties()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    fn print(&self) {
        match &self.parent {
            Some(parent) => println!("class {} : {parent}", self.name),
            None => println!("class {}", self.name),
        }

        println!("  fields:");
        for field in &self.fields {
            let mutability = if field.mutable { "mutable" } else { "immutable" };
            println!(
                "    [{}] {} ({mutability}, defined in {})",
                field.index, field.name, field.defined_in
            );
        }

        println!("  slots:");
        for slot in &self.slots {
            println!(
                "    [{}] {}({}) (defined in {}, implemented in {})",
                slot.slot,
                slot.name,
                slot.params.join(", "),
                slot.defined_in,
                slot.implemented_in
            );
        }

        if !self.properties.is_empty() {
            println!("  properties:");
            for (key, value) in &self.properties {
                println!("    {key} = {value}");
            }
        }
    }
}
