//! Command-line entry point for OME Notes.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use ome_form::FieldValue;
use thiserror::Error;

use ome_notes::config::ConfigError;
use ome_notes::intake::{self, IntakeError};
use ome_notes::viewer::{MetadataView, render_details};
use ome_notes::{AttributedTree, BindError, Document, DocumentError, FieldType, Notebook, NotesConfig, TemplateSet};

/// Metadata notebook for OME-XML documents.
#[derive(Parser)]
#[command(name = "ome-notes", version, about = "View and annotate OME-XML metadata")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Allow notebook edits regardless of the configuration
    #[arg(long, global = true, conflicts_with = "read_only")]
    editable: bool,

    /// Forbid notebook edits regardless of the configuration
    #[arg(long, global = true)]
    read_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the element outline of a metadata file
    View {
        /// OME-XML file
        file: PathBuf,
    },

    /// Print the attributes of every element with a tag
    Inspect {
        /// OME-XML file
        file: PathBuf,
        /// Tag to look up
        tag: String,
    },

    /// List the fields of a template file
    Template {
        /// Template file (defaults to the configured template path)
        file: Option<PathBuf>,
    },

    /// Open the notebook on a metadata file, apply edits and print the fields
    Notebook {
        /// OME-XML file
        file: PathBuf,
        /// Field edit as NAME=VALUE (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        edits: Vec<String>,
        /// Write the edited document here
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<NotesConfig, ConfigError> {
    match path {
        Some(path) => NotesConfig::load(path),
        None => Ok(NotesConfig::load_from_default_path().unwrap_or_default()),
    }
}

fn run(cli: Cli, config: NotesConfig) -> Result<(), CliError> {
    let editable = if cli.editable {
        true
    } else if cli.read_only {
        false
    } else {
        config.editable
    };

    match cli.command {
        Commands::View { file } => {
            let view = MetadataView::from_xml(&intake::read_metadata(&file)?);
            print!("{}", view.render_outline());
        }
        Commands::Inspect { file, tag } => {
            let view = MetadataView::from_xml(&intake::read_metadata(&file)?);
            let Some(doc) = view.document() else {
                print!("{}", view.render_outline());
                return Ok(());
            };
            let nodes = doc.nodes_by_tag(&tag);
            if nodes.is_empty() {
                println!("No <{}> elements", tag);
            }
            for node in nodes {
                if let Some(details) = view.inspect(node) {
                    println!("{}", render_details(&details));
                }
            }
        }
        Commands::Template { file } => {
            let path = file
                .or(config.template_path)
                .ok_or_else(|| CliError::Usage("No template file given or configured".into()))?;
            print_templates(&TemplateSet::load(&path)?);
        }
        Commands::Notebook { file, edits, output } => {
            let document = Document::parse(&intake::read_metadata(&file)?)?;
            let mut notebook = Notebook::open(document, editable)?;

            for edit in &edits {
                let (name, raw) = edit
                    .split_once('=')
                    .ok_or_else(|| CliError::Usage(format!("Expected NAME=VALUE, got '{}'", edit)))?;
                let value = parse_value(&notebook, name.trim(), raw)?;
                let outcome = notebook.edit(name.trim(), value)?;
                log::info!("{}: {:?}", name.trim(), outcome);
            }

            print_notebook(&notebook);
            if let Some(output) = output {
                notebook.document().save(&output)?;
            }
        }
    }
    Ok(())
}

/// Interpret a command-line value for the field's type.
fn parse_value(notebook: &Notebook, name: &str, raw: &str) -> Result<FieldValue, CliError> {
    let field = notebook
        .form()
        .field(name)
        .ok_or_else(|| CliError::Usage(format!("Unknown field '{}'", name)))?;

    let invalid = || CliError::Usage(format!("'{}' is not a valid {} value for '{}'", raw, field.field_type(), name));
    match field.field_type() {
        FieldType::Boolean => raw.trim().parse::<bool>().map(FieldValue::Bool).map_err(|_| invalid()),
        FieldType::Integer => raw.trim().parse::<i64>().map(FieldValue::Int).map_err(|_| invalid()),
        FieldType::Thumbnail => Err(invalid()),
        FieldType::Text | FieldType::Enum => Ok(FieldValue::text(raw)),
    }
}

fn print_templates(set: &TemplateSet) {
    for field in set.fields() {
        let grid = field.grid();
        let row = if grid.is_assigned() {
            grid.row.to_string()
        } else {
            "-".to_string()
        };
        println!(
            "{:<28} {:<9} row {:>2} col {} default {:?}",
            field.name(),
            field.field_type().to_string(),
            row,
            grid.column,
            field.default_value().to_string()
        );
        if let Some(values) = field.enum_values() {
            println!("{:<28} values: {}", "", values.join(", "));
        }
    }
    for rejected in set.rejected() {
        println!("rejected block {} (line {}): {}", rejected.index, rejected.line, rejected.error);
    }
}

fn print_notebook(notebook: &Notebook) {
    for field in notebook.form().fields() {
        let control = field.control();
        let state = if control.is_enabled() { "" } else { " (disabled)" };
        println!("{}: {}{}", field.name(), control.value(), state);
    }
}
