use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ogis::bridge::HeadlessEditor;
use ogis::export::export_to_dir;
use ogis::import::ImportOutcome;
use ogis::storage::{default_storage_root, FileStorage};
use ogis::store::StateStore;

/// Geographic feature editor state tool
#[derive(Parser, Debug)]
#[command(name = "ogis")]
#[command(version, about, long_about = None)]
struct Args {
    /// Data directory for persisted state
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of the current document
    Show,
    /// Import a .json, .geojson, .kml or .gpx file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Export the document as pretty-printed GeoJSON
    Export {
        /// Directory to write into (defaults to the current directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Remove all features, keeping the configuration
    Clear,
    /// Set one configuration option to a JSON value
    SetOption {
        key: String,
        /// JSON value, e.g. 'true' or '{"color":"#70af00"}'
        value: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let root = args.data_dir.unwrap_or_else(default_storage_root);
    let mut store = StateStore::new(FileStorage::new(root), HeadlessEditor::new());

    match args.command {
        Command::Show => {
            let document = store.document();
            println!("features:     {}", document.features().len());
            println!("marker types: {}", document.marker_types().len());
            println!("line types:   {}", document.line_types().len());
            println!("shape types:  {}", document.shape_types().len());
        }
        Command::Import { file } => match store.import_file(&file)? {
            ImportOutcome::Replaced => {
                println!("imported {}", file.display());
            }
            ImportOutcome::Delegated => {
                println!("{} needs the map editor's importer", file.display());
            }
        },
        Command::Export { dir } => {
            let document = store.document();
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let path = export_to_dir(&document, &dir)?;
            println!("wrote {}", path.display());
        }
        Command::Clear => {
            store.clear()?;
            println!("cleared");
        }
        Command::SetOption { key, value } => {
            let value = serde_json::from_str(&value)
                .map_err(|e| anyhow::anyhow!("option value is not JSON: {e}"))?;
            let mut config = store.document().config().clone();
            config.set_option(key, value);
            store.update_config(config);
        }
    }

    Ok(())
}
