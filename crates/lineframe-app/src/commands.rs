//! Command-line operations over document files and the local store.

use lineframe_core::{Document, FileStorage, FormatError, SCHEMA_VERSION, Storage, StorageError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::shortcuts::ShortcutRegistry;

/// Environment variable overriding the local document store directory.
pub const STORE_ENV: &str = "LINEFRAME_STORE";

pub const USAGE: &str = "\
Usage: lineframe <command> [args]

Commands:
  info <file>                       Summarize a document
  upgrade <in> <out>                Rewrite a document in the current schema
  export-defs <file> <out>          Write the document's custom catalog entries
  import-defs <file> <defs> <out>   Merge a definitions file into a document
  store list                        List documents in the local store
  store put <file> <id>             Copy a document into the store
  store get <id> <out>              Copy a stored document to a file
  store rm <id>                     Remove a stored document
  keys                              Show keyboard bindings
";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}\n\n{usage}", usage = USAGE)]
    Usage(String),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type CliResult<T> = Result<T, CliError>;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Info(PathBuf),
    Upgrade { input: PathBuf, output: PathBuf },
    ExportDefs { input: PathBuf, output: PathBuf },
    ImportDefs { input: PathBuf, defs: PathBuf, output: PathBuf },
    StoreList,
    StorePut { input: PathBuf, id: String },
    StoreGet { id: String, output: PathBuf },
    StoreRemove(String),
    Keys,
    Help,
}

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> CliResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let words: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = match words.as_slice() {
            [] | ["help"] | ["-h"] | ["--help"] => Command::Help,
            ["info", file] => Command::Info(PathBuf::from(*file)),
            ["upgrade", input, output] => Command::Upgrade {
                input: PathBuf::from(*input),
                output: PathBuf::from(*output),
            },
            ["export-defs", input, output] => Command::ExportDefs {
                input: PathBuf::from(*input),
                output: PathBuf::from(*output),
            },
            ["import-defs", input, defs, output] => Command::ImportDefs {
                input: PathBuf::from(*input),
                defs: PathBuf::from(*defs),
                output: PathBuf::from(*output),
            },
            ["store", "list"] => Command::StoreList,
            ["store", "put", input, id] => Command::StorePut {
                input: PathBuf::from(*input),
                id: id.to_string(),
            },
            ["store", "get", id, output] => Command::StoreGet {
                id: id.to_string(),
                output: PathBuf::from(*output),
            },
            ["store", "rm", id] => Command::StoreRemove(id.to_string()),
            ["keys"] => Command::Keys,
            _ => return Err(CliError::Usage(format!("unrecognized arguments: {}", args.join(" ")))),
        };
        Ok(command)
    }
}

fn read_text(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_text(path: &Path, text: &str) -> CliResult<()> {
    fs::write(path, text).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn format_error(path: &Path) -> impl FnOnce(FormatError) -> CliError + '_ {
    move |source| CliError::Format {
        path: path.to_path_buf(),
        source,
    }
}

fn read_document(path: &Path) -> CliResult<Document> {
    let text = read_text(path)?;
    Document::from_json(&text).map_err(format_error(path))
}

fn write_document(path: &Path, document: &Document) -> CliResult<()> {
    let json = document.to_json().map_err(format_error(path))?;
    write_text(path, &json)
}

fn open_store() -> CliResult<FileStorage> {
    let storage = match std::env::var_os(STORE_ENV) {
        Some(dir) => FileStorage::new(PathBuf::from(dir))?,
        None => FileStorage::default_location()?,
    };
    log::debug!("Using store at {}", storage.base_path().display());
    Ok(storage)
}

/// One-screen overview of a document.
pub fn summarize(document: &Document) -> String {
    let mut out = String::new();
    let name = if document.meta.name.is_empty() { "(untitled)" } else { &document.meta.name };
    out.push_str(&format!("Name:     {name}\n"));
    out.push_str(&format!("Unit:     {}\n", document.meta.unit));
    out.push_str(&format!("Grid:     {} (snap {})\n", document.settings.grid_size, if document.settings.snap { "on" } else { "off" }));
    out.push_str("Levels:\n");
    for level in document.levels_by_elevation() {
        out.push_str(&format!("  {:4} {:8} z={}\n", level.id, level.name, level.z));
    }
    out.push_str(&format!("Nodes:    {}\n", document.nodes().len()));
    out.push_str(&format!("Members:  {}\n", document.members().len()));
    out.push_str(&format!("Surfaces: {}\n", document.surfaces().len()));
    out.push_str(&format!("Loads:    {}\n", document.loads().len()));
    out.push_str(&format!("Supports: {}\n", document.supports().len()));
    out.push_str(&format!(
        "Custom catalog: {} sections, {} springs\n",
        document.catalog().custom_sections().count(),
        document.catalog().custom_springs().count()
    ));
    out
}

/// Execute a command, returning the text to print.
pub fn run(command: Command) -> CliResult<String> {
    match command {
        Command::Help => Ok(USAGE.to_string()),
        Command::Keys => Ok(ShortcutRegistry::describe()),
        Command::Info(path) => {
            let document = read_document(&path)?;
            Ok(summarize(&document))
        }
        Command::Upgrade { input, output } => {
            let document = read_document(&input)?;
            write_document(&output, &document)?;
            log::info!("Upgraded {} to schema {SCHEMA_VERSION}", input.display());
            Ok(format!("Wrote {} (schema {SCHEMA_VERSION})\n", output.display()))
        }
        Command::ExportDefs { input, output } => {
            let document = read_document(&input)?;
            match document.export_user_definitions().map_err(format_error(&input))? {
                Some(json) => {
                    write_text(&output, &json)?;
                    Ok(format!("Wrote {}\n", output.display()))
                }
                None => Ok("No custom definitions to export\n".to_string()),
            }
        }
        Command::ImportDefs { input, defs, output } => {
            let mut document = read_document(&input)?;
            let text = read_text(&defs)?;
            let count = document.import_user_definitions(&text).map_err(format_error(&defs))?;
            write_document(&output, &document)?;
            Ok(format!("Imported {count} definitions into {}\n", output.display()))
        }
        Command::StoreList => {
            let ids = open_store()?.list()?;
            if ids.is_empty() {
                return Ok("Store is empty\n".to_string());
            }
            Ok(ids.iter().map(|id| format!("{id}\n")).collect())
        }
        Command::StorePut { input, id } => {
            let document = read_document(&input)?;
            open_store()?.save(&id, &document)?;
            Ok(format!("Stored {id}\n"))
        }
        Command::StoreGet { id, output } => {
            let document = open_store()?.load(&id)?;
            write_document(&output, &document)?;
            Ok(format!("Wrote {}\n", output.display()))
        }
        Command::StoreRemove(id) => {
            open_store()?.delete(&id)?;
            Ok(format!("Removed {id}\n"))
        }
    }
}
