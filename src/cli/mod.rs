//! Command-line interface for stdnames.
//!
//! Provides the two library tools: `check-unique`, which reports (and
//! optionally removes) duplicate standard names, and `convert`, which renders
//! a library as Markdown or YAML.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::SchemaValidator;
use crate::config::{self, ResolvedConfig};
use crate::core::DEFAULT_KEY_FIELD;

pub mod check_unique;
pub mod convert;

pub use check_unique::{check_unique, CheckOutcome};
pub use convert::{convert, output_path};

/// stdnames - Standard-name library tools
#[derive(Parser, Debug)]
#[command(name = "stdnames")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print additional diagnostics
    #[arg(long, global = true)]
    pub debug: bool,

    /// Skip XSD validation of the library file
    #[arg(long, global = true)]
    pub no_validate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report duplicate standard names, optionally removing them
    CheckUnique {
        /// XML file with standard name library
        standard_name_file: PathBuf,

        /// Field to check for uniqueness
        #[arg(long, default_value = DEFAULT_KEY_FIELD)]
        field: String,

        /// Remove duplicates and overwrite the file
        #[arg(long)]
        overwrite: bool,
    },

    /// Convert a standard name library to another format
    Convert {
        /// XML file with standard name library
        standard_name_file: PathBuf,

        /// Name of output file (without extension)
        #[arg(long)]
        output_filename: Option<String>,

        /// Format of output file
        #[arg(long, value_name = "md|yaml")]
        output_format: String,
    },
}

/// Schema validation settings handed to the tools
#[derive(Clone, Copy)]
pub struct Validation<'a> {
    pub validator: &'a dyn SchemaValidator,
    pub schema_dir: Option<&'a Path>,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<ExitCode> {
        let defaults;
        let cfg = if self.needs_config() {
            config::config()?
        } else {
            defaults = ResolvedConfig::default();
            &defaults
        };
        let validator = cfg.validator();
        let validation = (!self.no_validate).then_some(Validation {
            validator: &validator,
            schema_dir: cfg.schema_dir.as_deref(),
        });

        match self.command {
            Commands::CheckUnique {
                standard_name_file,
                field,
                overwrite,
            } => {
                let path = absolute(&standard_name_file)?;
                let outcome = check_unique(
                    &path,
                    &field,
                    overwrite,
                    validation,
                    &mut std::io::stdout().lock(),
                )?;
                Ok(outcome.exit_code())
            }
            Commands::Convert {
                standard_name_file,
                output_filename,
                output_format,
            } => {
                let path = absolute(&standard_name_file)?;
                let base = output_filename.unwrap_or_else(|| cfg.output_filename.clone());
                convert(&path, &output_format, &base, validation)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    /// Whether this run reads anything from the config file
    fn needs_config(&self) -> bool {
        !self.no_validate
            || matches!(
                self.command,
                Commands::Convert {
                    output_filename: None,
                    ..
                }
            )
    }
}

/// Make `path` absolute against the current directory
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Ok(cwd.join(path))
}
