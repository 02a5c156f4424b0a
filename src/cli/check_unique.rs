//! The `check-unique` tool: report and optionally remove duplicate entries.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;

use super::Validation;
use crate::adapters::{read_catalog, validate_source, write_catalog};
use crate::core::{find_duplicates, remove_duplicates, DuplicateReport};

/// How a `check-unique` run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Every key value occurs once
    NoDuplicates,

    /// Duplicates were found and the file was rewritten without them
    DuplicatesRemoved { removed: usize },

    /// Duplicates were found and left in place
    DuplicatesFound { duplicates: usize },
}

impl CheckOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CheckOutcome::DuplicatesFound { .. } => ExitCode::from(1),
            _ => ExitCode::SUCCESS,
        }
    }
}

/// Check `path` for entries sharing a `field` value, writing the report to `out`.
///
/// With `overwrite`, duplicates after the first occurrence are removed and
/// the file is rewritten in place.
pub fn check_unique(
    path: &Path,
    field: &str,
    overwrite: bool,
    validation: Option<Validation<'_>>,
    out: &mut impl Write,
) -> Result<CheckOutcome> {
    let mut catalog = read_catalog(path)?;

    if let Some(validation) = validation {
        validate_source(path, &catalog, validation.validator, validation.schema_dir)?;
    }

    let scan = find_duplicates(&catalog, field);
    let report = DuplicateReport::from_scan(&scan, field);
    writeln!(out, "{}", report)?;

    if report.is_empty() {
        return Ok(CheckOutcome::NoDuplicates);
    }

    if !overwrite {
        return Ok(CheckOutcome::DuplicatesFound {
            duplicates: report.total_removed(),
        });
    }

    writeln!(out, "Removing duplicates and overwriting {}", path.display())?;
    let before = catalog.entry_count();
    remove_duplicates(&mut catalog, field);
    let removed = before - catalog.entry_count();

    write_catalog(&catalog, path)
        .with_context(|| format!("Failed to overwrite {}", path.display()))?;
    info!(removed, path = %path.display(), "Duplicates removed");

    Ok(CheckOutcome::DuplicatesRemoved { removed })
}
