//! The `convert` tool: render a library file as Markdown or YAML.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::Validation;
use crate::adapters::{read_catalog, validate_source};
use crate::render::OutputFormat;

/// Output path for a base name and format (`<base>.<ext>`)
pub fn output_path(base: &str, format: OutputFormat) -> PathBuf {
    PathBuf::from(format!("{}.{}", base, format.renderer().extension()))
}

/// Render the library at `path` into `<output_base>.<ext>` and return the file written.
///
/// The format is checked before anything is read, and the document is
/// fully rendered before the output file is created.
pub fn convert(
    path: &Path,
    output_format: &str,
    output_base: &str,
    validation: Option<Validation<'_>>,
) -> Result<PathBuf> {
    let format: OutputFormat = output_format.parse()?;
    let catalog = read_catalog(path)?;

    if let Some(validation) = validation {
        validate_source(path, &catalog, validation.validator, validation.schema_dir)?;
    }

    let document = format.renderer().render(&catalog)?;

    let output = output_path(output_base, format);
    std::fs::write(&output, document)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    info!(
        library = catalog.name(),
        format = %format,
        output = %output.display(),
        "Wrote standard name document"
    );
    Ok(output)
}
