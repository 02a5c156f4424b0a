//! Schema discovery and validation.
//!
//! Library files declare a `version` on their root element. The matching
//! XSD is `<stem>_v<major>_<minor>.xsd`, looked up next to the library file
//! unless a schema directory is configured. Validation itself is delegated
//! to an external program, `xmllint` by default.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::Catalog;

/// Schema validation errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Standard name library has no version attribute")]
    MissingVersion,

    #[error("Invalid schema version, '{0}'")]
    InvalidVersion(String),

    #[error("Cannot find schema file, {schema_name}, for version {version}")]
    SchemaNotFound {
        schema_name: String,
        version: SchemaVersion,
    },

    #[error("Schema validator '{program}' is not available")]
    ValidatorUnavailable { program: String },

    #[error("Invalid standard names file, {}{}", .path.display(), detail_segment(.detail))]
    Invalid {
        path: PathBuf,
        detail: Option<String>,
    },

    #[error("Failed to run schema validator: {0}")]
    Io(#[from] io::Error),
}

fn detail_segment(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!("\n{}", d))
        .unwrap_or_default()
}

/// Library schema version (`major.minor`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
}

impl SchemaVersion {
    /// Parse `1` or `1.0` style version strings
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let invalid = || SchemaError::InvalidVersion(raw.to_string());
        let parts: Vec<&str> = raw.trim().split('.').collect();

        let number = |s: &str| s.trim().parse::<u32>().map_err(|_| invalid());
        match parts.as_slice() {
            [major] => Ok(Self {
                major: number(*major)?,
                minor: 0,
            }),
            [major, minor] => Ok(Self {
                major: number(*major)?,
                minor: number(*minor)?,
            }),
            _ => Err(invalid()),
        }
    }

    /// Suffix used in schema file names, e.g. `v1_0`
    pub fn file_suffix(&self) -> String {
        format!("v{}_{}", self.major, self.minor)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Read the schema version declared by a catalog
pub fn find_schema_version(catalog: &Catalog) -> Result<SchemaVersion, SchemaError> {
    let raw = catalog
        .version
        .as_deref()
        .ok_or(SchemaError::MissingVersion)?;
    SchemaVersion::parse(raw)
}

/// Locate the XSD for `schema_name` at `version` inside `dir`
pub fn find_schema_file(schema_name: &str, version: SchemaVersion, dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(format!("{}_{}.xsd", schema_name, version.file_suffix()));
    debug!(candidate = %candidate.display(), "Looking for schema file");
    candidate.is_file().then_some(candidate)
}

/// Something that can check a document against an XSD
pub trait SchemaValidator {
    /// Human-readable validator name
    fn name(&self) -> &str;

    /// Validate `document` against `schema`
    fn validate(&self, document: &Path, schema: &Path) -> Result<(), SchemaError>;
}

/// Validates by running `xmllint --noout --schema <xsd> <xml>`
#[derive(Debug, Clone)]
pub struct XmllintValidator {
    /// Program to execute
    pub program: PathBuf,

    /// Whether a missing program is an error (otherwise validation is skipped)
    pub required: bool,
}

impl XmllintValidator {
    pub fn new(program: impl Into<PathBuf>, required: bool) -> Self {
        Self {
            program: program.into(),
            required,
        }
    }
}

impl SchemaValidator for XmllintValidator {
    fn name(&self) -> &str {
        "xmllint"
    }

    fn validate(&self, document: &Path, schema: &Path) -> Result<(), SchemaError> {
        let output = match Command::new(&self.program)
            .arg("--noout")
            .arg("--schema")
            .arg(schema)
            .arg(document)
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let program = self.program.display().to_string();
                if self.required {
                    return Err(SchemaError::ValidatorUnavailable { program });
                }
                warn!(%program, "Schema validator not found, skipping validation");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string);
        Err(SchemaError::Invalid {
            path: document.to_path_buf(),
            detail,
        })
    }
}

/// Validate the library file at `path` before anything edits it.
///
/// `catalog` must be the tree just read from `path`; only its version is used.
pub fn validate_source(
    path: &Path,
    catalog: &Catalog,
    validator: &dyn SchemaValidator,
    schema_dir: Option<&Path>,
) -> Result<(), SchemaError> {
    let version = find_schema_version(catalog)?;
    let schema_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let dir = match schema_dir {
        Some(dir) => dir.to_path_buf(),
        None => path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let schema = find_schema_file(&schema_name, version, &dir).ok_or_else(|| {
        SchemaError::SchemaNotFound {
            schema_name: schema_name.clone(),
            version,
        }
    })?;

    info!(
        validator = validator.name(),
        schema = %schema.display(),
        "Validating standard name library"
    );
    validator.validate(path, &schema)
}
