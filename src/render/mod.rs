//! Renderers that turn a catalog into a document.
//!
//! Each output format implements [`Renderer`]. Adding a format means adding
//! an [`OutputFormat`] variant and its renderer; the model and the duplicate
//! logic are untouched.

pub mod markdown;
pub mod yaml;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::core::NoNameToDescribeError;
use crate::domain::{Catalog, MalformedEntryError};

pub use markdown::{link, render_markdown, MarkdownRenderer};
pub use yaml::{build_yaml, Units, YamlLibrary, YamlRenderer, YamlSection, YamlStandardName};

/// Two-character escape used inside section comments to mark a line break
pub const PARAGRAPH_BREAK: &str = "\\n";

/// Errors raised while rendering
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    MalformedEntry(#[from] MalformedEntryError),

    #[error(transparent)]
    Description(#[from] NoNameToDescribeError),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Formatting error: {0}")]
    Format(#[from] fmt::Error),
}

/// Requested output format is not one we can produce
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported output format, '{0}'")]
pub struct UnsupportedFormatError(pub String);

/// A document format a catalog can be rendered to
pub trait Renderer {
    /// File extension for documents in this format (without the dot)
    fn extension(&self) -> &'static str;

    /// Render the whole catalog
    fn render(&self, catalog: &Catalog) -> Result<String, RenderError>;
}

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Yaml,
}

impl OutputFormat {
    /// Selector string as accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Yaml => "yaml",
        }
    }

    /// The renderer producing this format
    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self {
            OutputFormat::Markdown => Box::new(MarkdownRenderer),
            OutputFormat::Yaml => Box::new(YamlRenderer),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UnsupportedFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md" => Ok(OutputFormat::Markdown),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(UnsupportedFormatError(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
