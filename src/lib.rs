//! stdnames - Tools for metadata standard-name libraries
//!
//! A standard-name library is an XML catalog of controlled metadata
//! identifiers (standard names) with a type, kind and units, grouped into
//! nested sections.
//!
//! # Architecture
//!
//! The library file is parsed once into an in-memory tree which is then
//! either:
//! - scanned for duplicate entries, which can be removed (first occurrence wins)
//!   and the file rewritten, or
//! - rendered to another format (Markdown with a linked table of contents, or YAML)
//!
//! # Modules
//!
//! - `adapters`: XML reading/writing and schema validation
//! - `core`: Description synthesis and duplicate resolution
//! - `domain`: Data structures (Catalog, Section, Entry)
//! - `render`: Markdown and YAML renderers
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Report duplicate standard names
//! stdnames check-unique standard_names.xml
//!
//! # Remove them and rewrite the file
//! stdnames check-unique standard_names.xml --overwrite
//!
//! # Render the library as Markdown
//! stdnames convert standard_names.xml --output-format md
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;

// Re-export main types at crate root for convenience
pub use crate::core::{find_duplicates, remove_duplicates, synthesize, DuplicateScan};
pub use domain::{Catalog, Entry, Node, Section, TypeDescriptor};
pub use render::{build_yaml, render_markdown, OutputFormat, Renderer};
