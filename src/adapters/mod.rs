//! Interfaces to the outside world.
//!
//! Adapters turn library files into catalog trees and back, and check
//! library files against their XSD schema using an external validator.

pub mod schema;
pub mod xml;

pub use schema::{
    find_schema_file, find_schema_version, validate_source, SchemaError, SchemaValidator,
    SchemaVersion, XmllintValidator,
};
pub use xml::{catalog_to_xml, parse_catalog, read_catalog, write_catalog, ParseErrorKind, XmlError};
