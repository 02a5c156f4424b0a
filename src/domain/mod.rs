//! Domain types for standard-name libraries.
//!
//! This module contains the tree model:
//! - Catalog: the library root
//! - Section / Node: named groupings, children kept in document order
//! - Entry / TypeDescriptor: individual standard names

pub mod catalog;

// Re-export commonly used types
pub use catalog::{
    Catalog, Entry, EntryProperty, MalformedEntryError, Node, Section, SourceLocation,
    TypeDescriptor, DEFAULT_ROOT_TAG,
};
