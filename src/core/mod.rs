//! Core algorithms over the catalog tree.
//!
//! This module contains:
//! - Description: default descriptions synthesized from standard names
//! - Duplicates: first-occurrence-wins duplicate scanning and removal

pub mod description;
pub mod duplicates;

// Re-export commonly used types
pub use description::{describe, synthesize, NameSource, NoNameToDescribeError};
pub use duplicates::{
    find_duplicates, remove_duplicates, DuplicateReport, DuplicateScan, DEFAULT_KEY_FIELD,
};
