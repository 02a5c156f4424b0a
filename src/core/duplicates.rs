//! Duplicate detection and removal.
//!
//! Entries are scanned depth-first in document order. The first entry
//! carrying a given key value is the survivor; every later entry with the
//! same value is a duplicate. Entries that lack the key field are skipped.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::domain::{Catalog, Node, Section};

/// Field compared when no other is requested
pub const DEFAULT_KEY_FIELD: &str = "name";

/// Result of scanning a catalog for repeated key values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateScan {
    /// Each distinct value, at the position of its first occurrence
    pub unique: Vec<String>,

    /// Every non-first occurrence, in document order
    pub duplicates: Vec<String>,

    /// Entries skipped because they lack the key field
    pub missing_key: usize,
}

impl DuplicateScan {
    /// Whether any value occurs more than once
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Scan a catalog for entries sharing the same `key_field` value
pub fn find_duplicates(catalog: &Catalog, key_field: &str) -> DuplicateScan {
    let mut seen = HashSet::new();
    let mut scan = DuplicateScan::default();

    for entry in catalog.walk_entries() {
        let Some(value) = entry.field(key_field) else {
            warn!(
                field = key_field,
                entry = entry.name().unwrap_or("<unnamed>"),
                "Standard name has no key field, skipping"
            );
            scan.missing_key += 1;
            continue;
        };

        if seen.insert(value) {
            scan.unique.push(value.to_string());
        } else {
            scan.duplicates.push(value.to_string());
        }
    }

    debug!(
        unique = scan.unique.len(),
        duplicates = scan.duplicates.len(),
        "Duplicate scan complete"
    );
    scan
}

/// Remove every entry whose `key_field` value already occurred earlier.
///
/// Each section's child list is rebuilt rather than edited in place.
/// Entries without the key field are kept.
pub fn remove_duplicates<'a>(catalog: &'a mut Catalog, key_field: &str) -> &'a mut Catalog {
    let mut seen = HashSet::new();
    let mut removed = 0;

    for section in &mut catalog.sections {
        retain_first_occurrences(section, key_field, &mut seen, &mut removed);
    }

    info!(removed, field = key_field, "Removed duplicate standard names");
    catalog
}

fn retain_first_occurrences(
    section: &mut Section,
    key_field: &str,
    seen: &mut HashSet<String>,
    removed: &mut usize,
) {
    let children = std::mem::take(&mut section.children);
    let mut kept = Vec::with_capacity(children.len());

    for node in children {
        match node {
            Node::Entry(entry) => {
                if let Some(value) = entry.field(key_field) {
                    if !seen.insert(value.to_string()) {
                        debug!(section = %section.name, value, "Dropping duplicate");
                        *removed += 1;
                        continue;
                    }
                }
                kept.push(Node::Entry(entry));
            }
            Node::Section(mut subsection) => {
                retain_first_occurrences(&mut subsection, key_field, seen, removed);
                kept.push(Node::Section(subsection));
            }
        }
    }

    section.children = kept;
}

/// Per-value summary of a scan, as printed by the `check-unique` tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReport {
    /// The key field that was compared
    pub field: String,

    /// Duplicated values with the number of entries that would be removed
    pub entries: Vec<(String, usize)>,
}

impl DuplicateReport {
    /// Group a scan's duplicates by value, in order of first duplication
    pub fn from_scan(scan: &DuplicateScan, field: &str) -> Self {
        let mut entries: Vec<(String, usize)> = Vec::new();
        for value in &scan.duplicates {
            match entries.iter_mut().find(|(v, _)| v == value) {
                Some((_, count)) => *count += 1,
                None => entries.push((value.clone(), 1)),
            }
        }

        Self {
            field: field.to_string(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries removed across all values
    pub fn total_removed(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

impl fmt::Display for DuplicateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "No duplicate {}s were found.", self.field);
        }

        write!(f, "The following duplicate {} entries were found:", self.field)?;
        for (value, count) in &self.entries {
            write!(f, "\n{}, ({} duplicate(s))", value, count)?;
        }
        Ok(())
    }
}
