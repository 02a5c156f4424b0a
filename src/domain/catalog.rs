//! In-memory tree of a standard-name library.
//!
//! A `Catalog` owns an ordered list of top-level `Section`s. Each section
//! holds its children as `Node`s so that the interleaving of entries and
//! subsections in the source document survives parsing. Nothing in here
//! mutates the tree except the duplicate resolver, which rebuilds a
//! section's child list.

use std::fmt;

use thiserror::Error;

/// Root element tag used when a catalog is built in code rather than parsed
pub const DEFAULT_ROOT_TAG: &str = "standard_names";

/// An entry child element the model does not recognize
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown standard name property, '{tag}'")]
pub struct MalformedEntryError {
    /// Tag of the offending child element
    pub tag: String,

    /// Name of the entry that contained it (if it had one)
    pub entry: Option<String>,
}

/// Location of a node in its source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// File path or other identifier of the source
    pub origin: String,

    /// 1-based line number
    pub line: usize,
}

impl SourceLocation {
    pub fn new(origin: impl Into<String>, line: usize) -> Self {
        Self {
            origin: origin.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin, self.line)
    }
}

/// A standard-name library
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// Library name (the root `name` attribute)
    pub name: String,

    /// Schema version string (the root `version` attribute)
    pub version: Option<String>,

    /// Tag of the root element, kept for round-tripping
    pub root_tag: String,

    /// Any other root attributes, in source order
    pub attributes: Vec<(String, String)>,

    /// Top-level sections
    pub sections: Vec<Section>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            root_tag: DEFAULT_ROOT_TAG.to_string(),
            attributes: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Set the schema version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Append a top-level section
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Library name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level sections in document order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Every entry in the tree, depth-first in document order
    pub fn walk_entries(&self) -> Vec<&Entry> {
        let mut out = Vec::new();
        for section in &self.sections {
            section.collect_entries(&mut out);
        }
        out
    }

    /// Total number of entries anywhere in the tree
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(Section::entry_count).sum()
    }
}

/// A named grouping of entries and nested sections
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,

    /// Free text; may contain literal `\n` paragraph markers
    pub comment: Option<String>,

    /// Entries and subsections, interleaved as in the source
    pub children: Vec<Node>,
}

/// A child of a section
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Section(Section),
    Entry(Entry),
}

impl Section {
    /// Create an empty section
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            children: Vec::new(),
        }
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Append an entry after the existing children
    pub fn with_entry(mut self, entry: Entry) -> Self {
        self.children.push(Node::Entry(entry));
        self
    }

    /// Append a subsection after the existing children
    pub fn with_section(mut self, section: Section) -> Self {
        self.children.push(Node::Section(section));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// All children in document order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct-child entries in order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.children.iter().filter_map(|node| match node {
            Node::Entry(entry) => Some(entry),
            Node::Section(_) => None,
        })
    }

    /// Direct-child subsections in order
    pub fn subsections(&self) -> impl Iterator<Item = &Section> {
        self.children.iter().filter_map(|node| match node {
            Node::Section(section) => Some(section),
            Node::Entry(_) => None,
        })
    }

    /// Number of entries in this section and below
    pub fn entry_count(&self) -> usize {
        self.children
            .iter()
            .map(|node| match node {
                Node::Entry(_) => 1,
                Node::Section(section) => section.entry_count(),
            })
            .sum()
    }

    fn collect_entries<'a>(&'a self, out: &mut Vec<&'a Entry>) {
        for node in &self.children {
            match node {
                Node::Entry(entry) => out.push(entry),
                Node::Section(section) => section.collect_entries(out),
            }
        }
    }
}

/// A single standard name
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The standard name itself; the schema requires it, the model does not
    pub name: Option<String>,

    /// Human-readable description; synthesized from the name when absent
    pub description: Option<String>,

    /// Any other attributes, in source order
    pub attributes: Vec<(String, String)>,

    /// Child elements (normally a single `type`)
    pub properties: Vec<EntryProperty>,

    /// Where the entry was parsed from
    pub location: Option<SourceLocation>,
}

/// A child element of an entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryProperty {
    Type(TypeDescriptor),

    /// Any element other than `type`; rejected when rendered
    Unknown {
        tag: String,
        attributes: Vec<(String, String)>,
    },
}

impl Entry {
    /// Create an entry with the given standard name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::unnamed()
        }
    }

    /// Create an entry with no `name` attribute
    pub fn unnamed() -> Self {
        Self {
            name: None,
            description: None,
            attributes: Vec::new(),
            properties: Vec::new(),
            location: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a free-form attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Attach a type descriptor
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.properties.push(EntryProperty::Type(descriptor));
        self
    }

    /// Attach an arbitrary child property
    pub fn with_property(mut self, property: EntryProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Record the source location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Look up an attribute by name, including `name` and `description`
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "name" => self.name(),
            "description" => self.description(),
            _ => self
                .attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
        }
    }

    /// The entry's type descriptor, if any.
    ///
    /// Fails on the first child element that is not a `type`.
    pub fn type_descriptor(&self) -> Result<Option<&TypeDescriptor>, MalformedEntryError> {
        let mut found = None;
        for property in &self.properties {
            match property {
                EntryProperty::Type(descriptor) => {
                    if found.is_none() {
                        found = Some(descriptor);
                    }
                }
                EntryProperty::Unknown { tag, .. } => {
                    return Err(MalformedEntryError {
                        tag: tag.clone(),
                        entry: self.name.clone(),
                    });
                }
            }
        }
        Ok(found)
    }
}

/// The `type` element of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Element text: the storage type name (e.g. `real`, `integer`)
    pub type_name: String,

    pub kind: Option<String>,

    /// Raw `units` attribute
    pub units: Option<String>,
}

impl TypeDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            kind: None,
            units: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }
}
