//! YAML rendering.
//!
//! Unlike the Markdown renderer this groups each section's direct entries
//! ahead of its subsections, whatever their order in the source. Entries
//! without a type descriptor are left out.

use std::fmt;

use serde::Serialize;

use super::{RenderError, Renderer, PARAGRAPH_BREAK};
use crate::domain::{Catalog, Entry, Section};

/// YAML output
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlRenderer;

impl Renderer for YamlRenderer {
    fn extension(&self) -> &'static str {
        "yaml"
    }

    fn render(&self, catalog: &Catalog) -> Result<String, RenderError> {
        let library = build_yaml(catalog)?;
        Ok(serde_yaml::to_string(&library)?)
    }
}

/// Document root. Field order is the key order in the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YamlLibrary {
    pub library_name: String,
    pub section: Vec<YamlSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YamlSection {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub standard_names: Vec<YamlStandardName>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub section: Vec<YamlSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YamlStandardName {
    pub name: String,
    pub description: String,

    #[serde(rename = "type")]
    pub type_name: String,

    pub kind: Option<String>,
    pub units: Option<Units>,
}

/// A `units` value, numeric when the attribute parses as an integer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Units {
    Integer(i64),
    Text(String),
}

impl Units {
    /// Integer if `raw` is one, otherwise the original text
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<i64>()
            .map(Units::Integer)
            .unwrap_or_else(|_| Units::Text(raw.to_string()))
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Integer(value) => write!(f, "{}", value),
            Units::Text(text) => f.write_str(text),
        }
    }
}

/// Build the YAML document structure for a catalog
pub fn build_yaml(catalog: &Catalog) -> Result<YamlLibrary, RenderError> {
    Ok(YamlLibrary {
        library_name: catalog.name().to_string(),
        section: catalog
            .sections()
            .iter()
            .map(build_section)
            .collect::<Result<_, _>>()?,
    })
}

fn build_section(section: &Section) -> Result<YamlSection, RenderError> {
    let mut standard_names = Vec::new();
    for entry in section.entries() {
        if let Some(name) = build_standard_name(entry)? {
            standard_names.push(name);
        }
    }

    Ok(YamlSection {
        name: section.name().to_string(),
        comment: section
            .comment()
            .filter(|comment| !comment.is_empty())
            .map(flatten_comment),
        standard_names,
        section: section
            .subsections()
            .map(build_section)
            .collect::<Result<_, _>>()?,
    })
}

fn build_standard_name(entry: &Entry) -> Result<Option<YamlStandardName>, RenderError> {
    let Some(descriptor) = entry.type_descriptor()? else {
        return Ok(None);
    };

    Ok(Some(YamlStandardName {
        name: entry.name().unwrap_or_default().to_string(),
        description: entry.resolved_description()?.into_owned(),
        type_name: descriptor.type_name.clone(),
        kind: descriptor.kind.clone(),
        units: descriptor.units.as_deref().map(Units::parse),
    }))
}

/// Collapse a comment onto one line.
///
/// Code fences are dropped and every line is whitespace-normalized.
fn flatten_comment(comment: &str) -> String {
    comment
        .replace("```", "")
        .split(PARAGRAPH_BREAK)
        .flat_map(|paragraph| paragraph.lines())
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
