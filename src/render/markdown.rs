//! Markdown rendering with a linked table of contents.
//!
//! Sections become headings (`##` for top level, one more `#` per nesting
//! level) and entries become bullets, visited in document order so nested
//! sections appear exactly where they sit among their siblings.

use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{RenderError, Renderer, PARAGRAPH_BREAK};
use crate::domain::{Catalog, Entry, Node, Section};

/// Anything a heading anchor cannot contain
static DROPPED_LINK_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z_-]").expect("valid link character regex"));

/// Markdown output
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, catalog: &Catalog) -> Result<String, RenderError> {
        render_markdown(catalog)
    }
}

/// Anchor a Markdown viewer generates for a heading with this text
pub fn link(text: &str) -> String {
    let link = text.trim().to_lowercase().replace(' ', "-");
    DROPPED_LINK_CHARS_RE.replace_all(&link, "").into_owned()
}

/// Render the catalog as a Markdown document
pub fn render_markdown(catalog: &Catalog) -> Result<String, RenderError> {
    let mut out = String::new();

    writeln!(out, "# {}", catalog.name())?;
    writeln!(out, "#### Table of Contents")?;
    for section in catalog.sections() {
        writeln!(out, "* [{}](#{})", section.name(), link(section.name()))?;
    }
    writeln!(out)?;

    for section in catalog.sections() {
        write_section(&mut out, section, 2)?;
    }

    Ok(out)
}

fn write_section(out: &mut String, section: &Section, level: usize) -> Result<(), RenderError> {
    writeln!(out, "{} {}", "#".repeat(level), section.name())?;

    if let Some(comment) = section.comment() {
        for line in comment_lines(comment) {
            writeln!(out, "{}", line)?;
        }
    }

    for node in section.children() {
        match node {
            Node::Section(subsection) => write_section(out, subsection, level + 1)?,
            Node::Entry(entry) => write_entry(out, entry)?,
        }
    }

    Ok(())
}

fn write_entry(out: &mut String, entry: &Entry) -> Result<(), RenderError> {
    let description = entry.resolved_description()?;
    writeln!(out, "* `{}`: {}", entry.name().unwrap_or_default(), description)?;

    if let Some(descriptor) = entry.type_descriptor()? {
        let kind = descriptor
            .kind
            .as_deref()
            .map(|kind| format!("(kind={})", kind))
            .unwrap_or_default();
        writeln!(
            out,
            "    * `{}{}`: units = {}",
            descriptor.type_name,
            kind,
            descriptor.units.as_deref().unwrap_or_default()
        )?;
    }

    Ok(())
}

/// Split a comment into output lines.
///
/// Runs of spaces collapse to one; the literal `\n` marker separates lines.
fn comment_lines(comment: &str) -> Vec<String> {
    collapse_spaces(comment)
        .split(PARAGRAPH_BREAK)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_space = false;
    for c in text.chars() {
        if c == ' ' && previous_space {
            continue;
        }
        previous_space = c == ' ';
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryProperty, TypeDescriptor};

    #[test]
    fn test_link_rule() {
        assert_eq!(link(" My Section Name! "), "my-section-name");
        assert_eq!(link("State_Variables"), "state_variables");
        assert_eq!(link("GFS 2.0 physics"), "gfs--physics");
    }

    #[test]
    fn test_entry_with_synthesized_description_and_type() {
        let catalog = Catalog::new("lib").with_section(
            Section::new("s").with_entry(
                Entry::new("bar").with_type(
                    TypeDescriptor::new("real")
                        .with_kind("8")
                        .with_units("1"),
                ),
            ),
        );

        let md = render_markdown(&catalog).unwrap();
        assert!(md.contains("* `bar`: Bar\n    * `real(kind=8)`: units = 1\n"));
    }

    #[test]
    fn test_full_document_layout() {
        let catalog = Catalog::new("Test Library")
            .with_section(
                Section::new("State Variables")
                    .with_comment("First line.   Still first.\\nSecond line.\\n  ")
                    .with_entry(Entry::new("air_temperature").with_description("Air temp"))
                    .with_section(
                        Section::new("Nested")
                            .with_entry(Entry::new("x_0p5").with_type(TypeDescriptor::new("integer").with_units("count")))
                            .with_section(
                                Section::new("Deeper").with_section(
                                    Section::new("Deepest").with_entry(Entry::new("bottom")),
                                ),
                            ),
                    )
                    .with_entry(Entry::new("after_nested")),
            )
            .with_section(Section::new("Other"));

        let md = render_markdown(&catalog).unwrap();
        let expected = "\
# Test Library
#### Table of Contents
* [State Variables](#state-variables)
* [Other](#other)

## State Variables
First line. Still first.
Second line.
* `air_temperature`: Air temp
### Nested
* `x_0p5`: X 0.5
    * `integer`: units = count
#### Deeper
##### Deepest
* `bottom`: Bottom
* `after_nested`: After nested
## Other
";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_entry_without_type_has_no_sub_bullet() {
        let catalog =
            Catalog::new("lib").with_section(Section::new("s").with_entry(Entry::new("plain")));
        let md = render_markdown(&catalog).unwrap();
        assert!(md.ends_with("## s\n* `plain`: Plain\n"));
    }

    #[test]
    fn test_unknown_property_aborts() {
        let catalog = Catalog::new("lib").with_section(Section::new("s").with_entry(
            Entry::new("x").with_property(EntryProperty::Unknown {
                tag: "dims".to_string(),
                attributes: Vec::new(),
            }),
        ));

        let result = render_markdown(&catalog);
        assert!(matches!(result, Err(RenderError::MalformedEntry(_))));
    }

    #[test]
    fn test_nameless_entry_aborts() {
        let catalog =
            Catalog::new("lib").with_section(Section::new("s").with_entry(Entry::unnamed()));
        let result = render_markdown(&catalog);
        assert!(matches!(result, Err(RenderError::Description(_))));
    }

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_spaces("a    b  c d"), "a b c d");
    }
}
