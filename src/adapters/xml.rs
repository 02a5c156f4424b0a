//! Reading and writing standard-name library XML.
//!
//! The expected shape is a root element (conventionally `standard_names`)
//! holding `section` elements, which in turn hold `standard_name` entries
//! and nested `section`s. Entries carry an optional `type` child.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::attributes::{AttrError, Attribute};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    Catalog, Entry, EntryProperty, Node, Section, SourceLocation, TypeDescriptor,
};

const SECTION_TAG: &str = "section";
const ENTRY_TAG: &str = "standard_name";
const TYPE_TAG: &str = "type";

/// Errors reading or writing library files
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}:{line}: {kind}")]
    Parse {
        origin: String,
        line: usize,
        kind: ParseErrorKind,
    },

    #[error("Failed to serialize catalog: {0}")]
    Write(#[from] quick_xml::Error),
}

/// What went wrong while parsing
#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("{0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("{0}")]
    Attribute(#[from] AttrError),

    #[error("unexpected element <{tag}> inside <{parent}>")]
    UnexpectedElement { tag: String, parent: String },

    #[error("document has no root element")]
    MissingRoot,

    #[error("unexpected end of document")]
    UnexpectedEof,
}

/// Read and parse a library file
pub fn read_catalog(path: &Path) -> Result<Catalog, XmlError> {
    let source = fs::read_to_string(path).map_err(|source| XmlError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let catalog = parse_catalog(&source, &path.display().to_string())?;
    debug!(
        path = %path.display(),
        sections = catalog.sections().len(),
        entries = catalog.entry_count(),
        "Read standard name library"
    );
    Ok(catalog)
}

/// Parse library XML. `origin` names the source in locations and errors.
pub fn parse_catalog(source: &str, origin: &str) -> Result<Catalog, XmlError> {
    Parser::new(source, origin).parse_document()
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
    origin: &'a str,

    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, origin: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.trim_text(true);
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            reader,
            origin,
            line_starts,
        }
    }

    /// Line of the reader's current position
    fn line(&self) -> usize {
        let pos = self.reader.buffer_position();
        // Number of lines starting at or before `pos`
        self.line_starts.partition_point(|&start| start <= pos)
    }

    fn fail(&self, kind: impl Into<ParseErrorKind>) -> XmlError {
        XmlError::Parse {
            origin: self.origin.to_string(),
            line: self.line(),
            kind: kind.into(),
        }
    }

    fn unexpected(&self, start: &BytesStart, parent: &str) -> XmlError {
        self.fail(ParseErrorKind::UnexpectedElement {
            tag: tag_name(start),
            parent: parent.to_string(),
        })
    }

    fn next_event(&mut self) -> Result<Event<'a>, XmlError> {
        self.reader.read_event().map_err(|e| self.fail(e))
    }

    fn attributes(&self, start: &BytesStart) -> Result<Vec<(String, String)>, XmlError> {
        let mut out = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.fail(e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = self
                .reader
                .decoder()
                .decode(&attr.value)
                .map_err(|e| self.fail(e))?;
            // Normalize before unescaping so character references survive
            let value = unescape(&normalize_attribute(&raw))
                .map_err(|e| self.fail(quick_xml::Error::from(e)))?
                .into_owned();
            out.push((key, value));
        }
        Ok(out)
    }

    fn parse_document(&mut self) -> Result<Catalog, XmlError> {
        loop {
            match self.next_event()? {
                Event::Start(start) => {
                    let mut catalog = self.root(&start)?;
                    self.root_children(&mut catalog)?;
                    return Ok(catalog);
                }
                Event::Empty(start) => return self.root(&start),
                Event::Eof => return Err(self.fail(ParseErrorKind::MissingRoot)),
                _ => {}
            }
        }
    }

    fn root(&self, start: &BytesStart) -> Result<Catalog, XmlError> {
        let mut catalog = Catalog::new("");
        catalog.root_tag = tag_name(start);
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "name" => catalog.name = value,
                "version" => catalog.version = Some(value),
                _ => catalog.attributes.push((key, value)),
            }
        }
        Ok(catalog)
    }

    fn root_children(&mut self, catalog: &mut Catalog) -> Result<(), XmlError> {
        loop {
            let (start, empty) = match self.next_event()? {
                Event::Start(start) => (start, false),
                Event::Empty(start) => (start, true),
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.fail(ParseErrorKind::UnexpectedEof)),
                _ => continue,
            };

            if start.name().as_ref() != SECTION_TAG.as_bytes() {
                return Err(self.unexpected(&start, &catalog.root_tag));
            }
            let section = self.section(&start, empty)?;
            catalog.sections.push(section);
        }
    }

    fn section(&mut self, start: &BytesStart, empty: bool) -> Result<Section, XmlError> {
        let mut section = Section::new("");
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "name" => section.name = value,
                "comment" => section.comment = Some(value),
                _ => {}
            }
        }
        if empty {
            return Ok(section);
        }

        loop {
            let (child, child_empty) = match self.next_event()? {
                Event::Start(child) => (child, false),
                Event::Empty(child) => (child, true),
                Event::End(_) => return Ok(section),
                Event::Eof => return Err(self.fail(ParseErrorKind::UnexpectedEof)),
                _ => continue,
            };

            let node = match child.name().as_ref() {
                b"section" => Node::Section(self.section(&child, child_empty)?),
                b"standard_name" => Node::Entry(self.entry(&child, child_empty)?),
                _ => return Err(self.unexpected(&child, SECTION_TAG)),
            };
            section.children.push(node);
        }
    }

    fn entry(&mut self, start: &BytesStart, empty: bool) -> Result<Entry, XmlError> {
        let mut entry =
            Entry::unnamed().with_location(SourceLocation::new(self.origin, self.line()));
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "name" => entry.name = Some(value),
                "description" => entry.description = Some(value),
                _ => entry.attributes.push((key, value)),
            }
        }
        if empty {
            return Ok(entry);
        }

        loop {
            let (child, child_empty) = match self.next_event()? {
                Event::Start(child) => (child, false),
                Event::Empty(child) => (child, true),
                Event::End(_) => return Ok(entry),
                Event::Eof => return Err(self.fail(ParseErrorKind::UnexpectedEof)),
                _ => continue,
            };

            let property = if child.name().as_ref() == TYPE_TAG.as_bytes() {
                EntryProperty::Type(self.type_descriptor(&child, child_empty)?)
            } else {
                // Kept so rendering can reject it; its content is skipped
                let attributes = self.attributes(&child)?;
                if !child_empty {
                    self.reader
                        .read_to_end(child.name())
                        .map_err(|e| self.fail(e))?;
                }
                EntryProperty::Unknown {
                    tag: tag_name(&child),
                    attributes,
                }
            };
            entry.properties.push(property);
        }
    }

    fn type_descriptor(
        &mut self,
        start: &BytesStart,
        empty: bool,
    ) -> Result<TypeDescriptor, XmlError> {
        let mut descriptor = TypeDescriptor::new("");
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "kind" => descriptor.kind = Some(value),
                "units" => descriptor.units = Some(value),
                _ => {}
            }
        }
        if empty {
            return Ok(descriptor);
        }

        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Text(t) => text.push_str(&t.unescape().map_err(|e| self.fail(e))?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
                Event::End(_) => break,
                Event::Start(child) | Event::Empty(child) => {
                    return Err(self.unexpected(&child, TYPE_TAG))
                }
                Event::Eof => return Err(self.fail(ParseErrorKind::UnexpectedEof)),
                _ => {}
            }
        }
        descriptor.type_name = text.trim().to_string();
        Ok(descriptor)
    }
}

fn tag_name(start: &BytesStart) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

/// XML attribute-value normalization: literal line breaks and tabs become spaces
fn normalize_attribute(value: &str) -> String {
    value.replace(|c: char| matches!(c, '\n' | '\r' | '\t'), " ")
}

/// Escape an attribute value, keeping line breaks and tabs as character references
fn attribute<'a>(key: &'a str, value: &str) -> Attribute<'a> {
    let escaped = escape(value)
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;");
    Attribute {
        key: QName(key.as_bytes()),
        value: escaped.into_bytes().into(),
    }
}

/// Serialize a catalog back to library XML
pub fn catalog_to_xml(catalog: &Catalog) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new(catalog.root_tag.as_str());
    root.push_attribute(attribute("name", catalog.name.as_str()));
    if let Some(version) = &catalog.version {
        root.push_attribute(attribute("version", version.as_str()));
    }
    for (key, value) in &catalog.attributes {
        root.push_attribute(attribute(key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(root))?;

    for section in catalog.sections() {
        write_section(&mut writer, section)?;
    }

    writer.write_event(Event::End(BytesEnd::new(catalog.root_tag.as_str())))?;

    let mut xml = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    xml.push('\n');
    Ok(xml)
}

fn write_section(writer: &mut Writer<Vec<u8>>, section: &Section) -> Result<(), XmlError> {
    let mut start = BytesStart::new(SECTION_TAG);
    start.push_attribute(attribute("name", section.name()));
    if let Some(comment) = section.comment() {
        start.push_attribute(attribute("comment", comment));
    }

    if section.children().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for node in section.children() {
        match node {
            Node::Section(subsection) => write_section(writer, subsection)?,
            Node::Entry(entry) => write_entry(writer, entry)?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(SECTION_TAG)))?;
    Ok(())
}

fn write_entry(writer: &mut Writer<Vec<u8>>, entry: &Entry) -> Result<(), XmlError> {
    let mut start = BytesStart::new(ENTRY_TAG);
    if let Some(name) = entry.name() {
        start.push_attribute(attribute("name", name));
    }
    if let Some(description) = entry.description() {
        start.push_attribute(attribute("description", description));
    }
    for (key, value) in &entry.attributes {
        start.push_attribute(attribute(key.as_str(), value.as_str()));
    }

    if entry.properties.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for property in &entry.properties {
        match property {
            EntryProperty::Type(descriptor) => write_type(writer, descriptor)?,
            EntryProperty::Unknown { tag, attributes } => {
                let mut element = BytesStart::new(tag.as_str());
                for (key, value) in attributes {
                    element.push_attribute(attribute(key.as_str(), value.as_str()));
                }
                writer.write_event(Event::Empty(element))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(ENTRY_TAG)))?;
    Ok(())
}

fn write_type(writer: &mut Writer<Vec<u8>>, descriptor: &TypeDescriptor) -> Result<(), XmlError> {
    let mut start = BytesStart::new(TYPE_TAG);
    if let Some(kind) = &descriptor.kind {
        start.push_attribute(attribute("kind", kind.as_str()));
    }
    if let Some(units) = &descriptor.units {
        start.push_attribute(attribute("units", units.as_str()));
    }

    if descriptor.type_name.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(&descriptor.type_name)))?;
    writer.write_event(Event::End(BytesEnd::new(TYPE_TAG)))?;
    Ok(())
}

/// Overwrite `path` with the serialized catalog.
///
/// Holds an exclusive lock on the file while writing.
pub fn write_catalog(catalog: &Catalog, path: &Path) -> Result<(), XmlError> {
    let xml = catalog_to_xml(catalog)?;
    let io_err = |source: std::io::Error| XmlError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(io_err)?;

    file.lock_exclusive().map_err(io_err)?;
    file.set_len(0).map_err(io_err)?;
    file.write_all(xml.as_bytes()).map_err(io_err)?;
    file.flush().map_err(io_err)?;

    // Lock is released when file is dropped
    debug!(path = %path.display(), bytes = xml.len(), "Wrote standard name library");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<?xml-stylesheet type="text/xsl" href="standard_names.xsl"?>
<standard_names name="Test Names" version="1.0">
  <section name="State">
    <standard_name name="air_temperature" description="Temperature of air">
      <type kind="kind_phys" units="K">real</type>
    </standard_name>
    <section name="Nested" comment="A   nested\nsection"/>
    <standard_name name="horizontal_loop_extent">
      <type units="count">integer</type>
    </standard_name>
  </section>
</standard_names>
"#;

    #[test]
    fn test_parse_sample() {
        let catalog = parse_catalog(SAMPLE, "names.xml").unwrap();
        assert_eq!(catalog.name(), "Test Names");
        assert_eq!(catalog.version.as_deref(), Some("1.0"));
        assert_eq!(catalog.root_tag, "standard_names");

        let state = &catalog.sections()[0];
        assert_eq!(state.children().len(), 3);
        assert!(matches!(state.children()[1], Node::Section(_)));

        let first = state.entries().next().unwrap();
        assert_eq!(first.name(), Some("air_temperature"));
        assert_eq!(first.description(), Some("Temperature of air"));
        let descriptor = first.type_descriptor().unwrap().unwrap();
        assert_eq!(descriptor.type_name, "real");
        assert_eq!(descriptor.kind.as_deref(), Some("kind_phys"));
        assert_eq!(descriptor.units.as_deref(), Some("K"));
        assert_eq!(first.location.as_ref().unwrap().line, 5);

        let nested = state.subsections().next().unwrap();
        assert_eq!(nested.comment(), Some("A   nested\\nsection"));
    }

    #[test]
    fn test_unknown_entry_child_is_kept() {
        let xml = r#"<standard_names name="x">
  <section name="s">
    <standard_name name="a"><dimensions><dim>n</dim></dimensions></standard_name>
  </section>
</standard_names>"#;

        let catalog = parse_catalog(xml, "x.xml").unwrap();
        let entry = catalog.sections()[0].entries().next().unwrap();
        assert!(matches!(
            &entry.properties[0],
            EntryProperty::Unknown { tag, .. } if tag == "dimensions"
        ));
    }

    #[test]
    fn test_unexpected_element_in_section() {
        let xml = r#"<standard_names name="x"><section name="s"><bogus/></section></standard_names>"#;
        let err = parse_catalog(xml, "x.xml").unwrap_err();
        assert!(matches!(
            err,
            XmlError::Parse {
                kind: ParseErrorKind::UnexpectedElement { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let xml = r#"<standard_names name="x"><section name="s"></standard_names>"#;
        assert!(parse_catalog(xml, "x.xml").is_err());
        assert!(parse_catalog("", "x.xml").is_err());
    }

    #[test]
    fn test_attribute_newlines_normalized() {
        let xml = "<standard_names name=\"x\"><section name=\"s\" comment=\"one\ntwo\"/></standard_names>";
        let catalog = parse_catalog(xml, "x.xml").unwrap();
        assert_eq!(catalog.sections()[0].comment(), Some("one two"));
    }

    #[test]
    fn test_character_reference_newline_kept() {
        let xml = r#"<standard_names name="x"><section name="s" comment="one&#10;two &amp; three"/></standard_names>"#;
        let catalog = parse_catalog(xml, "x.xml").unwrap();
        assert_eq!(catalog.sections()[0].comment(), Some("one\ntwo & three"));

        // Written back as a reference, so the line break survives a rewrite
        let xml = catalog_to_xml(&catalog).unwrap();
        assert!(xml.contains("comment=\"one&#10;two &amp; three\""));
        let reparsed = parse_catalog(&xml, "x.xml").unwrap();
        assert_eq!(reparsed.sections()[0].comment(), Some("one\ntwo & three"));
    }

    #[test]
    fn test_line_of_last_entry_in_large_library() {
        let count = 20_000;
        let mut xml = String::from("<standard_names name=\"big\" version=\"1.0\">\n<section name=\"s\">\n");
        for i in 0..count {
            xml.push_str(&format!(
                "<standard_name name=\"name_{i}\">\n<type units=\"1\">real</type>\n</standard_name>\n"
            ));
        }
        xml.push_str("</section>\n</standard_names>\n");

        let catalog = parse_catalog(&xml, "big.xml").unwrap();
        let entries = catalog.walk_entries();
        assert_eq!(entries.len(), count);

        // Two header lines, then three lines per entry
        assert_eq!(entries[0].location.as_ref().unwrap().line, 3);
        let last = entries[count - 1];
        assert_eq!(last.name(), Some(format!("name_{}", count - 1).as_str()));
        assert_eq!(last.location.as_ref().unwrap().line, 3 + 3 * (count - 1));
    }

    #[test]
    fn test_serialize_then_parse_preserves_tree() {
        let catalog = parse_catalog(SAMPLE, "names.xml").unwrap();
        let xml = catalog_to_xml(&catalog).unwrap();
        let reparsed = parse_catalog(&xml, "names.xml").unwrap();

        assert_eq!(reparsed.name, catalog.name);
        assert_eq!(reparsed.version, catalog.version);
        assert_eq!(reparsed.entry_count(), catalog.entry_count());
        let names: Vec<_> = reparsed.walk_entries().into_iter().filter_map(Entry::name).collect();
        assert_eq!(names, vec!["air_temperature", "horizontal_loop_extent"]);
        assert_eq!(
            reparsed.sections()[0].subsections().next().unwrap().comment(),
            Some("A   nested\\nsection")
        );
    }
}
