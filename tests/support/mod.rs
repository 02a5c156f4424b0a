//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};

use stdnames::adapters::{SchemaError, SchemaValidator};
use tempfile::TempDir;

pub const LIBRARY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<standard_names name="Test Standard Names" version="1.0">
  <section name="Dimensions" comment="Dimension names.\n  Used   for array extents.">
    <standard_name name="horizontal_dimension">
      <type units="count">integer</type>
    </standard_name>
    <standard_name name="vertical_layer_dimension">
      <type units="count">integer</type>
    </standard_name>
    <standard_name name="horizontal_dimension" description="Duplicate of the first">
      <type units="count">integer</type>
    </standard_name>
  </section>
  <section name="State Variables">
    <standard_name name="air_temperature" long_name="T">
      <type kind="kind_phys" units="K">real</type>
    </standard_name>
    <section name="Clouds">
      <standard_name name="cloud_optical_depth_layers_from_0p55mu_to_0p99mu">
        <type kind="kind_phys" units="1">real</type>
      </standard_name>
      <standard_name name="horizontal_dimension">
        <type units="count">integer</type>
      </standard_name>
    </section>
    <standard_name name="surface_air_temperature" long_name="T">
      <type kind="kind_phys" units="K">real</type>
    </standard_name>
  </section>
</standard_names>
"#;

/// Write `contents` as `standard_names.xml` in a fresh temp dir
pub fn library_file(contents: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("standard_names.xml");
    std::fs::write(&path, contents).unwrap();
    (temp, path)
}

/// Validator that accepts or rejects everything and counts calls
pub struct FakeValidator {
    pub accept: bool,
    pub calls: Cell<usize>,
}

impl FakeValidator {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            calls: Cell::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            calls: Cell::new(0),
        }
    }
}

impl SchemaValidator for FakeValidator {
    fn name(&self) -> &str {
        "fake"
    }

    fn validate(&self, document: &Path, _schema: &Path) -> Result<(), SchemaError> {
        self.calls.set(self.calls.get() + 1);
        if self.accept {
            Ok(())
        } else {
            Err(SchemaError::Invalid {
                path: document.to_path_buf(),
                detail: Some("element section: Schemas validity error".to_string()),
            })
        }
    }
}

/// Write an empty schema file next to `library` so schema lookup succeeds
pub fn schema_beside(library: &Path) {
    let dir = library.parent().unwrap();
    std::fs::write(dir.join("standard_names_v1_0.xsd"), "<xs:schema/>").unwrap();
}
