//! Duplicate Check Integration Tests
//!
//! Tests for the check-unique tool: reporting, exit outcomes, and rewriting
//! the library file without duplicates.

mod support;

use stdnames::adapters::read_catalog;
use stdnames::cli::{check_unique, CheckOutcome, Validation};
use stdnames::find_duplicates;
use support::{library_file, schema_beside, FakeValidator, LIBRARY};

#[test]
fn test_duplicates_reported_without_overwrite() {
    let (_temp, path) = library_file(LIBRARY);
    let mut out = Vec::new();

    let outcome = check_unique(&path, "name", false, None, &mut out).unwrap();
    assert_eq!(outcome, CheckOutcome::DuplicatesFound { duplicates: 2 });

    let report = String::from_utf8(out).unwrap();
    assert_eq!(
        report,
        "The following duplicate name entries were found:\nhorizontal_dimension, (2 duplicate(s))\n"
    );

    // File is left untouched
    assert_eq!(std::fs::read_to_string(&path).unwrap(), LIBRARY);
}

#[test]
fn test_overwrite_removes_all_but_first() {
    let (_temp, path) = library_file(LIBRARY);
    let mut out = Vec::new();

    let outcome = check_unique(&path, "name", true, None, &mut out).unwrap();
    assert_eq!(outcome, CheckOutcome::DuplicatesRemoved { removed: 2 });

    let report = String::from_utf8(out).unwrap();
    assert!(report.contains(&format!(
        "Removing duplicates and overwriting {}",
        path.display()
    )));

    let catalog = read_catalog(&path).unwrap();
    assert_eq!(catalog.entry_count(), 5);
    assert_eq!(catalog.version.as_deref(), Some("1.0"));

    let survivors: Vec<_> = catalog
        .walk_entries()
        .into_iter()
        .filter(|e| e.name() == Some("horizontal_dimension"))
        .collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].description(), None);

    // Nested section lost its duplicate but kept its other entry
    let clouds = catalog.sections()[1].subsections().next().unwrap();
    assert_eq!(clouds.entries().count(), 1);

    // Other attributes survive the rewrite
    let air = catalog
        .walk_entries()
        .into_iter()
        .find(|e| e.name() == Some("air_temperature"))
        .unwrap();
    assert_eq!(air.field("long_name"), Some("T"));
}

#[test]
fn test_second_run_finds_nothing() {
    let (_temp, path) = library_file(LIBRARY);
    check_unique(&path, "name", true, None, &mut Vec::new()).unwrap();

    let mut out = Vec::new();
    let outcome = check_unique(&path, "name", false, None, &mut out).unwrap();
    assert_eq!(outcome, CheckOutcome::NoDuplicates);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "No duplicate names were found.\n"
    );
}

#[test]
fn test_custom_field_skips_entries_without_it() {
    let (_temp, path) = library_file(LIBRARY);

    let catalog = read_catalog(&path).unwrap();
    let scan = find_duplicates(&catalog, "long_name");
    assert_eq!(scan.unique, vec!["T"]);
    assert_eq!(scan.duplicates, vec!["T"]);
    assert_eq!(scan.missing_key, 5);

    let outcome = check_unique(&path, "long_name", true, None, &mut Vec::new()).unwrap();
    assert_eq!(outcome, CheckOutcome::DuplicatesRemoved { removed: 1 });

    let catalog = read_catalog(&path).unwrap();
    assert!(catalog
        .walk_entries()
        .iter()
        .all(|e| e.name() != Some("surface_air_temperature")));
    // Entries lacking the field are never removed, even if their names repeat
    assert_eq!(catalog.entry_count(), 6);
}

#[test]
fn test_validation_runs_before_scan() {
    let (_temp, path) = library_file(LIBRARY);
    schema_beside(&path);
    let validator = FakeValidator::accepting();

    let validation = Validation {
        validator: &validator,
        schema_dir: None,
    };
    let outcome = check_unique(&path, "name", false, Some(validation), &mut Vec::new()).unwrap();
    assert_eq!(validator.calls.get(), 1);
    assert!(matches!(outcome, CheckOutcome::DuplicatesFound { .. }));
}

#[test]
fn test_invalid_file_is_not_rewritten() {
    let (_temp, path) = library_file(LIBRARY);
    schema_beside(&path);
    let validator = FakeValidator::rejecting();

    let validation = Validation {
        validator: &validator,
        schema_dir: None,
    };
    let mut out = Vec::new();
    let err = check_unique(&path, "name", true, Some(validation), &mut out).unwrap_err();

    assert!(err
        .to_string()
        .starts_with("Invalid standard names file"));
    assert!(out.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), LIBRARY);
}

#[test]
fn test_missing_schema_file_is_an_error() {
    let (_temp, path) = library_file(LIBRARY);
    let validator = FakeValidator::accepting();

    let validation = Validation {
        validator: &validator,
        schema_dir: None,
    };
    let err = check_unique(&path, "name", false, Some(validation), &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("Cannot find schema file"));
    assert_eq!(validator.calls.get(), 0);
}
