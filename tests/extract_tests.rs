//! End-to-end extraction and resolution tests
//!
//! These drive the library the way an embedding system would: write a
//! template and a backing config to disk, run the processor, then
//! query the registry.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use docvars::{DocvarsError, TemplateProcessor};

const EMPTY_CONFIG: &str = "sources: []\n";

const SAMPLE_TEMPLATE: &str = "\
Applicant: ${sex=Female}
Copies: ${readme=5}
Offset: ${num=0}
Total: ${testexpr=${num}+${readme}}

Dear ${sex}, you requested ${readme} copies.
";

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn static_var_extract_worked_example() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(&dir, "vars.yaml", EMPTY_CONFIG);
    let template = write_fixture(&dir, "letter.doc", SAMPLE_TEMPLATE);

    let processor = TemplateProcessor::new(&config);
    let dsc = processor.static_var_extract(&template).unwrap();
    let ds = dsc.const_data_source();

    let sex = ds.data_holder("sex").expect("sex not extracted");
    assert_eq!(sex.value().unwrap(), "Female");

    let readme = ds.data_holder("readme").expect("readme not extracted");
    assert_eq!(readme.value().unwrap(), "5");

    let testexpr = ds.data_holder("testexpr").expect("testexpr not extracted");
    assert_eq!(testexpr.expr(), Some("${num}+${readme}"));
    assert!(matches!(
        testexpr.value().unwrap_err(),
        DocvarsError::UnresolvedExpression { .. }
    ));

    assert_eq!(testexpr.fill_value(ds).unwrap(), "5.0");
    assert_eq!(testexpr.value().unwrap(), "5.0");
    // idempotent: second fill returns the same value
    assert_eq!(testexpr.fill_value(ds).unwrap(), "5.0");
}

#[test]
fn numeric_operands_sum() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(&dir, "vars.yaml", EMPTY_CONFIG);
    let template = write_fixture(
        &dir,
        "sum.doc",
        "${num=5} ${readme=5} ${testexpr=${num}+${readme}}",
    );

    let dsc = TemplateProcessor::new(&config)
        .static_var_extract(&template)
        .unwrap();
    let ds = dsc.const_data_source();
    assert_eq!(ds.data_holder("testexpr").unwrap().fill_value(ds).unwrap(), "10.0");
}

#[test]
fn forward_references_across_the_document() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(&dir, "vars.yaml", EMPTY_CONFIG);
    // total is defined before the variables it references
    let template = write_fixture(
        &dir,
        "fwd.doc",
        "${total=${price}*${count}} ${price=3} ${count=4}",
    );

    let dsc = TemplateProcessor::new(&config)
        .static_var_extract(&template)
        .unwrap();
    let ds = dsc.const_data_source();
    assert_eq!(ds.data_holder("total").unwrap().fill_value(ds).unwrap(), "12.0");
}

#[test]
fn extraction_keeps_declaration_order() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(&dir, "vars.yaml", EMPTY_CONFIG);
    let template = write_fixture(&dir, "order.doc", SAMPLE_TEMPLATE);

    let dsc = TemplateProcessor::new(&config)
        .static_var_extract(&template)
        .unwrap();
    let names: Vec<&str> = dsc
        .const_data_source()
        .vars()
        .iter()
        .map(|h| h.name())
        .collect();
    assert_eq!(names, vec!["sex", "readme", "num", "testexpr"]);
}

#[test]
fn config_declared_sources_are_available() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(
        &dir,
        "vars.yaml",
        r#"
sources:
  - name: test
    vars:
      - name: base
        value: "5"
      - name: doubled
        expr: "${base}*2"
"#,
    );
    let template = write_fixture(&dir, "t.doc", "no definitions here");

    let dsc = TemplateProcessor::new(&config)
        .static_var_extract(&template)
        .unwrap();

    assert!(dsc.filename().ends_with("vars.yaml"));
    assert_eq!(dsc.data_sources().len(), 1);
    assert!(dsc.data_source("missing").is_none());

    let test = dsc.data_source("test").unwrap();
    let doubled = test.data_holder("doubled").unwrap();
    assert_eq!(doubled.fill_value(test).unwrap(), "10.0");
}

#[test]
fn cyclic_references_fail_instead_of_recursing() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(&dir, "vars.yaml", EMPTY_CONFIG);
    let template = write_fixture(&dir, "cycle.doc", "${a=${b}+1} ${b=${a}+1}");

    let dsc = TemplateProcessor::new(&config)
        .static_var_extract(&template)
        .unwrap();
    let ds = dsc.const_data_source();
    let err = ds.data_holder("a").unwrap().fill_value(ds).unwrap_err();
    assert!(matches!(err, DocvarsError::CyclicReference { .. }));
}

#[test]
fn unknown_reference_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(&dir, "vars.yaml", EMPTY_CONFIG);
    let template = write_fixture(&dir, "unknown.doc", "${a=${ghost}+1}");

    let dsc = TemplateProcessor::new(&config)
        .static_var_extract(&template)
        .unwrap();
    let ds = dsc.const_data_source();
    let err = ds.data_holder("a").unwrap().fill_value(ds).unwrap_err();
    assert!(matches!(err, DocvarsError::UnknownVariable { .. }));
}

#[test]
fn missing_template_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(&dir, "vars.yaml", EMPTY_CONFIG);

    let err = TemplateProcessor::new(&config)
        .static_var_extract(dir.path().join("missing.doc"))
        .unwrap_err();
    assert!(matches!(err, DocvarsError::TemplateRead { .. }));
}

#[test]
fn duplicate_definition_is_a_format_error() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(&dir, "vars.yaml", EMPTY_CONFIG);
    let template = write_fixture(&dir, "dup.doc", "${x=1} ${x=2}");

    let err = TemplateProcessor::new(&config)
        .static_var_extract(&template)
        .unwrap_err();
    assert!(matches!(err, DocvarsError::TemplateFormat { .. }));
}

#[test]
fn missing_config_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    let template = write_fixture(&dir, "t.doc", "${x=1}");

    let err = TemplateProcessor::new(dir.path().join("missing.yaml"))
        .static_var_extract(&template)
        .unwrap_err();
    assert!(matches!(err, DocvarsError::ConfigLoad { .. }));
}

#[test]
fn string_interpolation_variables_resolve() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(&dir, "vars.yaml", EMPTY_CONFIG);
    let template = write_fixture(
        &dir,
        "greet.doc",
        "${name=Ada} ${greeting=Hello ${name}!}",
    );

    let dsc = TemplateProcessor::new(&config)
        .static_var_extract(&template)
        .unwrap();
    let ds = dsc.const_data_source();
    assert_eq!(
        ds.data_holder("greeting").unwrap().fill_value(ds).unwrap(),
        "Hello Ada!"
    );
}
