//! Style/SimpleIfClause through the engine.

use rubric::{build_cops, Config, Engine};

fn engine() -> Engine {
    let only = ["Style/SimpleIfClause".to_string()];
    Engine::new(build_cops(&Config::builtin(), Some(&only)).unwrap())
}

#[test]
fn registers_an_offense_for_boolean_branches() {
    let source = "if foo\n  true\nelse\n  false\nend\n";
    let report = engine().inspect_source(source, true).unwrap();
    assert_eq!(report.offenses.len(), 1);
    assert_eq!(
        report.offenses[0].message,
        "Replace the if-clause with \"!!foo\"."
    );
    assert_eq!(report.corrected_source(), Some("!!foo\n"));
}

#[test]
fn accepts_plain_calls() {
    let report = engine().inspect_source("good_method", false).unwrap();
    assert!(report.offenses.is_empty());
}

#[test]
fn nested_in_a_method_body() {
    let source = "def admin\n  if role == :admin then true else false end\nend\n";
    let report = engine().inspect_source(source, true).unwrap();
    assert_eq!(
        report.offenses[0].message,
        "Replace the if-clause with \"!!role == :admin\"."
    );
    assert_eq!(
        report.corrected_source(),
        Some("def admin\n  !!(role == :admin)\nend\n")
    );
}

#[test]
fn can_be_disabled() {
    let mut config = Config::builtin();
    config.merge(Config::from_toml_str("[\"Style/SimpleIfClause\"]\nEnabled = false\n").unwrap());
    let engine = Engine::from_config(&config).unwrap();
    let report = engine.inspect_source("x ? true : false", false).unwrap();
    assert!(report.offenses.is_empty());
}

#[test]
fn receiver_of_a_call_is_parenthesized() {
    let report = engine()
        .inspect_source("if foo then true else false end.to_s", true)
        .unwrap();
    assert_eq!(report.corrected_source(), Some("(!!foo).to_s"));
}
