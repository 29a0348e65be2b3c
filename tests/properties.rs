//! Whole-engine properties over mixed sources with the built-in configuration.

use rubric::{Config, CopConfig, Engine};
use rubric_core::patch::{find_conflicts, PatchError, Rewrite};

const MIXED: &str = "\
puts sprintf('%d', 1)
puts x % [1, 2]
begin
  work
rescue => ex
  log(ex)
end
ok = flag ? true : false
";

fn builtin() -> Engine {
    Engine::from_config(&Config::builtin()).unwrap()
}

fn with_style(style: &str) -> Engine {
    let config = Config::builtin().with_cop(
        "Style/FormatString",
        CopConfig::default().with_option("EnforcedStyle", style),
    );
    Engine::from_config(&config).unwrap()
}

#[test]
fn offenses_come_out_in_document_order() {
    let report = builtin().inspect_source(MIXED, false).unwrap();
    let cops: Vec<&str> = report.offenses.iter().map(|o| o.cop_name.as_str()).collect();
    assert_eq!(
        cops,
        vec![
            "Style/FormatString",
            "Style/FormatString",
            "Naming/RescuedExceptionsVariableName",
            "Style/SimpleIfClause",
        ]
    );
    let starts: Vec<usize> = report.offenses.iter().map(|o| o.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[test]
fn correcting_then_reinspecting_is_clean() {
    let engine = builtin();
    let first = engine.inspect_source(MIXED, true).unwrap();
    let corrected = first.corrected_source().unwrap();
    assert_eq!(
        corrected,
        "\
puts format('%d', 1)
puts format(x, 1, 2)
begin
  work
rescue => e
  log(ex)
end
ok = !!flag
"
    );
    let second = engine.inspect_source(corrected, true).unwrap();
    assert!(second.offenses.is_empty());
    assert_eq!(second.correction, None);
}

#[test]
fn idempotent_for_every_style() {
    let sources = [
        "puts \"%d\" % 10\n",
        "puts x % { a: 10, b: 11 }\n",
        "format(something, a, b)\n",
        "sprintf(something, a: 10)\n",
    ];
    for style in ["sprintf", "format", "percent"] {
        let engine = with_style(style);
        for source in sources {
            let report = engine.inspect_source(source, true).unwrap();
            let text = report.corrected_source().unwrap_or(source);
            let again = engine.inspect_source(text, false).unwrap();
            assert!(again.offenses.is_empty(), "{} {:?} -> {:?}", style, source, text);
        }
    }
}

#[test]
fn offense_spans_lie_within_their_rewrites() {
    let report = builtin().inspect_source(MIXED, false).unwrap();
    for offense in &report.offenses {
        let rewrite = offense.rewrite.as_ref().unwrap();
        assert!(rewrite.span.contains(&offense.span), "{}", offense);
        assert!(offense.span.end <= MIXED.len());
    }
    let rewrites: Vec<Rewrite> = report
        .offenses
        .iter()
        .filter_map(|o| o.rewrite.clone())
        .collect();
    assert!(find_conflicts(&rewrites).is_empty());
}

#[test]
fn ambiguous_percent_is_silent() {
    for style in ["sprintf", "format", "percent"] {
        let engine = with_style(style);
        for source in ["10 % 4", "x % 4", "x % Y"] {
            let report = engine.inspect_source(source, false).unwrap();
            assert!(report.offenses.is_empty(), "{} {}", style, source);
        }
    }
}

#[test]
fn nested_rewrites_conflict_but_offenses_remain() {
    let report = with_style("percent")
        .inspect_source("format(x, sprintf(y, 1))", true)
        .unwrap();
    assert_eq!(report.offenses.len(), 2);
    assert!(report.offenses.iter().all(|o| o.correctable && !o.corrected));
    assert!(matches!(report.correction, Some(Err(PatchError::Conflict { .. }))));
}
