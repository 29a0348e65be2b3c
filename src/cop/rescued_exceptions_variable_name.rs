//! `Naming/RescuedExceptionsVariableName`: rescued exceptions get one name.
//!
//! ```ruby
//! # PreferredName = "e"
//! begin
//!   work
//! rescue MyError => exception   # bad, renamed to e
//!   log(exception)
//! end
//!
//! rescue MyError => _exception  # bad, renamed to _e
//! ```
//!
//! Only the binding itself is renamed; references in the rescue body are
//! left as written. Instance variable bindings (`=> @error`) are ignored.

use rubric_ast::{Node, NodeKind};
use rubric_core::patch::Rewrite;
use rubric_core::RubricError;

use super::Cop;
use crate::config::CopConfig;
use crate::offense::{Finding, Severity};
use crate::pattern::NodePattern;

const BOUND: &str = "(resbody _ $(lvasgn _) _)";
const UNBOUND: &str = "(resbody (array $!const ...) nil _)";

const DEFAULT_PREFERRED_NAME: &str = "e";

pub struct RescuedExceptionsVariableName {
    preferred: String,
    severity: Severity,
    bound: NodePattern,
    unbound: NodePattern,
}

impl RescuedExceptionsVariableName {
    pub const NAME: &'static str = "Naming/RescuedExceptionsVariableName";

    pub fn new(config: &CopConfig) -> Result<Self, RubricError> {
        let preferred = config
            .string_option(Self::NAME, "PreferredName")?
            .unwrap_or(DEFAULT_PREFERRED_NAME);
        if !is_local_name(preferred) {
            return Err(RubricError::InvalidConfig {
                cop: Self::NAME.to_string(),
                option: "PreferredName".to_string(),
                value: preferred.to_string(),
                expected: "a local variable name".to_string(),
            });
        }

        Ok(RescuedExceptionsVariableName {
            preferred: preferred.to_string(),
            severity: config.severity_or_default(),
            bound: NodePattern::parse(BOUND)?,
            unbound: NodePattern::parse(UNBOUND)?,
        })
    }

    pub fn preferred_name(&self) -> &str {
        &self.preferred
    }

    /// The name `actual` should have been: underscore-prefixed names stay prefixed.
    fn expected_name(&self, actual: &str) -> String {
        if actual.starts_with('_') {
            format!("_{}", self.preferred)
        } else {
            self.preferred.clone()
        }
    }

    fn message(&self, expected: &str, actual: &str) -> String {
        format!("Use `{}` instead of `{}`.", expected, actual)
    }
}

impl Cop for RescuedExceptionsVariableName {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn interests(&self) -> &'static [NodeKind] {
        &[NodeKind::Resbody]
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, node: &Node, _parent: Option<&Node>, source: &str) -> Option<Finding> {
        if let Some(captures) = self.bound.match_node(node) {
            let binding = captures.node(0)?;
            let actual = binding.child_symbol(0)?;
            let expected = self.expected_name(actual);
            if actual == expected {
                return None;
            }
            let span = binding.loc().selector.unwrap_or(binding.span());
            return Some(
                Finding::new(self.message(&expected, actual), span)
                    .with_rewrite(Some(Rewrite::new(span, expected))),
            );
        }

        let captures = self.unbound.match_node(node)?;
        let expression = captures.node(0)?;
        let actual = expression.source(source);
        let expected = self.expected_name(actual);
        if actual == expected {
            return None;
        }
        Some(Finding::new(self.message(&expected, actual), expression.span()))
    }
}

fn is_local_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cop::check_source;

    fn check_all(cop: &RescuedExceptionsVariableName, source: &str) -> Vec<Finding> {
        check_source(cop, source)
    }

    fn default_cop() -> RescuedExceptionsVariableName {
        RescuedExceptionsVariableName::new(&CopConfig::default()).unwrap()
    }

    #[test]
    fn defaults_to_e() {
        assert_eq!(default_cop().preferred_name(), "e");
    }

    #[test]
    fn renames_the_binding_only() {
        let source = "begin\n  foo\nrescue => ex\n  bar(ex)\nend\n";
        let found = check_all(&default_cop(), source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Use `e` instead of `ex`.");
        assert_eq!(found[0].span.slice(source), Some("ex"));
        assert_eq!(found[0].rewrite.as_ref().map(|r| r.replacement.as_str()), Some("e"));
    }

    #[test]
    fn keeps_underscore_prefix() {
        let source = "begin\nfoo\nrescue StandardError => _exception\nend";
        let found = check_all(&default_cop(), source);
        assert_eq!(found[0].message, "Use `_e` instead of `_exception`.");
        assert!(check_all(&default_cop(), "begin\nfoo\nrescue => _e\nend").is_empty());
    }

    #[test]
    fn preferred_name_is_configurable() {
        let cop = RescuedExceptionsVariableName::new(
            &CopConfig::default().with_option("PreferredName", "error"),
        )
        .unwrap();
        assert!(check_all(&cop, "begin\nfoo\nrescue => error\nend").is_empty());
        let found = check_all(&cop, "begin\nfoo\nrescue => e\nend");
        assert_eq!(found[0].message, "Use `error` instead of `e`.");
    }

    #[test]
    fn invalid_preferred_name() {
        for bad in ["Error", "", "e-1", "@e"] {
            let config = CopConfig::default().with_option("PreferredName", bad);
            assert!(RescuedExceptionsVariableName::new(&config).is_err(), "{}", bad);
        }
    }

    #[test]
    fn constants_and_bare_rescue_are_silent() {
        let cop = default_cop();
        assert!(check_all(&cop, "begin\nfoo\nrescue MyError\nend").is_empty());
        assert!(check_all(&cop, "begin\nfoo\nrescue A::B, C\nend").is_empty());
        assert!(check_all(&cop, "begin\nfoo\nrescue\nend").is_empty());
        assert!(check_all(&cop, "begin\nfoo\nrescue => @error\nend").is_empty());
    }

    #[test]
    fn unbound_expression_is_reported_without_rewrite() {
        let source = "begin\nfoo\nrescue errors\nend";
        let found = check_all(&default_cop(), source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Use `e` instead of `errors`.");
        assert!(found[0].rewrite.is_none());
    }
}
