//! `Style/FormatString`: enforce one of `format`, `sprintf` or `String#%`.
//!
//! ```ruby
//! # EnforcedStyle = "format"
//! format('%d', 10)        # good
//! sprintf('%d', 10)       # bad, corrected to format('%d', 10)
//! '%d' % 10               # bad, corrected to format('%d', 10)
//!
//! # EnforcedStyle = "percent"
//! '%d' % [10, 11]         # good
//! format('%d %d', 10, 11) # bad, corrected to '%d %d' % [10, 11]
//! ```
//!
//! A `%` send only counts as formatting when the left operand is a string
//! literal or the right operand is an array or hash literal. `10 % 4` and
//! `x % y` are left alone.

use std::fmt;

use rubric_ast::{Node, NodeKind};
use rubric_core::patch::{Rewrite, Span};
use rubric_core::RubricError;

use super::{in_place_of, operand_source, Cop};
use crate::config::CopConfig;
use crate::offense::{Finding, Severity};
use crate::pattern::NodePattern;

const FORMATTER: &str = "{
    (send nil ${:sprintf :format} _ _ ...)
    (send {str dstr} $:% ...)
    (send !nil $:% {array hash})
}";

/// The three formatting styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatStyle {
    Format,
    Sprintf,
    Percent,
}

impl FormatStyle {
    pub const ALL: &'static [FormatStyle] =
        &[FormatStyle::Format, FormatStyle::Sprintf, FormatStyle::Percent];

    /// Configuration value for this style.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatStyle::Format => "format",
            FormatStyle::Sprintf => "sprintf",
            FormatStyle::Percent => "percent",
        }
    }

    /// How offense messages name this style.
    pub fn method_name(&self) -> &'static str {
        match self {
            FormatStyle::Format => "format",
            FormatStyle::Sprintf => "sprintf",
            FormatStyle::Percent => "String#%",
        }
    }

    pub fn parse(value: &str) -> Option<FormatStyle> {
        FormatStyle::ALL.iter().copied().find(|s| s.as_str() == value)
    }

    /// Style implied by a matched selector.
    fn from_selector(selector: &str) -> Option<FormatStyle> {
        match selector {
            "%" => Some(FormatStyle::Percent),
            "format" => Some(FormatStyle::Format),
            "sprintf" => Some(FormatStyle::Sprintf),
            _ => None,
        }
    }
}

impl fmt::Display for FormatStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct FormatString {
    style: FormatStyle,
    severity: Severity,
    formatter: NodePattern,
}

impl FormatString {
    pub const NAME: &'static str = "Style/FormatString";

    /// Build from configuration. `EnforcedStyle` is required.
    pub fn new(config: &CopConfig) -> Result<Self, RubricError> {
        let value = config
            .string_option(Self::NAME, "EnforcedStyle")?
            .ok_or_else(|| RubricError::config_missing(Self::NAME, "EnforcedStyle"))?;
        let style = FormatStyle::parse(value).ok_or_else(|| RubricError::InvalidConfig {
            cop: Self::NAME.to_string(),
            option: "EnforcedStyle".to_string(),
            value: value.to_string(),
            expected: "one of sprintf, format, percent".to_string(),
        })?;
        Ok(Self::with_style(style)?.with_severity(config.severity_or_default()))
    }

    pub fn with_style(style: FormatStyle) -> Result<Self, RubricError> {
        Ok(FormatString {
            style,
            severity: Severity::default(),
            formatter: NodePattern::parse(FORMATTER)?,
        })
    }

    fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn style(&self) -> FormatStyle {
        self.style
    }

    fn correction(
        &self,
        node: &Node,
        parent: Option<&Node>,
        detected: FormatStyle,
        source: &str,
    ) -> Option<Rewrite> {
        match (detected, self.style) {
            (FormatStyle::Percent, target) => percent_to_call(node, target, source),
            (_, FormatStyle::Percent) => call_to_percent(node, parent, source),
            (_, target) => Some(Rewrite::new(node.loc().selector?, target.as_str())),
        }
    }
}

impl Cop for FormatString {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn interests(&self) -> &'static [NodeKind] {
        &[NodeKind::Send]
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, node: &Node, parent: Option<&Node>, source: &str) -> Option<Finding> {
        let captures = self.formatter.match_node(node)?;
        let detected = FormatStyle::from_selector(captures.symbol(0)?)?;
        if detected == self.style {
            return None;
        }

        let selector = node.loc().selector?;
        let message = format!(
            "Favor `{}` over `{}`.",
            self.style.method_name(),
            detected.method_name()
        );
        Some(
            Finding::new(message, selector)
                .with_rewrite(self.correction(node, parent, detected, source)),
        )
    }
}

/// `format(fmt, a, b)` to `fmt % [a, b]`.
fn call_to_percent(node: &Node, parent: Option<&Node>, source: &str) -> Option<Rewrite> {
    let arguments = node.arguments();
    let (format, rest) = arguments.split_first()?;
    debug_assert!(!rest.is_empty(), "format call with one argument matched");

    let operand = match rest {
        [] => return None,
        [hash] if hash.is_hash() && !hash.has_braces() => {
            format!("{{ {} }}", hash.source(source))
        }
        [array] if array.is_array() => format!("[{}]", array.source(source)),
        [single] => operand_source(single, source).into_owned(),
        many => {
            let items: Vec<&str> = many.iter().map(|arg| arg.source(source)).collect();
            format!("[{}]", items.join(", "))
        }
    };

    let replacement = format!("{} % {}", operand_source(format, source), operand);
    Some(Rewrite::new(
        node.span(),
        in_place_of(node, parent, replacement),
    ))
}

/// `fmt % [a, b]` to `style(fmt, a, b)`.
fn percent_to_call(node: &Node, target: FormatStyle, source: &str) -> Option<Rewrite> {
    let receiver = node.receiver()?;
    let operand = node.arguments().first().copied();
    debug_assert!(operand.is_some(), "percent send without an operand matched");
    let operand = operand?;

    let elements = if operand.is_array() || operand.is_hash() {
        let mut children = operand.node_children();
        match (children.next(), children.last()) {
            (Some(first), Some(last)) => Span::new(first.span().start, last.span().end)
                .slice(source)?
                .to_string(),
            (Some(only), None) => only.source(source).to_string(),
            _ => String::new(),
        }
    } else {
        operand.source(source).to_string()
    };

    let replacement = if elements.is_empty() {
        format!("{}({})", target.as_str(), receiver.source(source))
    } else {
        format!("{}({}, {})", target.as_str(), receiver.source(source), elements)
    };
    Some(Rewrite::new(node.span(), replacement))
}
