//! `Style/SimpleIfClause`: an `if` that only returns `true` or `false`.
//!
//! ```ruby
//! # bad
//! if foo
//!   true
//! else
//!   false
//! end
//! foo ? false : true
//!
//! # good
//! !!foo
//! !foo
//! ```

use rubric_ast::{Node, NodeKind};
use rubric_core::patch::Rewrite;
use rubric_core::RubricError;

use super::{in_place_of, operand_source, Cop};
use crate::config::CopConfig;
use crate::offense::{Finding, Severity};
use crate::pattern::NodePattern;

const TRUTHY: &str = "(if $_ true false)";
const FALSY: &str = "(if $_ false true)";

pub struct SimpleIfClause {
    severity: Severity,
    truthy: NodePattern,
    falsy: NodePattern,
}

impl SimpleIfClause {
    pub const NAME: &'static str = "Style/SimpleIfClause";

    pub fn new(config: &CopConfig) -> Result<Self, RubricError> {
        Ok(SimpleIfClause {
            severity: config.severity_or_default(),
            truthy: NodePattern::parse(TRUTHY)?,
            falsy: NodePattern::parse(FALSY)?,
        })
    }
}

impl Cop for SimpleIfClause {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn interests(&self) -> &'static [NodeKind] {
        &[NodeKind::If]
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, node: &Node, parent: Option<&Node>, source: &str) -> Option<Finding> {
        // An elsif branch cannot be replaced on its own.
        let keyword = node.loc().keyword.and_then(|span| span.slice(source));
        if keyword == Some("elsif") {
            return None;
        }

        let (condition, prefix) = if let Some(captures) = self.truthy.match_node(node) {
            (captures.node(0)?, "!!")
        } else {
            (self.falsy.match_node(node)?.node(0)?, "!")
        };

        let message = format!(
            "Replace the if-clause with \"{}{}\".",
            prefix,
            condition.source(source)
        );
        let replacement = in_place_of(
            node,
            parent,
            format!("{}{}", prefix, operand_source(condition, source)),
        );
        Some(
            Finding::new(message, node.span())
                .with_rewrite(Some(Rewrite::new(node.span(), replacement))),
        )
    }
}
