//! Cops: named rules that inspect nodes and report offenses.
//!
//! Each cop declares the node kinds it is interested in; the engine only calls
//! [`Cop::check`] for those kinds. A cop is built once from its
//! [`CopConfig`] and is read-only afterwards.

pub mod format_string;
pub mod rescued_exceptions_variable_name;
pub mod simple_if_clause;

use std::borrow::Cow;

use rubric_ast::{Node, NodeKind};
use rubric_core::RubricError;
use tracing::{debug, warn};

use crate::config::{Config, CopConfig};
use crate::offense::{Finding, Severity};

pub use format_string::{FormatString, FormatStyle};
pub use rescued_exceptions_variable_name::RescuedExceptionsVariableName;
pub use simple_if_clause::SimpleIfClause;

/// A rule over AST nodes.
pub trait Cop: Send + Sync {
    /// Qualified name, e.g. `Style/FormatString`.
    fn name(&self) -> &'static str;

    /// Node kinds this cop wants to see.
    fn interests(&self) -> &'static [NodeKind];

    fn severity(&self) -> Severity {
        Severity::Convention
    }

    /// Inspect one node of an interesting kind. `parent` is the enclosing
    /// node, `None` at the root.
    fn check(&self, node: &Node, parent: Option<&Node>, source: &str) -> Option<Finding>;
}

/// Static description of a built-in cop.
pub struct CopInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn(&CopConfig) -> Result<Box<dyn Cop>, RubricError>,
}

/// Every built-in cop, in registration order.
pub const REGISTRY: &[CopInfo] = &[
    CopInfo {
        name: RescuedExceptionsVariableName::NAME,
        description: "Use a consistent name for rescued exceptions.",
        build: |config| Ok(Box::new(RescuedExceptionsVariableName::new(config)?)),
    },
    CopInfo {
        name: FormatString::NAME,
        description: "Enforce one style of string formatting.",
        build: |config| Ok(Box::new(FormatString::new(config)?)),
    },
    CopInfo {
        name: SimpleIfClause::NAME,
        description: "Replace if-expressions returning booleans with the condition.",
        build: |config| Ok(Box::new(SimpleIfClause::new(config)?)),
    },
];

pub fn find(name: &str) -> Option<&'static CopInfo> {
    REGISTRY.iter().find(|info| info.name == name)
}

/// Build the enabled cops, optionally restricted to `only`.
pub fn build_cops(
    config: &Config,
    only: Option<&[String]>,
) -> Result<Vec<Box<dyn Cop>>, RubricError> {
    if let Some(only) = only {
        if let Some(unknown) = only.iter().find(|name| find(name).is_none()) {
            return Err(RubricError::invalid_args(format!("unknown cop '{}'", unknown)));
        }
    }
    for name in config.cop_names() {
        if find(name).is_none() {
            warn!(cop = name, "configuration mentions an unknown cop");
        }
    }

    let mut cops = Vec::new();
    for info in REGISTRY {
        if let Some(only) = only {
            if !only.iter().any(|name| name == info.name) {
                continue;
            }
        }
        let cop_config = config.cop(info.name);
        if !cop_config.is_enabled() {
            debug!(cop = info.name, "cop disabled by configuration");
            continue;
        }
        cops.push((info.build)(&cop_config)?);
    }
    Ok(cops)
}

/// Source of `node`, parenthesized when it would bind looser than an operand.
pub(crate) fn operand_source<'s>(node: &Node, source: &'s str) -> Cow<'s, str> {
    let text = node.source(source);
    let loose = node.is_binary_operation()
        || matches!(
            node.kind(),
            NodeKind::And | NodeKind::Or | NodeKind::If | NodeKind::Lvasgn | NodeKind::Ivasgn
        );
    if loose {
        Cow::Owned(format!("({})", text))
    } else {
        Cow::Borrowed(text)
    }
}

/// `replacement` standing in for all of `node`, parenthesized when `node` is
/// the receiver of a call or an operand of an infix operator.
pub(crate) fn in_place_of(node: &Node, parent: Option<&Node>, replacement: String) -> String {
    let bound = parent.is_some_and(|parent| {
        parent.kind() == NodeKind::Send
            && (parent
                .receiver()
                .is_some_and(|receiver| std::ptr::eq(receiver, node))
                || parent.is_binary_operation())
    });
    if bound {
        format!("({})", replacement)
    } else {
        replacement
    }
}

/// Run `cop` over every interesting node of `source`.
#[cfg(test)]
pub(crate) fn check_source(cop: &dyn Cop, source: &str) -> Vec<Finding> {
    let root = rubric_ast::parse(source).unwrap().unwrap();
    let nodes = rubric_ast::descendants(&root);
    nodes
        .iter()
        .filter(|node| cop.interests().contains(&node.kind()))
        .filter_map(|node| {
            let parent = nodes.iter().copied().find(|candidate| {
                candidate
                    .node_children()
                    .any(|child| std::ptr::eq(child, *node))
            });
            cop.check(node, parent, source)
        })
        .collect()
}
