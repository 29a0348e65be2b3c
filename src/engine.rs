//! Rule engine: one pre-order walk, dispatching each node to the cops that
//! registered for its kind, then a single correction pass.

use std::collections::HashMap;

use rubric_ast::visitor::{walk, VisitResult, Visitor};
use rubric_ast::{Node, NodeKind, ParseError};
use rubric_core::patch::{apply_rewrites, PatchError, Rewrite};
use rubric_core::RubricError;
use tracing::{debug, warn};

use crate::config::Config;
use crate::cop::{build_cops, Cop};
use crate::offense::Offense;

/// Result of inspecting one source text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    /// Offenses in traversal order: pre-order over nodes, then cop
    /// registration order within a node.
    pub offenses: Vec<Offense>,
    /// Corrected text when autocorrection was requested and there was
    /// something to correct. An error means the rewrites conflicted.
    pub correction: Option<Result<String, PatchError>>,
}

impl Report {
    pub fn corrected_source(&self) -> Option<&str> {
        match &self.correction {
            Some(Ok(text)) => Some(text),
            _ => None,
        }
    }

    pub fn correctable_count(&self) -> usize {
        self.offenses.iter().filter(|o| o.correctable).count()
    }

    pub fn corrected_count(&self) -> usize {
        self.offenses.iter().filter(|o| o.corrected).count()
    }
}

pub struct Engine {
    cops: Vec<Box<dyn Cop>>,
    dispatch: HashMap<NodeKind, Vec<usize>>,
}

impl Engine {
    pub fn new(cops: Vec<Box<dyn Cop>>) -> Self {
        let mut dispatch: HashMap<NodeKind, Vec<usize>> = HashMap::new();
        for (index, cop) in cops.iter().enumerate() {
            for kind in cop.interests() {
                dispatch.entry(*kind).or_default().push(index);
            }
        }
        Engine { cops, dispatch }
    }

    /// Build every enabled cop from `config`.
    pub fn from_config(config: &Config) -> Result<Self, RubricError> {
        Ok(Self::new(build_cops(config, None)?))
    }

    pub fn cops(&self) -> impl Iterator<Item = &dyn Cop> {
        self.cops.iter().map(|cop| cop.as_ref())
    }

    /// Run every interested cop over the tree rooted at `root`.
    pub fn inspect(&self, source: &str, root: &Node) -> Vec<Offense> {
        let mut collector = Collector {
            engine: self,
            source,
            ancestors: Vec::new(),
            found: Vec::new(),
        };
        walk(&mut collector, root);
        collector.found
    }

    /// Inspect and, if asked, apply every available rewrite in one pass.
    pub fn run(&self, source: &str, root: Option<&Node>, autocorrect: bool) -> Report {
        let Some(root) = root else {
            return Report::default();
        };

        let mut offenses = self.inspect(source, root);
        let correction = if autocorrect {
            correct(source, &mut offenses)
        } else {
            None
        };
        debug!(
            offenses = offenses.len(),
            corrected = offenses.iter().filter(|o| o.corrected).count(),
            "inspection finished"
        );
        Report {
            offenses,
            correction,
        }
    }

    /// Parse `source` with the reference parser and run.
    pub fn inspect_source(&self, source: &str, autocorrect: bool) -> Result<Report, ParseError> {
        let root = rubric_ast::parse(source)?;
        Ok(self.run(source, root.as_ref(), autocorrect))
    }
}

/// Apply the rewrites of `offenses`, marking them corrected on success.
fn correct(source: &str, offenses: &mut [Offense]) -> Option<Result<String, PatchError>> {
    let rewrites: Vec<Rewrite> = offenses
        .iter()
        .filter_map(|offense| offense.rewrite.clone())
        .collect();
    if rewrites.is_empty() {
        return None;
    }

    match apply_rewrites(source, &rewrites) {
        Ok(text) => {
            for offense in offenses.iter_mut().filter(|o| o.rewrite.is_some()) {
                offense.corrected = true;
            }
            Some(Ok(text))
        }
        Err(err) => {
            warn!(error = %err, "skipping autocorrection");
            Some(Err(err))
        }
    }
}

struct Collector<'e, 's, 'a> {
    engine: &'e Engine,
    source: &'s str,
    ancestors: Vec<&'a Node>,
    found: Vec<Offense>,
}

impl<'a> Visitor<'a> for Collector<'_, '_, 'a> {
    fn visit_node(&mut self, node: &'a Node) -> VisitResult {
        if let Some(indices) = self.engine.dispatch.get(&node.kind()) {
            let parent = self.ancestors.last().copied();
            for &index in indices {
                let cop = &self.engine.cops[index];
                if let Some(finding) = cop.check(node, parent, self.source) {
                    debug_assert!(node.span().contains(&finding.span));
                    let offense = Offense::new(cop.name(), cop.severity(), finding, self.source);
                    self.found.push(offense);
                }
            }
        }
        self.ancestors.push(node);
        VisitResult::Continue
    }

    fn leave_node(&mut self, _node: &'a Node) {
        self.ancestors.pop();
    }
}
