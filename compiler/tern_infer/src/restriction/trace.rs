//! Counter-example search for ordering violations.
//!
//! Starting from the node whose type is too wide, follow incoming edges
//! toward whoever contributed the offending part, until reaching a node
//! whose own sources all agree with what is expected there. That node is
//! where the bad type originates.
//!
//! The search is a depth-first walk over sources that disagree with the
//! (projected) expected type, best candidate first:
//!
//! - parameter and return slots rank above other hops
//! - hops that are themselves mismatches (an `error` value, or a variable
//!   that rejected an edge) rank above hops that merely pass a type along
//! - ties break on `NodeId`, so the trace is deterministic
//!
//! A node is never revisited: nodes on the current path are skipped, and a
//! node whose subtree failed to reach an origin is marked dead. Paths stop
//! at `trace_max_depth`. Expanding more than `trace_step_budget` nodes is an
//! internal error.

use std::cmp::Reverse;
use std::fmt;

use rustc_hash::FxHashSet;
use tern_ir::SourceLoc;
use tern_types::TypeData;

use crate::{InferError, Node, NodeId, TypeInferer, VarKind};

/// One line of a rendered trace, in data-flow order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRow {
    pub node: NodeId,
    pub location: SourceLoc,
    /// What the node stands for, e.g. `argument $x of f()`.
    pub subject: String,
    /// Its committed type.
    pub value: String,
}

impl fmt::Display for TraceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.subject, self.value)
    }
}

struct Candidate {
    node: NodeId,
    expected: TypeData,
    score: u8,
}

pub(crate) struct TraceSearch<'a> {
    solver: &'a TypeInferer,
    max_depth: usize,
    budget: usize,
    steps: usize,
    on_path: FxHashSet<NodeId>,
    dead: FxHashSet<NodeId>,
    /// Longest path seen, used when no origin is reachable.
    best: Vec<NodeId>,
}

impl<'a> TraceSearch<'a> {
    pub(crate) fn new(solver: &'a TypeInferer) -> Self {
        let config = solver.config();
        TraceSearch {
            solver,
            max_depth: config.trace_max_depth.max(1),
            budget: config.trace_step_budget,
            steps: 0,
            on_path: FxHashSet::default(),
            dead: FxHashSet::default(),
            best: Vec::new(),
        }
    }

    pub(crate) fn run(
        mut self,
        start: NodeId,
        expected: &TypeData,
    ) -> Result<Vec<TraceRow>, InferError> {
        let mut path = Vec::new();
        if !self.descend(start, expected.clone(), &mut path)? {
            path = std::mem::take(&mut self.best);
        }
        self.render(&path)
    }

    /// Returns `true` once `path` ends at an origin or at the depth cap.
    fn descend(
        &mut self,
        id: NodeId,
        expected: TypeData,
        path: &mut Vec<NodeId>,
    ) -> Result<bool, InferError> {
        self.steps += 1;
        if self.steps > self.budget {
            return Err(InferError::TraceBudgetExceeded {
                budget: self.budget,
            });
        }
        path.push(id);
        self.on_path.insert(id);
        if path.len() > self.best.len() {
            self.best.clone_from(path);
        }
        if path.len() >= self.max_depth {
            return Ok(true);
        }

        let node = self.solver.node(id)?;
        let candidates = self.candidates(&node, &expected)?;
        if candidates.is_empty() {
            return Ok(true);
        }
        for candidate in candidates {
            if self.on_path.contains(&candidate.node) || self.dead.contains(&candidate.node) {
                continue;
            }
            if self.descend(candidate.node, candidate.expected, path)? {
                return Ok(true);
            }
        }

        path.pop();
        self.on_path.remove(&id);
        self.dead.insert(id);
        Ok(false)
    }

    /// Sources of `node` whose value does not fit what is expected of them,
    /// best first.
    fn candidates(
        &self,
        node: &Node,
        expected: &TypeData,
    ) -> Result<Vec<Candidate>, InferError> {
        let ctx = self.solver.context();
        let mut out = Vec::new();
        for (_, edge) in self.solver.graph.sources(node)? {
            let source = self.solver.node(edge.from)?;
            let value = source.value();
            let expected_here = match &edge.path {
                None => expected.clone(),
                Some(path) => expected.read_at(ctx, path),
            };
            if value.is_less_or_equal(ctx, &expected_here) {
                continue;
            }
            out.push(Candidate {
                node: edge.from,
                expected: expected_here,
                score: score(&source, &value),
            });
        }
        out.sort_by_key(|c| (Reverse(c.score), c.node));
        out.dedup_by_key(|c| c.node);
        Ok(out)
    }

    fn render(&self, path: &[NodeId]) -> Result<Vec<TraceRow>, InferError> {
        let ctx = self.solver.context();
        let mut rows: Vec<TraceRow> = Vec::with_capacity(path.len());
        for &id in path.iter().rev() {
            let node = self.solver.node(id)?;
            let row = TraceRow {
                node: id,
                location: node.location(),
                subject: node.describe(&ctx.names),
                value: node.value().display(ctx).to_string(),
            };
            // Same type at the same place says nothing new.
            if rows
                .last()
                .is_some_and(|last| last.location == row.location && last.value == row.value)
            {
                continue;
            }
            rows.push(row);
        }
        Ok(rows)
    }
}

fn score(source: &Node, value: &TypeData) -> u8 {
    let mut score = 0;
    if let Some(var) = source.as_var() {
        if matches!(var.kind, VarKind::Param { .. } | VarKind::Return) {
            score += 2;
        }
        if var.mismatch().is_some() {
            score += 1;
        }
    }
    if value.is_error() {
        score += 1;
    }
    score
}
