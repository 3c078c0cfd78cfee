//! The fixpoint solver.
//!
//! `TypeInferer` owns the graph, the global injector queue and everything
//! reported along the way. It is `Sync`: edge collection, the worker pool and
//! code generation all talk to it through `&self`.

mod worker;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::deque::{Injector, Worker};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tern_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue, ErrorCode};
use tern_ir::SourceLoc;
use tern_types::{MultiKey, TypeContext, TypeData};

use crate::graph::Graph;
use crate::{
    CallResult, EdgeId, ExprKind, ExprNode, InferConfig, InferError, Node, NodeId, NodeKind,
    Restriction, TypeNode, VarNode,
};

/// Counters describing a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InferStats {
    pub nodes: usize,
    pub edges: usize,
    /// Passes over any node, including relaunches.
    pub recalculations: usize,
    /// Extra passes caused by schedules that arrived during a pass.
    pub relaunches: usize,
    /// Passes that changed the committed value.
    pub changes: usize,
    /// Passes run by `resolve` on the caller's thread.
    pub inline_runs: usize,
}

#[derive(Default)]
struct Counters {
    recalculations: AtomicUsize,
    relaunches: AtomicUsize,
    changes: AtomicUsize,
    inline_runs: AtomicUsize,
}

/// Everything reported for one compilation.
#[derive(Clone, Debug, Default)]
pub struct InferenceOutcome {
    /// Lattice errors in node order, then restriction violations in
    /// registration order.
    pub diagnostics: Vec<Diagnostic>,
    /// Code generation must not run when set.
    pub has_hard_error: bool,
}

pub struct TypeInferer {
    ctx: Arc<TypeContext>,
    config: InferConfig,
    pub(crate) graph: Graph,
    injector: Injector<NodeId>,
    /// Queue entries not yet fully processed, across all queues.
    pending: AtomicUsize,
    closed: AtomicBool,
    abort: AtomicBool,
    restrictions: RwLock<Vec<Restriction>>,
    lattice_errors: Mutex<Vec<(NodeId, Diagnostic)>>,
    violations: Mutex<Vec<Diagnostic>>,
    diagnostics: Mutex<DiagnosticQueue>,
    counters: Counters,
}

impl TypeInferer {
    pub fn new(ctx: Arc<TypeContext>, config: InferConfig) -> Self {
        let queue = DiagnosticQueue::with_config(DiagnosticConfig {
            error_limit: config.error_limit,
            deduplicate: true,
        });
        TypeInferer {
            ctx,
            config,
            graph: Graph::new(),
            injector: Injector::new(),
            pending: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            abort: AtomicBool::new(false),
            restrictions: RwLock::new(Vec::new()),
            lattice_errors: Mutex::new(Vec::new()),
            violations: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(queue),
            counters: Counters::default(),
        }
    }

    #[inline]
    pub fn context(&self) -> &TypeContext {
        &self.ctx
    }

    #[inline]
    pub fn config(&self) -> &InferConfig {
        &self.config
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), InferError> {
        if self.is_finished() {
            Err(InferError::SolverClosed { operation })
        } else {
            Ok(())
        }
    }

    /// Register a node and schedule its first pass.
    pub fn add_node(&self, kind: NodeKind) -> Result<NodeId, InferError> {
        self.ensure_open("add_node")?;
        let id = self.graph.push_node(|id| Node::new(id, kind))?;
        self.enqueue(id, None)?;
        Ok(id)
    }

    pub fn add_var(&self, var: VarNode) -> Result<NodeId, InferError> {
        self.add_node(NodeKind::Var(var))
    }

    /// Register an expression. A call whose type rule reads past its
    /// arguments is rejected here rather than on its first evaluation.
    pub fn add_expr(&self, kind: ExprKind, location: SourceLoc) -> Result<NodeId, InferError> {
        if let ExprKind::Call {
            callee,
            args,
            result: CallResult::Rule(rule),
        } = &kind
        {
            if let Some(n) = rule.max_arg().filter(|&n| n >= args.len()) {
                return Err(InferError::MalformedRule {
                    callee: self.context().names.lookup(*callee).to_string(),
                    detail: format!("argument #{} is missing", n + 1),
                });
            }
        }
        self.add_node(NodeKind::Expr(ExprNode::new(kind, location)))
    }

    pub fn add_type(&self, value: TypeData, location: SourceLoc) -> Result<NodeId, InferError> {
        self.add_node(NodeKind::Type(TypeNode { value, location }))
    }

    /// Let `from`'s value flow into `to`, at `path` if given.
    pub fn add_edge(
        &self,
        from: NodeId,
        to: NodeId,
        path: Option<MultiKey>,
    ) -> Result<EdgeId, InferError> {
        self.ensure_open("add_edge")?;
        let edge = self.graph.link(from, to, path)?;
        self.enqueue(to, None)?;
        Ok(edge)
    }

    /// Declare `var`'s type.
    ///
    /// The declared type also flows into the variable as a value, and an
    /// annotation check is registered for the edges it rejects. A second
    /// declaration for the same variable is ignored.
    pub fn set_type_restriction(&self, var: NodeId, declared: TypeData) -> Result<(), InferError> {
        self.ensure_open("set_type_restriction")?;
        let node = self.graph.node(var)?;
        let slot = node.as_var().ok_or(InferError::NotAVariable(var))?;
        if slot.type_restriction.set(Arc::new(declared.clone())).is_err() {
            tracing::debug!(node = ?var, "type restriction already set, keeping the first");
            return Ok(());
        }
        let annotation = self.add_type(declared, node.location())?;
        self.add_edge(annotation, var, None)?;
        self.add_restriction(Restriction::AnnotationMatch { var })
    }

    pub fn add_restriction(&self, restriction: Restriction) -> Result<(), InferError> {
        self.ensure_open("add_restriction")?;
        self.restrictions.write().push(restriction);
        Ok(())
    }

    /// Request another pass over `node`.
    pub fn schedule(&self, node: NodeId) -> Result<(), InferError> {
        self.ensure_open("schedule")?;
        self.enqueue(node, None)
    }

    /// Push onto the caller's local queue if it has one, else the injector.
    pub(crate) fn enqueue(
        &self,
        id: NodeId,
        local: Option<&Worker<NodeId>>,
    ) -> Result<(), InferError> {
        let node = self.graph.node(id)?;
        if node.state.request() {
            self.pending.fetch_add(1, Ordering::AcqRel);
            match local {
                Some(worker) => worker.push(id),
                None => self.injector.push(id),
            }
        }
        Ok(())
    }

    /// The committed value of `node`, running it inline first if it has
    /// never completed a pass.
    pub fn resolve(&self, id: NodeId) -> Result<Arc<TypeData>, InferError> {
        let node = self.graph.node(id)?;
        loop {
            if node.is_done() {
                return Ok(node.value());
            }
            if self.is_finished() {
                return Err(InferError::NotResolved(id));
            }
            if node.state.claim_inline() {
                self.counters.inline_runs.fetch_add(1, Ordering::Relaxed);
                self.run_claimed(&node, None)?;
            } else {
                std::thread::sleep(Duration::from_micros(50));
            }
        }
    }

    /// Run to a fixpoint and close the graph. Idempotent.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn finish(&self) -> Result<(), InferError> {
        if self.is_finished() {
            return Ok(());
        }
        self.run_to_fixpoint()?;
        self.closed.store(true, Ordering::Release);
        let stats = self.stats();
        tracing::debug!(
            nodes = stats.nodes,
            edges = stats.edges,
            recalculations = stats.recalculations,
            relaunches = stats.relaunches,
            "inference finished"
        );
        Ok(())
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Evaluate every registered restriction. Returns the number violated.
    ///
    /// Finishes the solver first. At most
    /// `InferConfig::max_reported_violations` of them are reported
    /// (0 = all), in registration order.
    #[tracing::instrument(level = "debug", skip_all, fields(count = self.restrictions.read().len()))]
    pub fn check_restrictions(&self) -> Result<usize, InferError> {
        self.finish()?;
        let restrictions = self.restrictions.read();
        let found: Vec<Option<Diagnostic>> = restrictions
            .par_iter()
            .map(|restriction| restriction.evaluate(self))
            .collect::<Result<_, _>>()?;
        let found: Vec<Diagnostic> = found.into_iter().flatten().collect();
        let limit = match self.config.max_reported_violations {
            0 => usize::MAX,
            n => n,
        };
        let total = found.len();
        self.violations.lock().extend(found.into_iter().take(limit));
        if total > 0 {
            tracing::debug!(total, reported = total.min(limit), "restrictions violated");
        }
        Ok(total)
    }

    /// Drain everything reported so far.
    pub fn take_outcome(&self) -> InferenceOutcome {
        let mut lattice = std::mem::take(&mut *self.lattice_errors.lock());
        lattice.sort_by_key(|(id, _)| *id);
        let violations = std::mem::take(&mut *self.violations.lock());

        let mut queue = self.diagnostics.lock();
        for (_, diag) in lattice {
            queue.push(diag);
        }
        for diag in violations {
            queue.push(diag);
        }
        let has_hard_error = queue.has_hard_error();
        InferenceOutcome {
            diagnostics: queue.flush(),
            has_hard_error,
        }
    }

    pub fn stats(&self) -> InferStats {
        InferStats {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            recalculations: self.counters.recalculations.load(Ordering::Relaxed),
            relaunches: self.counters.relaunches.load(Ordering::Relaxed),
            changes: self.counters.changes.load(Ordering::Relaxed),
            inline_runs: self.counters.inline_runs.load(Ordering::Relaxed),
        }
    }

    pub fn node(&self, id: NodeId) -> Result<Arc<Node>, InferError> {
        self.graph.node(id)
    }

    /// Record a lattice error, once per node. Restricted variables report
    /// through their annotation check instead.
    pub(crate) fn report_lattice_error(&self, node: &Node, reason: String) {
        if node.is_restricted() || !node.claim_error_report() {
            return;
        }
        let diag = Diagnostic::error(ErrorCode::E2001)
            .with_message(format!(
                "incompatible types in {}",
                node.describe(&self.ctx.names)
            ))
            .with_label(node.location(), reason);
        self.lattice_errors.lock().push((node.id(), diag));
    }
}

impl std::fmt::Debug for TypeInferer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInferer")
            .field("stats", &self.stats())
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
