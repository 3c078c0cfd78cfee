//! Checks evaluated once the fixpoint is reached.
//!
//! A violated restriction becomes a diagnostic. Ordering violations carry a
//! counter-example trace found by `trace::TraceSearch`.

mod trace;

use tern_diagnostic::{Diagnostic, ErrorCode, Severity};
use tern_ir::SourceLoc;
use tern_types::{PrimitiveKind, TypeData};

use crate::{InferError, Node, NodeId, NodeKind, Strictness, TypeInferer, VarKind};

pub use trace::TraceRow;
use trace::TraceSearch;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Restriction {
    /// `actual`'s type must be `<=` `expected`'s type.
    Ordering { actual: NodeId, expected: NodeId },
    /// A null check on `node` must be able to observe `null`.
    IssetSafety { node: NodeId },
    /// Every value flowing into an annotated variable must fit its
    /// declaration. Registered by `TypeInferer::set_type_restriction`.
    AnnotationMatch { var: NodeId },
    /// `node` is used as a value; `context` says where.
    NonVoid { node: NodeId, context: String },
}

impl Restriction {
    /// Whether the restriction holds for the committed values.
    pub fn check(&self, solver: &TypeInferer) -> Result<bool, InferError> {
        let ctx = solver.context();
        Ok(match self {
            Restriction::Ordering { actual, expected } => {
                let actual = solver.node(*actual)?.value();
                let expected = solver.node(*expected)?.value();
                actual.is_less_or_equal(ctx, &expected)
            }
            Restriction::IssetSafety { node } => solver.node(*node)?.value().can_hold_null(),
            Restriction::AnnotationMatch { var } => {
                let node = solver.node(*var)?;
                let var_node = node.as_var().ok_or(InferError::NotAVariable(*var))?;
                var_node.mismatch().is_none()
            }
            Restriction::NonVoid { node, .. } => {
                solver.node(*node)?.value().kind() != PrimitiveKind::Void
            }
        })
    }

    /// The diagnostic for a violation.
    pub fn describe(&self, solver: &TypeInferer) -> Result<Diagnostic, InferError> {
        match self {
            Restriction::Ordering { actual, expected } => {
                describe_ordering(solver, *actual, *expected)
            }
            Restriction::IssetSafety { node } => describe_isset(solver, *node),
            Restriction::AnnotationMatch { var } => describe_annotation(solver, *var),
            Restriction::NonVoid { node, context } => {
                let node = solver.node(*node)?;
                Ok(Diagnostic::error(ErrorCode::E2005)
                    .with_message(format!(
                        "{context}: {} has no value",
                        node.describe(&solver.context().names)
                    ))
                    .with_label(node.location(), "this evaluates to void"))
            }
        }
    }

    pub(crate) fn evaluate(&self, solver: &TypeInferer) -> Result<Option<Diagnostic>, InferError> {
        if self.check(solver)? {
            Ok(None)
        } else {
            self.describe(solver).map(Some)
        }
    }
}

fn describe_ordering(
    solver: &TypeInferer,
    actual: NodeId,
    expected: NodeId,
) -> Result<Diagnostic, InferError> {
    let ctx = solver.context();
    let actual_node = solver.node(actual)?;
    let actual_value = actual_node.value();
    let expected_value = solver.node(expected)?.value();

    let trace = TraceSearch::new(solver).run(actual, &expected_value)?;
    let mut diag = Diagnostic::error(ErrorCode::E2002)
        .with_message(format!(
            "{} is {}, but {} is required",
            actual_node.describe(&ctx.names),
            actual_value.display(ctx),
            expected_value.display(ctx)
        ))
        .with_label(actual_node.location(), "inferred here");
    for row in trace {
        diag = diag.with_secondary_label(row.location, row.to_string());
    }
    Ok(diag)
}

fn describe_isset(solver: &TypeInferer, id: NodeId) -> Result<Diagnostic, InferError> {
    let ctx = solver.context();
    let node = solver.node(id)?;
    let severity = match solver.config().strictness {
        Strictness::Strict => Severity::Error,
        Strictness::Default => Severity::Warning,
    };
    let mut diag = Diagnostic::with_severity(ErrorCode::E2003, severity)
        .with_message(format!(
            "null check on {} of type {} can never succeed",
            node.describe(&ctx.names),
            node.value().display(ctx)
        ))
        .with_label(node.location(), "checked here");
    if let Some((loc, text)) = explain_non_null(solver, &node)? {
        diag = diag.with_secondary_label(loc, text);
    }
    Ok(diag)
}

/// Walk back from `start` to the first variable and find an assignment to
/// it that cannot be null.
fn explain_non_null(
    solver: &TypeInferer,
    start: &Node,
) -> Result<Option<(SourceLoc, String)>, InferError> {
    let ctx = solver.context();
    let budget = solver.config().trace_step_budget;
    let mut queue = std::collections::VecDeque::from([start.id()]);
    let mut seen = rustc_hash::FxHashSet::default();
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) || seen.len() > budget {
            continue;
        }
        let node = solver.node(id)?;
        let sources = solver.graph.sources(&node)?;
        if let NodeKind::Var(var) = node.kind() {
            for (_, edge) in &sources {
                let source = solver.node(edge.from)?;
                let value = source.value();
                if !value.can_hold_null() {
                    let text = format!(
                        "{} is assigned {} here",
                        var.describe(&ctx.names),
                        value.display(ctx)
                    );
                    return Ok(Some((source.location(), text)));
                }
            }
            return Ok(None);
        }
        queue.extend(sources.into_iter().map(|(_, edge)| edge.from));
    }
    Ok(None)
}

fn describe_annotation(solver: &TypeInferer, id: NodeId) -> Result<Diagnostic, InferError> {
    let ctx = solver.context();
    let names = &ctx.names;
    let node = solver.node(id)?;
    let var = node.as_var().ok_or(InferError::NotAVariable(id))?;
    let declared = var
        .type_restriction()
        .cloned()
        .unwrap_or_else(TypeData::any);
    let Some(mismatch) = var.mismatch() else {
        return Ok(Diagnostic::error(ErrorCode::E2004)
            .with_message(format!(
                "{} is declared as {}",
                var.describe(names),
                declared.display(ctx)
            ))
            .with_label(node.location(), "declared here"));
    };
    let edge = solver.graph.edge(mismatch.edge)?;
    let source = solver.node(edge.from)?;
    let function = names.lookup(var.function);

    let how = match (var.kind, &edge.path, source.as_var().map(|v| v.kind)) {
        (VarKind::Param { index, .. }, _, _) => {
            format!("argument #{} passed to {function}()", index + 1)
        }
        (VarKind::Return, _, _) => format!("value returned from {function}()"),
        (_, Some(path), _) if !path.is_root() => format!(
            "element {} assigned to {}",
            path.display(&ctx.keys),
            var.describe(names)
        ),
        (_, _, Some(VarKind::Param { by_ref: true, .. })) => format!(
            "value written through reference {} into {}",
            source.describe(names),
            var.describe(names)
        ),
        _ => format!("value assigned to {}", var.describe(names)),
    };

    Ok(Diagnostic::error(ErrorCode::E2004)
        .with_message(format!(
            "{how} is {}, but {} is declared as {}",
            mismatch.value.display(ctx),
            var.describe(names),
            declared.display(ctx)
        ))
        .with_label(source.location(), how)
        .with_secondary_label(node.location(), "declared here"))
}
