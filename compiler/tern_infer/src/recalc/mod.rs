//! One pass over one node: compute, compare, commit.

mod expr;
mod var;

use tern_types::TypeData;

use crate::{InferError, Node, NodeKind, TypeInferer};

/// A freshly computed value and, if it turned into `error` here, why.
pub(crate) struct Recalc {
    pub(crate) value: TypeData,
    pub(crate) conflict: Option<String>,
}

impl Recalc {
    pub(crate) fn ok(value: TypeData) -> Self {
        Recalc {
            value,
            conflict: None,
        }
    }
}

impl TypeInferer {
    /// Recompute `node` and commit the result. Returns whether the committed
    /// value changed.
    pub(crate) fn recalculate(&self, node: &Node) -> Result<bool, InferError> {
        let previous = node.value();
        let Recalc { value, conflict } = match node.kind() {
            NodeKind::Type(_) => return Ok(false),
            NodeKind::Expr(expr) => self.recalc_expr(node, expr, &previous)?,
            NodeKind::Var(var) => self.recalc_var(node, var, &previous)?,
        };
        let ctx = self.context();
        tracing::trace!(
            node = ?node.id(),
            value = %value.display(ctx),
            "recalculated"
        );
        if value == *previous {
            return Ok(false);
        }
        // Only errors that arise here are reported; an `error` flowing in
        // from a source was reported where it arose.
        let arose_here = value.is_error() && !previous.is_error();
        if let Some(reason) = conflict.filter(|_| arose_here) {
            self.report_lattice_error(node, reason);
        }
        node.commit(value);
        Ok(true)
    }
}
