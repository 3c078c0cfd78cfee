//! Variables: the join of everything flowing in.

use std::sync::Arc;

use tern_types::{explain_conflict, JoinMode, TypeContext, TypeData};

use super::Recalc;
use crate::node::Mismatch;
use crate::{Edge, EdgeId, InferError, Node, TypeInferer, VarNode};

struct Contribution {
    id: EdgeId,
    edge: Edge,
    value: Arc<TypeData>,
}

impl Contribution {
    fn apply(&self, ctx: &TypeContext, target: &mut TypeData) {
        match &self.edge.path {
            None => target.join_with(ctx, &self.value, JoinMode::KEEP),
            Some(path) => target.set_lca_at(ctx, path, &self.value, JoinMode::KEEP),
        }
    }
}

impl TypeInferer {
    pub(super) fn recalc_var(
        &self,
        node: &Node,
        var: &VarNode,
        previous: &TypeData,
    ) -> Result<Recalc, InferError> {
        let ctx = self.context();
        let contributions = self
            .graph
            .sources(node)?
            .into_iter()
            .map(|(id, edge)| {
                let value = self.graph.node(edge.from)?.value();
                Ok(Contribution { id, edge, value })
            })
            .collect::<Result<Vec<_>, InferError>>()?;

        let mut value = previous.clone();
        for contribution in &contributions {
            contribution.apply(ctx, &mut value);
        }

        if let Some(declared) = var.type_restriction() {
            if !value.is_less_or_equal(ctx, declared) {
                value = replay_within(ctx, var, previous, declared, &contributions);
            }
            return Ok(Recalc::ok(value));
        }

        let conflict = if value.is_error() && !previous.is_error() {
            first_conflict(ctx, previous, &contributions)
        } else {
            None
        };
        Ok(Recalc { value, conflict })
    }
}

/// Rebuild from `previous`, keeping only contributions that stay within
/// `declared`. The first rejected one is recorded on the variable.
fn replay_within(
    ctx: &TypeContext,
    var: &VarNode,
    previous: &TypeData,
    declared: &TypeData,
    contributions: &[Contribution],
) -> TypeData {
    let mut value = previous.clone();
    for contribution in contributions {
        let mut trial = value.clone();
        contribution.apply(ctx, &mut trial);
        if trial.is_less_or_equal(ctx, declared) {
            value = trial;
        } else {
            var.record_mismatch(Mismatch {
                edge: contribution.id,
                value: (*contribution.value).clone(),
            });
        }
    }
    value
}

/// Find the contribution that first turned the value into `error`.
fn first_conflict(
    ctx: &TypeContext,
    previous: &TypeData,
    contributions: &[Contribution],
) -> Option<String> {
    let mut value = previous.clone();
    for contribution in contributions {
        let before = value.clone();
        contribution.apply(ctx, &mut value);
        if !value.is_error() {
            continue;
        }
        return match &contribution.edge.path {
            None => explain_conflict(ctx, &before, &contribution.value),
            Some(path) => {
                let slot = before.read_at(ctx, path);
                let at = path.display(&ctx.keys);
                Some(
                    explain_conflict(ctx, &slot, &contribution.value).map_or_else(
                        || format!("cannot write {} at {at}", contribution.value.display(ctx)),
                        |reason| format!("at {at}: {reason}"),
                    ),
                )
            }
        };
    }
    None
}
