//! Expressions: a value computed from structural inputs.
//!
//! On the first pass every input read also links an edge from the input to
//! the expression, before the read, so a change racing with the pass still
//! reschedules it.

use std::sync::Arc;

use tern_ir::Name;
use tern_types::{explain_conflict, JoinMode, PrimitiveKind, TypeContext, TypeData};

use super::Recalc;
use crate::rule::RuleEnv;
use crate::{
    BinaryOp, CallResult, ExprKind, ExprNode, IndexKey, InferError, Node, NodeId, TypeInferer,
    UnaryOp,
};

struct Inputs<'a> {
    solver: &'a TypeInferer,
    target: NodeId,
    link: bool,
}

impl Inputs<'_> {
    fn read(&self, id: NodeId) -> Result<Arc<TypeData>, InferError> {
        if self.link {
            self.solver.graph.link_once(id, self.target)?;
        }
        Ok(self.solver.graph.node(id)?.value())
    }
}

impl TypeInferer {
    pub(super) fn recalc_expr(
        &self,
        node: &Node,
        expr: &ExprNode,
        previous: &TypeData,
    ) -> Result<Recalc, InferError> {
        let inputs = Inputs {
            solver: self,
            target: node.id(),
            link: !expr.inputs_linked(),
        };
        let fresh = self.eval_expr(&expr.kind, &inputs)?;
        if inputs.link {
            expr.mark_inputs_linked();
        }

        // Committed information is never dropped.
        let ctx = self.context();
        let mut value = previous.clone();
        value.join_with(ctx, &fresh.value, JoinMode::KEEP);
        let conflict = fresh.conflict.or_else(|| {
            (value.is_error() && !fresh.value.is_error())
                .then(|| explain_conflict(ctx, previous, &fresh.value))
                .flatten()
        });
        Ok(Recalc { value, conflict })
    }

    fn eval_expr(&self, kind: &ExprKind, inputs: &Inputs<'_>) -> Result<Recalc, InferError> {
        let ctx = self.context();
        Ok(match kind {
            ExprKind::Const(kind) => Recalc::ok(TypeData::of(*kind)),
            ExprKind::Fixed(value) => Recalc::ok(value.clone()),
            ExprKind::VarRead { var, narrowing } => {
                Recalc::ok(inputs.read(*var)?.narrowed(*narrowing))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = inputs.read(*lhs)?;
                let rhs = inputs.read(*rhs)?;
                binary(ctx, *op, &lhs, &rhs)
            }
            ExprKind::Unary { op, operand } => unary(*op, &*inputs.read(*operand)?),
            ExprKind::Index { base, key } => index(ctx, &*inputs.read(*base)?, *key),
            ExprKind::ArrayLiteral(items) => {
                let mut value = TypeData::of(PrimitiveKind::Array);
                let mut conflict = None;
                for item in items {
                    let item = inputs.read(*item)?;
                    let before = value.element().cloned();
                    value.set_lca_at(ctx, ctx.any_key_path(), &item, JoinMode::KEEP);
                    if value.is_error() && conflict.is_none() {
                        conflict = before
                            .and_then(|elem| explain_conflict(ctx, &elem, &item))
                            .map(|reason| format!("in array element: {reason}"));
                    }
                }
                Recalc { value, conflict }
            }
            ExprKind::TupleLiteral(items) => {
                let items = items
                    .iter()
                    .map(|item| inputs.read(*item).map(|v| (*v).clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                Recalc::ok(TypeData::tuple(ctx, items))
            }
            ExprKind::ShapeLiteral(fields) => {
                let mut value = TypeData::of(PrimitiveKind::Shape);
                for (key, field) in fields {
                    value = value.with_subkey(*key, (*inputs.read(*field)?).clone());
                }
                Recalc::ok(value)
            }
            ExprKind::Ternary { then, otherwise } => {
                let then = inputs.read(*then)?;
                let otherwise = inputs.read(*otherwise)?;
                joined(ctx, &then, &otherwise, JoinMode::KEEP)
            }
            ExprKind::Call {
                callee,
                args,
                result,
            } => match result {
                CallResult::ReturnSlot(slot) => Recalc::ok((*inputs.read(*slot)?).clone()),
                CallResult::Rule(rule) => {
                    let mut env = CallEnv {
                        inputs,
                        callee: *callee,
                        args,
                    };
                    let value = rule.eval(ctx, &mut env)?;
                    let conflict = if value.is_error() && !self.any_error(args)? {
                        Some(format!(
                            "{}() cannot be applied to these arguments",
                            env.callee()
                        ))
                    } else {
                        None
                    };
                    Recalc { value, conflict }
                }
            },
            // Closures are objects at runtime; their result flows through
            // `CallbackReturn`.
            ExprKind::Lambda { .. } => Recalc::ok(TypeData::of(PrimitiveKind::Object)),
            ExprKind::New(class) => Recalc::ok(TypeData::instance(*class)),
            ExprKind::Assign { value } => Recalc::ok((*inputs.read(*value)?).clone()),
            ExprKind::Isset(_) | ExprKind::InstanceOf => {
                Recalc::ok(TypeData::of(PrimitiveKind::Bool))
            }
            ExprKind::Fork(call) => Recalc::ok(TypeData::future_of((*inputs.read(*call)?).clone())),
            ExprKind::Wait(future) => wait(ctx, &*inputs.read(*future)?),
        })
    }
}

impl TypeInferer {
    fn any_error(&self, args: &[NodeId]) -> Result<bool, InferError> {
        for id in args {
            if self.graph.node(*id)?.value().is_error() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

struct CallEnv<'a, 'b> {
    inputs: &'b Inputs<'a>,
    callee: Name,
    args: &'b [NodeId],
}

impl RuleEnv for CallEnv<'_, '_> {
    fn callee(&self) -> String {
        self.inputs
            .solver
            .context()
            .names
            .lookup(self.callee)
            .to_string()
    }

    fn arg(&mut self, index: usize) -> Result<Option<Arc<TypeData>>, InferError> {
        self.args
            .get(index)
            .map(|id| self.inputs.read(*id))
            .transpose()
    }

    fn callback_return(&mut self, index: usize) -> Result<Option<Arc<TypeData>>, InferError> {
        let Some(&id) = self.args.get(index) else {
            return Ok(None);
        };
        let node = self.inputs.solver.graph.node(id)?;
        match node.as_expr().map(|expr| &expr.kind) {
            Some(ExprKind::Lambda { returns }) => self.inputs.read(*returns).map(Some),
            _ => Err(InferError::MalformedRule {
                callee: self.callee(),
                detail: format!("argument #{} is not a callback", index + 1),
            }),
        }
    }
}

fn joined(ctx: &TypeContext, a: &TypeData, b: &TypeData, mode: JoinMode) -> Recalc {
    let value = tern_types::join(ctx, a, b, mode);
    let conflict = (value.is_error() && !a.is_error() && !b.is_error())
        .then(|| explain_conflict(ctx, a, b))
        .flatten();
    Recalc { value, conflict }
}

/// Operand of arithmetic: optional-ness dropped, booleans count as ints.
fn numeric(value: &TypeData) -> TypeData {
    let value = value.drop_optional();
    match value.kind() {
        PrimitiveKind::Bool | PrimitiveKind::False | PrimitiveKind::Null => {
            TypeData::of(PrimitiveKind::Int)
        }
        _ => value,
    }
}

fn is_stringy(value: &TypeData) -> bool {
    matches!(value.kind(), PrimitiveKind::String | PrimitiveKind::Mixed)
}

fn binary(ctx: &TypeContext, op: BinaryOp, lhs: &TypeData, rhs: &TypeData) -> Recalc {
    if op.is_boolean() {
        return Recalc::ok(TypeData::of(PrimitiveKind::Bool));
    }
    if op.is_integral() {
        return Recalc::ok(TypeData::of(PrimitiveKind::Int));
    }
    match op {
        BinaryOp::Div => Recalc::ok(TypeData::of(PrimitiveKind::Float)),
        BinaryOp::Concat => Recalc::ok(TypeData::of(PrimitiveKind::String)),
        BinaryOp::Coalesce => {
            let mut value = TypeData::any();
            value.join_with(ctx, lhs, JoinMode::DROP_OR_NULL);
            let left = value.clone();
            value.join_with(ctx, rhs, JoinMode::KEEP);
            let conflict = (value.is_error() && !left.is_error() && !rhs.is_error())
                .then(|| explain_conflict(ctx, &left, rhs))
                .flatten();
            Recalc { value, conflict }
        }
        _ => {
            if is_stringy(lhs) || is_stringy(rhs) {
                return Recalc::ok(TypeData::of(PrimitiveKind::Mixed));
            }
            joined(ctx, &numeric(lhs), &numeric(rhs), JoinMode::KEEP)
        }
    }
}

fn unary(op: UnaryOp, operand: &TypeData) -> Recalc {
    let value = match op {
        UnaryOp::Not | UnaryOp::BoolCast => TypeData::of(PrimitiveKind::Bool),
        UnaryOp::BitNot | UnaryOp::IntCast => TypeData::of(PrimitiveKind::Int),
        UnaryOp::FloatCast => TypeData::of(PrimitiveKind::Float),
        UnaryOp::StringCast => TypeData::of(PrimitiveKind::String),
        UnaryOp::Neg | UnaryOp::Plus => {
            let value = numeric(operand);
            match value.kind() {
                PrimitiveKind::Any | PrimitiveKind::Int | PrimitiveKind::Float => value,
                k if k.is_scalar_like() && k != PrimitiveKind::Array => {
                    TypeData::of(PrimitiveKind::Mixed)
                }
                PrimitiveKind::Error => TypeData::error(),
                _ => {
                    return Recalc {
                        value: TypeData::error(),
                        conflict: Some(format!("arithmetic on {}", value.kind())),
                    }
                }
            }
        }
        UnaryOp::ArrayCast => match operand.kind() {
            PrimitiveKind::Array => operand.drop_optional(),
            PrimitiveKind::Any | PrimitiveKind::Null => TypeData::of(PrimitiveKind::Array),
            PrimitiveKind::Error => TypeData::error(),
            PrimitiveKind::Tuple | PrimitiveKind::Shape | PrimitiveKind::Mixed => {
                TypeData::array_of(TypeData::of(PrimitiveKind::Mixed))
            }
            _ => TypeData::array_of(operand.drop_optional()),
        },
    };
    Recalc::ok(value)
}

fn index(ctx: &TypeContext, base: &TypeData, key: IndexKey) -> Recalc {
    let path = ctx.root_path().child(key.key());
    let value = base.read_at(ctx, &path);
    let conflict = (value.is_error() && !base.is_error()).then(|| match key {
        IndexKey::Const(key) => format!(
            "cannot read element [{}] of {}",
            ctx.keys.lookup(key),
            base.display(ctx)
        ),
        IndexKey::Dynamic => format!(
            "cannot read an element of {} with a non-constant key",
            base.display(ctx)
        ),
    });
    Recalc { value, conflict }
}

fn wait(ctx: &TypeContext, future: &TypeData) -> Recalc {
    match future.kind() {
        PrimitiveKind::Future | PrimitiveKind::FutureQueue => Recalc::ok(
            future
                .element()
                .cloned()
                .unwrap_or_else(TypeData::any),
        ),
        PrimitiveKind::Any => Recalc::ok(TypeData::any()),
        PrimitiveKind::Error => Recalc::ok(TypeData::error()),
        _ => Recalc {
            value: TypeData::error(),
            conflict: Some(format!("wait() on non-future {}", future.display(ctx))),
        },
    }
}
