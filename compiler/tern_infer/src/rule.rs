//! The result-type mini-language for builtin and annotated functions.
//!
//! A `TypeRule` tree is produced by the annotation parser, e.g.
//! `array_values(array<T>) -> array<T>` becomes
//! `Compose { kind: Array, items: [(ANY, Index(Arg(0), None))] }`.

use std::sync::Arc;

use tern_types::{ClassId, JoinMode, Key, PrimitiveKind, TypeContext, TypeData, TypeFlags};

use crate::InferError;

#[derive(Clone, Debug, PartialEq)]
pub enum TypeRule {
    Fixed(TypeData),
    /// The type of argument `n`.
    Arg(usize),
    DropOptional(Box<TypeRule>),
    /// Join of all operands.
    Lca(Vec<TypeRule>),
    /// Return type of the callback passed as argument `n`.
    CallbackReturn(usize),
    /// Element of the inner type at a constant key, or at `Key::ANY`.
    Index(Box<TypeRule>, Option<Key>),
    Instance(ClassId),
    /// A container or scalar assembled from parts.
    Compose {
        kind: PrimitiveKind,
        or_null: bool,
        or_false: bool,
        items: Vec<(Key, TypeRule)>,
    },
}

/// What a rule can ask about the call it is evaluated for.
pub(crate) trait RuleEnv {
    fn callee(&self) -> String;

    fn arg(&mut self, index: usize) -> Result<Option<Arc<TypeData>>, InferError>;

    /// `None` if argument `index` is absent; an error if it is not a callback.
    fn callback_return(&mut self, index: usize) -> Result<Option<Arc<TypeData>>, InferError>;
}

impl TypeRule {
    pub fn arg(n: usize) -> Self {
        TypeRule::Arg(n)
    }

    pub fn array_of(element: TypeRule) -> Self {
        TypeRule::Compose {
            kind: PrimitiveKind::Array,
            or_null: false,
            or_false: false,
            items: vec![(Key::ANY, element)],
        }
    }

    /// Element type of argument `n`.
    pub fn element_of(n: usize) -> Self {
        TypeRule::Index(Box::new(TypeRule::Arg(n)), None)
    }

    pub(crate) fn eval(
        &self,
        ctx: &TypeContext,
        env: &mut impl RuleEnv,
    ) -> Result<TypeData, InferError> {
        Ok(match self {
            TypeRule::Fixed(value) => value.clone(),
            TypeRule::Arg(n) => {
                let value = env.arg(*n)?.ok_or_else(|| missing(env, *n))?;
                (*value).clone()
            }
            TypeRule::DropOptional(inner) => inner.eval(ctx, env)?.drop_optional(),
            TypeRule::Lca(operands) => {
                let mut acc = TypeData::any();
                for operand in operands {
                    acc.join_with(ctx, &operand.eval(ctx, env)?, JoinMode::KEEP);
                }
                acc
            }
            TypeRule::CallbackReturn(n) => {
                let value = env.callback_return(*n)?.ok_or_else(|| missing(env, *n))?;
                (*value).clone()
            }
            TypeRule::Index(inner, key) => {
                let base = inner.eval(ctx, env)?;
                let path = ctx.root_path().child(key.unwrap_or(Key::ANY));
                base.read_at(ctx, &path)
            }
            TypeRule::Instance(class) => TypeData::instance(*class),
            TypeRule::Compose {
                kind,
                or_null,
                or_false,
                items,
            } => {
                let mut out = TypeData::of(*kind);
                for (key, item) in items {
                    let value = item.eval(ctx, env)?;
                    if kind.is_keyed() {
                        out = out.with_subkey(*key, value);
                    } else {
                        out.set_lca_at(ctx, &ctx.root_path().child(*key), &value, JoinMode::KEEP);
                    }
                }
                let mut flags = TypeFlags::empty();
                flags.set(TypeFlags::OR_NULL, *or_null);
                flags.set(TypeFlags::OR_FALSE, *or_false);
                out.with_flags(flags)
            }
        })
    }

    /// Highest argument index the rule reads, if any.
    pub fn max_arg(&self) -> Option<usize> {
        match self {
            TypeRule::Fixed(_) | TypeRule::Instance(_) => None,
            TypeRule::Arg(n) | TypeRule::CallbackReturn(n) => Some(*n),
            TypeRule::DropOptional(inner) | TypeRule::Index(inner, _) => inner.max_arg(),
            TypeRule::Lca(operands) => operands.iter().filter_map(TypeRule::max_arg).max(),
            TypeRule::Compose { items, .. } => {
                items.iter().filter_map(|(_, rule)| rule.max_arg()).max()
            }
        }
    }
}

fn missing(env: &impl RuleEnv, n: usize) -> InferError {
    InferError::MalformedRule {
        callee: env.callee(),
        detail: format!("argument #{} is missing", n + 1),
    }
}

#[cfg(test)]
mod tests;
