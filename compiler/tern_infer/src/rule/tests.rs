use std::sync::Arc;

use pretty_assertions::assert_eq;
use tern_types::{Key, PrimitiveKind, TypeContext, TypeData};

use super::{RuleEnv, TypeRule};
use crate::InferError;

struct Args {
    args: Vec<TypeData>,
    callback: Option<TypeData>,
}

impl RuleEnv for Args {
    fn callee(&self) -> String {
        "f".to_string()
    }

    fn arg(&mut self, index: usize) -> Result<Option<Arc<TypeData>>, InferError> {
        Ok(self.args.get(index).cloned().map(Arc::new))
    }

    fn callback_return(&mut self, index: usize) -> Result<Option<Arc<TypeData>>, InferError> {
        if index >= self.args.len() {
            return Ok(None);
        }
        Ok(self.callback.clone().map(Arc::new))
    }
}

fn env(args: Vec<TypeData>) -> Args {
    Args {
        args,
        callback: None,
    }
}

fn int() -> TypeData {
    TypeData::of(PrimitiveKind::Int)
}

#[test]
fn arg_and_element() {
    let ctx = TypeContext::default();
    let mut args = env(vec![TypeData::array_of(int())]);
    assert_eq!(
        TypeRule::arg(0).eval(&ctx, &mut args),
        Ok(TypeData::array_of(int()))
    );
    assert_eq!(TypeRule::element_of(0).eval(&ctx, &mut args), Ok(int()));
}

#[test]
fn missing_argument_is_malformed() {
    let ctx = TypeContext::default();
    let err = TypeRule::arg(2).eval(&ctx, &mut env(vec![int()]));
    assert_eq!(
        err,
        Err(InferError::MalformedRule {
            callee: "f".into(),
            detail: "argument #3 is missing".into(),
        })
    );
}

#[test]
fn lca_and_drop_optional() {
    let ctx = TypeContext::default();
    let mut args = env(vec![int().or_null(), TypeData::of(PrimitiveKind::Float)]);
    let rule = TypeRule::Lca(vec![
        TypeRule::DropOptional(Box::new(TypeRule::arg(0))),
        TypeRule::arg(1),
    ]);
    assert_eq!(rule.eval(&ctx, &mut args), Ok(TypeData::of(PrimitiveKind::Float)));
}

#[test]
fn compose_array_of_callback_returns() {
    let ctx = TypeContext::default();
    let mut args = Args {
        args: vec![TypeData::any(), TypeData::array_of(int())],
        callback: Some(TypeData::of(PrimitiveKind::String)),
    };
    let rule = TypeRule::array_of(TypeRule::CallbackReturn(0));
    assert_eq!(
        rule.eval(&ctx, &mut args),
        Ok(TypeData::array_of(TypeData::of(PrimitiveKind::String)))
    );
}

#[test]
fn compose_tuple_and_flags() {
    let ctx = TypeContext::default();
    let rule = TypeRule::Compose {
        kind: PrimitiveKind::Tuple,
        or_null: false,
        or_false: true,
        items: vec![
            (ctx.keys.item(0), TypeRule::arg(0)),
            (ctx.keys.item(1), TypeRule::Fixed(TypeData::of(PrimitiveKind::String))),
        ],
    };
    let expected =
        TypeData::tuple(&ctx, [int(), TypeData::of(PrimitiveKind::String)]).or_false();
    assert_eq!(rule.eval(&ctx, &mut env(vec![int()])), Ok(expected));
}

#[test]
fn index_with_constant_key() {
    let ctx = TypeContext::default();
    let shape = TypeData::shape(&ctx, [("id", int())]);
    let rule = TypeRule::Index(Box::new(TypeRule::arg(0)), Some(ctx.keys.string("id")));
    assert_eq!(rule.eval(&ctx, &mut env(vec![shape])), Ok(int()));
    assert_eq!(
        TypeRule::Index(Box::new(TypeRule::Fixed(int())), Some(Key::ANY))
            .eval(&ctx, &mut env(vec![])),
        Ok(TypeData::error())
    );
}

#[test]
fn max_arg() {
    assert_eq!(TypeRule::Fixed(int()).max_arg(), None);
    assert_eq!(
        TypeRule::Lca(vec![TypeRule::arg(1), TypeRule::CallbackReturn(3)]).max_arg(),
        Some(3)
    );
}
