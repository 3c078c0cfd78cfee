//! Human-readable reasons for a join that collapsed to `error`.

use crate::{join, JoinMode, Key, KeyData, PrimitiveKind, TypeContext, TypeData};

fn class_names(ctx: &TypeContext, data: &TypeData) -> String {
    data.classes()
        .iter()
        .map(|&id| ctx.names.lookup(ctx.classes.name(id)))
        .collect::<Vec<_>>()
        .join("|")
}

/// Explain why `join(a, b)` is `error`.
///
/// Returns `None` when the two values merge fine or one of them already is
/// `error` (the conflict was reported where it first appeared).
pub fn explain_conflict(ctx: &TypeContext, a: &TypeData, b: &TypeData) -> Option<String> {
    if a.is_error() || b.is_error() || a.is_any() || b.is_any() {
        return None;
    }
    if !join(ctx, a, b, JoinMode::KEEP).is_error() {
        return None;
    }

    let (ka, kb) = (a.kind(), b.kind());
    let optional = |k: PrimitiveKind| matches!(k, PrimitiveKind::Null | PrimitiveKind::False);

    if a.indirection() != b.indirection() && !optional(ka) && !optional(kb) {
        return Some(format!(
            "mixing values with different indirection: {} and {}",
            a.display(ctx),
            b.display(ctx)
        ));
    }

    match (ka, kb) {
        (PrimitiveKind::Class, PrimitiveKind::Class) => Some(format!(
            "mixing classes {} and {} which have no common ancestor",
            class_names(ctx, a),
            class_names(ctx, b)
        )),
        (PrimitiveKind::Void, _) | (_, PrimitiveKind::Void) => {
            let other = if ka == PrimitiveKind::Void { b } else { a };
            Some(format!("mixing void with non-void {}", other.display(ctx)))
        }
        (PrimitiveKind::Tuple, PrimitiveKind::Tuple) => {
            let (xs, ys) = (a.subkeys(), b.subkeys());
            if xs.len() != ys.len() {
                return Some(format!(
                    "mixing tuples of different arity ({} and {})",
                    xs.len(),
                    ys.len()
                ));
            }
            xs.iter().zip(ys).enumerate().find_map(|(i, ((_, x), (_, y)))| {
                explain_conflict(ctx, x, y).map(|inner| format!("in tuple item {i}: {inner}"))
            })
        }
        (PrimitiveKind::Tuple, _) | (_, PrimitiveKind::Tuple) => {
            let other = if ka == PrimitiveKind::Tuple { b } else { a };
            Some(format!("mixing tuple with non-tuple {}", other.display(ctx)))
        }
        (PrimitiveKind::Shape, PrimitiveKind::Shape) => {
            for (key, x) in a.subkeys() {
                let field = ctx.keys.lookup(*key);
                match b.subkey(*key) {
                    Some(y) => {
                        if let Some(inner) = explain_conflict(ctx, x, y) {
                            return Some(format!("in shape field '{field}': {inner}"));
                        }
                    }
                    None => {
                        return Some(format!("mixing shapes with different keys: '{field}' is missing"));
                    }
                }
            }
            let missing = b
                .subkeys()
                .iter()
                .find(|(key, _)| a.subkey(*key).is_none())
                .map_or(KeyData::Any, |(key, _)| ctx.keys.lookup(*key));
            Some(format!("mixing shapes with different keys: '{missing}' is missing"))
        }
        (PrimitiveKind::Shape, _) | (_, PrimitiveKind::Shape) => {
            let other = if ka == PrimitiveKind::Shape { b } else { a };
            Some(format!("mixing shape with non-shape {}", other.display(ctx)))
        }
        _ if ka == kb && ka.is_array_like() => match (a.element(), b.element()) {
            (Some(x), Some(y)) => explain_conflict(ctx, x, y)
                .map(|inner| format!("in {} element: {inner}", ka.as_str())),
            _ => None,
        },
        (PrimitiveKind::Array | PrimitiveKind::Mixed, PrimitiveKind::Array | PrimitiveKind::Mixed) => {
            match (a.subkey(Key::ANY), b.subkey(Key::ANY)) {
                (Some(x), Some(y)) => explain_conflict(ctx, x, y)
                    .map(|inner| format!("in array element: {inner}")),
                _ => None,
            }
        }
        _ => Some(format!(
            "mixing {} with {}",
            a.display(ctx),
            b.display(ctx)
        )),
    }
}
