//! Rendering `TypeData` the way diagnostics print types.
//!
//! `?int`, `int|false`, `array<int>`, `tuple(int, string)`,
//! `shape(x:int, ...)`, `future<int>`, class names, `?mixed(int|string)`,
//! and a `*` prefix per indirection level. A `mixed` with every part set
//! prints as plain `mixed`.

use std::fmt;

use crate::{PrimitiveKind, TypeContext, TypeData, TypeFlags};

pub struct TypeDisplay<'a> {
    data: &'a TypeData,
    ctx: &'a TypeContext,
}

impl TypeData {
    pub fn display<'a>(&'a self, ctx: &'a TypeContext) -> TypeDisplay<'a> {
        TypeDisplay { data: self, ctx }
    }
}

impl TypeDisplay<'_> {
    fn nested<'b>(&'b self, data: &'b TypeData) -> TypeDisplay<'b> {
        TypeDisplay {
            data,
            ctx: self.ctx,
        }
    }

    fn write_core(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data;
        match data.kind() {
            PrimitiveKind::Array | PrimitiveKind::Future | PrimitiveKind::FutureQueue => {
                f.write_str(data.kind().as_str())?;
                if let Some(elem) = data.element() {
                    write!(f, "<{}>", self.nested(elem))?;
                }
                Ok(())
            }
            PrimitiveKind::Tuple => {
                let mut items: Vec<(i64, &TypeData)> = data
                    .subkeys()
                    .iter()
                    .map(|(k, v)| (self.ctx.keys.as_int(*k).unwrap_or(i64::MAX), v))
                    .collect();
                items.sort_by_key(|(i, _)| *i);
                f.write_str("tuple(")?;
                for (n, (_, item)) in items.iter().enumerate() {
                    if n > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.nested(item))?;
                }
                f.write_str(")")
            }
            PrimitiveKind::Shape => {
                let mut fields: Vec<(String, &TypeData)> = data
                    .subkeys()
                    .iter()
                    .map(|(k, v)| (self.ctx.keys.lookup(*k).to_string(), v))
                    .collect();
                fields.sort_by(|a, b| a.0.cmp(&b.0));
                f.write_str("shape(")?;
                for (n, (name, field)) in fields.iter().enumerate() {
                    if n > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}:{}", self.nested(field))?;
                }
                if data.flags().contains(TypeFlags::SHAPE_HAS_VARG) {
                    f.write_str(if fields.is_empty() { "..." } else { ", ..." })?;
                }
                f.write_str(")")
            }
            PrimitiveKind::Mixed => {
                f.write_str("mixed")?;
                if data.is_unrestricted_mixed() {
                    return Ok(());
                }
                f.write_str("(")?;
                for (n, kind) in data.flags().mixed_kinds().enumerate() {
                    if n > 0 {
                        f.write_str("|")?;
                    }
                    f.write_str(kind.as_str())?;
                    if let (PrimitiveKind::Array, Some(elem)) = (kind, data.element()) {
                        write!(f, "<{}>", self.nested(elem))?;
                    }
                }
                f.write_str(")")
            }
            PrimitiveKind::Class if !data.classes().is_empty() => {
                for (n, &class) in data.classes().iter().enumerate() {
                    if n > 0 {
                        f.write_str("|")?;
                    }
                    let name = self.ctx.classes.name(class);
                    f.write_str(self.ctx.names.lookup(name))?;
                }
                Ok(())
            }
            kind => f.write_str(kind.as_str()),
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.data.indirection() {
            f.write_str("*")?;
        }
        if self.data.is_or_null() && !self.data.is_unrestricted_mixed() {
            f.write_str("?")?;
        }
        self.write_core(f)?;
        if self.data.is_or_false() {
            f.write_str("|false")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
