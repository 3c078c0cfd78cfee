//! Lattice operations on `TypeData`.
//!
//! - join ("LCA"): least upper bound, computed in place
//! - `set_lca_at`: join into the sub-structure addressed by a path
//! - `read_at` / `const_read_at`: projections along a path
//! - `is_less_or_equal`: `join(expected, given) == expected`
//! - `narrowed`: apply a smart-cast exclusion mask
//!
//! `any` is the identity of join and `error` absorbs everything. Joins are
//! monotone: flags and class sets only grow, subkeys only widen.

mod explain;

pub use explain::explain_conflict;

use smallvec::SmallVec;

use crate::{
    ClassId, CommonAncestor, Key, KindMask, MultiKey, PrimitiveKind, TypeContext, TypeData,
    TypeFlags,
};

/// How the incoming side's optional-ness is treated by a join.
///
/// Null-coalescing and narrowing peel optional-ness off before merging.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Debug)]
pub struct JoinMode {
    pub drop_or_null: bool,
    pub drop_or_false: bool,
}

impl JoinMode {
    pub const KEEP: JoinMode = JoinMode {
        drop_or_null: false,
        drop_or_false: false,
    };

    pub const DROP_OR_NULL: JoinMode = JoinMode {
        drop_or_null: true,
        drop_or_false: false,
    };

    pub const DROP_OPTIONAL: JoinMode = JoinMode {
        drop_or_null: true,
        drop_or_false: true,
    };

    #[inline]
    fn strip(self, mut flags: TypeFlags) -> TypeFlags {
        if self.drop_or_null {
            flags.remove(TypeFlags::OR_NULL);
        }
        if self.drop_or_false {
            flags.remove(TypeFlags::OR_FALSE);
        }
        flags
    }
}

/// Join two values into a fresh one.
pub fn join(ctx: &TypeContext, a: &TypeData, b: &TypeData, mode: JoinMode) -> TypeData {
    let mut out = a.clone();
    out.join_with(ctx, b, mode);
    out
}

/// `given <= expected` in the lattice order.
pub fn is_less_or_equal(ctx: &TypeContext, given: &TypeData, expected: &TypeData) -> bool {
    let mut joined = expected.clone();
    joined.join_with(ctx, given, JoinMode::KEEP);
    joined == *expected
}

/// Restricted-mixed bits contributed by one side's kind.
fn mixed_parts(data: &TypeData) -> TypeFlags {
    match data.kind {
        PrimitiveKind::Mixed => {
            let parts = data.flags & TypeFlags::MIXED_PARTS;
            if parts.is_empty() {
                TypeFlags::MIXED_PARTS
            } else {
                parts
            }
        }
        PrimitiveKind::Null => TypeFlags::empty(),
        kind => TypeFlags::mixed_part(kind),
    }
}

enum KindMerge {
    Keep(PrimitiveKind),
    /// Our side is a bare `null`/`false`: take the incoming structure.
    Adopt,
    Mixed,
    Error,
}

fn merge_kinds(a: PrimitiveKind, b: PrimitiveKind) -> KindMerge {
    use PrimitiveKind::{Class, False, Float, Int, Null, Object};

    match (a, b) {
        _ if a == b => KindMerge::Keep(a),
        (Null, _) => KindMerge::Adopt,
        (_, Null) => KindMerge::Keep(a),
        (False, _) => KindMerge::Adopt,
        (_, False) => KindMerge::Keep(a),
        (Int, Float) | (Float, Int) => KindMerge::Keep(Float),
        (Class, Object) | (Object, Class) => KindMerge::Keep(Object),
        _ if a.is_scalar_like() && b.is_scalar_like() => KindMerge::Mixed,
        _ => KindMerge::Error,
    }
}

#[inline]
fn is_bare_optional(kind: PrimitiveKind) -> bool {
    matches!(kind, PrimitiveKind::Null | PrimitiveKind::False)
}

impl TypeData {
    /// Join `other` into `self` (the "LCA" operation).
    pub fn join_with(&mut self, ctx: &TypeContext, other: &TypeData, mode: JoinMode) {
        if self.is_error() {
            return;
        }
        if other.is_error() {
            *self = TypeData::error();
            return;
        }

        // A bare null/false with its optional-ness dropped contributes nothing.
        if (other.kind == PrimitiveKind::Null && mode.drop_or_null)
            || (other.kind == PrimitiveKind::False && mode.drop_or_false)
        {
            return;
        }

        let incoming = mode.strip(other.flags);

        if other.is_any() {
            self.flags |= incoming;
            self.normalize();
            return;
        }
        if self.is_any() {
            let own = self.flags;
            *self = other.clone();
            self.flags = own | incoming;
            self.normalize();
            return;
        }

        let a = self.kind;
        let b = other.kind;

        if self.indirection != other.indirection && !is_bare_optional(a) && !is_bare_optional(b)
        {
            *self = TypeData::error();
            return;
        }

        let mut flags = self.flags | incoming;
        if a == PrimitiveKind::Null || b == PrimitiveKind::Null {
            flags |= TypeFlags::OR_NULL;
        } else if a == PrimitiveKind::False || b == PrimitiveKind::False {
            flags |= TypeFlags::OR_FALSE;
        }

        let kind = match merge_kinds(a, b) {
            KindMerge::Adopt => {
                *self = other.clone();
                self.flags = flags;
                self.normalize();
                return;
            }
            KindMerge::Error => {
                *self = TypeData::error();
                return;
            }
            KindMerge::Mixed | KindMerge::Keep(PrimitiveKind::Mixed) => {
                self.widen_to_mixed(ctx, other, flags);
                return;
            }
            KindMerge::Keep(kind) => kind,
        };

        self.kind = kind;
        self.flags = flags;

        // Null/false on the incoming side carry no structure.
        if is_bare_optional(b) {
            self.normalize();
            return;
        }

        match kind {
            PrimitiveKind::Class => {
                if !self.join_classes(ctx, &other.classes) {
                    *self = TypeData::error();
                    return;
                }
            }
            k if k.is_array_like() => {
                if let Some(elem) = other.subkey(Key::ANY) {
                    let slot = self.subkey_slot(Key::ANY);
                    self.subkeys[slot].1.join_with(ctx, elem, JoinMode::KEEP);
                }
            }
            PrimitiveKind::Tuple => {
                if !self.join_keyed(ctx, other, false) {
                    *self = TypeData::error();
                    return;
                }
            }
            PrimitiveKind::Shape => {
                let open = self.flags.contains(TypeFlags::SHAPE_HAS_VARG);
                if !self.join_keyed(ctx, other, open) {
                    *self = TypeData::error();
                    return;
                }
            }
            _ => {}
        }

        if self.subkeys.iter().any(|(_, v)| v.is_error()) {
            *self = TypeData::error();
            return;
        }
        self.normalize();
    }

    /// Turn `self` into the `mixed` covering both sides.
    ///
    /// `flags` holds both sides' flags. `or_null` stays a flag; `or_false`
    /// becomes the bool part. Array elements survive under `Key::ANY`.
    fn widen_to_mixed(&mut self, ctx: &TypeContext, other: &TypeData, flags: TypeFlags) {
        let mut element = self.mixed_element().cloned();
        if let Some(theirs) = other.mixed_element() {
            match &mut element {
                Some(ours) => ours.join_with(ctx, theirs, JoinMode::KEEP),
                None => element = Some(theirs.clone()),
            }
        }

        let mut parts = if ctx.restricted_mixed() {
            mixed_parts(self) | mixed_parts(other)
        } else {
            TypeFlags::MIXED_PARTS
        };
        if flags.contains(TypeFlags::OR_FALSE) {
            parts |= TypeFlags::MIXED_BOOL;
        }
        let null = if ctx.restricted_mixed() {
            flags & TypeFlags::OR_NULL
        } else {
            TypeFlags::OR_NULL
        };

        self.kind = PrimitiveKind::Mixed;
        self.flags = parts | null;
        self.classes.clear();
        self.subkeys.clear();
        if let Some(element) = element {
            if element.is_error() {
                *self = TypeData::error();
                return;
            }
            self.subkeys.push((Key::ANY, element));
        }
        self.normalize();
    }

    /// Element of an array, or of the array part of a `mixed`.
    fn mixed_element(&self) -> Option<&TypeData> {
        match self.kind {
            PrimitiveKind::Array | PrimitiveKind::Mixed => self.subkey(Key::ANY),
            _ => None,
        }
    }

    /// Union class candidates, then collapse to the common ancestor.
    /// Returns `false` when the classes share nothing.
    fn join_classes(&mut self, ctx: &TypeContext, incoming: &[ClassId]) -> bool {
        let mut merged: SmallVec<[ClassId; 4]> =
            self.classes.iter().chain(incoming).copied().collect();
        merged.sort_unstable();
        merged.dedup();
        if merged.len() <= 1 {
            self.classes = merged.into_iter().collect();
            return true;
        }
        match ctx.classes.common_ancestor(&merged) {
            CommonAncestor::Unique(id) => {
                self.classes.clear();
                self.classes.push(id);
                true
            }
            CommonAncestor::Ambiguous => {
                self.classes = merged.into_iter().collect();
                true
            }
            CommonAncestor::None => false,
        }
    }

    /// Key-by-key join for tuples and shapes. With `open`, keys missing on
    /// one side are taken from the other; otherwise key sets must match.
    fn join_keyed(&mut self, ctx: &TypeContext, other: &TypeData, open: bool) -> bool {
        let same_keys = self.subkeys.len() == other.subkeys.len()
            && self
                .subkeys
                .iter()
                .zip(&other.subkeys)
                .all(|((x, _), (y, _))| x == y);
        if !same_keys && !open {
            return false;
        }
        for (key, value) in &other.subkeys {
            let slot = self.subkey_slot(*key);
            self.subkeys[slot].1.join_with(ctx, value, JoinMode::KEEP);
        }
        true
    }

    /// Join `value` into the sub-structure at `path`.
    ///
    /// `any` (and bare `null`) turn into arrays along the way; array-like
    /// kinds address their element whatever the key; tuples and shapes
    /// address the item named by a constant key. Writing into `mixed` is a
    /// no-op. Anything else becomes `error`.
    pub fn set_lca_at(
        &mut self,
        ctx: &TypeContext,
        path: &MultiKey,
        value: &TypeData,
        mode: JoinMode,
    ) {
        self.set_lca_at_keys(ctx, path.keys(), value, mode);
    }

    fn set_lca_at_keys(
        &mut self,
        ctx: &TypeContext,
        keys: &[Key],
        value: &TypeData,
        mode: JoinMode,
    ) {
        let Some((&key, rest)) = keys.split_first() else {
            self.join_with(ctx, value, mode);
            return;
        };

        let slot_key = match self.kind {
            PrimitiveKind::Error | PrimitiveKind::Mixed => return,
            PrimitiveKind::Any => {
                self.kind = PrimitiveKind::Array;
                Key::ANY
            }
            PrimitiveKind::Null => {
                self.kind = PrimitiveKind::Array;
                self.flags |= TypeFlags::OR_NULL;
                Key::ANY
            }
            k if k.is_array_like() => Key::ANY,
            PrimitiveKind::Tuple if !key.is_any() && self.subkey(key).is_some() => key,
            PrimitiveKind::Shape
                if !key.is_any()
                    && (self.subkey(key).is_some()
                        || self.flags.contains(TypeFlags::SHAPE_HAS_VARG)) =>
            {
                key
            }
            _ => {
                *self = TypeData::error();
                return;
            }
        };

        let slot = self.subkey_slot(slot_key);
        let child = &mut self.subkeys[slot].1;
        child.set_lca_at_keys(ctx, rest, value, mode);
        if child.is_error() {
            *self = TypeData::error();
        }
    }

    /// Owned projection along `path`.
    ///
    /// Falls back to `any` where nothing is known yet and to `error` where
    /// the path cannot address anything.
    pub fn read_at(&self, ctx: &TypeContext, path: &MultiKey) -> TypeData {
        self.read_at_keys(ctx, path.keys())
    }

    pub(crate) fn read_at_keys(&self, ctx: &TypeContext, keys: &[Key]) -> TypeData {
        let Some((&key, rest)) = keys.split_first() else {
            return self.clone();
        };
        match self.kind {
            PrimitiveKind::Any => TypeData::any(),
            PrimitiveKind::Mixed | PrimitiveKind::String | PrimitiveKind::Null => {
                TypeData::of(self.kind)
            }
            k if k.is_array_like() => self
                .subkey(Key::ANY)
                .map_or_else(TypeData::any, |elem| elem.read_at_keys(ctx, rest)),
            PrimitiveKind::Tuple if key.is_any() => {
                if !self.flags.contains(TypeFlags::TUPLE_AS_ARRAY) {
                    return TypeData::error();
                }
                let mut all = TypeData::any();
                for (_, item) in &self.subkeys {
                    all.join_with(ctx, item, JoinMode::KEEP);
                }
                all.read_at_keys(ctx, rest)
            }
            PrimitiveKind::Tuple => self
                .subkey(key)
                .map_or_else(TypeData::error, |item| item.read_at_keys(ctx, rest)),
            PrimitiveKind::Shape => match self.subkey(key) {
                Some(field) => field.read_at_keys(ctx, rest),
                None if self.flags.contains(TypeFlags::SHAPE_HAS_VARG) => TypeData::any(),
                None => TypeData::error(),
            },
            _ => TypeData::error(),
        }
    }

    /// Borrowing projection that only follows stored subkeys.
    ///
    /// Array-like kinds resolve any key to their element. Returns `None` if
    /// the path does not resolve.
    pub fn const_read_at(&self, path: &MultiKey) -> Option<&TypeData> {
        let mut cur = self;
        for &key in path.keys() {
            cur = if cur.kind.is_array_like() {
                cur.subkey(Key::ANY)?
            } else if cur.kind.is_keyed() {
                cur.subkey(key)?
            } else {
                return None;
            };
        }
        Some(cur)
    }

    /// Apply a smart-cast mask of kinds this read is known to exclude.
    ///
    /// Excluding `null` drops `or_null`; excluding `false` or `bool` drops
    /// `or_false`. A `mixed` loses the excluded parts and collapses to the
    /// remaining kind when only one is left, keeping `or_null` and the array
    /// element. A float part cannot be split from its int part.
    #[must_use]
    pub fn narrowed(&self, exclude: KindMask) -> TypeData {
        if exclude.is_empty() || self.is_error() {
            return self.clone();
        }
        let mut out = self.clone();
        if exclude.has(PrimitiveKind::Null) {
            out.flags.remove(TypeFlags::OR_NULL);
        }
        if exclude.has(PrimitiveKind::False) || exclude.has(PrimitiveKind::Bool) {
            out.flags.remove(TypeFlags::OR_FALSE);
        }
        if out.kind != PrimitiveKind::Mixed {
            return out;
        }

        let mut parts = out.flags & TypeFlags::MIXED_PARTS;
        for kind in parts.mixed_kinds() {
            if exclude.has(kind) {
                parts.remove(TypeFlags::mixed_bit(kind));
            }
        }
        if parts.contains(TypeFlags::MIXED_FLOAT) {
            parts |= TypeFlags::MIXED_INT;
        }
        // Everything excluded: contradictory narrowing, keep the value.
        if parts.is_empty() {
            return out;
        }
        let null = out.flags & TypeFlags::OR_NULL;

        let only = if parts == TypeFlags::MIXED_INT | TypeFlags::MIXED_FLOAT {
            Some(PrimitiveKind::Float)
        } else {
            let mut remaining = parts.mixed_kinds();
            match (remaining.next(), remaining.next()) {
                (Some(kind), None) => Some(kind),
                _ => None,
            }
        };
        let Some(kind) = only else {
            out.flags = parts | null;
            out.normalize();
            return out;
        };
        let mut single = TypeData::of(kind).with_flags(null);
        if kind == PrimitiveKind::Array {
            if let Some(element) = out.subkey(Key::ANY) {
                single.subkeys.push((Key::ANY, element.clone()));
            }
        }
        single
    }

    #[inline]
    pub fn is_less_or_equal(&self, ctx: &TypeContext, expected: &TypeData) -> bool {
        is_less_or_equal(ctx, self, expected)
    }
}
