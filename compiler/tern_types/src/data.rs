//! The lattice element.

use smallvec::SmallVec;

use crate::{ClassId, Key, PrimitiveKind, TypeContext, TypeFlags};

/// A lattice value: primitive kind, modifiers, class candidates and nested
/// values keyed by `Key`.
///
/// Subkeys are kept sorted by key handle so that equality is structural and
/// lookups are a binary search. Array-like kinds store their element under
/// `Key::ANY`; tuples and shapes store one entry per item or field.
///
/// Values published on graph nodes are never mutated; recalculation works on
/// a private clone.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeData {
    pub(crate) kind: PrimitiveKind,
    pub(crate) flags: TypeFlags,
    pub(crate) indirection: u8,
    pub(crate) classes: SmallVec<[ClassId; 1]>,
    pub(crate) subkeys: Vec<(Key, TypeData)>,
}

impl Default for TypeData {
    fn default() -> Self {
        Self::any()
    }
}

impl TypeData {
    /// The pristine value every node starts with; identity for join.
    pub fn any() -> Self {
        Self::of(PrimitiveKind::Any)
    }

    pub fn error() -> Self {
        Self::of(PrimitiveKind::Error)
    }

    /// A bare kind. Containers start without a known element; a bare
    /// `mixed` may be any scalar, `null` included.
    pub fn of(kind: PrimitiveKind) -> Self {
        let mut data = TypeData {
            kind,
            flags: TypeFlags::empty(),
            indirection: 0,
            classes: SmallVec::new(),
            subkeys: Vec::new(),
        };
        if kind == PrimitiveKind::Mixed {
            data.normalize();
        }
        data
    }

    /// A `mixed` made of the scalar kinds named by `parts`. A single part
    /// stays a `mixed`; joins never produce that form.
    pub fn mixed_of(parts: TypeFlags) -> Self {
        let mut data = Self::of(PrimitiveKind::Any);
        data.kind = PrimitiveKind::Mixed;
        data.flags = parts;
        data.normalize();
        data
    }

    pub fn array_of(element: TypeData) -> Self {
        Self::container(PrimitiveKind::Array, element)
    }

    pub fn future_of(result: TypeData) -> Self {
        Self::container(PrimitiveKind::Future, result)
    }

    pub fn future_queue_of(result: TypeData) -> Self {
        Self::container(PrimitiveKind::FutureQueue, result)
    }

    fn container(kind: PrimitiveKind, element: TypeData) -> Self {
        let mut data = Self::of(kind);
        data.subkeys.push((Key::ANY, element));
        data
    }

    pub fn tuple(ctx: &TypeContext, items: impl IntoIterator<Item = TypeData>) -> Self {
        let mut data = Self::of(PrimitiveKind::Tuple);
        for (i, item) in items.into_iter().enumerate() {
            data.insert_subkey(ctx.keys.item(i), item);
        }
        data
    }

    pub fn shape<'a>(
        ctx: &TypeContext,
        fields: impl IntoIterator<Item = (&'a str, TypeData)>,
    ) -> Self {
        let mut data = Self::of(PrimitiveKind::Shape);
        for (name, field) in fields {
            data.insert_subkey(ctx.keys.string(name), field);
        }
        data
    }

    /// Builder form of a subkey write, for values assembled from parts.
    #[must_use]
    pub fn with_subkey(mut self, key: Key, value: TypeData) -> Self {
        self.insert_subkey(key, value);
        self
    }

    /// An instance of exactly one class.
    pub fn instance(class: ClassId) -> Self {
        let mut data = Self::of(PrimitiveKind::Class);
        data.classes.push(class);
        data
    }

    #[must_use]
    pub fn or_null(mut self) -> Self {
        self.flags |= TypeFlags::OR_NULL;
        self.normalize();
        self
    }

    #[must_use]
    pub fn or_false(mut self) -> Self {
        self.flags |= TypeFlags::OR_FALSE;
        self.normalize();
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self.normalize();
        self
    }

    /// Pointer-like foreign value with `levels` of indirection.
    #[must_use]
    pub fn with_indirection(mut self, levels: u8) -> Self {
        self.indirection = levels;
        self
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    #[inline]
    pub fn indirection(&self) -> u8 {
        self.indirection
    }

    #[inline]
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    #[inline]
    pub fn subkeys(&self) -> &[(Key, TypeData)] {
        &self.subkeys
    }

    pub fn subkey(&self, key: Key) -> Option<&TypeData> {
        self.subkeys
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|i| &self.subkeys[i].1)
    }

    /// Element of an array-like value.
    pub fn element(&self) -> Option<&TypeData> {
        if self.kind.is_array_like() {
            self.subkey(Key::ANY)
        } else {
            None
        }
    }

    pub(crate) fn insert_subkey(&mut self, key: Key, value: TypeData) {
        match self.subkeys.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(i) => self.subkeys[i].1 = value,
            Err(i) => self.subkeys.insert(i, (key, value)),
        }
    }

    /// Index of `key`, inserting a pristine `any` entry if absent.
    pub(crate) fn subkey_slot(&mut self, key: Key) -> usize {
        match self.subkeys.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(i) => i,
            Err(i) => {
                self.subkeys.insert(i, (key, TypeData::any()));
                i
            }
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind == PrimitiveKind::Error
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        self.kind == PrimitiveKind::Any
    }

    #[inline]
    pub fn is_or_null(&self) -> bool {
        self.flags.contains(TypeFlags::OR_NULL)
    }

    #[inline]
    pub fn is_or_false(&self) -> bool {
        self.flags.contains(TypeFlags::OR_FALSE)
    }

    /// Whether a `null` can be observed in this value at runtime.
    pub fn can_hold_null(&self) -> bool {
        self.is_or_null() || self.kind.holds_null_natively()
    }

    /// True if this value or anything nested in it is `error`.
    pub fn contains_error(&self) -> bool {
        self.is_error() || self.subkeys.iter().any(|(_, v)| v.contains_error())
    }

    /// Same value with `or_null`/`or_false` removed; a bare `null` or `false`
    /// becomes `any`.
    #[must_use]
    pub fn drop_optional(&self) -> TypeData {
        if matches!(self.kind, PrimitiveKind::Null | PrimitiveKind::False) {
            return TypeData::any();
        }
        let mut out = self.clone();
        out.flags.remove(TypeFlags::OPTIONAL);
        out
    }

    /// Restore the representation invariants after flags or kind changed.
    ///
    /// Optional-ness has one spelling: `any|null` is `null`, `any|false` is
    /// `false` and `null|false` is `false` with `or_null`. A `mixed` keeps
    /// only its parts and `or_null`; `or_false` becomes the bool part, a
    /// float part implies the int part and no parts means every part.
    pub(crate) fn normalize(&mut self) {
        if self.kind == PrimitiveKind::Any && self.flags.intersects(TypeFlags::OPTIONAL) {
            self.kind = if self.flags.contains(TypeFlags::OR_FALSE) {
                PrimitiveKind::False
            } else {
                PrimitiveKind::Null
            };
        }
        if self.kind == PrimitiveKind::Null && self.flags.contains(TypeFlags::OR_FALSE) {
            self.kind = PrimitiveKind::False;
            self.flags.insert(TypeFlags::OR_NULL);
        }
        match self.kind {
            PrimitiveKind::Error => {
                *self = TypeData::error();
                return;
            }
            PrimitiveKind::Mixed => {
                if self.flags.contains(TypeFlags::OR_FALSE) {
                    self.flags.insert(TypeFlags::MIXED_BOOL);
                }
                if self.flags.contains(TypeFlags::MIXED_FLOAT) {
                    self.flags.insert(TypeFlags::MIXED_INT);
                }
                self.flags &= TypeFlags::MIXED_PARTS | TypeFlags::OR_NULL;
                if !self.flags.intersects(TypeFlags::MIXED_PARTS) {
                    self.flags = TypeFlags::MIXED_PARTS | TypeFlags::OR_NULL;
                }
                if self.flags.contains(TypeFlags::MIXED_ARRAY) {
                    self.subkeys.retain(|(key, _)| key.is_any());
                } else {
                    self.subkeys.clear();
                }
                self.classes.clear();
                return;
            }
            PrimitiveKind::Bool | PrimitiveKind::False => self.flags.remove(TypeFlags::OR_FALSE),
            PrimitiveKind::Null => self.flags.remove(TypeFlags::OR_NULL),
            _ => {}
        }
        self.flags.remove(TypeFlags::MIXED_PARTS);
        if self.kind != PrimitiveKind::Tuple {
            self.flags.remove(TypeFlags::TUPLE_AS_ARRAY);
        }
        if self.kind != PrimitiveKind::Shape {
            self.flags.remove(TypeFlags::SHAPE_HAS_VARG);
        }
        if self.kind != PrimitiveKind::Class {
            self.classes.clear();
        }
        if !self.kind.is_array_like() && !self.kind.is_keyed() {
            self.subkeys.clear();
        }
    }

    /// Every scalar part is set: nothing is known about this `mixed`.
    pub fn is_unrestricted_mixed(&self) -> bool {
        self.kind == PrimitiveKind::Mixed && self.flags.contains(TypeFlags::MIXED_PARTS)
    }
}
