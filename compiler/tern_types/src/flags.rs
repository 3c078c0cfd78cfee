//! Modifier flags carried by every `TypeData`.

use bitflags::bitflags;

use crate::PrimitiveKind;

bitflags! {
    /// Modifiers layered over a primitive kind.
    ///
    /// Flags only ever grow under join. The `MIXED_*` bits record which
    /// scalar kinds were merged into a `mixed`; an unrestricted `mixed`
    /// has none of them set.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u16 {
        // === Optional-ness ===

        /// May additionally be `null`.
        const OR_NULL = 1 << 0;
        /// May additionally be `false`.
        const OR_FALSE = 1 << 1;

        // === Structural ===

        /// Shape accepts fields beyond the declared ones.
        const SHAPE_HAS_VARG = 1 << 2;
        /// Tuple may be indexed with a non-constant key.
        const TUPLE_AS_ARRAY = 1 << 3;

        // === Restricted mixed ===

        const MIXED_BOOL = 1 << 8;
        const MIXED_INT = 1 << 9;
        const MIXED_FLOAT = 1 << 10;
        const MIXED_STRING = 1 << 11;
        const MIXED_ARRAY = 1 << 12;

        const OPTIONAL = Self::OR_NULL.bits() | Self::OR_FALSE.bits();
        const STRUCTURAL = Self::SHAPE_HAS_VARG.bits() | Self::TUPLE_AS_ARRAY.bits();
        const MIXED_PARTS = Self::MIXED_BOOL.bits()
            | Self::MIXED_INT.bits()
            | Self::MIXED_FLOAT.bits()
            | Self::MIXED_STRING.bits()
            | Self::MIXED_ARRAY.bits();
    }
}

impl TypeFlags {
    /// Restricted-mixed bits contributed by a scalar kind.
    ///
    /// `float` contributes the int bit too: `int` joined with `float` is
    /// already `float`, and the parts must not depend on join order.
    pub fn mixed_part(kind: PrimitiveKind) -> TypeFlags {
        match kind {
            PrimitiveKind::Float => TypeFlags::MIXED_INT | TypeFlags::MIXED_FLOAT,
            _ => Self::mixed_bit(kind),
        }
    }

    /// The single restricted-mixed bit naming `kind`.
    pub fn mixed_bit(kind: PrimitiveKind) -> TypeFlags {
        match kind {
            PrimitiveKind::False | PrimitiveKind::Bool => TypeFlags::MIXED_BOOL,
            PrimitiveKind::Int => TypeFlags::MIXED_INT,
            PrimitiveKind::Float => TypeFlags::MIXED_FLOAT,
            PrimitiveKind::String => TypeFlags::MIXED_STRING,
            PrimitiveKind::Array => TypeFlags::MIXED_ARRAY,
            _ => TypeFlags::empty(),
        }
    }

    /// Kinds named by the restricted-mixed bits, in display order.
    pub fn mixed_kinds(self) -> impl Iterator<Item = PrimitiveKind> {
        [
            (TypeFlags::MIXED_BOOL, PrimitiveKind::Bool),
            (TypeFlags::MIXED_INT, PrimitiveKind::Int),
            (TypeFlags::MIXED_FLOAT, PrimitiveKind::Float),
            (TypeFlags::MIXED_STRING, PrimitiveKind::String),
            (TypeFlags::MIXED_ARRAY, PrimitiveKind::Array),
        ]
        .into_iter()
        .filter(move |(bit, _)| self.contains(*bit))
        .map(|(_, kind)| kind)
    }
}
