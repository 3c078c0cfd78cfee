//! Primitive kinds and kind masks.

use bitflags::bitflags;
use std::fmt;

/// Primitive kind of a `TypeData`.
///
/// The declaration order is the widening order. Kinds up to and including
/// `Mixed` are scalar-ish and widen into `Mixed`; kinds from `Void` upward
/// never widen, except `Class` into `Object`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(u8)]
pub enum PrimitiveKind {
    Any,
    Null,
    False,
    Bool,
    Int,
    Float,
    String,
    Array,
    Mixed,
    Void,
    Tuple,
    Shape,
    Future,
    FutureQueue,
    Class,
    Object,
    Error,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 17] = [
        PrimitiveKind::Any,
        PrimitiveKind::Null,
        PrimitiveKind::False,
        PrimitiveKind::Bool,
        PrimitiveKind::Int,
        PrimitiveKind::Float,
        PrimitiveKind::String,
        PrimitiveKind::Array,
        PrimitiveKind::Mixed,
        PrimitiveKind::Void,
        PrimitiveKind::Tuple,
        PrimitiveKind::Shape,
        PrimitiveKind::Future,
        PrimitiveKind::FutureQueue,
        PrimitiveKind::Class,
        PrimitiveKind::Object,
        PrimitiveKind::Error,
    ];

    /// Kinds that may widen into `Mixed`.
    #[inline]
    pub fn is_scalar_like(self) -> bool {
        self <= PrimitiveKind::Mixed
    }

    /// Kinds whose element type lives under the single `Key::ANY` subkey.
    #[inline]
    pub fn is_array_like(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Array | PrimitiveKind::Future | PrimitiveKind::FutureQueue
        )
    }

    /// Kinds with one subkey per item or field.
    #[inline]
    pub fn is_keyed(self) -> bool {
        matches!(self, PrimitiveKind::Tuple | PrimitiveKind::Shape)
    }

    /// Kinds whose runtime representation can hold `null` without boxing.
    #[inline]
    pub fn holds_null_natively(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Any
                | PrimitiveKind::Null
                | PrimitiveKind::Mixed
                | PrimitiveKind::Class
                | PrimitiveKind::Object
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Any => "any",
            PrimitiveKind::Null => "null",
            PrimitiveKind::False => "false",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::String => "string",
            PrimitiveKind::Array => "array",
            PrimitiveKind::Mixed => "mixed",
            PrimitiveKind::Void => "void",
            PrimitiveKind::Tuple => "tuple",
            PrimitiveKind::Shape => "shape",
            PrimitiveKind::Future => "future",
            PrimitiveKind::FutureQueue => "future_queue",
            PrimitiveKind::Class => "class",
            PrimitiveKind::Object => "object",
            PrimitiveKind::Error => "error",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// A set of primitive kinds, one bit per `PrimitiveKind`.
    ///
    /// Smart-cast analysis hands one of these to every variable read to say
    /// which kinds the read is known to exclude.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct KindMask: u32 {
        const ANY = 1 << 0;
        const NULL = 1 << 1;
        const FALSE = 1 << 2;
        const BOOL = 1 << 3;
        const INT = 1 << 4;
        const FLOAT = 1 << 5;
        const STRING = 1 << 6;
        const ARRAY = 1 << 7;
        const MIXED = 1 << 8;
        const VOID = 1 << 9;
        const TUPLE = 1 << 10;
        const SHAPE = 1 << 11;
        const FUTURE = 1 << 12;
        const FUTURE_QUEUE = 1 << 13;
        const CLASS = 1 << 14;
        const OBJECT = 1 << 15;
        const ERROR = 1 << 16;
    }
}

impl KindMask {
    #[inline]
    pub fn of(kind: PrimitiveKind) -> Self {
        KindMask::from_bits_truncate(1 << (kind as u8))
    }

    #[inline]
    pub fn has(self, kind: PrimitiveKind) -> bool {
        self.contains(Self::of(kind))
    }
}

impl From<PrimitiveKind> for KindMask {
    fn from(kind: PrimitiveKind) -> Self {
        Self::of(kind)
    }
}
