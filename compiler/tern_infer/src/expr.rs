//! Expression vocabulary supplied by edge collection.
//!
//! Each variant names its structural inputs by `NodeId`. Recalculation reads
//! those inputs and registers an edge from each of them on the first pass.

use tern_ir::Name;
use tern_types::{ClassId, Key, KindMask, PrimitiveKind, TypeData};

use crate::{NodeId, TypeRule};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Identical,
    Lt,
    Le,
    Gt,
    Ge,
    Spaceship,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            BinaryOp::Mod
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::Shl
                | BinaryOp::Shr
                | BinaryOp::Spaceship
        )
    }

    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Identical
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::And
                | BinaryOp::Or
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    IntCast,
    FloatCast,
    StringCast,
    BoolCast,
    ArrayCast,
}

/// Index used by an element read.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// A key folded at compile time.
    Const(Key),
    /// Known only at runtime; reads project through `Key::ANY`.
    Dynamic,
}

impl IndexKey {
    pub fn key(self) -> Key {
        match self {
            IndexKey::Const(key) => key,
            IndexKey::Dynamic => Key::ANY,
        }
    }
}

/// Where a call's result type comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum CallResult {
    /// A builtin or annotated function whose result is computed from its
    /// argument types.
    Rule(TypeRule),
    /// A user function; the result is the value of its return variable.
    ReturnSlot(NodeId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// A literal of a bare kind.
    Const(PrimitiveKind),
    /// A value known up front, e.g. a typed constant.
    Fixed(TypeData),
    /// Read of a variable, minus the kinds a smart cast has ruled out.
    VarRead { var: NodeId, narrowing: KindMask },
    Binary { op: BinaryOp, lhs: NodeId, rhs: NodeId },
    Unary { op: UnaryOp, operand: NodeId },
    Index { base: NodeId, key: IndexKey },
    ArrayLiteral(Vec<NodeId>),
    TupleLiteral(Vec<NodeId>),
    ShapeLiteral(Vec<(Key, NodeId)>),
    /// The condition does not contribute to the value.
    Ternary { then: NodeId, otherwise: NodeId },
    Call {
        callee: Name,
        args: Vec<NodeId>,
        result: CallResult,
    },
    /// An anonymous function; `returns` is its return variable.
    Lambda { returns: NodeId },
    New(ClassId),
    Assign { value: NodeId },
    Isset(NodeId),
    InstanceOf,
    Fork(NodeId),
    Wait(NodeId),
}

impl ExprKind {
    /// Short name used in traces and diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            ExprKind::Const(_) | ExprKind::Fixed(_) => "constant",
            ExprKind::VarRead { .. } => "variable read",
            ExprKind::Binary { .. } => "binary expression",
            ExprKind::Unary { .. } => "unary expression",
            ExprKind::Index { .. } => "element read",
            ExprKind::ArrayLiteral(_) => "array literal",
            ExprKind::TupleLiteral(_) => "tuple literal",
            ExprKind::ShapeLiteral(_) => "shape literal",
            ExprKind::Ternary { .. } => "conditional expression",
            ExprKind::Call { .. } => "call",
            ExprKind::Lambda { .. } => "closure",
            ExprKind::New(_) => "new expression",
            ExprKind::Assign { .. } => "assignment",
            ExprKind::Isset(_) => "isset()",
            ExprKind::InstanceOf => "instanceof",
            ExprKind::Fork(_) => "fork()",
            ExprKind::Wait(_) => "wait()",
        }
    }
}
