//! Graph nodes.
//!
//! A node owns its committed value behind an `RwLock<Arc<_>>`: readers clone
//! the `Arc`, recalculation builds a new value privately and swaps it in.

mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tern_ir::{Name, SourceLoc, StringInterner};
use tern_types::TypeData;

use crate::{EdgeId, ExprKind, NodeId};

pub(crate) use state::{NodeState, Phase};

/// What a variable node stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    Local,
    Global,
    Static,
    Param { index: usize, by_ref: bool },
    /// The return value of `function`.
    Return,
    ClassField,
}

/// The first edge that broke a variable's declared type.
#[derive(Clone, Debug)]
pub(crate) struct Mismatch {
    pub(crate) edge: EdgeId,
    /// What the edge tried to contribute.
    pub(crate) value: TypeData,
}

pub struct VarNode {
    pub name: Name,
    pub function: Name,
    pub kind: VarKind,
    pub location: SourceLoc,
    pub(crate) type_restriction: OnceLock<Arc<TypeData>>,
    pub(crate) mismatch: Mutex<Option<Mismatch>>,
}

impl VarNode {
    pub fn new(name: Name, function: Name, kind: VarKind, location: SourceLoc) -> Self {
        VarNode {
            name,
            function,
            kind,
            location,
            type_restriction: OnceLock::new(),
            mismatch: Mutex::new(None),
        }
    }

    pub fn local(name: Name, location: SourceLoc) -> Self {
        Self::new(name, location.function, VarKind::Local, location)
    }

    pub fn param(name: Name, index: usize, location: SourceLoc) -> Self {
        Self::new(
            name,
            location.function,
            VarKind::Param {
                index,
                by_ref: false,
            },
            location,
        )
    }

    pub fn return_of(function: Name, location: SourceLoc) -> Self {
        Self::new(Name::EMPTY, function, VarKind::Return, location)
    }

    /// The declared type, if the variable has one.
    pub fn type_restriction(&self) -> Option<&TypeData> {
        self.type_restriction.get().map(AsRef::as_ref)
    }

    /// Record the first mismatch only.
    pub(crate) fn record_mismatch(&self, mismatch: Mismatch) {
        let mut slot = self.mismatch.lock();
        if slot.is_none() {
            *slot = Some(mismatch);
        }
    }

    pub(crate) fn mismatch(&self) -> Option<Mismatch> {
        self.mismatch.lock().clone()
    }

    /// `$x`, `argument $x of f()`, `return value of f()`.
    pub fn describe(&self, names: &StringInterner) -> String {
        let name = names.lookup(self.name);
        let function = names.lookup(self.function);
        match self.kind {
            VarKind::Local | VarKind::Static => format!("${name}"),
            VarKind::Global => format!("global ${name}"),
            VarKind::Param { .. } => format!("argument ${name} of {function}()"),
            VarKind::Return => format!("return value of {function}()"),
            VarKind::ClassField => format!("field ${name}"),
        }
    }
}

/// A value fixed at construction: an annotation, a literal type.
pub struct TypeNode {
    pub value: TypeData,
    pub location: SourceLoc,
}

pub struct ExprNode {
    pub kind: ExprKind,
    pub location: SourceLoc,
    /// Set once the first pass has linked every examined input.
    pub(crate) inputs_linked: AtomicBool,
}

impl ExprNode {
    pub fn new(kind: ExprKind, location: SourceLoc) -> Self {
        ExprNode {
            kind,
            location,
            inputs_linked: AtomicBool::new(false),
        }
    }

    pub(crate) fn inputs_linked(&self) -> bool {
        self.inputs_linked.load(Ordering::Acquire)
    }

    pub(crate) fn mark_inputs_linked(&self) {
        self.inputs_linked.store(true, Ordering::Release);
    }
}

pub enum NodeKind {
    Expr(ExprNode),
    Var(VarNode),
    Type(TypeNode),
}

/// Edge handles attached to one node. Most nodes have few.
pub type EdgeList = SmallVec<[EdgeId; 4]>;

pub struct Node {
    id: NodeId,
    kind: NodeKind,
    value: RwLock<Arc<TypeData>>,
    edges_in: Mutex<EdgeList>,
    edges_out: Mutex<EdgeList>,
    pub(crate) state: NodeState,
    /// Set once a lattice error on this node has been reported.
    reported: AtomicBool,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        let initial = match &kind {
            NodeKind::Type(ty) => ty.value.clone(),
            NodeKind::Expr(_) | NodeKind::Var(_) => TypeData::any(),
        };
        Node {
            id,
            kind,
            value: RwLock::new(Arc::new(initial)),
            edges_in: Mutex::new(EdgeList::new()),
            edges_out: Mutex::new(EdgeList::new()),
            state: NodeState::default(),
            reported: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn location(&self) -> SourceLoc {
        match &self.kind {
            NodeKind::Expr(expr) => expr.location,
            NodeKind::Var(var) => var.location,
            NodeKind::Type(ty) => ty.location,
        }
    }

    pub fn as_var(&self) -> Option<&VarNode> {
        match &self.kind {
            NodeKind::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&ExprNode> {
        match &self.kind {
            NodeKind::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    /// The committed value.
    pub fn value(&self) -> Arc<TypeData> {
        Arc::clone(&self.value.read())
    }

    pub(crate) fn commit(&self, value: TypeData) {
        *self.value.write() = Arc::new(value);
    }

    /// Whether the node has finished at least one pass.
    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn edges_in(&self) -> EdgeList {
        self.edges_in.lock().clone()
    }

    pub fn edges_out(&self) -> EdgeList {
        self.edges_out.lock().clone()
    }

    pub(crate) fn push_edge_in(&self, edge: EdgeId) {
        self.edges_in.lock().push(edge);
    }

    pub(crate) fn push_edge_out(&self, edge: EdgeId) {
        self.edges_out.lock().push(edge);
    }

    /// True the first time only.
    pub(crate) fn claim_error_report(&self) -> bool {
        !self.reported.swap(true, Ordering::AcqRel)
    }

    /// A restricted variable reports through its declared type instead.
    pub(crate) fn is_restricted(&self) -> bool {
        self.as_var()
            .is_some_and(|var| var.type_restriction().is_some())
    }

    /// Human-readable name for traces and diagnostics.
    pub fn describe(&self, names: &StringInterner) -> String {
        match &self.kind {
            NodeKind::Var(var) => var.describe(names),
            NodeKind::Expr(expr) => expr.kind.describe().to_string(),
            NodeKind::Type(_) => "declared type".to_string(),
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            NodeKind::Expr(_) => "expr",
            NodeKind::Var(_) => "var",
            NodeKind::Type(_) => "type",
        };
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &kind)
            .field("phase", &self.state.phase())
            .finish_non_exhaustive()
    }
}
