//! Tern types - the type lattice used by whole-program inference.
//!
//! # Design
//!
//! - **Keys are interned**: `Key(u32)` handles, equal keys are equal handles
//! - **Values are trees**: `TypeData` owns its nested element/item types
//! - **One session object**: `TypeContext` bundles the interners and class
//!   table instead of process-wide statics
//!
//! The lattice is "any at the bottom, error at the top". Everything in
//! between is ordered by `is_less_or_equal`, defined through join.

mod class;
mod context;
mod data;
mod flags;
mod format;
mod key;
mod kind;
mod lattice;

pub use class::{ClassId, ClassInfo, ClassTable, CommonAncestor};
pub use context::TypeContext;
pub use data::TypeData;
pub use flags::TypeFlags;
pub use format::TypeDisplay;
pub use key::{Key, KeyData, KeyInterner, MultiKey};
pub use kind::{KindMask, PrimitiveKind};
pub use lattice::{explain_conflict, is_less_or_equal, join, JoinMode};
