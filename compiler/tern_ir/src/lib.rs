//! Tern IR - shared identifiers for the compiler passes.
//!
//! The inference engine only needs a thin slice of the front end:
//! - `Name`: a 32-bit interned identifier (variables, functions, classes, files)
//! - `StringInterner`: sharded, thread-safe interner backing `Name`
//! - `SourceLoc`: where a node came from, used when rendering traces
//!
//! Everything here is `Copy` or cheaply shareable so that graph nodes can carry
//! it without touching the interner on the hot path.

mod interner;
mod loc;
mod name;

pub use interner::{InternError, SharedInterner, StringInterner};
pub use loc::SourceLoc;
pub use name::Name;
