//! Per-compilation type session.

use std::sync::Arc;

use tern_ir::SharedInterner;

use crate::{ClassTable, KeyInterner, MultiKey};

/// Everything the lattice needs besides the values themselves.
///
/// Created once per compilation and passed by reference to every component.
/// Holds the name and key interners, the class table, and the pre-allocated
/// depth-0 and depth-1 paths.
pub struct TypeContext {
    pub names: SharedInterner,
    pub keys: KeyInterner,
    pub classes: ClassTable,
    root_path: MultiKey,
    any_key_path: MultiKey,
    restricted_mixed: bool,
}

impl TypeContext {
    pub fn new(names: SharedInterner) -> Self {
        TypeContext {
            names,
            keys: KeyInterner::new(),
            classes: ClassTable::new(),
            root_path: MultiKey::root(),
            any_key_path: MultiKey::any_key(),
            restricted_mixed: true,
        }
    }

    /// Share the context across worker threads.
    pub fn shared(names: SharedInterner) -> Arc<Self> {
        Arc::new(Self::new(names))
    }

    /// Track which scalar kinds make up a `mixed`.
    #[must_use]
    pub fn with_restricted_mixed(mut self, enabled: bool) -> Self {
        self.restricted_mixed = enabled;
        self
    }

    #[inline]
    pub fn restricted_mixed(&self) -> bool {
        self.restricted_mixed
    }

    /// The empty path. Cloning never allocates.
    #[inline]
    pub fn root_path(&self) -> &MultiKey {
        &self.root_path
    }

    /// The `[Key::ANY]` path. Cloning never allocates.
    #[inline]
    pub fn any_key_path(&self) -> &MultiKey {
        &self.any_key_path
    }
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new(SharedInterner::new())
    }
}

impl std::fmt::Debug for TypeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeContext")
            .field("keys", &self.keys)
            .field("classes", &self.classes)
            .field("restricted_mixed", &self.restricted_mixed)
            .finish_non_exhaustive()
    }
}
