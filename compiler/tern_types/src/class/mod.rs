//! Class hierarchy used by the lattice to merge class candidates.

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::fmt;

use tern_ir::Name;

/// Handle to a declared class or interface.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ClassId(u32);

impl ClassId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub name: Name,
    pub parent: Option<ClassId>,
    pub interfaces: SmallVec<[ClassId; 2]>,
    pub is_interface: bool,
}

/// Result of collapsing a class candidate set.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CommonAncestor {
    /// Exactly one minimal class every candidate derives from.
    Unique(ClassId),
    /// Several minimal common ancestors (e.g. two shared interfaces).
    Ambiguous,
    /// Nothing in common.
    None,
}

/// Declared classes and interfaces.
///
/// Declarations happen during edge collection; the solver only reads.
#[derive(Default)]
pub struct ClassTable {
    classes: RwLock<Vec<ClassInfo>>,
    by_name: RwLock<FxHashMap<Name, ClassId>>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn declare(&self, name: Name, parent: Option<ClassId>, is_interface: bool) -> ClassId {
        let mut by_name = self.by_name.write();
        if let Some(&id) = by_name.get(&name) {
            let mut classes = self.classes.write();
            if let Some(info) = classes.get_mut(id.index()) {
                if info.parent.is_none() {
                    info.parent = parent;
                }
            }
            return id;
        }
        let mut classes = self.classes.write();
        let id = ClassId(u32::try_from(classes.len()).unwrap_or(u32::MAX));
        classes.push(ClassInfo {
            name,
            parent,
            interfaces: SmallVec::new(),
            is_interface,
        });
        by_name.insert(name, id);
        tracing::trace!(?id, ?parent, is_interface, "declared class");
        id
    }

    /// Declare a class, or return the existing id for `name`.
    pub fn declare_class(&self, name: Name, parent: Option<ClassId>) -> ClassId {
        self.declare(name, parent, false)
    }

    pub fn declare_interface(&self, name: Name) -> ClassId {
        self.declare(name, None, true)
    }

    /// Record that `class` implements (or, for interfaces, extends) `interface`.
    pub fn implement(&self, class: ClassId, interface: ClassId) {
        let mut classes = self.classes.write();
        if let Some(info) = classes.get_mut(class.index()) {
            if !info.interfaces.contains(&interface) {
                info.interfaces.push(interface);
            }
        }
    }

    pub fn lookup(&self, name: Name) -> Option<ClassId> {
        self.by_name.read().get(&name).copied()
    }

    pub fn info(&self, id: ClassId) -> Option<ClassInfo> {
        self.classes.read().get(id.index()).cloned()
    }

    pub fn name(&self, id: ClassId) -> Name {
        self.classes
            .read()
            .get(id.index())
            .map_or(Name::EMPTY, |info| info.name)
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `id` itself and every class or interface it derives from.
    pub fn ancestors(&self, id: ClassId) -> FxHashSet<ClassId> {
        let classes = self.classes.read();
        let mut seen = FxHashSet::default();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if !seen.insert(cur) {
                continue;
            }
            if let Some(info) = classes.get(cur.index()) {
                stack.extend(info.parent);
                stack.extend(info.interfaces.iter().copied());
            }
        }
        seen
    }

    /// Reflexive, transitive.
    pub fn derives_from(&self, class: ClassId, ancestor: ClassId) -> bool {
        class == ancestor || self.ancestors(class).contains(&ancestor)
    }

    pub fn common_ancestor(&self, candidates: &[ClassId]) -> CommonAncestor {
        let Some((&first, rest)) = candidates.split_first() else {
            return CommonAncestor::None;
        };
        let mut common = self.ancestors(first);
        for &other in rest {
            let theirs = self.ancestors(other);
            common.retain(|c| theirs.contains(c));
            if common.is_empty() {
                return CommonAncestor::None;
            }
        }

        let mut minimal: Vec<ClassId> = common
            .iter()
            .copied()
            .filter(|&c| {
                !common
                    .iter()
                    .any(|&d| d != c && self.derives_from(d, c))
            })
            .collect();
        minimal.sort_unstable();

        match minimal.as_slice() {
            [] => CommonAncestor::None,
            [only] => CommonAncestor::Unique(*only),
            _ => CommonAncestor::Ambiguous,
        }
    }
}

impl fmt::Debug for ClassTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassTable({} classes)", self.len())
    }
}

#[cfg(test)]
mod tests;
