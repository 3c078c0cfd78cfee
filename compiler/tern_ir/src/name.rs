//! Handles for interned identifiers.

use std::fmt;

const LOCAL_BITS: u32 = 28;

/// A symbol, variable, class or file name owned by a `StringInterner`.
///
/// The top four bits pick the interner shard; the rest index the string
/// inside that shard. Handle `0` is always the empty string.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    pub const EMPTY: Name = Name(0);

    /// Largest per-shard index a handle can encode.
    pub const MAX_LOCAL: u32 = (1 << LOCAL_BITS) - 1;

    pub const NUM_SHARDS: usize = 1 << (32 - LOCAL_BITS);

    #[inline]
    pub(crate) const fn new(shard: u32, local: u32) -> Self {
        debug_assert!((shard as usize) < Self::NUM_SHARDS);
        debug_assert!(local <= Self::MAX_LOCAL);
        Name((shard << LOCAL_BITS) | local)
    }

    #[inline]
    pub(crate) const fn shard(self) -> usize {
        (self.0 >> LOCAL_BITS) as usize
    }

    #[inline]
    pub(crate) const fn local(self) -> usize {
        (self.0 & Self::MAX_LOCAL) as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("Name(\"\")");
        }
        write!(f, "Name(#{}.{})", self.shard(), self.local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_and_index_round_trip() {
        let name = Name::new(15, Name::MAX_LOCAL);
        assert_eq!((name.shard(), name.local()), (15, Name::MAX_LOCAL as usize));
        assert!(!name.is_empty());
        assert_eq!(format!("{:?}", Name::new(3, 7)), "Name(#3.7)");
    }

    #[test]
    fn empty_is_the_default() {
        assert_eq!(Name::default(), Name::EMPTY);
        assert!(Name::EMPTY.is_empty());
        assert_eq!(format!("{:?}", Name::EMPTY), "Name(\"\")");
    }
}
