//! Source locations attached to graph nodes.

use crate::{Name, StringInterner};
use std::fmt;

/// Where a node originates: file, enclosing function and line.
///
/// `function` is `Name::EMPTY` for top-level code. A location with an empty
/// file and line 0 is "unknown" and renders as `<unknown>`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourceLoc {
    pub file: Name,
    pub function: Name,
    pub line: u32,
}

impl SourceLoc {
    pub const UNKNOWN: SourceLoc = SourceLoc {
        file: Name::EMPTY,
        function: Name::EMPTY,
        line: 0,
    };

    #[inline]
    pub const fn new(file: Name, function: Name, line: u32) -> Self {
        SourceLoc {
            file,
            function,
            line,
        }
    }

    #[inline]
    pub const fn is_unknown(&self) -> bool {
        self.file.is_empty() && self.line == 0
    }

    /// Render against an interner: `file:line in function()`.
    pub fn display<'a>(&'a self, interner: &'a StringInterner) -> LocDisplay<'a> {
        LocDisplay {
            loc: self,
            interner,
        }
    }
}

pub struct LocDisplay<'a> {
    loc: &'a SourceLoc,
    interner: &'a StringInterner,
}

impl fmt::Display for LocDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loc.is_unknown() {
            return f.write_str("<unknown>");
        }
        write!(
            f,
            "{}:{}",
            self.interner.lookup(self.loc.file),
            self.loc.line
        )?;
        if !self.loc.function.is_empty() {
            write!(f, " in {}()", self.interner.lookup(self.loc.function))?;
        }
        Ok(())
    }
}
