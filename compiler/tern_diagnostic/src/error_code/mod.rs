//! Error codes for inference diagnostics.
//!
//! Format: E#### where the first digit is the phase:
//! - E2xxx: type inference and restriction checks
//! - E9xxx: internal compiler errors

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Incompatible types merged into one value
    E2001,
    /// Value is wider than the type required at a use site
    E2002,
    /// Emptiness/identity check not representable on the inferred type
    E2003,
    /// Value does not match a declared annotation
    E2004,
    /// Void result used where a value is required
    E2005,
    /// Internal invariant violated during inference
    E9001,
}

impl ErrorCode {
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E9001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line summary, used for `--explain` style listings.
    pub fn summary(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "incompatible types mixed in one value",
            ErrorCode::E2002 => "value type is wider than required",
            ErrorCode::E2003 => "isset/null check on a type that cannot hold null",
            ErrorCode::E2004 => "value does not match declared type",
            ErrorCode::E2005 => "void value used",
            ErrorCode::E9001 => "internal inference error",
        }
    }

    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E2001
                | ErrorCode::E2002
                | ErrorCode::E2003
                | ErrorCode::E2004
                | ErrorCode::E2005
        )
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
