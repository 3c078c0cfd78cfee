//! Diagnostics for type inference.
//!
//! A diagnostic carries:
//! - an error code for searchability
//! - a severity (hard errors stop code generation)
//! - a message and a primary location
//! - notes, one per rendered trace row or explanation line
//!
//! Diagnostics are collected in a `DiagnosticQueue`, which enforces the error
//! limit, drops exact duplicates and remembers whether a hard error fired.

mod diagnostic;
mod error_code;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
