//! Internal solver errors.
//!
//! These are programming errors in the caller or corrupted graph state, not
//! type errors in the program being compiled. Type errors become
//! `Diagnostic`s; these abort the run.

use tern_diagnostic::{Diagnostic, ErrorCode};

use crate::{EdgeId, NodeId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InferError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("unknown edge {0:?}")]
    UnknownEdge(EdgeId),

    #[error("node {0:?} is not a variable")]
    NotAVariable(NodeId),

    #[error("{operation} called after finish()")]
    SolverClosed { operation: &'static str },

    #[error("malformed type rule for {callee}(): {detail}")]
    MalformedRule { callee: String, detail: String },

    #[error("counter-example search exceeded its budget of {budget} steps")]
    TraceBudgetExceeded { budget: usize },

    #[error("node {0:?} was never resolved before finish()")]
    NotResolved(NodeId),

    #[error("an inference worker panicked")]
    WorkerPanicked,

    #[error("the {arena} arena has no handles left")]
    GraphFull { arena: &'static str },
}

impl InferError {
    /// Report as an internal compiler error.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(ErrorCode::E9001)
            .with_message(format!("internal inference error: {self}"))
            .with_note("this is a bug in the compiler, not in the program being compiled")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tern_diagnostic::Severity;

    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            InferError::SolverClosed {
                operation: "add_edge"
            }
            .to_string(),
            "add_edge called after finish()"
        );
        assert_eq!(
            InferError::MalformedRule {
                callee: "array_map".into(),
                detail: "argument #2 is missing".into(),
            }
            .to_string(),
            "malformed type rule for array_map(): argument #2 is missing"
        );
        assert_eq!(
            InferError::GraphFull { arena: "edge" }.to_string(),
            "the edge arena has no handles left"
        );
    }

    #[test]
    fn internal_diagnostic() {
        let diag = InferError::WorkerPanicked.to_diagnostic();
        assert_eq!(diag.code, ErrorCode::E9001);
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.message.contains("worker panicked"));
    }
}
