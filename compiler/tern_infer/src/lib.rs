//! Tern inference - whole-program type inference over a dependency graph.
//!
//! # Pipeline
//!
//! 1. Edge collection registers nodes and edges (`TypeInferer::add_*`)
//! 2. `run_to_fixpoint` recalculates scheduled nodes on a worker pool until
//!    no node changes
//! 3. `finish` closes the graph; restrictions are checked and reported
//! 4. Code generation reads committed values through `resolve`
//!
//! Values only grow during the run, so the fixpoint is reached in a bounded
//! number of passes regardless of scheduling order.

mod config;
mod error;
mod expr;
mod graph;
mod node;
mod recalc;
mod restriction;
mod rule;
mod solver;

use std::sync::Once;

pub use config::{InferConfig, Strictness};
pub use error::InferError;
pub use expr::{BinaryOp, CallResult, ExprKind, IndexKey, UnaryOp};
pub use graph::{Edge, EdgeId, NodeId};
pub use node::{EdgeList, ExprNode, Node, NodeKind, TypeNode, VarKind, VarNode};
pub use restriction::{Restriction, TraceRow};
pub use rule::TypeRule;
pub use solver::{InferStats, InferenceOutcome, TypeInferer};

static TRACING_INIT: Once = Once::new();

/// Install a hierarchical tracing subscriber, once per process.
///
/// Only takes effect when `RUST_LOG` is set, e.g.
/// `RUST_LOG=tern_infer=debug` for pool statistics or
/// `RUST_LOG=tern_infer=trace` for every recalculation.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .init();
        }
    });
}
