#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tern_diagnostic::ErrorCode;
use tern_ir::{SharedInterner, SourceLoc};
use tern_types::{KindMask, MultiKey, PrimitiveKind, TypeContext, TypeData};

use super::*;
use crate::{CallResult, ExprKind, IndexKey, InferConfig, TypeRule, UnaryOp, VarKind, VarNode};

fn solver() -> TypeInferer {
    solver_with(InferConfig::single_threaded())
}

fn solver_with(config: InferConfig) -> TypeInferer {
    let ctx = Arc::new(TypeContext::new(SharedInterner::new()));
    TypeInferer::new(ctx, config)
}

fn at(solver: &TypeInferer, line: u32) -> SourceLoc {
    let names = &solver.context().names;
    SourceLoc::new(names.intern("main.php"), names.intern("main"), line)
}

fn local(solver: &TypeInferer, name: &str, line: u32) -> NodeId {
    let name = solver.context().names.intern(name);
    solver.add_var(VarNode::local(name, at(solver, line))).unwrap()
}

fn constant(solver: &TypeInferer, kind: PrimitiveKind, line: u32) -> NodeId {
    solver.add_expr(ExprKind::Const(kind), at(solver, line)).unwrap()
}

fn of(kind: PrimitiveKind) -> TypeData {
    TypeData::of(kind)
}

#[test]
fn variable_joins_incoming_edges() {
    let s = solver();
    let x = local(&s, "x", 1);
    let one = constant(&s, PrimitiveKind::Int, 2);
    let half = constant(&s, PrimitiveKind::Float, 3);
    s.add_edge(one, x, None).unwrap();
    s.add_edge(half, x, None).unwrap();
    s.run_to_fixpoint().unwrap();
    assert_eq!(*s.resolve(x).unwrap(), of(PrimitiveKind::Float));
}

#[test]
fn path_edges_write_into_elements() {
    let s = solver();
    let arr = local(&s, "arr", 1);
    let item = constant(&s, PrimitiveKind::String, 2);
    s.add_edge(item, arr, Some(MultiKey::any_key())).unwrap();
    s.finish().unwrap();
    assert_eq!(
        *s.resolve(arr).unwrap(),
        TypeData::array_of(of(PrimitiveKind::String))
    );
}

#[test]
fn expressions_link_their_inputs_once() {
    let s = solver();
    let x = local(&s, "x", 1);
    let one = constant(&s, PrimitiveKind::Int, 1);
    s.add_edge(one, x, None).unwrap();
    let read = s
        .add_expr(
            ExprKind::VarRead {
                var: x,
                narrowing: KindMask::empty(),
            },
            at(&s, 2),
        )
        .unwrap();
    s.run_to_fixpoint().unwrap();
    assert_eq!(*s.resolve(read).unwrap(), of(PrimitiveKind::Int));

    // A later contribution to `x` reaches the read through the lazy edge.
    let text = constant(&s, PrimitiveKind::String, 3);
    s.add_edge(text, x, None).unwrap();
    s.run_to_fixpoint().unwrap();
    assert_eq!(s.resolve(read).unwrap().kind(), PrimitiveKind::Mixed);

    let reads_of_x = s
        .node(x)
        .unwrap()
        .edges_out()
        .into_iter()
        .filter(|e| s.graph.edge(*e).unwrap().to == read)
        .count();
    assert_eq!(reads_of_x, 1);
}

#[test]
fn resolve_runs_a_node_inline() {
    let s = solver();
    let x = local(&s, "x", 1);
    let ty = s.add_type(of(PrimitiveKind::Int), at(&s, 1)).unwrap();
    s.add_edge(ty, x, None).unwrap();
    assert_eq!(*s.resolve(x).unwrap(), of(PrimitiveKind::Int));
    assert_eq!(s.stats().inline_runs, 1);

    // The stale queue entry is skipped by the worker.
    s.run_to_fixpoint().unwrap();
    assert_eq!(*s.resolve(x).unwrap(), of(PrimitiveKind::Int));
}

#[test]
fn closed_after_finish() {
    let s = solver();
    let x = local(&s, "x", 1);
    s.finish().unwrap();
    assert!(s.is_finished());
    assert_eq!(
        s.add_expr(ExprKind::InstanceOf, SourceLoc::UNKNOWN).err(),
        Some(InferError::SolverClosed {
            operation: "add_node"
        })
    );
    assert_eq!(
        s.schedule(x).err(),
        Some(InferError::SolverClosed {
            operation: "schedule"
        })
    );
    assert_eq!(*s.resolve(x).unwrap(), TypeData::any());
    s.finish().unwrap();
}

#[test]
fn unknown_nodes_are_errors() {
    let s = solver();
    let ghost = NodeId::from_raw(42);
    assert_eq!(s.resolve(ghost).err(), Some(InferError::UnknownNode(ghost)));
    let x = local(&s, "x", 1);
    assert_eq!(
        s.add_edge(ghost, x, None).err(),
        Some(InferError::UnknownNode(ghost))
    );
}

#[test]
fn restriction_only_on_variables() {
    let s = solver();
    let c = constant(&s, PrimitiveKind::Int, 1);
    assert_eq!(
        s.set_type_restriction(c, of(PrimitiveKind::Int)).err(),
        Some(InferError::NotAVariable(c))
    );
}

#[test]
fn lattice_error_is_reported_once_where_it_arises() {
    let s = solver();
    let classes = &s.context().classes;
    let names = &s.context().names;
    let a = classes.declare_class(names.intern("A"), None);
    let b = classes.declare_class(names.intern("B"), None);

    let x = local(&s, "x", 1);
    let y = local(&s, "y", 5);
    let new_a = s.add_expr(ExprKind::New(a), at(&s, 2)).unwrap();
    let new_b = s.add_expr(ExprKind::New(b), at(&s, 3)).unwrap();
    s.add_edge(new_a, x, None).unwrap();
    s.add_edge(new_b, x, None).unwrap();
    s.add_edge(x, y, None).unwrap();
    s.finish().unwrap();

    assert!(s.resolve(x).unwrap().is_error());
    assert!(s.resolve(y).unwrap().is_error());

    let outcome = s.take_outcome();
    assert!(outcome.has_hard_error);
    assert_eq!(outcome.diagnostics.len(), 1);
    let diag = &outcome.diagnostics[0];
    assert_eq!(diag.code, ErrorCode::E2001);
    assert_eq!(diag.message, "incompatible types in $x");
    assert_eq!(
        diag.labels[0].message,
        "mixing classes A and B which have no common ancestor"
    );
    assert_eq!(diag.primary_loc(), Some(at(&s, 1)));
}

#[test]
fn restricted_variable_stays_within_its_declaration() {
    let s = solver();
    let x = local(&s, "x", 1);
    s.set_type_restriction(x, of(PrimitiveKind::Int).or_null())
        .unwrap();
    let one = constant(&s, PrimitiveKind::Int, 2);
    let text = constant(&s, PrimitiveKind::String, 3);
    s.add_edge(one, x, None).unwrap();
    s.add_edge(text, x, None).unwrap();
    s.finish().unwrap();

    assert_eq!(*s.resolve(x).unwrap(), of(PrimitiveKind::Int).or_null());
    let outcome = s.take_outcome();
    assert!(outcome.diagnostics.is_empty(), "no lattice error");

    assert_eq!(s.check_restrictions().unwrap(), 1);
    let outcome = s.take_outcome();
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, ErrorCode::E2004);
}

#[test]
fn calls_evaluate_rules_and_callbacks() {
    let s = solver();
    let names = &s.context().names;
    let ret = s
        .add_var(VarNode::return_of(names.intern("{closure}"), at(&s, 1)))
        .unwrap();
    let text = constant(&s, PrimitiveKind::String, 1);
    s.add_edge(text, ret, None).unwrap();
    let lambda = s
        .add_expr(ExprKind::Lambda { returns: ret }, at(&s, 1))
        .unwrap();
    let list = s
        .add_expr(
            ExprKind::Fixed(TypeData::array_of(of(PrimitiveKind::Int))),
            at(&s, 2),
        )
        .unwrap();
    let call = s
        .add_expr(
            ExprKind::Call {
                callee: names.intern("array_map"),
                args: vec![lambda, list],
                result: CallResult::Rule(TypeRule::array_of(TypeRule::CallbackReturn(0))),
            },
            at(&s, 3),
        )
        .unwrap();
    s.finish().unwrap();
    assert_eq!(
        *s.resolve(call).unwrap(),
        TypeData::array_of(of(PrimitiveKind::String))
    );
    assert_eq!(s.resolve(lambda).unwrap().kind(), PrimitiveKind::Object);
}

#[test]
fn rule_reading_past_its_arguments_is_rejected_when_added() {
    let s = solver();
    let names = &s.context().names;
    let arg = constant(&s, PrimitiveKind::Int, 1);
    let before = s.stats().nodes;
    let added = s.add_expr(
        ExprKind::Call {
            callee: names.intern("strlen"),
            args: vec![arg],
            result: CallResult::Rule(TypeRule::arg(2)),
        },
        at(&s, 1),
    );
    assert_eq!(
        added,
        Err(InferError::MalformedRule {
            callee: "strlen".into(),
            detail: "argument #3 is missing".into(),
        })
    );
    assert_eq!(s.stats().nodes, before);
}

#[test]
fn malformed_rule_aborts_the_run() {
    let s = solver();
    let names = &s.context().names;
    let list = constant(&s, PrimitiveKind::Array, 1);
    s.add_expr(
        ExprKind::Call {
            callee: names.intern("array_map"),
            args: vec![list],
            result: CallResult::Rule(TypeRule::CallbackReturn(0)),
        },
        at(&s, 1),
    )
    .unwrap();
    assert_eq!(
        s.run_to_fixpoint(),
        Err(InferError::MalformedRule {
            callee: "array_map".into(),
            detail: "argument #1 is not a callback".into(),
        })
    );
    assert!(!s.is_finished());
}

#[test]
fn unary_and_index_read_their_operands() {
    let s = solver();
    let one = constant(&s, PrimitiveKind::Int, 1);
    let negated = s
        .add_expr(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: one,
            },
            at(&s, 1),
        )
        .unwrap();
    let list = s
        .add_expr(
            ExprKind::Fixed(TypeData::array_of(of(PrimitiveKind::Float))),
            at(&s, 2),
        )
        .unwrap();
    let item = s
        .add_expr(
            ExprKind::Index {
                base: list,
                key: IndexKey::Dynamic,
            },
            at(&s, 2),
        )
        .unwrap();
    s.finish().unwrap();
    assert_eq!(*s.resolve(item).unwrap(), of(PrimitiveKind::Float));
    assert_eq!(*s.resolve(negated).unwrap(), of(PrimitiveKind::Int));
}

#[test]
fn user_function_calls_read_the_return_slot() {
    let s = solver();
    let names = &s.context().names;
    let f = names.intern("f");
    let ret = s.add_var(VarNode::return_of(f, at(&s, 10))).unwrap();
    let param = s
        .add_var(VarNode::new(
            names.intern("p"),
            f,
            VarKind::Param {
                index: 0,
                by_ref: false,
            },
            at(&s, 10),
        ))
        .unwrap();
    let read_p = s
        .add_expr(
            ExprKind::VarRead {
                var: param,
                narrowing: KindMask::empty(),
            },
            at(&s, 11),
        )
        .unwrap();
    s.add_edge(read_p, ret, None).unwrap();

    let arg = constant(&s, PrimitiveKind::Float, 20);
    s.add_edge(arg, param, None).unwrap();
    let call = s
        .add_expr(
            ExprKind::Call {
                callee: f,
                args: vec![arg],
                result: CallResult::ReturnSlot(ret),
            },
            at(&s, 20),
        )
        .unwrap();
    s.finish().unwrap();
    assert_eq!(*s.resolve(call).unwrap(), of(PrimitiveKind::Float));
}

#[test]
fn fork_and_wait() {
    let s = solver();
    let value = constant(&s, PrimitiveKind::Int, 1);
    let fork = s.add_expr(ExprKind::Fork(value), at(&s, 1)).unwrap();
    let wait = s.add_expr(ExprKind::Wait(fork), at(&s, 2)).unwrap();
    s.finish().unwrap();
    assert_eq!(
        *s.resolve(fork).unwrap(),
        TypeData::future_of(of(PrimitiveKind::Int))
    );
    assert_eq!(*s.resolve(wait).unwrap(), of(PrimitiveKind::Int));
}

#[test]
fn pool_reaches_the_same_fixpoint() {
    fn build(s: &TypeInferer) -> Vec<NodeId> {
        let mut chain = vec![local(s, "v0", 1)];
        let seed = constant(s, PrimitiveKind::Int, 1);
        s.add_edge(seed, chain[0], None).unwrap();
        for i in 1..200 {
            let v = local(s, &format!("v{i}"), 1);
            s.add_edge(chain[i - 1], v, None).unwrap();
            chain.push(v);
        }
        // Close the loop and widen it once.
        s.add_edge(chain[199], chain[0], None).unwrap();
        let widen = constant(s, PrimitiveKind::Float, 2);
        s.add_edge(widen, chain[100], None).unwrap();
        chain
    }

    let single = solver();
    let single_chain = build(&single);
    single.finish().unwrap();

    let pooled = solver_with(InferConfig::default().with_workers(4));
    let pooled_chain = build(&pooled);
    pooled.finish().unwrap();

    for (a, b) in single_chain.iter().zip(&pooled_chain) {
        assert_eq!(single.resolve(*a).unwrap(), pooled.resolve(*b).unwrap());
        assert_eq!(*pooled.resolve(*b).unwrap(), of(PrimitiveKind::Float));
    }
    assert!(pooled.stats().recalculations >= 200);
}
