//! Arena-allocated AST for the Rue type checker.
//!
//! Trees use `ExprId(u32)` indices into a per-file [`ExprArena`]; children
//! are ids, never boxes. Work queues in the resolver address nodes as
//! `(tree, id)` pairs, which stay valid across the worker/main-thread
//! handoff — node ids are stable for the lifetime of a tree even as nodes
//! are rewritten in place.

mod arena;
mod expr;
pub mod mk;

pub use arena::{ExprArena, ExprId};
pub use expr::{CastKind, ClassKind, Expr, ExprKind, IdentKind, MethodDefFlags, Tree};
