//! `dialex` manages the dialects of an MLIR-style IR.
//!
//! - [Globals](globals::Globals) hold what is shared between contexts: the
//!   dialects that are *available*, the search prefixes under which dialect
//!   modules are resolved and the dialects to load when a context is created.
//! - A [Context](context::Context) *loads* dialects, lazily or eagerly,
//!   and owns the operations created in it.
//! - [Context::dialects](context::Context::dialects) wraps a loaded dialect
//!   together with the operation builders of its module.
//! - [Operation::create](operation::Operation::create) enforces the
//!   registration policy, and [Verify](common_traits::Verify) checks
//!   operations against their dialect's schemas.
//! - Diagnostics flow through handlers attached to the context.
//!
//! ```
//! use dialex::{context::Context, globals::Globals};
//!
//! let globals = Globals::new();
//! let mut ctx = Context::new(&globals);
//! assert!(ctx.is_registered_operation("cf.cond_br"));
//! let func = ctx.dialects().attr("func").unwrap();
//! assert_eq!(func.namespace().as_str(), "func");
//! ```

#[forbid(unsafe_code)]
pub mod attribute;
pub mod common_traits;
pub mod context;
pub mod diagnostics;
pub mod dialect;
pub mod dialects;
pub mod globals;
pub mod identifier;
pub mod location;
pub mod op;
pub mod operation;
pub mod printable;
pub mod registry;
pub mod resolver;
pub mod result;
pub mod r#type;
pub mod wrapper;
