//! Dialects that are part of `dialex`.
//!
//! Each dialect comes in two parts: a constructor for the [Dialect](crate::dialect::Dialect)
//! with its operation schemas, made available by [register_all], and a
//! dialect module linked at `"dialects.<namespace>"` with its operation builders.

use crate::{context::Context, globals::Globals, operation::OperationState, r#type::Type};

pub mod arith;
pub mod builtin;
pub mod cf;
pub mod func;

/// Make every dialect in this crate available.
pub(crate) fn register_all(globals: &Globals) {
    globals.register_dialect(builtin::dialect);
    globals.register_dialect(func::dialect);
    globals.register_dialect(arith::dialect);
    globals.register_dialect(cf::dialect);
}

/// If `state` has no result types, give it one result of type `ty`.
pub(crate) fn infer_single_result(state: &mut OperationState, ty: Option<Type>) {
    if state.result_types.is_empty() {
        state.result_types.extend(ty);
    }
}

/// Type of the first operand of `state`, if there is one and it's live.
pub(crate) fn first_operand_type(ctx: &Context, state: &OperationState) -> Option<Type> {
    state.operands.first().and_then(|opd| opd.get_type(ctx))
}
