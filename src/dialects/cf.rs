//! Unstructured control flow.

use std::borrow::Cow;

use linkme::distributed_slice;
use thiserror::Error;

use crate::{
    context::Context,
    dialect::{Dialect, DialectName},
    location::Located,
    op::{Arity, OpSchema},
    operation::Operation,
    resolver::{DialectModule, DIALECT_MODULES},
    r#type::Type,
    result::Result,
    verify_err,
    wrapper::DialectClass,
};

pub const NAMESPACE: &str = "cf";

#[derive(Debug, Error)]
#[error("'{0}' op requires its first operand to be of type i1")]
pub struct ConditionTypeVerifyErr(pub String);

fn verify_condition(ctx: &Context, op: &Operation) -> Result<()> {
    if op.get_operand_type(ctx, 0) != Some(Type::i1()) {
        return verify_err!(op.loc(), ConditionTypeVerifyErr(op.get_opid().to_string()));
    }
    Ok(())
}

pub fn dialect() -> Dialect {
    Dialect::new(DialectName::new(NAMESPACE))
        .with_op(OpSchema::new("br").operands(Arity::AtLeast(0)))
        .with_op(
            OpSchema::new("cond_br")
                .operands(Arity::AtLeast(1))
                .verifier(verify_condition),
        )
        .with_op(
            OpSchema::new("assert")
                .operands(Arity::Exactly(1))
                .required_attr("msg")
                .verifier(verify_condition),
        )
}

pub fn class() -> DialectClass {
    DialectClass::new(NAMESPACE)
        .with_op("br", Operation::create)
        .with_op("cond_br", Operation::create)
        .with_op("assert", Operation::create)
}

#[distributed_slice(DIALECT_MODULES)]
static CF_MODULE: DialectModule = DialectModule {
    path: Cow::Borrowed("dialects.cf"),
    class: Some(class),
    dialect: None,
};
