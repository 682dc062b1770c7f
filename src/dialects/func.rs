//! Functions, calls and returns.

use std::borrow::Cow;

use linkme::distributed_slice;
use thiserror::Error;

use crate::{
    attribute::Attribute,
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

pub const NAMESPACE: &str = "func";

#[derive(Debug, Error)]
pub enum FuncOpVerifyErr {
    #[error("'func.func' op requires a string attribute 'sym_name'")]
    SymNameNotString,
    #[error("'func.func' op requires 'function_type' to be a function type")]
    NotFunctionType,
}

#[derive(Debug, Error)]
#[error("'func.call' op requires 'callee' to be a symbol reference")]
pub struct CalleeNotSymbolErr;

fn verify_func(_ctx: &Context, op: &Operation) -> Result<()> {
    if !matches!(op.attributes.get("sym_name"), Some(Attribute::String(_))) {
        return verify_err!(op.loc(), FuncOpVerifyErr::SymNameNotString);
    }
    if !matches!(
        op.attributes.get("function_type"),
        Some(Attribute::Type(Type::Function { .. }))
    ) {
        return verify_err!(op.loc(), FuncOpVerifyErr::NotFunctionType);
    }
    Ok(())
}

fn verify_call(_ctx: &Context, op: &Operation) -> Result<()> {
    match op.attributes.get("callee") {
        Some(Attribute::SymbolRef(_)) => Ok(()),
        _ => verify_err!(op.loc(), CalleeNotSymbolErr),
    }
}

pub fn dialect() -> Dialect {
    Dialect::new(DialectName::new(NAMESPACE))
        .with_op(
            OpSchema::new("func")
                .required_attr("sym_name")
                .required_attr("function_type")
                .verifier(verify_func),
        )
        .with_op(OpSchema::new("return").operands(Arity::AtLeast(0)))
        .with_op(
            OpSchema::new("call")
                .operands(Arity::AtLeast(0))
                .results(Arity::AtLeast(0))
                .required_attr("callee")
                .verifier(verify_call),
        )
}

pub fn class() -> DialectClass {
    DialectClass::new(NAMESPACE)
        .with_op("func", Operation::create)
        .with_op("return", Operation::create)
        .with_op("call", Operation::create)
}

#[distributed_slice(DIALECT_MODULES)]
static FUNC_MODULE: DialectModule = DialectModule {
    path: Cow::Borrowed("dialects.func"),
    class: Some(class),
    dialect: None,
};
