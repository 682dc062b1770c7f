//! Integer and floating point arithmetic.
//!
//! The builders infer result types: a constant's from its `value`
//! attribute, a binary operation's from its first operand.

use std::borrow::Cow;

use linkme::distributed_slice;
use thiserror::Error;

use crate::{
    context::{Context, Ptr},
    dialect::{Dialect, DialectName},
    location::Located,
    op::{Arity, OpSchema, OpVerifier},
    operation::{Operation, OperationState},
    resolver::{DialectModule, DIALECT_MODULES},
    r#type::Type,
    result::Result,
    verify_err,
    wrapper::DialectClass,
};

use super::{first_operand_type, infer_single_result};

pub const NAMESPACE: &str = "arith";

const INT_BINARY_OPS: [&str; 3] = ["addi", "subi", "muli"];
const FLOAT_BINARY_OPS: [&str; 3] = ["addf", "subf", "mulf"];

#[derive(Debug, Error)]
#[error("'{op}' op requires operands and result of the same {expected} type")]
pub struct BinaryTypeVerifyErr {
    pub op: String,
    pub expected: &'static str,
}

#[derive(Debug, Error)]
#[error("'arith.constant' op value type does not match the result type {0}")]
pub struct ConstantTypeVerifyErr(pub String);

fn verify_binary(
    ctx: &Context,
    op: &Operation,
    expected: &'static str,
    accepts: fn(&Type) -> bool,
) -> Result<()> {
    let res_ty = &op.result_types()[0];
    let all_match = accepts(res_ty)
        && (0..op.get_num_operands())
            .all(|idx| op.get_operand_type(ctx, idx).as_ref() == Some(res_ty));
    if !all_match {
        return verify_err!(
            op.loc(),
            BinaryTypeVerifyErr {
                op: op.get_opid().to_string(),
                expected,
            }
        );
    }
    Ok(())
}

fn verify_int_binary(ctx: &Context, op: &Operation) -> Result<()> {
    verify_binary(ctx, op, "integer", Type::is_integer_or_index)
}

fn verify_float_binary(ctx: &Context, op: &Operation) -> Result<()> {
    verify_binary(ctx, op, "float", Type::is_float)
}

fn verify_constant(_ctx: &Context, op: &Operation) -> Result<()> {
    let res_ty = &op.result_types()[0];
    let value_ty = op.attributes.get("value").and_then(|value| value.get_type());
    if value_ty != Some(res_ty) {
        return verify_err!(op.loc(), ConstantTypeVerifyErr(res_ty.to_string()));
    }
    Ok(())
}

pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new(DialectName::new(NAMESPACE)).with_op(
        OpSchema::new("constant")
            .results(Arity::Exactly(1))
            .required_attr("value")
            .verifier(verify_constant),
    );
    let binary = |name: &str, verifier: OpVerifier| {
        OpSchema::new(name)
            .operands(Arity::Exactly(2))
            .results(Arity::Exactly(1))
            .verifier(verifier)
    };
    for name in INT_BINARY_OPS {
        dialect.add_op(binary(name, verify_int_binary));
    }
    for name in FLOAT_BINARY_OPS {
        dialect.add_op(binary(name, verify_float_binary));
    }
    dialect
}

fn build_constant(ctx: &mut Context, mut state: OperationState) -> Result<Ptr<Operation>> {
    let ty = state
        .get_attribute("value")
        .and_then(|value| value.get_type())
        .cloned();
    infer_single_result(&mut state, ty);
    Operation::create(ctx, state)
}

fn build_binary(ctx: &mut Context, mut state: OperationState) -> Result<Ptr<Operation>> {
    let ty = first_operand_type(ctx, &state);
    infer_single_result(&mut state, ty);
    Operation::create(ctx, state)
}

pub fn class() -> DialectClass {
    let mut class = DialectClass::new(NAMESPACE).with_op("constant", build_constant);
    for name in INT_BINARY_OPS.into_iter().chain(FLOAT_BINARY_OPS) {
        class.add_op(name, build_binary);
    }
    class
}

#[distributed_slice(DIALECT_MODULES)]
static ARITH_MODULE: DialectModule = DialectModule {
    path: Cow::Borrowed("dialects.arith"),
    class: Some(class),
    dialect: None,
};

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::{BinaryTypeVerifyErr, ConstantTypeVerifyErr};
    use crate::{
        attribute::Attribute,
        common_traits::Verify,
        context::Context,
        globals::Globals,
        operation::{Operation, OperationState},
        printable::Printable,
        r#type::Type,
    };

    #[test]
    fn builders_infer_result_types() {
        let mut ctx = Context::new(&Globals::new());
        let arith = ctx.dialects().attr("arith").unwrap();
        let c = arith
            .build(
                &mut ctx,
                "constant",
                OperationState::default().attribute("value", Attribute::integer(7, Type::i64())),
            )
            .unwrap();
        let c_val = c.deref(&ctx).get_result(0).unwrap();
        let mul = arith
            .build(
                &mut ctx,
                "muli",
                OperationState::default().operands(&[c_val, c_val]),
            )
            .unwrap();
        expect![[r#"%1 = "arith.muli"(%0, %0) : (i64, i64) -> i64"#]]
            .assert_eq(&mul.disp(&ctx).to_string());
        c.verify(&ctx).unwrap();
        mul.verify(&ctx).unwrap();
    }

    #[test]
    fn type_mismatches() {
        let mut ctx = Context::new(&Globals::new());
        let c = Operation::create(
            &mut ctx,
            OperationState::new("arith.constant")
                .attribute("value", Attribute::integer(7, Type::i64()))
                .results(&[Type::i32()]),
        )
        .unwrap();
        assert!(c.verify(&ctx).unwrap_err().is::<ConstantTypeVerifyErr>());

        let c_val = c.deref(&ctx).get_result(0).unwrap();
        let add = Operation::create(
            &mut ctx,
            OperationState::new("arith.addf")
                .operands(&[c_val, c_val])
                .results(&[Type::i32()]),
        )
        .unwrap();
        let err = add.verify(&ctx).unwrap_err();
        assert!(err.is::<BinaryTypeVerifyErr>());
        expect![[r#"'arith.addf' op requires operands and result of the same float type"#]]
            .assert_eq(&err.err.to_string());
    }
}
