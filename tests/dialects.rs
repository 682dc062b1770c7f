use common::{assert_no_live_contexts, create_input, setup_context};
use dialex::{
    common_traits::Verify,
    operation::OperationState,
    printable::Printable,
    r#type::Type,
    registry::UnknownDialectErr,
    result::ErrorKind,
};
use expect_test::expect;

mod common;

#[test]
fn dialect_descriptor() {
    {
        let mut ctx = setup_context();
        let d = ctx.get_dialect_descriptor("func").unwrap();
        expect![[r#"<DialectDescriptor func>"#]].assert_eq(&d.to_string());
        assert_eq!(d.namespace().as_str(), "func");

        let err = ctx.get_dialect_descriptor("not_existing").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownDialect);
        expect![[r#"unknown dialect: Dialect "not_existing" not found"#]]
            .assert_eq(&err.to_string());
    }
    assert_no_live_contexts();
}

#[test]
fn user_dialect_class() {
    {
        let mut ctx = setup_context();

        let d = ctx.dialects().attr("func").unwrap();
        expect![[r#"<Dialect func (class dialects.func)>"#]].assert_eq(&d.to_string());
        let err = ctx.dialects().attr("not_existing").unwrap_err();
        assert_eq!(err.kind, ErrorKind::AttributeNotFound);

        let d = ctx.dialects().index("func").unwrap();
        expect![[r#"<Dialect func (class dialects.func)>"#]].assert_eq(&d.to_string());
        let err = ctx.dialects().index("not_existing").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexOutOfRange);
        assert!(err.is::<UnknownDialectErr>());

        let d = ctx.d().index("func").unwrap();
        expect![[r#"<Dialect func (class dialects.func)>"#]].assert_eq(&d.to_string());
    }
    assert_no_live_contexts();
}

#[test]
fn custom_op_view() {
    {
        let mut ctx = setup_context();
        ctx.set_allow_unregistered_dialects(true);

        let (in0, input0) = create_input(&mut ctx, Type::f32());
        let (in1, input1) = create_input(&mut ctx, Type::f32());

        // Through the context's dialect wrapper.
        let arith = ctx.dialects().attr("arith").unwrap();
        let op1 = arith
            .build(
                &mut ctx,
                "addf",
                OperationState::default().operands(&[input0, input1]),
            )
            .unwrap();
        let r0 = op1.deref(&ctx).get_result(0).unwrap();

        // Through the process-wide operation classes.
        let addf = ctx
            .globals()
            .lookup_operation_class("arith.addf")
            .unwrap()
            .unwrap();
        let op2 = addf
            .build(&mut ctx, OperationState::default().operands(&[input0, r0]))
            .unwrap();

        let printed: Vec<String> = [in0, in1, op1, op2]
            .iter()
            .map(|op| op.disp(&ctx).to_string())
            .collect();
        expect![[r#"
            %0 = "test_input.intinput"() : () -> f32
            %1 = "test_input.intinput"() : () -> f32
            %2 = "arith.addf"(%0, %1) : (f32, f32) -> f32
            %3 = "arith.addf"(%0, %2) : (f32, f32) -> f32"#]]
        .assert_eq(&printed.join("\n"));

        op1.verify(&ctx).unwrap();
        op2.verify(&ctx).unwrap();
    }
    assert_no_live_contexts();
}

#[test]
fn is_registered_operation() {
    {
        let ctx = setup_context();
        assert!(ctx.is_registered_operation("cf.cond_br"));
        assert!(!ctx.is_registered_operation("func.not_existing"));
    }
    assert_no_live_contexts();
}

#[test]
fn unknown_op_builder() {
    let mut ctx = setup_context();
    let func = ctx.d().attr("func").unwrap();
    let err = func
        .build(&mut ctx, "not_existing", OperationState::default())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AttributeNotFound);
    assert_eq!(ctx.num_live_operations(), 0);
}
