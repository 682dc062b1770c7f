use common::{assert_no_live_contexts, record_diagnostics};
use dialex::{
    common_traits::Verify,
    context::{Context, ContextConfig},
    diagnostics::Severity,
    globals::Globals,
    location::Location,
    operation::{Operation, OperationState},
    printable::Printable,
    result::ErrorKind,
};
use expect_test::expect;

mod common;

#[test]
fn dialect_load_on_create() {
    let globals = Globals::new();
    {
        let mut ctx = Context::with_config(
            &globals,
            ContextConfig::default()
                .load_on_create(&[])
                .allow_unregistered_dialects(true),
        )
        .unwrap();
        ctx.set_emit_error_diagnostics(true);
        let seen = record_diagnostics(&ctx, true);

        let op = Operation::create(&mut ctx, OperationState::new("arith.addi")).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0]
            .message
            .contains("op created with unregistered dialect"));

        ctx.set_allow_unregistered_dialects(false);
        let err = op.verify(&ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::VerificationFailed);
        // Error diagnostics are emitted, and the handler consumed this one.
        assert!(err.diagnostics.is_empty());
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1].severity, Severity::Error);
    }
    {
        let mut ctx =
            Context::with_config(&globals, ContextConfig::default().load_on_create(&["func"]))
                .unwrap();
        assert_eq!(ctx.list_dialects(), vec!["func".to_string()]);
        Operation::create(&mut ctx, OperationState::new("func.func")).unwrap();
    }

    assert!(globals.load_on_create_dialects().is_empty());
    globals.append_load_on_create_dialect("func");
    assert!(globals
        .load_on_create_dialects()
        .contains(&"func".to_string()));
    assert_no_live_contexts();
}

#[test]
fn verification_diagnostics_are_captured() {
    let mut ctx = Context::with_config(
        &Globals::new(),
        ContextConfig::default().allow_unregistered_dialects(true),
    )
    .unwrap();
    let seen = record_diagnostics(&ctx, false);

    let loc = Location::file_line_col("input.mlir", 4, 2);
    let op = Operation::create(&mut ctx, OperationState::new("custom.op").loc(loc)).unwrap();
    assert_eq!(seen.borrow()[0].severity, Severity::Warning);

    ctx.set_allow_unregistered_dialects(false);
    let err = op.verify(&ctx).unwrap_err();
    // Not handed to handlers, but kept with the error.
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(err.diagnostics.len(), 1);

    let printed = err.disp(&ctx).to_string();
    let first_two: Vec<&str> = printed.lines().take(2).collect();
    expect![[r#"
        [input.mlir:4:2] verification failed: 'custom.op' op created with unregistered dialect. If this is intended, please call allow_unregistered_dialects on the Context
          input.mlir:4:2: error: 'custom.op' op created with unregistered dialect. If this is intended, please call allow_unregistered_dialects on the Context"#]]
    .assert_eq(&first_two.join("\n"));
}

#[test]
fn first_handler_consumes() {
    let mut ctx = Context::with_config(
        &Globals::new(),
        ContextConfig::default().allow_unregistered_dialects(true),
    )
    .unwrap();
    let seen = record_diagnostics(&ctx, true);
    let later = record_diagnostics(&ctx, true);

    Operation::create(&mut ctx, OperationState::new("custom.a")).unwrap();
    assert_eq!(seen.borrow().len(), 1);
    // Consumed by the first handler.
    assert!(later.borrow().is_empty());

    assert_eq!(ctx.num_diagnostic_handlers(), 2);
}
