#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use dialex::{
    context::{Context, Ptr},
    diagnostics::Diagnostic,
    globals::Globals,
    operation::{Operation, OperationState, Value},
    r#type::Type,
};

/// A context with every upstream dialect loaded.
pub fn setup_context() -> Context {
    Context::new(&Globals::new())
}

/// Attach a handler that records the messages it sees. It consumes them if `consume`.
pub fn record_diagnostics(ctx: &Context, consume: bool) -> Rc<RefCell<Vec<Diagnostic>>> {
    let log = Rc::new(RefCell::new(vec![]));
    let handler_log = log.clone();
    ctx.attach_diagnostic_handler(move |diag: &Diagnostic| {
        handler_log.borrow_mut().push(diag.clone());
        consume
    });
    log
}

/// Create an unregistered operation producing a single value of type `ty`.
/// The context must allow unregistered dialects.
pub fn create_input(ctx: &mut Context, ty: Type) -> (Ptr<Operation>, Value) {
    let op = Operation::create(
        ctx,
        OperationState::new("test_input.intinput").results(&[ty]),
    )
    .unwrap();
    let value = op.deref(ctx).get_result(0).unwrap();
    (op, value)
}

/// Every context created on this thread has been dropped.
pub fn assert_no_live_contexts() {
    assert_eq!(Context::live_count(), 0);
}
