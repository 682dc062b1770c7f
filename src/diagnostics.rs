//! Structured diagnostics and the chain of handlers they are delivered to.
//!
//! Handlers are attached to a [Context] and run synchronously, in the order
//! they were attached, for every [Diagnostic] emitted afterwards. A handler
//! returning `true` consumes the diagnostic: handlers attached later don't
//! see it. Diagnostics that no handler consumes go to the default sink
//! (a [tracing] event) when the context has `emit_error_diagnostics` set.
//!
//! While an operation is verified, Error diagnostics are captured into the
//! returned [Error](crate::result::Error) rather than being handed to
//! handlers, unless `emit_error_diagnostics` is set.

use std::{
    cell::{Cell, RefCell},
    fmt::Display,
};

use tracing::{debug, error, info, warn};

use crate::{context::Context, location::Location, printable::Printable};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Remark,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Remark => write!(f, "remark"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub loc: Location,
    /// Notes attached to this diagnostic, delivered along with it.
    pub notes: Vec<Diagnostic>,
}

impl Diagnostic {
    pub fn new(severity: Severity, loc: Location, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            severity,
            message: message.into(),
            loc,
            notes: vec![],
        }
    }

    pub fn error(loc: Location, message: impl Into<String>) -> Diagnostic {
        Self::new(Severity::Error, loc, message)
    }

    pub fn warning(loc: Location, message: impl Into<String>) -> Diagnostic {
        Self::new(Severity::Warning, loc, message)
    }

    pub fn remark(loc: Location, message: impl Into<String>) -> Diagnostic {
        Self::new(Severity::Remark, loc, message)
    }

    pub fn note(loc: Location, message: impl Into<String>) -> Diagnostic {
        Self::new(Severity::Note, loc, message)
    }

    /// Attach a note to this diagnostic.
    pub fn with_note(mut self, loc: Location, message: impl Into<String>) -> Diagnostic {
        self.notes.push(Diagnostic::note(loc, message));
        self
    }
}

impl Printable for Diagnostic {
    fn fmt(&self, ctx: &Context, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.loc.disp(ctx),
            self.severity,
            self.message
        )?;
        for note in &self.notes {
            write!(f, "\n  {}", note.disp(ctx))?;
        }
        Ok(())
    }
}

/// Something that wants to observe diagnostics.
/// Returns `true` if the diagnostic was consumed.
pub trait DiagnosticHandler {
    fn handle(&mut self, diag: &Diagnostic) -> bool;
}

impl<F: FnMut(&Diagnostic) -> bool> DiagnosticHandler for F {
    fn handle(&mut self, diag: &Diagnostic) -> bool {
        self(diag)
    }
}

/// Identifies an attached handler, for detaching it later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerToken(u64);

#[derive(Default)]
pub(crate) struct DiagnosticEngine {
    handlers: RefCell<Vec<(HandlerToken, Box<dyn DiagnosticHandler>)>>,
    /// Handlers taken out of `handlers` by the dispatches in progress.
    dispatching: RefCell<Vec<HandlerToken>>,
    /// Handlers detached while they were taken out for dispatch.
    pending_detach: RefCell<Vec<HandlerToken>>,
    next_token: Cell<u64>,
    /// One entry per active capture scope, innermost last.
    captures: RefCell<Vec<Vec<Diagnostic>>>,
    emit_error_diagnostics: Cell<bool>,
}

impl DiagnosticEngine {
    fn attach(&self, handler: Box<dyn DiagnosticHandler>) -> HandlerToken {
        let token = HandlerToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.handlers.borrow_mut().push((token, handler));
        token
    }

    fn detach(&self, token: HandlerToken) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let len = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        if handlers.len() != len {
            return true;
        }
        let mut pending = self.pending_detach.borrow_mut();
        if self.dispatching.borrow().contains(&token) && !pending.contains(&token) {
            pending.push(token);
            return true;
        }
        false
    }

    fn is_capturing(&self) -> bool {
        !self.captures.borrow().is_empty()
    }

    fn capture_diag(&self, diag: Diagnostic) {
        if let Some(scope) = self.captures.borrow_mut().last_mut() {
            scope.push(diag);
        }
    }

    /// Run the handler chain. Returns `true` if some handler consumed `diag`.
    /// Handlers run outside of any borrow, so they may attach, detach
    /// and emit. Handlers attached meanwhile go to the end of the chain.
    fn dispatch(&self, diag: &Diagnostic) -> bool {
        let mut running = self.handlers.take();
        let outer = self.dispatching.borrow().len();
        self.dispatching
            .borrow_mut()
            .extend(running.iter().map(|(token, _)| *token));

        let consumed = running.iter_mut().any(|(_, handler)| handler.handle(diag));

        self.dispatching.borrow_mut().truncate(outer);
        let mut pending = self.pending_detach.borrow_mut();
        running.retain(|(token, _)| match pending.iter().position(|t| t == token) {
            Some(idx) => {
                pending.swap_remove(idx);
                false
            }
            None => true,
        });
        drop(pending);
        let mut handlers = self.handlers.borrow_mut();
        running.append(&mut handlers);
        *handlers = running;
        consumed
    }
}

fn default_sink(ctx: &Context, diag: &Diagnostic) {
    let text = diag.disp(ctx).to_string();
    match diag.severity {
        Severity::Error => error!("{}", text),
        Severity::Warning => warn!("{}", text),
        Severity::Remark => info!("{}", text),
        Severity::Note => debug!("{}", text),
    }
}

impl Context {
    /// Attach a diagnostic handler. It sees every diagnostic emitted
    /// from now on, after the handlers attached before it.
    pub fn attach_diagnostic_handler(
        &self,
        handler: impl DiagnosticHandler + 'static,
    ) -> HandlerToken {
        self.diagnostics.attach(Box::new(handler))
    }

    /// Detach a handler. Returns `false` if it wasn't attached.
    pub fn detach_diagnostic_handler(&self, token: HandlerToken) -> bool {
        self.diagnostics.detach(token)
    }

    pub fn num_diagnostic_handlers(&self) -> usize {
        self.diagnostics.handlers.borrow().len()
    }

    pub fn emit_error_diagnostics(&self) -> bool {
        self.diagnostics.emit_error_diagnostics.get()
    }

    pub fn set_emit_error_diagnostics(&self, emit: bool) {
        self.diagnostics.emit_error_diagnostics.set(emit);
    }

    /// Deliver `diag` to the attached handlers.
    pub fn emit_diagnostic(&self, diag: Diagnostic) {
        let engine = &self.diagnostics;
        let is_error = diag.severity == Severity::Error;
        let emit_errors = engine.emit_error_diagnostics.get();

        if is_error && engine.is_capturing() && !emit_errors {
            engine.capture_diag(diag);
            return;
        }
        if engine.dispatch(&diag) {
            return;
        }
        if emit_errors {
            default_sink(self, &diag);
        }
        if is_error {
            engine.capture_diag(diag);
        }
    }

    /// Run `f`, collecting the Error diagnostics it emits that are not
    /// delivered to (or not consumed by) handlers.
    pub(crate) fn capture_diagnostics<T>(&self, f: impl FnOnce() -> T) -> (T, Vec<Diagnostic>) {
        self.diagnostics.captures.borrow_mut().push(vec![]);
        let res = f();
        let captured = self
            .diagnostics
            .captures
            .borrow_mut()
            .pop()
            .unwrap_or_default();
        (res, captured)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        fmt,
        rc::Rc,
        sync::{Arc, Mutex},
    };

    use expect_test::expect;
    use tracing::{
        field::{Field, Visit},
        Event, Level, Subscriber,
    };
    use tracing_subscriber::{
        layer::{Context as LayerContext, SubscriberExt},
        Layer,
    };

    use super::{Diagnostic, HandlerToken, Severity};
    use crate::{context::Context, globals::Globals, location::Location, printable::Printable};

    fn recorder(
        log: &Rc<RefCell<Vec<String>>>,
        tag: &'static str,
        consume: bool,
    ) -> impl FnMut(&Diagnostic) -> bool + 'static {
        let log = log.clone();
        move |d: &Diagnostic| {
            log.borrow_mut().push(format!("{}:{}", tag, d.message));
            consume
        }
    }

    #[test]
    fn attachment_order_and_consumption() {
        let ctx = Context::new(&Globals::new());
        let log = Rc::new(RefCell::new(vec![]));

        let first = ctx.attach_diagnostic_handler(recorder(&log, "first", false));
        ctx.attach_diagnostic_handler(recorder(&log, "second", true));
        ctx.attach_diagnostic_handler(recorder(&log, "third", true));

        ctx.emit_diagnostic(Diagnostic::warning(Location::Unknown, "w1"));
        assert_eq!(*log.borrow(), vec!["first:w1", "second:w1"]);

        assert!(ctx.detach_diagnostic_handler(first));
        assert!(!ctx.detach_diagnostic_handler(first));
        ctx.emit_diagnostic(Diagnostic::remark(Location::Unknown, "r2"));
        assert_eq!(*log.borrow(), vec!["first:w1", "second:w1", "second:r2"]);
        assert_eq!(ctx.num_diagnostic_handlers(), 2);
    }

    #[test]
    fn capture_scope() {
        let ctx = Context::new(&Globals::new());
        let log = Rc::new(RefCell::new(vec![]));
        ctx.attach_diagnostic_handler(recorder(&log, "h", false));

        let (_, captured) = ctx.capture_diagnostics(|| {
            ctx.emit_diagnostic(Diagnostic::error(Location::Unknown, "e1"));
            ctx.emit_diagnostic(Diagnostic::warning(Location::Unknown, "w1"));
        });
        // Errors are captured, everything else still reaches handlers.
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].message, "e1");
        assert_eq!(*log.borrow(), vec!["h:w1"]);

        ctx.set_emit_error_diagnostics(true);
        let (_, captured) = ctx.capture_diagnostics(|| {
            ctx.emit_diagnostic(Diagnostic::error(Location::Unknown, "e2"));
        });
        // Not consumed by the handler, so it's also kept with the capture.
        assert_eq!(captured.len(), 1);
        assert_eq!(*log.borrow(), vec!["h:w1", "h:e2"]);
    }

    #[test]
    fn print_with_notes() {
        let ctx = Context::new(&Globals::new());
        let diag = Diagnostic::error(Location::file_line_col("x.mlir", 2, 5), "bad thing")
            .with_note(Location::Unknown, "see here");
        assert_eq!(diag.severity, Severity::Error);
        expect![[r#"
            x.mlir:2:5: error: bad thing
              ?: note: see here"#]]
        .assert_eq(&diag.disp(&ctx).to_string());
    }

    #[test]
    fn handlers_can_reshape_the_chain() {
        let ctx = Rc::new(Context::new(&Globals::new()));
        let log = Rc::new(RefCell::new(vec![]));
        let own_token: Rc<Cell<Option<HandlerToken>>> = Rc::default();

        // Detaches itself and attaches a replacement on the first diagnostic.
        let once = {
            let (weak, log, own_token) = (Rc::downgrade(&ctx), log.clone(), own_token.clone());
            move |d: &Diagnostic| {
                log.borrow_mut().push(format!("once:{}", d.message));
                if let (Some(ctx), Some(token)) = (weak.upgrade(), own_token.take()) {
                    assert!(ctx.detach_diagnostic_handler(token));
                    assert!(!ctx.detach_diagnostic_handler(token));
                    ctx.attach_diagnostic_handler(recorder(&log, "late", false));
                    ctx.emit_diagnostic(Diagnostic::note(Location::Unknown, "nested"));
                }
                false
            }
        };
        own_token.set(Some(ctx.attach_diagnostic_handler(once)));

        ctx.emit_diagnostic(Diagnostic::remark(Location::Unknown, "r1"));
        ctx.emit_diagnostic(Diagnostic::remark(Location::Unknown, "r2"));
        assert_eq!(*log.borrow(), vec!["once:r1", "late:nested", "late:r2"]);
        assert_eq!(ctx.num_diagnostic_handlers(), 1);
    }

    /// Records the events of this module's default sink.
    struct SinkRecorder(Arc<Mutex<Vec<(Level, String)>>>);

    struct MessageField(String);

    impl Visit for MessageField {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for SinkRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
            if event.metadata().target() != "dialex::diagnostics" {
                return;
            }
            let mut message = MessageField(String::new());
            event.record(&mut message);
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), message.0));
        }
    }

    #[test]
    fn default_sink_logs_unconsumed() {
        let ctx = Context::new(&Globals::new());
        let events = Arc::new(Mutex::new(vec![]));
        let subscriber = tracing_subscriber::registry().with(SinkRecorder(events.clone()));

        tracing::subscriber::with_default(subscriber, || {
            ctx.emit_diagnostic(Diagnostic::warning(Location::Unknown, "w0"));
            assert!(events.lock().unwrap().is_empty());

            ctx.set_emit_error_diagnostics(true);
            ctx.emit_diagnostic(Diagnostic::error(Location::Unknown, "e1"));
            ctx.emit_diagnostic(Diagnostic::remark(Location::Unknown, "r1"));

            let log = Rc::new(RefCell::new(vec![]));
            ctx.attach_diagnostic_handler(recorder(&log, "h", true));
            ctx.emit_diagnostic(Diagnostic::error(Location::Unknown, "consumed"));
            assert_eq!(*log.borrow(), vec!["h:consumed"]);
        });

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                (Level::ERROR, "?: error: e1".to_string()),
                (Level::INFO, "?: remark: r1".to_string()),
            ]
        );
    }
}
