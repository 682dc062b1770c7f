//! [Context] and [Ptr] together provide memory management for `dialex`.
//!
//! A [Context] is one session: it owns the dialects loaded into it, the
//! operations created in it, the cached dialect wrappers and the attached
//! diagnostic handlers. Everything it hands out is either a [Ptr] into one
//! of its arenas or a cheap handle that is meaningless without it.

use std::{
    any::TypeId,
    cell::{Cell, Ref, RefCell, RefMut},
    fmt::Debug,
    hash::Hash,
    marker::PhantomData,
};

use rustc_hash::FxHashMap;
use slotmap::{DefaultKey, SlotMap};
use tracing::{debug, warn};

use crate::{
    common_traits::Verify,
    dialect::DialectName,
    diagnostics::DiagnosticEngine,
    globals::Globals,
    operation::Operation,
    printable::Printable,
    registry::DialectRegistry,
    result::Result,
    wrapper::DialectWrapper,
};

pub type ArenaCell<T> = SlotMap<DefaultKey, RefCell<T>>;

thread_local! {
    static LIVE_CONTEXTS: Cell<usize> = const { Cell::new(0) };
}

/// Options for constructing a [Context].
#[derive(Clone, Debug, Default)]
pub struct ContextConfig {
    /// Dialects to load while constructing the context. `None` defers to
    /// the [Globals]: all available dialects are loaded, or, if that has
    /// been turned off, those in [Globals::load_on_create_dialects].
    pub load_on_create_dialects: Option<Vec<String>>,
    /// Initial value of [Context::allow_unregistered_dialects].
    pub allow_unregistered_dialects: bool,
}

impl ContextConfig {
    pub fn load_on_create(mut self, dialects: &[&str]) -> ContextConfig {
        self.load_on_create_dialects = Some(dialects.iter().map(|d| d.to_string()).collect());
        self
    }

    pub fn allow_unregistered_dialects(mut self, allow: bool) -> ContextConfig {
        self.allow_unregistered_dialects = allow;
        self
    }
}

/// A context stores all IR data of this compilation session.
pub struct Context {
    globals: Globals,
    /// Dialects loaded in this context.
    pub(crate) registry: DialectRegistry,
    /// Allocation pool for [Operation]s.
    pub(crate) operations: ArenaCell<Operation>,
    /// Wrappers handed out by [Context::dialects], cached by namespace.
    pub(crate) wrappers: FxHashMap<DialectName, DialectWrapper>,
    pub(crate) diagnostics: DiagnosticEngine,
    allow_unregistered_dialects: bool,
    next_op_number: u64,
}

impl Context {
    /// Create a context, loading dialects as directed by `globals`.
    /// Names in [Globals::load_on_create_dialects] that cannot be
    /// loaded are skipped with a warning.
    pub fn new(globals: &Globals) -> Context {
        let mut ctx = Context::empty(globals);
        if globals.load_all_available_dialects() {
            ctx.load_all_available_dialects();
        } else {
            for name in globals.load_on_create_dialects() {
                if let Err(err) = ctx.dialects().index(&name) {
                    warn!("Skipping load-on-create dialect {}: {}", name, err);
                }
            }
        }
        ctx
    }

    /// Create a context from an explicit configuration. Fails if a
    /// load-on-create dialect can't be loaded.
    pub fn with_config(globals: &Globals, config: ContextConfig) -> Result<Context> {
        let ContextConfig {
            load_on_create_dialects,
            allow_unregistered_dialects,
        } = config;

        let mut ctx = match load_on_create_dialects {
            None => Context::new(globals),
            Some(names) => {
                let mut ctx = Context::empty(globals);
                for name in names {
                    ctx.dialects().index(&name)?;
                }
                ctx
            }
        };
        ctx.allow_unregistered_dialects = allow_unregistered_dialects;
        Ok(ctx)
    }

    fn empty(globals: &Globals) -> Context {
        LIVE_CONTEXTS.with(|live| live.set(live.get() + 1));
        debug!("Creating context");
        Context {
            globals: globals.clone(),
            registry: DialectRegistry::default(),
            operations: ArenaCell::default(),
            wrappers: FxHashMap::default(),
            diagnostics: DiagnosticEngine::default(),
            allow_unregistered_dialects: false,
            next_op_number: 0,
        }
    }

    /// The process-wide configuration this context was created with.
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn allow_unregistered_dialects(&self) -> bool {
        self.allow_unregistered_dialects
    }

    pub fn set_allow_unregistered_dialects(&mut self, allow: bool) {
        self.allow_unregistered_dialects = allow;
    }

    /// Number of [Context]s alive on this thread.
    pub fn live_count() -> usize {
        LIVE_CONTEXTS.with(|live| live.get())
    }

    /// Number of operations that have been created and not erased.
    pub fn num_live_operations(&self) -> usize {
        self.operations.len()
    }

    pub(crate) fn next_op_number(&mut self) -> u64 {
        let number = self.next_op_number;
        self.next_op_number += 1;
        number
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        LIVE_CONTEXTS.with(|live| live.set(live.get() - 1));
    }
}

pub(crate) mod private {
    use std::{cell::RefCell, marker::PhantomData};

    use super::{ArenaCell, Context, Ptr};

    /// An IR object owned by Context
    pub trait ArenaObj
    where
        Self: Sized,
    {
        /// Get the arena that has allocated this object.
        fn get_arena(ctx: &Context) -> &ArenaCell<Self>;
        /// Get the arena that has allocated this object.
        fn get_arena_mut(ctx: &mut Context) -> &mut ArenaCell<Self>;

        /// Allocates object on the arena, given a creator function.
        fn alloc<T: FnOnce(Ptr<Self>) -> Self>(ctx: &mut Context, f: T) -> Ptr<Self> {
            let key = Self::get_arena_mut(ctx).insert_with_key(|key| {
                RefCell::new(f(Ptr {
                    key,
                    _dummy: PhantomData,
                }))
            });
            Ptr {
                key,
                _dummy: PhantomData,
            }
        }

        /// Deallocates this object from the arena.
        fn dealloc(ptr: Ptr<Self>, ctx: &mut Context) {
            Self::get_arena_mut(ctx).remove(ptr.key);
        }
    }
}

use private::ArenaObj;

/// Pointer to an IR Object owned by Context.
pub struct Ptr<T: ArenaObj> {
    pub(crate) key: DefaultKey,
    pub(crate) _dummy: PhantomData<T>,
}

impl<'a, T: ArenaObj> Ptr<T> {
    /// Return a [Ref] to the pointee.
    /// This borrows from a RefCell and the borrow is live
    /// as long as the returned Ref lives.
    ///
    /// Panics if the pointee has been deallocated.
    pub fn deref(&self, ctx: &'a Context) -> Ref<'a, T> {
        T::get_arena(ctx)
            .get(self.key)
            .expect("Dangling Ptr: pointee was deallocated")
            .borrow()
    }

    /// Return a RefMut to the pointee.
    /// This mutably borrows from a RefCell and the borrow is live
    /// as long as the returned RefMut lives.
    ///
    /// Panics if the pointee has been deallocated.
    pub fn deref_mut(&self, ctx: &'a Context) -> RefMut<'a, T> {
        T::get_arena(ctx)
            .get(self.key)
            .expect("Dangling Ptr: pointee was deallocated")
            .borrow_mut()
    }

    /// Try and return a Ref to the pointee.
    /// Fails if the pointee is deallocated or mutably borrowed.
    pub fn try_deref(&self, ctx: &'a Context) -> Option<Ref<'a, T>> {
        T::get_arena(ctx)
            .get(self.key)
            .and_then(|cell| cell.try_borrow().ok())
    }

    /// Is the pointee still allocated?
    pub fn is_alive(&self, ctx: &Context) -> bool {
        T::get_arena(ctx).contains_key(self.key)
    }
}

impl<T: ArenaObj> Clone for Ptr<T> {
    fn clone(&self) -> Ptr<T> {
        *self
    }
}

impl<T: ArenaObj> Copy for Ptr<T> {}

impl<T: ArenaObj> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: ArenaObj> Eq for Ptr<T> {}

impl<T: ArenaObj + 'static> Hash for Ptr<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        TypeId::of::<T>().hash(state);
        self.key.hash(state);
    }
}

impl<T: ArenaObj> Debug for Ptr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ptr({:?})", self.key)
    }
}

impl<T: ArenaObj + Printable> Printable for Ptr<T> {
    fn fmt(&self, ctx: &Context, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.deref(ctx).fmt(ctx, f)
    }
}

impl<T: ArenaObj + Verify> Verify for Ptr<T> {
    fn verify(&self, ctx: &Context) -> Result<()> {
        self.deref(ctx).verify(ctx)
    }
}
