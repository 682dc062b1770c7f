//! Process-wide configuration shared by the [Context]s created from it.
//!
//! [Globals] is a cheap handle: clones share the same state. Contexts keep a
//! clone, so search prefixes appended later, and the dialect modules they
//! make loadable, are visible to every context (live or not). The
//! load-on-create list, in contrast, is only read while a [Context] is
//! being constructed.
//!
//! [Globals] is confined to the thread that created it.
//!
//! [Context]: crate::context::Context

use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use crate::{
    dialect::{DialectConstructor, DialectName},
    dialects,
    op::OpId,
    resolver::{DialectLoader, LinkedModules, SearchPathResolver},
    result::Result,
    wrapper::{DialectClass, OpClass},
};

/// The prefix under which the dialects of this crate are linked.
pub const DEFAULT_SEARCH_PREFIX: &str = "dialects";

struct GlobalsInner {
    resolver: SearchPathResolver,
    /// Dialects that can be loaded without module resolution, in registration order.
    constructors: Vec<(DialectName, DialectConstructor)>,
    load_on_create: Vec<String>,
    load_all_available: bool,
}

#[derive(Clone)]
pub struct Globals(Rc<RefCell<GlobalsInner>>);

impl Default for Globals {
    fn default() -> Self {
        Self::new()
    }
}

impl Globals {
    /// Globals with the upstream dialects available, [LinkedModules] as
    /// the loader, and [DEFAULT_SEARCH_PREFIX] as the only search prefix.
    pub fn new() -> Globals {
        Self::with_loader(LinkedModules)
    }

    /// Same as [Globals::new], but resolving modules with `loader`.
    pub fn with_loader(loader: impl DialectLoader + 'static) -> Globals {
        let mut resolver = SearchPathResolver::new(loader);
        resolver.append_search_prefix(DEFAULT_SEARCH_PREFIX);
        let globals = Globals(Rc::new(RefCell::new(GlobalsInner {
            resolver,
            constructors: vec![],
            load_on_create: vec![],
            load_all_available: true,
        })));
        dialects::register_all(&globals);
        globals
    }

    /// Make a dialect available to contexts. Returns `false`
    /// (and changes nothing) if it's already available.
    pub fn register_dialect(&self, constructor: DialectConstructor) -> bool {
        let name = constructor().get_name().clone();
        let mut inner = self.0.borrow_mut();
        if inner.constructors.iter().any(|(n, _)| *n == name) {
            return false;
        }
        debug!("Registering dialect {}", name);
        inner.constructors.push((name, constructor));
        true
    }

    pub(crate) fn dialect_constructor(&self, name: &DialectName) -> Option<DialectConstructor> {
        self.0
            .borrow()
            .constructors
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, constructor)| *constructor)
    }

    /// Dialects that can be loaded without module resolution.
    pub fn available_dialects(&self) -> Vec<DialectName> {
        self.0
            .borrow()
            .constructors
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Append a prefix to the dialect module search path.
    /// Duplicates are ignored, in which case `false` is returned.
    pub fn append_dialect_search_prefix(&self, prefix: &str) -> bool {
        self.0.borrow_mut().resolver.append_search_prefix(prefix)
    }

    pub fn dialect_search_prefixes(&self) -> Vec<String> {
        self.0.borrow().resolver.search_prefixes().to_vec()
    }

    /// Dialects loaded by contexts constructed without an explicit list,
    /// when loading all available dialects is turned off.
    pub fn load_on_create_dialects(&self) -> Vec<String> {
        self.0.borrow().load_on_create.clone()
    }

    /// Append to [Self::load_on_create_dialects]. There's no removal.
    pub fn append_load_on_create_dialect(&self, name: &str) {
        let mut inner = self.0.borrow_mut();
        if !inner.load_on_create.iter().any(|n| n == name) {
            inner.load_on_create.push(name.to_string());
        }
    }

    /// Do contexts constructed without an explicit load-on-create
    /// list load every available dialect? Defaults to `true`.
    pub fn load_all_available_dialects(&self) -> bool {
        self.0.borrow().load_all_available
    }

    pub fn set_load_all_available_dialects(&self, load_all: bool) {
        self.0.borrow_mut().load_all_available = load_all;
    }

    /// Query, without trying to load it, whether `namespace`'s module is loaded.
    pub fn is_dialect_module_loaded(&self, namespace: &str) -> bool {
        self.0.borrow().resolver.is_module_loaded(namespace)
    }

    /// Load `namespace`'s dialect module, if not already loaded.
    /// If the module brings a dialect, that dialect becomes available.
    ///
    /// The loader runs while the globals are borrowed, so it must not
    /// call back into them.
    pub fn load_dialect_module(&self, namespace: &str) -> Result<bool> {
        let dialect = {
            let mut inner = self.0.borrow_mut();
            if inner.resolver.is_module_loaded(namespace) {
                return Ok(true);
            }
            if !inner.resolver.resolve_and_load(namespace)? {
                return Ok(false);
            }
            inner
                .resolver
                .get_loaded_module(namespace)
                .and_then(|module| module.dialect)
        };
        if let Some(constructor) = dialect {
            self.register_dialect(constructor);
        }
        Ok(true)
    }

    /// The operation builders for `namespace`, loading its module if needed.
    pub fn lookup_dialect_class(&self, namespace: &str) -> Result<Option<Rc<DialectClass>>> {
        if !self.load_dialect_module(namespace)? {
            return Ok(None);
        }
        Ok(self
            .0
            .borrow()
            .resolver
            .get_loaded_module(namespace)
            .and_then(|module| module.class.clone()))
    }

    /// The builder for a qualified operation name, loading its dialect's module if needed.
    pub fn lookup_operation_class(&self, qualified_name: &str) -> Result<Option<OpClass>> {
        let opid = OpId::parse(qualified_name)?;
        Ok(self
            .lookup_dialect_class(&opid.dialect)?
            .and_then(|class| class.get_op(&opid.name).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::{Globals, DEFAULT_SEARCH_PREFIX};
    use crate::{
        dialect::{Dialect, DialectName},
        op::OpSchema,
        resolver::{DialectModule, LinkedModules, ModuleTable},
        wrapper::DialectClass,
    };

    fn toy_dialect() -> Dialect {
        Dialect::new(DialectName::new("toy")).with_op(OpSchema::new("print"))
    }

    fn toy_class() -> DialectClass {
        DialectClass::new("toy")
    }

    #[test]
    fn defaults() {
        let globals = Globals::new();
        assert_eq!(globals.dialect_search_prefixes(), vec![DEFAULT_SEARCH_PREFIX]);
        assert!(globals.load_on_create_dialects().is_empty());
        assert!(globals.load_all_available_dialects());
        let available: Vec<_> = globals
            .available_dialects()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(available, vec!["builtin", "func", "arith", "cf"]);
    }

    #[test]
    fn search_prefix_idempotence() {
        let globals = Globals::new();
        assert!(globals.append_dialect_search_prefix("custom_dialect"));
        let len = globals.dialect_search_prefixes().len();
        assert!(!globals.append_dialect_search_prefix("custom_dialect"));
        assert_eq!(globals.dialect_search_prefixes().len(), len);
    }

    #[test]
    fn load_on_create_is_monotonic() {
        let globals = Globals::new();
        globals.append_load_on_create_dialect("func");
        globals.append_load_on_create_dialect("func");
        globals.append_load_on_create_dialect("cf");
        assert_eq!(globals.load_on_create_dialects(), vec!["func", "cf"]);
    }

    #[test]
    fn modules_can_bring_dialects() {
        let mut table = ModuleTable::with_fallback(LinkedModules);
        table.insert(DialectModule {
            path: Cow::Borrowed("toys.toy"),
            class: Some(toy_class),
            dialect: Some(toy_dialect),
        });
        let globals = Globals::with_loader(table);
        let toy = DialectName::new("toy");

        assert!(!globals.load_dialect_module("toy").unwrap());
        assert!(globals.dialect_constructor(&toy).is_none());

        globals.append_dialect_search_prefix("toys");
        assert!(!globals.is_dialect_module_loaded("toy"));
        assert!(globals.load_dialect_module("toy").unwrap());
        assert!(globals.is_dialect_module_loaded("toy"));
        assert!(globals.dialect_constructor(&toy).is_some());
        assert!(!globals.register_dialect(toy_dialect));
    }

    #[test]
    fn operation_classes() {
        let globals = Globals::new();
        assert!(!globals.is_dialect_module_loaded("arith"));
        let addf = globals.lookup_operation_class("arith.addf").unwrap().unwrap();
        assert_eq!(addf.id().to_string(), "arith.addf");
        assert!(globals.is_dialect_module_loaded("arith"));
        assert!(globals
            .lookup_operation_class("arith.not_existing")
            .unwrap()
            .is_none());
        assert!(globals.lookup_operation_class("nope.op").unwrap().is_none());
        assert!(globals.lookup_operation_class("malformed").is_err());
    }
}
