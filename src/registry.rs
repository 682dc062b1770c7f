//! The dialects loaded in a [Context], and the lookups that load them lazily.
//!
//! See the [DialectRegistry] in MLIR: it maps a namespace to a constructor so
//! that the set of *available* dialects is decoupled from the set of dialects
//! *loaded* in a context. Here the available constructors live in the
//! [Globals](crate::globals::Globals) and the [DialectRegistry] only tracks
//! what a single [Context] has loaded.

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::{
    context::{private::ArenaObj, ArenaCell, Context, Ptr},
    dialect::{Dialect, DialectConstructor, DialectDescriptor, DialectName},
    op::OpId,
    result::Result,
    unknown_dialect_err,
};

#[derive(Debug, Error)]
#[error("Dialect \"{0}\" not found")]
pub struct UnknownDialectErr(pub String);

/// Dialects loaded in a [Context], in load order.
#[derive(Default)]
pub(crate) struct DialectRegistry {
    pub(crate) dialects: ArenaCell<Dialect>,
    by_name: FxHashMap<DialectName, Ptr<Dialect>>,
    load_order: Vec<DialectName>,
}

impl DialectRegistry {
    fn get(&self, name: &str) -> Option<Ptr<Dialect>> {
        self.by_name.get(&DialectName::new(name)).copied()
    }
}

impl Context {
    /// Get a descriptor for the dialect `namespace`, loading it if necessary.
    /// Loading falls back to resolving the namespace's dialect module through
    /// the search prefixes, since a module may bring its own dialect.
    pub fn get_dialect_descriptor(&mut self, namespace: &str) -> Result<DialectDescriptor> {
        if !DialectName::is_valid(namespace) {
            return unknown_dialect_err!(UnknownDialectErr(namespace.to_string()));
        }
        let name = DialectName::new(namespace);
        if let Some(dialect) = self.registry.get(namespace) {
            return Ok(DialectDescriptor::new(name, dialect));
        }
        if let Some(constructor) = self.globals().dialect_constructor(&name) {
            return Ok(self.load_dialect(constructor));
        }
        if self.globals().load_dialect_module(namespace)? {
            if let Some(constructor) = self.globals().dialect_constructor(&name) {
                return Ok(self.load_dialect(constructor));
            }
        }
        unknown_dialect_err!(UnknownDialectErr(namespace.to_string()))
    }

    /// Get the loaded dialect `namespace`, without trying to load it.
    pub fn get_loaded_dialect(&self, namespace: &str) -> Option<Ptr<Dialect>> {
        self.registry.get(namespace)
    }

    /// Is `qualified_name` (`dialect.op`) an operation of a loaded dialect?
    /// Never loads anything, and malformed names are simply not registered.
    pub fn is_registered_operation(&self, qualified_name: &str) -> bool {
        OpId::parse(qualified_name)
            .map(|opid| self.is_registered_opid(&opid))
            .unwrap_or(false)
    }

    pub(crate) fn is_registered_opid(&self, opid: &OpId) -> bool {
        self.registry
            .get(&opid.dialect)
            .is_some_and(|dialect| dialect.deref(self).get_op(&opid.name).is_some())
    }

    /// Namespaces of all dialects loaded in this context, in load order.
    pub fn list_dialects(&self) -> Vec<String> {
        self.registry
            .load_order
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn num_loaded_dialects(&self) -> usize {
        self.registry.load_order.len()
    }

    /// Namespaces of all dialects that could be loaded without module resolution.
    pub fn available_dialects(&self) -> Vec<String> {
        self.globals()
            .available_dialects()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Load every available dialect that isn't loaded yet.
    pub fn load_all_available_dialects(&mut self) {
        for name in self.globals().available_dialects() {
            if self.registry.get(&name).is_some() {
                continue;
            }
            if let Some(constructor) = self.globals().dialect_constructor(&name) {
                self.load_dialect(constructor);
            }
        }
    }

    fn load_dialect(&mut self, constructor: DialectConstructor) -> DialectDescriptor {
        let dialect = constructor();
        let name = dialect.get_name().clone();
        if let Some(loaded) = self.registry.get(&name) {
            return DialectDescriptor::new(name, loaded);
        }
        debug!("Loading dialect {}", name);
        let ptr = Dialect::alloc(self, |_| dialect);
        self.registry.by_name.insert(name.clone(), ptr);
        self.registry.load_order.push(name.clone());
        DialectDescriptor::new(name, ptr)
    }
}
