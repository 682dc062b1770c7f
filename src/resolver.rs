//! Lazy resolution of dialect modules through an ordered list of search prefixes.
//!
//! A *dialect module* bundles what a namespace needs beyond the bare
//! [Dialect](crate::dialect::Dialect): the [DialectClass] with its operation
//! builders and, optionally, a constructor for the dialect itself (for
//! dialects that are not available up front). Modules are found by the
//! convention `"{prefix}.{namespace}"`, trying prefixes in order.
//!
//! How a module path turns into a [DialectModule] is up to the
//! [DialectLoader]. [LinkedModules] looks modules up in [DIALECT_MODULES],
//! a slice that any crate linked into the program can add to:
//! ```
//! use std::borrow::Cow;
//! use dialex::{resolver::{DialectModule, DIALECT_MODULES}, wrapper::DialectClass};
//!
//! fn class() -> DialectClass {
//!     DialectClass::new("toy")
//! }
//!
//! #[linkme::distributed_slice(DIALECT_MODULES)]
//! static TOY: DialectModule = DialectModule {
//!     path: Cow::Borrowed("my_dialects.toy"),
//!     class: Some(class),
//!     dialect: None,
//! };
//! # fn main() {}
//! ```

use std::{borrow::Cow, rc::Rc};

use linkme::distributed_slice;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    dialect::{DialectConstructor, DialectName},
    load_error,
    result::Result,
    wrapper::DialectClass,
};

/// A loadable dialect module.
#[derive(Clone, Debug)]
pub struct DialectModule {
    /// Full path of the module, `"{prefix}.{namespace}"`.
    pub path: Cow<'static, str>,
    /// Operation builders for the namespace.
    pub class: Option<fn() -> DialectClass>,
    /// The dialect itself, if the module brings one.
    pub dialect: Option<DialectConstructor>,
}

/// Modules linked into the program, found by [LinkedModules].
#[distributed_slice]
pub static DIALECT_MODULES: [DialectModule] = [..];

/// Strategy for turning a module path into a [DialectModule].
pub trait DialectLoader {
    /// `Ok(None)` if there's no module at `path`. Errors are for
    /// modules that exist but cannot be loaded.
    fn load(&self, path: &str) -> Result<Option<DialectModule>>;
}

/// Loads modules registered in [DIALECT_MODULES].
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkedModules;

impl DialectLoader for LinkedModules {
    fn load(&self, path: &str) -> Result<Option<DialectModule>> {
        Ok(DIALECT_MODULES
            .iter()
            .find(|module| module.path == path)
            .cloned())
    }
}

#[derive(Debug, Error)]
#[error("Dialect module \"{path}\" is broken: {reason}")]
pub struct BrokenModuleErr {
    pub path: String,
    pub reason: String,
}

/// An in-memory table of modules, optionally falling back to another loader.
#[derive(Default)]
pub struct ModuleTable {
    modules: FxHashMap<String, DialectModule>,
    broken: FxHashMap<String, String>,
    fallback: Option<Box<dyn DialectLoader>>,
}

impl ModuleTable {
    pub fn new() -> ModuleTable {
        ModuleTable::default()
    }

    /// A table that consults `fallback` for paths it doesn't know.
    pub fn with_fallback(fallback: impl DialectLoader + 'static) -> ModuleTable {
        ModuleTable {
            fallback: Some(Box::new(fallback)),
            ..ModuleTable::default()
        }
    }

    pub fn insert(&mut self, module: DialectModule) {
        self.modules.insert(module.path.to_string(), module);
    }

    /// Make loading `path` fail with `reason`.
    pub fn insert_broken(&mut self, path: &str, reason: &str) {
        self.broken.insert(path.to_string(), reason.to_string());
    }
}

impl DialectLoader for ModuleTable {
    fn load(&self, path: &str) -> Result<Option<DialectModule>> {
        if let Some(reason) = self.broken.get(path) {
            return Err(load_error!(BrokenModuleErr {
                path: path.to_string(),
                reason: reason.clone(),
            }));
        }
        if let Some(module) = self.modules.get(path) {
            return Ok(Some(module.clone()));
        }
        match &self.fallback {
            Some(fallback) => fallback.load(path),
            None => Ok(None),
        }
    }
}

/// What remains of a module once it's loaded.
#[derive(Clone, Debug)]
pub struct LoadedModule {
    pub path: String,
    pub class: Option<Rc<DialectClass>>,
    pub dialect: Option<DialectConstructor>,
}

/// Ordered search prefixes, the loader, and the modules loaded so far.
pub struct SearchPathResolver {
    prefixes: Vec<String>,
    prefix_set: FxHashSet<String>,
    loaded: FxHashMap<DialectName, LoadedModule>,
    loader: Box<dyn DialectLoader>,
}

impl SearchPathResolver {
    pub fn new(loader: impl DialectLoader + 'static) -> SearchPathResolver {
        SearchPathResolver {
            prefixes: vec![],
            prefix_set: FxHashSet::default(),
            loaded: FxHashMap::default(),
            loader: Box::new(loader),
        }
    }

    /// Append `prefix` to the search path. Appending a prefix that's
    /// already present does nothing and returns `false`.
    pub fn append_search_prefix(&mut self, prefix: &str) -> bool {
        if !self.prefix_set.insert(prefix.to_string()) {
            return false;
        }
        debug!("Appending dialect search prefix {}", prefix);
        self.prefixes.push(prefix.to_string());
        true
    }

    pub fn search_prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_module_loaded(&self, namespace: &str) -> bool {
        self.loaded.contains_key(&DialectName::new(namespace))
    }

    pub fn get_loaded_module(&self, namespace: &str) -> Option<&LoadedModule> {
        self.loaded.get(&DialectName::new(namespace))
    }

    /// Make sure the module for `namespace` is loaded. Returns `false` if
    /// no prefix yields one. Misses aren't remembered, so a prefix
    /// appended later can still resolve the namespace.
    pub fn resolve_and_load(&mut self, namespace: &str) -> Result<bool> {
        if self.is_module_loaded(namespace) {
            return Ok(true);
        }
        if !DialectName::is_valid(namespace) {
            return Ok(false);
        }
        for prefix in &self.prefixes {
            let path = format!("{}.{}", prefix, namespace);
            let Some(module) = self.loader.load(&path)? else {
                trace!("No dialect module at {}", path);
                continue;
            };
            debug!("Loaded dialect module {}", path);
            let loaded = LoadedModule {
                class: module.class.map(|class| {
                    let mut class = class();
                    class.set_module(&path);
                    Rc::new(class)
                }),
                dialect: module.dialect,
                path,
            };
            self.loaded.insert(DialectName::new(namespace), loaded);
            return Ok(true);
        }
        Ok(false)
    }
}
