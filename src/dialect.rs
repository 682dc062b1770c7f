//! [Dialect]s are a mechanism to group related operations.
//!
//! A dialect is *available* when a [DialectConstructor] for it is known to
//! the [Globals](crate::globals::Globals), and *loaded* once a [Context] has
//! instantiated it. Only loaded dialects make their operations registered.
//! A [DialectDescriptor] is the handle through which clients observe a
//! loaded dialect.

use std::{fmt::Display, ops::Deref};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    arg_err_noloc,
    context::{private::ArenaObj, ArenaCell, Context, Ptr},
    identifier::Identifier,
    impl_printable_for_display,
    op::{OpName, OpSchema},
    result::Result,
};

/// Dialect name: Safe wrapper around a String.
/// Unlike operation names, dialect names may not contain a `.`.
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct DialectName(String);

#[derive(Debug, Error)]
#[error("Malformed dialect name \"{0}\"")]
pub struct MalformedDialectNameErr(pub String);

impl DialectName {
    /// Create a new DialectName. The name isn't checked,
    /// use [TryFrom] for names that come from users.
    pub fn new(name: &str) -> DialectName {
        DialectName(name.to_string())
    }

    /// Is `name` well formed for a dialect?
    pub fn is_valid(name: &str) -> bool {
        Identifier::is_valid(name) && !name.contains('.')
    }
}

impl TryFrom<&str> for DialectName {
    type Error = crate::result::Error;

    fn try_from(value: &str) -> Result<Self> {
        if !DialectName::is_valid(value) {
            return arg_err_noloc!(MalformedDialectNameErr(value.to_string()));
        }
        Ok(DialectName(value.to_string()))
    }
}

impl Display for DialectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl_printable_for_display!(DialectName);

impl Deref for DialectName {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Builds a fresh instance of a dialect, to be loaded into a [Context].
pub type DialectConstructor = fn() -> Dialect;

/// A collection of operation schemas.
/// Dialects are identified by their names.
#[derive(Clone, Debug)]
pub struct Dialect {
    /// Name of this dialect.
    name: DialectName,
    /// Ops that are part of this dialect.
    ops: FxHashMap<OpName, OpSchema>,
    /// Operations of this dialect that have no schema are accepted by the verifier.
    allow_unknown_operations: bool,
}

impl Dialect {
    /// Create a new dialect with no operations.
    pub fn new(name: DialectName) -> Dialect {
        Dialect {
            name,
            ops: FxHashMap::default(),
            allow_unknown_operations: false,
        }
    }

    /// Add an operation to this dialect. Re-adding replaces the earlier schema.
    pub fn add_op(&mut self, schema: OpSchema) {
        self.ops.insert(schema.get_name().clone(), schema);
    }

    /// Builder style [Self::add_op].
    pub fn with_op(mut self, schema: OpSchema) -> Dialect {
        self.add_op(schema);
        self
    }

    pub fn set_allow_unknown_operations(&mut self, allow: bool) {
        self.allow_unknown_operations = allow;
    }

    pub fn allows_unknown_operations(&self) -> bool {
        self.allow_unknown_operations
    }

    /// This Dialect's name.
    pub fn get_name(&self) -> &DialectName {
        &self.name
    }

    /// Get the schema of an operation in this dialect.
    pub fn get_op(&self, name: &str) -> Option<&OpSchema> {
        self.ops.get(&OpName::new(name))
    }

    /// Names of all operations in this dialect, sorted.
    pub fn op_names(&self) -> Vec<OpName> {
        let mut names: Vec<_> = self.ops.keys().cloned().collect();
        names.sort();
        names
    }
}

impl ArenaObj for Dialect {
    fn get_arena(ctx: &Context) -> &ArenaCell<Self> {
        &ctx.registry.dialects
    }

    fn get_arena_mut(ctx: &mut Context) -> &mut ArenaCell<Self> {
        &mut ctx.registry.dialects
    }
}

/// A handle to a dialect loaded in a [Context].
/// Descriptors stay valid for as long as the [Context] they came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DialectDescriptor {
    namespace: DialectName,
    dialect: Ptr<Dialect>,
}

impl DialectDescriptor {
    pub(crate) fn new(namespace: DialectName, dialect: Ptr<Dialect>) -> DialectDescriptor {
        DialectDescriptor { namespace, dialect }
    }

    pub fn namespace(&self) -> &DialectName {
        &self.namespace
    }

    /// Is this descriptor's dialect loaded in `ctx`? Always `true` for the
    /// context that handed it out, as contexts never unload dialects.
    pub fn is_loaded(&self, ctx: &Context) -> bool {
        ctx.get_loaded_dialect(self.namespace.as_str()) == Some(self.dialect)
    }

    /// The loaded [Dialect] behind this descriptor.
    pub fn get_dialect(&self) -> Ptr<Dialect> {
        self.dialect
    }
}

impl Display for DialectDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<DialectDescriptor {}>", self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::{Dialect, DialectName, MalformedDialectNameErr};
    use crate::op::{Arity, OpSchema};

    #[test]
    fn dialect_names() {
        assert!(DialectName::try_from("arith").is_ok());
        assert!(DialectName::try_from("my_dialect2").is_ok());
        for bad in ["", "a.b", "9x", "with space"] {
            assert!(DialectName::try_from(bad)
                .unwrap_err()
                .is::<MalformedDialectNameErr>());
        }
    }

    #[test]
    fn op_schemas() {
        let dialect = Dialect::new(DialectName::new("test"))
            .with_op(OpSchema::new("b").results(Arity::Exactly(1)))
            .with_op(OpSchema::new("a"));
        assert!(dialect.get_op("a").is_some());
        assert!(dialect.get_op("c").is_none());
        assert_eq!(
            dialect
                .op_names()
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(!dialect.allows_unknown_operations());
    }
}
