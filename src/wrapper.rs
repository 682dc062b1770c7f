//! Typed views of loaded dialects, with their operation builders.
//!
//! [Context::dialects] (or its alias [Context::d]) looks dialects up by
//! namespace. There are two ways to ask, differing only in how a miss is
//! reported: [Dialects::attr] fails with [ErrorKind::AttributeNotFound],
//! [Dialects::index] with [ErrorKind::IndexOutOfRange]. Either way the
//! underlying error is an [UnknownDialectErr](crate::registry::UnknownDialectErr).

use std::{fmt::Display, rc::Rc};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    context::{Context, Ptr},
    create_err,
    dialect::{DialectDescriptor, DialectName},
    location::Location,
    op::{OpId, OpName},
    operation::{Operation, OperationState},
    result::{ErrorKind, Result},
};

/// Builds an operation from a partially filled [OperationState].
/// The state's name has already been set when a builder runs.
pub type OpBuilder = fn(&mut Context, OperationState) -> Result<Ptr<Operation>>;

/// A builder for one operation.
#[derive(Clone, Debug)]
pub struct OpClass {
    id: OpId,
    builder: OpBuilder,
}

impl OpClass {
    pub fn id(&self) -> &OpId {
        &self.id
    }

    /// Build the operation. The name in `state` is replaced with this op's.
    pub fn build(&self, ctx: &mut Context, mut state: OperationState) -> Result<Ptr<Operation>> {
        state.name = self.id.to_string();
        (self.builder)(ctx, state)
    }
}

/// The operation builders of a namespace, as provided by its dialect module.
#[derive(Clone, Debug)]
pub struct DialectClass {
    namespace: DialectName,
    module: String,
    ops: FxHashMap<OpName, OpClass>,
}

impl DialectClass {
    pub fn new(namespace: &str) -> DialectClass {
        DialectClass {
            namespace: DialectName::new(namespace),
            module: String::new(),
            ops: FxHashMap::default(),
        }
    }

    /// Add a builder for `namespace.name`.
    pub fn add_op(&mut self, name: &str, builder: OpBuilder) {
        let id = OpId {
            dialect: self.namespace.clone(),
            name: OpName::new(name),
        };
        self.ops.insert(OpName::new(name), OpClass { id, builder });
    }

    /// Builder style [Self::add_op].
    pub fn with_op(mut self, name: &str, builder: OpBuilder) -> DialectClass {
        self.add_op(name, builder);
        self
    }

    pub fn get_op(&self, name: &str) -> Option<&OpClass> {
        self.ops.get(&OpName::new(name))
    }

    pub fn namespace(&self) -> &DialectName {
        &self.namespace
    }

    /// Path of the module this class was loaded from.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub(crate) fn set_module(&mut self, module: &str) {
        self.module = module.to_string();
    }

    /// Names of all operations with builders, sorted.
    pub fn op_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.ops.keys().map(|name| name.to_string()).collect();
        names.sort();
        names
    }
}

#[derive(Debug, Error)]
#[error("Dialect \"{dialect}\" has no builder for operation \"{op}\"")]
pub struct NoSuchOpErr {
    pub dialect: String,
    pub op: String,
}

/// A loaded dialect as seen by clients: its descriptor and,
/// if its module provides one, its [DialectClass].
#[derive(Clone, Debug)]
pub struct DialectWrapper {
    descriptor: DialectDescriptor,
    class: Option<Rc<DialectClass>>,
}

impl DialectWrapper {
    pub fn namespace(&self) -> &DialectName {
        self.descriptor.namespace()
    }

    pub fn descriptor(&self) -> &DialectDescriptor {
        &self.descriptor
    }

    /// `None` for dialects whose module provides no builders.
    pub fn class(&self) -> Option<&DialectClass> {
        self.class.as_deref()
    }

    /// The builder for `op`. Fails with [ErrorKind::AttributeNotFound].
    pub fn op(&self, op: &str) -> Result<&OpClass> {
        match self.class().and_then(|class| class.get_op(op)) {
            Some(op_class) => Ok(op_class),
            None => create_err!(
                Location::Unknown,
                ErrorKind::AttributeNotFound,
                NoSuchOpErr {
                    dialect: self.namespace().to_string(),
                    op: op.to_string(),
                }
            ),
        }
    }

    /// Build `op` through this dialect's builder for it.
    pub fn build(
        &self,
        ctx: &mut Context,
        op: &str,
        state: OperationState,
    ) -> Result<Ptr<Operation>> {
        self.op(op)?.build(ctx, state)
    }
}

impl PartialEq for DialectWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor
            && match (&self.class, &other.class) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl Display for DialectWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.class {
            Some(class) => write!(f, "<Dialect {} (class {})>", self.namespace(), class.module()),
            None => write!(f, "<Dialect {} (generic)>", self.namespace()),
        }
    }
}

/// Dialect lookup by namespace. See the [module](crate::wrapper) documentation.
pub struct Dialects<'a> {
    ctx: &'a mut Context,
}

impl Dialects<'_> {
    /// Look `namespace` up, loading the dialect and its module as needed.
    /// Cached wrappers without a class are looked up again, since a search
    /// prefix appended since may provide the module now.
    fn lookup(self, namespace: &str) -> Result<DialectWrapper> {
        let ctx = self.ctx;
        if let Some(wrapper) = ctx.wrappers.get(&DialectName::new(namespace)) {
            if wrapper.class.is_some() {
                return Ok(wrapper.clone());
            }
        }
        // The module first: if it fails to load, no dialect gets loaded either.
        let class = ctx.globals().lookup_dialect_class(namespace)?;
        let descriptor = ctx.get_dialect_descriptor(namespace)?;
        let wrapper = DialectWrapper { descriptor, class };
        ctx.wrappers
            .insert(wrapper.namespace().clone(), wrapper.clone());
        Ok(wrapper)
    }

    fn lookup_or(self, namespace: &str, miss: ErrorKind) -> Result<DialectWrapper> {
        self.lookup(namespace).map_err(|mut err| {
            if err.kind == ErrorKind::UnknownDialect {
                err.kind = miss;
            }
            err
        })
    }

    /// Attribute style access, `dialects.func`.
    pub fn attr(self, namespace: &str) -> Result<DialectWrapper> {
        self.lookup_or(namespace, ErrorKind::AttributeNotFound)
    }

    /// Index style access, `dialects["func"]`.
    pub fn index(self, namespace: &str) -> Result<DialectWrapper> {
        self.lookup_or(namespace, ErrorKind::IndexOutOfRange)
    }
}

impl Context {
    /// Access loaded dialects (loading them lazily) by namespace.
    pub fn dialects(&mut self) -> Dialects<'_> {
        Dialects { ctx: self }
    }

    /// Alias for [Context::dialects].
    pub fn d(&mut self) -> Dialects<'_> {
        self.dialects()
    }
}
