//! Operations, and the policy that decides whether one may be created.
//!
//! An operation is *registered* if its dialect is loaded in the [Context] and
//! knows the operation. Anything else is unregistered, and may only be
//! created while [Context::allow_unregistered_dialects] is set. Registered
//! operations are checked against their [OpSchema](crate::op::OpSchema) by
//! [Verify::verify]; unregistered ones have no schema, but still fail
//! verification once the context stops allowing them.

use thiserror::Error;

use crate::{
    arg_err, arg_err_noloc,
    attribute::{Attribute, AttributeDict},
    common_traits::Verify,
    context::{private::ArenaObj, ArenaCell, Context, Ptr},
    diagnostics::Diagnostic,
    identifier::Identifier,
    location::{Located, Location},
    op::OpId,
    printable::{fmt_list, Printable},
    r#type::Type,
    result::Result,
    unregistered_err, verify_err,
};

/// A result of an operation, used as an operand by others.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Value {
    def: Ptr<Operation>,
    res_idx: usize,
}

impl Value {
    /// The operation that defines this value.
    pub fn get_defining_op(&self) -> Ptr<Operation> {
        self.def
    }

    pub fn get_result_idx(&self) -> usize {
        self.res_idx
    }

    /// The type of this value. `None` if the defining operation was erased.
    pub fn get_type(&self, ctx: &Context) -> Option<Type> {
        self.def
            .try_deref(ctx)
            .and_then(|op| op.result_types.get(self.res_idx).cloned())
    }
}

impl Printable for Value {
    fn fmt(&self, ctx: &Context, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.def.try_deref(ctx) {
            Some(op) if op.get_num_results() == 1 => write!(f, "%{}", op.number),
            Some(op) => write!(f, "%{}#{}", op.number, self.res_idx),
            None => write!(f, "%<erased>"),
        }
    }
}

/// Everything needed to create an operation.
#[derive(Clone, Debug, Default)]
pub struct OperationState {
    /// Qualified `dialect.op` name.
    pub name: String,
    pub operands: Vec<Value>,
    pub result_types: Vec<Type>,
    pub attributes: Vec<(String, Attribute)>,
    pub loc: Location,
}

impl OperationState {
    pub fn new(name: &str) -> OperationState {
        OperationState {
            name: name.to_string(),
            ..OperationState::default()
        }
    }

    pub fn operands(mut self, operands: &[Value]) -> OperationState {
        self.operands.extend_from_slice(operands);
        self
    }

    pub fn results(mut self, result_types: &[Type]) -> OperationState {
        self.result_types.extend_from_slice(result_types);
        self
    }

    pub fn attribute(mut self, name: &str, attr: Attribute) -> OperationState {
        self.attributes.push((name.to_string(), attr));
        self
    }

    pub fn loc(mut self, loc: Location) -> OperationState {
        self.loc = loc;
        self
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, attr)| attr)
    }
}

#[derive(Debug, Error)]
#[error("'{0}' op created with unregistered dialect. If this is intended, please call allow_unregistered_dialects on the Context")]
pub struct UnregisteredDialectErr(pub String);

#[derive(Debug, Error)]
#[error("'{op}' op is not registered in dialect '{dialect}', which does not allow unknown operations")]
pub struct UnregisteredOpErr {
    pub op: String,
    pub dialect: String,
}

#[derive(Debug, Error)]
#[error("'{op}' op operand #{idx} refers to an erased operation")]
pub struct DanglingOperandErr {
    pub op: String,
    pub idx: usize,
}

#[derive(Debug, Error)]
#[error("Cannot erase '{0}' op, its results still have uses")]
pub struct EraseWithUsesErr(pub String);

#[derive(Debug)]
pub struct Operation {
    self_ptr: Ptr<Operation>,
    opid: OpId,
    /// Creation order within the context, used for naming results when printing.
    number: u64,
    operands: Vec<Value>,
    result_types: Vec<Type>,
    pub attributes: AttributeDict,
    loc: Location,
}

impl Operation {
    /// Create a new operation.
    ///
    /// The dialect module of the namespace is resolved (loading it if a
    /// search prefix provides one), then the operation must either be
    /// registered, or the context must allow unregistered dialects. In
    /// the latter case a warning diagnostic is emitted.
    pub fn create(ctx: &mut Context, state: OperationState) -> Result<Ptr<Operation>> {
        let OperationState {
            name,
            operands,
            result_types,
            attributes,
            loc,
        } = state;
        let opid = OpId::parse(&name).map_err(|mut err| {
            err.set_loc(loc.clone());
            err
        })?;

        ctx.globals().load_dialect_module(&opid.dialect)?;

        let registered = ctx.is_registered_opid(&opid);
        if !registered && !ctx.allow_unregistered_dialects() {
            return unregistered_err!(loc, UnregisteredDialectErr(opid.to_string()));
        }

        for (idx, operand) in operands.iter().enumerate() {
            if !operand.def.is_alive(ctx) {
                return arg_err!(
                    loc,
                    DanglingOperandErr {
                        op: opid.to_string(),
                        idx
                    }
                );
            }
        }

        let mut attr_dict = AttributeDict::default();
        for (attr_name, attr) in attributes {
            let attr_name = Identifier::try_from(attr_name).map_err(|mut err| {
                err.set_loc(loc.clone());
                err
            })?;
            attr_dict.set(attr_name, attr);
        }

        let number = ctx.next_op_number();
        let op = Self::alloc(ctx, |self_ptr| Operation {
            self_ptr,
            opid: opid.clone(),
            number,
            operands,
            result_types,
            attributes: attr_dict,
            loc: loc.clone(),
        });

        if !registered {
            let message = if ctx.get_loaded_dialect(&opid.dialect).is_some() {
                format!("'{}' op created as unknown operation of dialect '{}'", opid, opid.dialect)
            } else {
                format!("'{}' op created with unregistered dialect '{}'", opid, opid.dialect)
            };
            ctx.emit_diagnostic(Diagnostic::warning(loc, message));
        }
        Ok(op)
    }

    /// Erase `ptr` from the context. Fails if another operation uses its results.
    pub fn erase(ptr: Ptr<Operation>, ctx: &mut Context) -> Result<()> {
        if !ptr.is_alive(ctx) {
            return arg_err_noloc!("Cannot erase an operation twice");
        }
        let has_uses = ctx.operations.values().any(|op| {
            op.borrow()
                .operands
                .iter()
                .any(|operand| operand.def == ptr)
        });
        if has_uses {
            let op = ptr.deref(ctx);
            return arg_err!(op.loc(), EraseWithUsesErr(op.opid.to_string()));
        }
        Self::dealloc(ptr, ctx);
        Ok(())
    }

    pub fn get_self_ptr(&self) -> Ptr<Operation> {
        self.self_ptr
    }

    pub fn get_opid(&self) -> &OpId {
        &self.opid
    }

    pub fn get_num_operands(&self) -> usize {
        self.operands.len()
    }

    pub fn get_operand(&self, idx: usize) -> Option<Value> {
        self.operands.get(idx).copied()
    }

    pub fn operands(&self) -> &[Value] {
        &self.operands
    }

    pub fn get_num_results(&self) -> usize {
        self.result_types.len()
    }

    pub fn get_result(&self, idx: usize) -> Option<Value> {
        (idx < self.result_types.len()).then_some(Value {
            def: self.self_ptr,
            res_idx: idx,
        })
    }

    pub fn results(&self) -> Vec<Value> {
        (0..self.result_types.len())
            .map(|res_idx| Value {
                def: self.self_ptr,
                res_idx,
            })
            .collect()
    }

    pub fn result_types(&self) -> &[Type] {
        &self.result_types
    }

    /// Type of the `idx`'th operand, if it's a live value.
    pub fn get_operand_type(&self, ctx: &Context, idx: usize) -> Option<Type> {
        self.get_operand(idx).and_then(|opd| opd.get_type(ctx))
    }

    /// Is this operation registered in `ctx` right now?
    pub fn is_registered(&self, ctx: &Context) -> bool {
        ctx.is_registered_opid(&self.opid)
    }

    fn verify_structure(&self, ctx: &Context) -> Result<()> {
        for (idx, operand) in self.operands.iter().enumerate() {
            if !operand.def.is_alive(ctx) {
                return verify_err!(
                    self.loc(),
                    DanglingOperandErr {
                        op: self.opid.to_string(),
                        idx
                    }
                );
            }
        }

        let Some(dialect) = ctx.get_loaded_dialect(&self.opid.dialect) else {
            if !ctx.allow_unregistered_dialects() {
                return verify_err!(self.loc(), UnregisteredDialectErr(self.opid.to_string()));
            }
            return Ok(());
        };
        let dialect = dialect.deref(ctx);
        match dialect.get_op(&self.opid.name) {
            Some(schema) => schema.verify(ctx, self),
            None if dialect.allows_unknown_operations() => Ok(()),
            None => verify_err!(
                self.loc(),
                UnregisteredOpErr {
                    op: self.opid.to_string(),
                    dialect: self.opid.dialect.to_string(),
                }
            ),
        }
    }
}

impl Verify for Operation {
    /// Verification failures are emitted as Error diagnostics. Those that
    /// don't reach a handler are returned with the error.
    fn verify(&self, ctx: &Context) -> Result<()> {
        let (res, captured) = ctx.capture_diagnostics(|| {
            let res = self.verify_structure(ctx);
            if let Err(err) = &res {
                ctx.emit_diagnostic(Diagnostic::error(err.loc.clone(), err.err.to_string()));
            }
            res
        });
        res.map_err(|err| err.with_diagnostics(captured))
    }
}

impl Located for Operation {
    fn loc(&self) -> Location {
        self.loc.clone()
    }

    fn set_loc(&mut self, loc: Location) {
        self.loc = loc;
    }
}

impl ArenaObj for Operation {
    fn get_arena(ctx: &Context) -> &ArenaCell<Self> {
        &ctx.operations
    }

    fn get_arena_mut(ctx: &mut Context) -> &mut ArenaCell<Self> {
        &mut ctx.operations
    }
}

/// Generic form: `%3 = "arith.addf"(%1, %2) {attrs} : (f32, f32) -> f32`
impl Printable for Operation {
    fn fmt(&self, ctx: &Context, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.result_types.len() {
            0 => (),
            1 => write!(f, "%{} = ", self.number)?,
            n => write!(f, "%{}:{} = ", self.number, n)?,
        }
        write!(f, "\"{}\"(", self.opid)?;
        fmt_list(&self.operands, ", ", ctx, f)?;
        write!(f, ")")?;
        if !self.attributes.is_empty() {
            write!(f, " {}", self.attributes)?;
        }
        let operand_types: Vec<Type> = self
            .operands
            .iter()
            .map(|opd| opd.get_type(ctx).unwrap_or(Type::None))
            .collect();
        write!(
            f,
            " : {}",
            Type::function(operand_types, self.result_types.clone())
        )
    }
}
