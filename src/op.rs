//! Operation names and the schemas that registered operations are verified against.
//!
//! An [OpId] is the fully qualified `dialect.op` name of an operation.
//! Dialects describe each of their operations with an [OpSchema]:
//! operand and result [Arity], the attributes it must carry, and an
//! optional custom [OpVerifier].

use std::{fmt::Display, ops::Deref};

use thiserror::Error;

use crate::{
    arg_err_noloc,
    context::Context,
    dialect::DialectName,
    identifier::Identifier,
    impl_printable_for_display,
    location::Located,
    operation::Operation,
    result::Result,
    verify_err,
};

/// An Op's name (not including its dialect).
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct OpName(String);

impl OpName {
    /// Create a new OpName.
    pub fn new(name: &str) -> OpName {
        OpName(name.to_string())
    }
}

impl Deref for OpName {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for OpName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A combination of an Op's name and its dialect.
#[derive(Clone, Hash, PartialEq, Eq, Debug)]
pub struct OpId {
    pub dialect: DialectName,
    pub name: OpName,
}

#[derive(Debug, Error)]
#[error("Malformed operation name \"{0}\", expected \"dialect.op\"")]
pub struct MalformedOpNameErr(pub String);

impl OpId {
    /// Split a qualified `dialect.op` name. The op part may itself contain dots.
    pub fn parse(qualified: &str) -> Result<OpId> {
        match qualified.split_once('.') {
            Some((dialect, name))
                if DialectName::is_valid(dialect) && Identifier::is_valid(name) =>
            {
                Ok(OpId {
                    dialect: DialectName::new(dialect),
                    name: OpName::new(name),
                })
            }
            _ => arg_err_noloc!(MalformedOpNameErr(qualified.to_string())),
        }
    }
}

impl Display for OpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.dialect, self.name)
    }
}

impl_printable_for_display!(OpId);

/// How many operands or results an operation takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Exactly(m) => n == *m,
            Arity::AtLeast(m) => n >= *m,
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Custom verification of an operation, run after the schema checks pass.
pub type OpVerifier = fn(&Context, &Operation) -> Result<()>;

#[derive(Debug, Error)]
#[error("'{op}' op expected {expected} {what}, but found {found}")]
pub struct ArityVerifyErr {
    pub op: String,
    pub what: &'static str,
    pub expected: Arity,
    pub found: usize,
}

#[derive(Debug, Error)]
#[error("'{op}' op requires attribute '{attr}'")]
pub struct MissingAttrVerifyErr {
    pub op: String,
    pub attr: &'static str,
}

/// What a registered operation must look like.
#[derive(Clone, Debug)]
pub struct OpSchema {
    name: OpName,
    operands: Arity,
    results: Arity,
    required_attrs: Vec<&'static str>,
    verifier: Option<OpVerifier>,
}

impl OpSchema {
    /// A schema accepting no operands and no results.
    pub fn new(name: &str) -> OpSchema {
        OpSchema {
            name: OpName::new(name),
            operands: Arity::Exactly(0),
            results: Arity::Exactly(0),
            required_attrs: vec![],
            verifier: None,
        }
    }

    pub fn operands(mut self, arity: Arity) -> OpSchema {
        self.operands = arity;
        self
    }

    pub fn results(mut self, arity: Arity) -> OpSchema {
        self.results = arity;
        self
    }

    pub fn required_attr(mut self, attr: &'static str) -> OpSchema {
        self.required_attrs.push(attr);
        self
    }

    pub fn verifier(mut self, verifier: OpVerifier) -> OpSchema {
        self.verifier = Some(verifier);
        self
    }

    pub fn get_name(&self) -> &OpName {
        &self.name
    }

    /// Check `op` against this schema.
    pub fn verify(&self, ctx: &Context, op: &Operation) -> Result<()> {
        let opid = op.get_opid();
        if !self.operands.accepts(op.get_num_operands()) {
            return verify_err!(
                op.loc(),
                ArityVerifyErr {
                    op: opid.to_string(),
                    what: "operands",
                    expected: self.operands,
                    found: op.get_num_operands(),
                }
            );
        }
        if !self.results.accepts(op.get_num_results()) {
            return verify_err!(
                op.loc(),
                ArityVerifyErr {
                    op: opid.to_string(),
                    what: "results",
                    expected: self.results,
                    found: op.get_num_results(),
                }
            );
        }
        if let Some(attr) = self
            .required_attrs
            .iter()
            .find(|attr| !op.attributes.contains(attr))
        {
            return verify_err!(
                op.loc(),
                MissingAttrVerifyErr {
                    op: opid.to_string(),
                    attr: *attr,
                }
            );
        }
        match self.verifier {
            Some(verifier) => verifier(ctx, op),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Arity, MalformedOpNameErr, OpId};

    #[test]
    fn parse_op_ids() {
        let id = OpId::parse("cf.cond_br").unwrap();
        assert_eq!(id.dialect.as_str(), "cf");
        assert_eq!(id.name.as_str(), "cond_br");
        assert_eq!(id.to_string(), "cf.cond_br");

        let id = OpId::parse("llvm.intr.memcpy").unwrap();
        assert_eq!(id.dialect.as_str(), "llvm");
        assert_eq!(id.name.as_str(), "intr.memcpy");

        for bad in ["func", ".op", "func.", "1x.op", "a b.c"] {
            assert!(OpId::parse(bad).unwrap_err().is::<MalformedOpNameErr>());
        }
    }

    #[test]
    fn arity() {
        assert!(Arity::Exactly(2).accepts(2));
        assert!(!Arity::Exactly(2).accepts(3));
        assert!(Arity::AtLeast(1).accepts(3));
        assert!(!Arity::AtLeast(1).accepts(0));
        assert_eq!(Arity::AtLeast(1).to_string(), "at least 1");
    }
}
