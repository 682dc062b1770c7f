//! The builtin dialect: containers and glue that every pipeline needs.

use std::borrow::Cow;

use linkme::distributed_slice;

use crate::{
    dialect::{Dialect, DialectName},
    op::{Arity, OpSchema},
    operation::Operation,
    resolver::{DialectModule, DIALECT_MODULES},
    wrapper::DialectClass,
};

pub const NAMESPACE: &str = "builtin";

pub fn dialect() -> Dialect {
    Dialect::new(DialectName::new(NAMESPACE))
        .with_op(OpSchema::new("module"))
        .with_op(
            OpSchema::new("unrealized_conversion_cast")
                .operands(Arity::AtLeast(0))
                .results(Arity::AtLeast(1)),
        )
}

pub fn class() -> DialectClass {
    DialectClass::new(NAMESPACE)
        .with_op("module", Operation::create)
        .with_op("unrealized_conversion_cast", Operation::create)
}

#[distributed_slice(DIALECT_MODULES)]
static BUILTIN_MODULE: DialectModule = DialectModule {
    path: Cow::Borrowed("dialects.builtin"),
    class: Some(class),
    dialect: None,
};
