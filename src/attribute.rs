//! Attributes are compile time constants attached to operations.

use std::{collections::BTreeMap, fmt::Display};

use crate::{identifier::Identifier, impl_printable_for_display, r#type::Type};

#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Unit,
    Bool(bool),
    Integer { value: i64, ty: Type },
    Float { value: f64, ty: Type },
    String(String),
    /// Reference to a symbol, printed as `@name`.
    SymbolRef(String),
    Type(Type),
    Array(Vec<Attribute>),
}

impl Attribute {
    pub fn integer(value: i64, ty: Type) -> Attribute {
        Attribute::Integer { value, ty }
    }

    pub fn float(value: f64, ty: Type) -> Attribute {
        Attribute::Float { value, ty }
    }

    /// The type of a typed attribute (integers, floats and type attributes).
    pub fn get_type(&self) -> Option<&Type> {
        match self {
            Attribute::Integer { ty, .. } | Attribute::Float { ty, .. } | Attribute::Type(ty) => {
                Some(ty)
            }
            _ => None,
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attribute::Unit => write!(f, "unit"),
            Attribute::Bool(b) => write!(f, "{}", b),
            Attribute::Integer { value, ty } => write!(f, "{} : {}", value, ty),
            Attribute::Float { value, ty } => write!(f, "{:?} : {}", value, ty),
            Attribute::String(s) => write!(f, "{:?}", s),
            Attribute::SymbolRef(s) => write!(f, "@{}", s),
            Attribute::Type(ty) => write!(f, "{}", ty),
            Attribute::Array(elems) => {
                write!(f, "[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl_printable_for_display!(Attribute);

/// Named attributes of an operation, kept sorted by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeDict(pub BTreeMap<Identifier, Attribute>);

impl AttributeDict {
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: Identifier, attr: Attribute) {
        self.0.insert(name, attr);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for AttributeDict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, attr)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match attr {
                Attribute::Unit => write!(f, "{}", name)?,
                _ => write!(f, "{} = {}", name, attr)?,
            }
        }
        write!(f, "}}")
    }
}
