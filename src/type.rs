//! A minimal type vocabulary for operation results and operands.
//!
//! Types are plain values here: they are compared structurally and are not
//! uniqued in the [Context](crate::context::Context).

use std::fmt::Display;

use crate::impl_printable_for_display;

/// Floating point formats.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum FloatKind {
    F16,
    F32,
    F64,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Type {
    /// Signless integer of the given bit width.
    Integer { width: u32 },
    Float(FloatKind),
    Index,
    Function {
        inputs: Vec<Type>,
        results: Vec<Type>,
    },
    None,
    /// A type from a dialect this crate knows nothing about, kept as text.
    Opaque { dialect: String, data: String },
}

impl Type {
    pub fn i1() -> Type {
        Type::Integer { width: 1 }
    }

    pub fn i32() -> Type {
        Type::Integer { width: 32 }
    }

    pub fn i64() -> Type {
        Type::Integer { width: 64 }
    }

    pub fn f32() -> Type {
        Type::Float(FloatKind::F32)
    }

    pub fn f64() -> Type {
        Type::Float(FloatKind::F64)
    }

    pub fn function(inputs: Vec<Type>, results: Vec<Type>) -> Type {
        Type::Function { inputs, results }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    pub fn is_integer_or_index(&self) -> bool {
        self.is_integer() || matches!(self, Type::Index)
    }
}

fn fmt_type_list(types: &[Type], f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Integer { width } => write!(f, "i{}", width),
            Type::Float(FloatKind::F16) => write!(f, "f16"),
            Type::Float(FloatKind::F32) => write!(f, "f32"),
            Type::Float(FloatKind::F64) => write!(f, "f64"),
            Type::Index => write!(f, "index"),
            Type::Function { inputs, results } => {
                write!(f, "(")?;
                fmt_type_list(inputs, f)?;
                write!(f, ") -> ")?;
                if results.len() == 1 && !matches!(results[0], Type::Function { .. }) {
                    write!(f, "{}", results[0])
                } else {
                    write!(f, "(")?;
                    fmt_type_list(results, f)?;
                    write!(f, ")")
                }
            }
            Type::None => write!(f, "none"),
            Type::Opaque { dialect, data } => write!(f, "!{}.{}", dialect, data),
        }
    }
}

impl_printable_for_display!(Type);

#[cfg(test)]
mod tests {
    use super::Type;

    #[test]
    fn print_types() {
        assert_eq!(Type::i32().to_string(), "i32");
        assert_eq!(Type::f32().to_string(), "f32");
        assert_eq!(
            Type::function(vec![Type::i32(), Type::Index], vec![Type::f64()]).to_string(),
            "(i32, index) -> f64"
        );
        assert_eq!(
            Type::function(vec![], vec![Type::i1(), Type::i1()]).to_string(),
            "() -> (i1, i1)"
        );
        assert_eq!(
            Type::Opaque {
                dialect: "custom".into(),
                data: "tok".into()
            }
            .to_string(),
            "!custom.tok"
        );
    }
}
