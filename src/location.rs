//! Source location for operations and diagnostics.

use crate::{
    context::Context,
    printable::{fmt_list, Printable},
};

/// Represents a (combination of) program source locations.
/// This captures more or less the functionality of MLIR's
/// [BuiltinLocationAttributes](https://mlir.llvm.org/docs/Dialects/Builtin/#location-attributes).
/// Unlike in MLIR, [Location] is not extensible.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub enum Location {
    /// A file along with a line and column within it.
    /// See [FileLineColLoc](https://mlir.llvm.org/docs/Dialects/Builtin/#filelinecolloc).
    FileLineCol {
        file: String,
        line: u32,
        column: u32,
    },
    /// A collection of other source locations.
    /// See [FusedLoc](https://mlir.llvm.org/docs/Dialects/Builtin/#fusedloc).
    Fused(Vec<Location>),
    /// Location with a name.
    /// See [NameLoc](https://mlir.llvm.org/docs/Dialects/Builtin/#nameloc).
    Named {
        name: String,
        child_loc: Box<Location>,
    },
    /// Connects the location of a callee with the location of the caller.
    /// See [CallSiteLoc](https://mlir.llvm.org/docs/Dialects/Builtin/#callsiteloc).
    CallSite {
        callee: Box<Location>,
        caller: Box<Location>,
    },
    /// Location unknown.
    #[default]
    Unknown,
}

impl Location {
    pub fn file_line_col(file: &str, line: u32, column: u32) -> Location {
        Location::FileLineCol {
            file: file.to_string(),
            line,
            column,
        }
    }

    pub fn named(name: &str, child_loc: Location) -> Location {
        Location::Named {
            name: name.to_string(),
            child_loc: Box::new(child_loc),
        }
    }

    pub fn call_site(callee: Location, caller: Location) -> Location {
        Location::CallSite {
            callee: Box::new(callee),
            caller: Box::new(caller),
        }
    }

    /// Fuse `locations`, dropping unknown ones. Fusing a single
    /// known location yields that location.
    pub fn fused(locations: Vec<Location>) -> Location {
        let mut locations: Vec<_> = locations
            .into_iter()
            .filter(|loc| !loc.is_unknown())
            .collect();
        match locations.len() {
            0 => Location::Unknown,
            1 => locations.remove(0),
            _ => Location::Fused(locations),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Location::Unknown)
    }
}

impl Printable for Location {
    fn fmt(&self, ctx: &Context, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileLineCol { file, line, column } => {
                write!(f, "{}:{}:{}", file, line, column)
            }
            Self::Fused(locations) => {
                write!(f, "fused[")?;
                fmt_list(locations, ", ", ctx, f)?;
                write!(f, "]")
            }
            Self::Named { name, child_loc } => {
                write!(f, "{}({})", name, child_loc.disp(ctx))
            }
            Self::CallSite { callee, caller } => {
                write!(f, "callsite({} at {})", callee.disp(ctx), caller.disp(ctx))
            }
            Self::Unknown => write!(f, "?"),
        }
    }
}

/// Any object that has an associated location.
pub trait Located {
    fn loc(&self) -> Location;
    fn set_loc(&mut self, loc: Location);
}
