//! Utilities for error handling

use std::{
    backtrace::{Backtrace, BacktraceStatus},
    fmt::Display,
};

use downcast_rs::{impl_downcast, DowncastSync};
use thiserror::Error;

use crate::{
    context::Context,
    diagnostics::Diagnostic,
    location::{Located, Location},
    printable::Printable,
};

/// The kinds of errors callers of this crate can observe.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A namespace is neither loaded, available nor resolvable.
    #[error("unknown dialect")]
    UnknownDialect,
    /// Attribute style access (`dialects().attr(..)`) of something that doesn't exist.
    #[error("attribute not found")]
    AttributeNotFound,
    /// Index style access (`dialects().index(..)`) of something that doesn't exist.
    #[error("index out of range")]
    IndexOutOfRange,
    /// An operation was requested in a dialect that isn't registered,
    /// and the context doesn't allow unregistered dialects.
    #[error("unregistered dialect")]
    UnregisteredDialect,
    /// The IR was found to be inconsistent or invalid during verification
    #[error("verification failed")]
    VerificationFailed,
    /// Inconsistent or invalid argument(s) passed to a dialex function.
    #[error("invalid argument")]
    InvalidArgument,
    /// A dialect module was found but could not be loaded.
    #[error("dialect module load failed")]
    ModuleLoadFailed,
}

/// An error object that can hold any [std::error::Error].
#[derive(Debug)]
pub struct Error {
    /// The kind of error this is
    pub kind: ErrorKind,
    /// The actual error object describing the error
    pub err: Box<dyn DialexError>,
    /// Location of the IR entity this error is about
    pub loc: Location,
    /// Error diagnostics captured while the failing operation ran.
    pub diagnostics: Vec<Diagnostic>,
    /// Details of how this error occurred
    pub backtrace: Backtrace,
}

impl Error {
    /// Is the concrete error object of type `T`?
    pub fn is<T: DialexError>(&self) -> bool {
        self.err.is::<T>()
    }

    /// Attach captured diagnostics to this error.
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }
}

/// This does not print [Location], diagnostics or [Backtrace]. Use [Printable::disp] for that.
impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.err)
    }
}

pub trait DialexError: std::error::Error + DowncastSync {}

impl<T: std::error::Error + Send + Sync + 'static> DialexError for T {}

impl_downcast!(DialexError);

impl std::error::Error for Error {}

impl Printable for Error {
    fn fmt(&self, ctx: &Context, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.loc.disp(ctx), self.kind, self.err)?;
        for diag in &self.diagnostics {
            write!(f, "\n  {}", diag.disp(ctx))?;
        }
        if self.backtrace.status() == BacktraceStatus::Captured {
            write!(f, "\nError backtrace:\n{}", self.backtrace)?;
        }
        Ok(())
    }
}

impl Located for Error {
    fn loc(&self) -> Location {
        self.loc.clone()
    }

    fn set_loc(&mut self, loc: Location) {
        self.loc = loc;
    }
}

/// Type alias for [std::result::Result] with the error type set to [struct@Error]
pub type Result<T> = std::result::Result<T, Error>;

#[doc(hidden)]
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

/// Specify [ErrorKind] and create [struct@Error] from any [std::error::Error] object.
/// To create [Result], use [create_err!](crate::create_err) instead.
/// The macro also accepts [format!] like arguments to create one-off errors.
#[macro_export]
macro_rules! create_error {
    ($loc: expr, $kind: expr, $str: literal $($t:tt)*) => {
        $crate::create_error!($loc, $kind, $crate::result::StringError(format!($str $($t)*)))
    };
    ($loc: expr, $kind: expr, $err: expr) => {
        $crate::result::Error {
            kind: $kind,
            err: Box::new($err),
            loc: $loc,
            diagnostics: vec![],
            backtrace: std::backtrace::Backtrace::capture(),
        }
    };
}

/// Specify [ErrorKind] and create [Result] from any [std::error::Error] object.
/// To create [struct@Error], use [create_error!](crate::create_error) instead.
#[macro_export]
macro_rules! create_err {
    ($loc: expr, $kind: expr, $($t:tt)*) => {
        Err($crate::create_error!($loc, $kind, $($t)*))
    };
}

/// Create [ErrorKind::VerificationFailed] [Result] from any [std::error::Error] object.
/// ```rust
/// use thiserror::Error;
/// use dialex::{verify_err, result::{Result, ErrorKind, Error}, location::Location};
///
/// #[derive(Error, Debug)]
/// #[error("sample error")]
/// pub struct SampleErr;
///
/// assert!(
///     matches!(
///         verify_err!(Location::Unknown, SampleErr),
///         Result::<()>::Err(Error {
///            kind: ErrorKind::VerificationFailed,
///            err,
///            ..
///         }) if err.is::<SampleErr>()
/// ));
///
/// let res_msg: Result<()> = verify_err!(Location::Unknown, "Some formatted {}", 0);
/// assert_eq!(
///     res_msg.unwrap_err().err.to_string(),
///     "Some formatted 0"
/// );
/// ```
#[macro_export]
macro_rules! verify_err {
    ($loc: expr, $($t:tt)*) => {
        $crate::create_err!($loc, $crate::result::ErrorKind::VerificationFailed, $($t)*)
    }
}

/// Create [ErrorKind::InvalidArgument] [Result] from any [std::error::Error] object.
#[macro_export]
macro_rules! arg_err {
    ($loc: expr, $($t:tt)*) => {
        $crate::create_err!($loc, $crate::result::ErrorKind::InvalidArgument, $($t)*)
    }
}

/// Same as [arg_err] but when no location is known.
#[macro_export]
macro_rules! arg_err_noloc {
    ($($t:tt)*) => {
        $crate::create_err!($crate::location::Location::Unknown, $crate::result::ErrorKind::InvalidArgument, $($t)*)
    }
}

/// Create [ErrorKind::UnknownDialect] [Result]. Lookups have no location.
#[macro_export]
macro_rules! unknown_dialect_err {
    ($($t:tt)*) => {
        $crate::create_err!($crate::location::Location::Unknown, $crate::result::ErrorKind::UnknownDialect, $($t)*)
    }
}

/// Create [ErrorKind::UnregisteredDialect] [Result].
#[macro_export]
macro_rules! unregistered_err {
    ($loc: expr, $($t:tt)*) => {
        $crate::create_err!($loc, $crate::result::ErrorKind::UnregisteredDialect, $($t)*)
    }
}

/// Create [ErrorKind::ModuleLoadFailed] [struct@Error]. Module loading has no location.
#[macro_export]
macro_rules! load_error {
    ($($t:tt)*) => {
        $crate::create_error!($crate::location::Location::Unknown, $crate::result::ErrorKind::ModuleLoadFailed, $($t)*)
    }
}
