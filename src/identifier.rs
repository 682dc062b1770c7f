//! [Identifier]s are strings used to name dialects, operations and attributes.

use std::{borrow::Borrow, fmt::Display, ops::Deref, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::{arg_err_noloc, impl_printable_for_display, result::Result};

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_$.]*$").expect("valid identifier regex"));

#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
/// An [Identifier] must satisfy the regex `[a-zA-Z_][a-zA-Z0-9_$.]*`.
/// Also see [module description](module@crate::identifier).
pub struct Identifier(String);

#[derive(Debug, Error)]
#[error("Malformed identifier \"{0}\"")]
pub struct MalformedIdentifierErr(pub String);

impl Identifier {
    /// Is `s` a well formed identifier?
    pub fn is_valid(s: &str) -> bool {
        IDENTIFIER_RE.is_match(s)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl_printable_for_display!(Identifier);

impl TryFrom<&str> for Identifier {
    type Error = crate::result::Error;

    fn try_from(value: &str) -> Result<Self> {
        if !Identifier::is_valid(value) {
            return arg_err_noloc!(MalformedIdentifierErr(value.to_string()));
        }
        Ok(Identifier(value.to_string()))
    }
}

impl TryFrom<String> for Identifier {
    type Error = crate::result::Error;

    fn try_from(value: String) -> Result<Self> {
        if !Identifier::is_valid(&value) {
            return arg_err_noloc!(MalformedIdentifierErr(value));
        }
        Ok(Identifier(value))
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl Deref for Identifier {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
