//! Utility traits such as [Verify].

use crate::{context::Context, result::Result};

/// Check and ensure correctness.
pub trait Verify {
    fn verify(&self, ctx: &Context) -> Result<()>;
}
