//! IR objects that are to be printed must implement [Printable].
//!
//! Printing needs access to the [Context] (to look up operations behind
//! [Ptr](crate::context::Ptr)s for example), so [std::fmt::Display] alone
//! isn't enough. [Printable::disp] pairs an object with a [Context] and
//! gives back something that implements [Display].

use std::fmt::{self, Display};

use crate::context::Context;

/// An object that implements [Display].
struct Displayable<'t, 'c, T: Printable + ?Sized> {
    t: &'t T,
    ctx: &'c Context,
}

impl<T: Printable + ?Sized> Display for Displayable<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.t.fmt(self.ctx, f)
    }
}

/// Easy printing of IR objects.
///
/// Example:
/// ```
/// use dialex::{context::Context, globals::Globals, printable::Printable};
/// use std::fmt;
/// struct S {
///     i: i64,
/// }
/// impl Printable for S {
///     fn fmt(&self, _ctx: &Context, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "{}", self.i)
///     }
/// }
///
/// let ctx = Context::new(&Globals::new());
/// assert!(S { i: 108 }.disp(&ctx).to_string() == "108");
/// ```
pub trait Printable {
    fn fmt(&self, ctx: &Context, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Get a [Display]'able object from the given [Context].
    fn disp<'t, 'c>(&'t self, ctx: &'c Context) -> Box<dyn Display + 'c>
    where
        't: 'c,
    {
        Box::new(Displayable { t: self, ctx })
    }
}

/// Implement [Printable] for a type that already implements [Display].
#[macro_export]
macro_rules! impl_printable_for_display {
    ($ty_name:ty) => {
        impl $crate::printable::Printable for $ty_name {
            fn fmt(
                &self,
                _ctx: &$crate::context::Context,
                f: &mut std::fmt::Formatter<'_>,
            ) -> std::fmt::Result {
                write!(f, "{}", self)
            }
        }
    };
}

impl_printable_for_display!(&str);
impl_printable_for_display!(String);

/// Print the elements of `list`, separated by `sep`.
pub fn fmt_list<T: Printable>(
    list: &[T],
    sep: &str,
    ctx: &Context,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let mut iter = list.iter();
    if let Some(first) = iter.next() {
        first.fmt(ctx, f)?;
    }
    for item in iter {
        write!(f, "{sep}")?;
        item.fmt(ctx, f)?;
    }
    Ok(())
}
