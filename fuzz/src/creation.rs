//! Ways of creating a [`Subject`] along with its [`Control`].

use arbitrary::Arbitrary;
use compact_variant::index::U3;
use compact_variant::{
    Empty,
    Variant,
};

use crate::{
    poison,
    Control,
    Subject,
};

#[derive(Arbitrary, Debug)]
pub enum Creation<'a> {
    /// Create using [`Default`], which holds the first alternative
    Default,
    /// Create using [`Variant::new`] with a byte
    Byte(u8),
    /// Create using [`Variant::from_value`], which converts an `i32` into the `i64`
    Int(i32),
    /// Create using [`Variant::from_value`] with a `String`
    Text(&'a str),
    /// Create using [`Variant::with`] and a closure building a `Box<str>`
    Boxed(&'a str),
    /// Create holding [`Empty`]
    Nothing,
    /// Create a `String`, then poison it so it's valueless
    Valueless(&'a str),
}

impl Creation<'_> {
    pub fn create(self) -> (Subject, Control) {
        match self {
            Creation::Default => (Subject::default(), Control::Byte(0)),
            Creation::Byte(b) => (Variant::new(b), Control::Byte(b)),
            Creation::Int(n) => (Variant::from_value(n), Control::Int(n as i64)),
            Creation::Text(s) => (Variant::from_value(s.to_owned()), Control::Text(s.to_owned())),
            Creation::Boxed(s) => (
                Variant::with::<_, U3, _>(|| Box::from(s)),
                Control::Boxed(Box::from(s)),
            ),
            Creation::Nothing => (Variant::new(Empty), Control::Nothing),
            Creation::Valueless(s) => {
                let mut subject: Subject = Variant::new(String::from(s));
                poison(&mut subject);
                (subject, Control::Valueless)
            }
        }
    }
}
