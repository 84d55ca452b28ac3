//! Visiting the active alternatives of one or more variants at once.
//!
//! A handler is any type implementing [`Handler`] for every combination of alternatives it can
//! be called with, as a tuple of references. Each of those impls has to produce the same
//! [`Handler::Output`], a handler that doesn't is rejected when the program is compiled.
//!
//! ```
//! use compact_variant::visit::Handler;
//! use compact_variant::{visit, Variant};
//!
//! struct Describe;
//!
//! impl Handler<(&i32, &bool)> for Describe {
//!     type Output = String;
//!     fn call(self, (n, b): (&i32, &bool)) -> String {
//!         format!("{n} and {b}")
//!     }
//! }
//!
//! impl Handler<(&i32, &char)> for Describe {
//!     type Output = String;
//!     fn call(self, (n, c): (&i32, &char)) -> String {
//!         format!("{n} and {c:?}")
//!     }
//! }
//!
//! let a: Variant<(i32,)> = Variant::new(4_i32);
//! let b: Variant<(bool, char)> = Variant::new('x');
//!
//! assert_eq!(visit!(Describe, &a, &b).unwrap(), "4 and 'x'");
//! ```
//!
//! Every participant is resolved in turn, each one narrowing the set of handler impls that can
//! still be reached, so a call only ever costs one `match` per participant. If any participant
//! is valueless the handler isn't called at all and a [`BadVariantAccess`] is returned.

use crate::list::AltList;
use crate::policy::Policy;
use crate::repr::discriminant::Encode;
use crate::{
    BadVariantAccess,
    Variant,
};

/// Something that can be called with a tuple of arguments.
///
/// Implement it for `&mut YourVisitor` to keep state across calls. It's implemented for
/// closures of up to four arguments, which is handy when every combination has the same types.
pub trait Handler<Args> {
    type Output;

    fn call(self, args: Args) -> Self::Output;
}

macro_rules! closure_handlers {
    ($(($($arg:ident),+)),+ $(,)?) => {
        $(
            impl<F, R, $($arg),+> Handler<($($arg,)+)> for F
            where
                F: FnOnce($($arg),+) -> R,
            {
                type Output = R;

                #[inline]
                #[allow(non_snake_case)]
                fn call(self, ($($arg,)+): ($($arg,)+)) -> R {
                    self($($arg),+)
                }
            }
        )+
    };
}

closure_handlers!((A), (A, B), (A, B, C), (A, B, C, D));

/// How a participant's active alternative is handed to the handler.
pub trait Mode {
    type Ref<'a, T: 'a>;

    /// # Safety
    /// * `ptr` must point to a live `T` that outlives `'a`, and is only ever written through
    ///   when `Self` is [`Exclusive`]
    unsafe fn project<'a, T: 'a>(ptr: *mut u8) -> Self::Ref<'a, T>;
}

/// Alternatives are handed out as `&T`.
#[derive(Debug)]
pub enum Shared {}

/// Alternatives are handed out as `&mut T`.
#[derive(Debug)]
pub enum Exclusive {}

impl Mode for Shared {
    type Ref<'a, T: 'a> = &'a T;

    #[inline(always)]
    unsafe fn project<'a, T: 'a>(ptr: *mut u8) -> &'a T {
        &*ptr.cast::<T>()
    }
}

impl Mode for Exclusive {
    type Ref<'a, T: 'a> = &'a mut T;

    #[inline(always)]
    unsafe fn project<'a, T: 'a>(ptr: *mut u8) -> &'a mut T {
        &mut *ptr.cast::<T>()
    }
}

/// Calls a handler with the alternative at a runtime index, implemented for every list.
///
/// The impl requires every alternative's call to have the same `Output`, which is how a
/// handler with inconsistent results gets rejected.
///
/// # Safety
/// * `dispatch` must call the handler with the alternative at `index`, projected from `ptr`
pub unsafe trait Dispatch<'a, M: Mode, H>: AltList {
    type Output;

    /// # Safety
    /// * `ptr` must point to the storage of a value whose live alternative is at `index`
    unsafe fn dispatch(ptr: *mut u8, index: usize, handler: H) -> Self::Output;
}

/// Appends an element to a tuple.
pub trait Append<X> {
    type Output;

    fn append(self, x: X) -> Self::Output;
}

macro_rules! append {
    ($(($($elem:ident),*)),+ $(,)?) => {
        $(
            impl<X, $($elem),*> Append<X> for ($($elem,)*) {
                type Output = ($($elem,)* X,);

                #[inline(always)]
                #[allow(non_snake_case)]
                fn append(self, x: X) -> Self::Output {
                    let ($($elem,)*) = self;
                    ($($elem,)* x,)
                }
            }
        )+
    };
}

append!(
    (),
    (A),
    (A, B),
    (A, B, C),
    (A, B, C, D),
    (A, B, C, D, E),
    (A, B, C, D, E, F),
    (A, B, C, D, E, F, G),
);

/// Returns `true` if any value of a participant list is valueless.
pub trait AnyValueless {
    fn any_valueless(&self) -> bool;
}

/// A list of values taking part in a visitation, written as nested pairs ending in `()`:
/// `(&a, (&mut b, ()))`.
///
/// `Prefix` holds the alternatives of the participants that were already resolved.
///
/// # Safety
/// * `dispatch` must call `handler` exactly once, with `prefix` followed by the live
///   alternative of every participant
pub unsafe trait Participants<H, Prefix>: AnyValueless {
    type Output;

    /// # Safety
    /// * no participant may be valueless
    unsafe fn dispatch(self, handler: H, prefix: Prefix) -> Self::Output;
}

impl AnyValueless for () {
    #[inline]
    fn any_valueless(&self) -> bool {
        false
    }
}

unsafe impl<H, Prefix> Participants<H, Prefix> for ()
where
    H: Handler<Prefix>,
{
    type Output = H::Output;

    #[inline]
    unsafe fn dispatch(self, handler: H, prefix: Prefix) -> H::Output {
        handler.call(prefix)
    }
}

impl<L, P, E, Rest> AnyValueless for (&Variant<L, P, E>, Rest)
where
    L: AltList,
    P: Policy<L>,
    E: Encode<L, P>,
    Rest: AnyValueless,
{
    #[inline]
    fn any_valueless(&self) -> bool {
        self.0.is_valueless() || self.1.any_valueless()
    }
}

impl<L, P, E, Rest> AnyValueless for (&mut Variant<L, P, E>, Rest)
where
    L: AltList,
    P: Policy<L>,
    E: Encode<L, P>,
    Rest: AnyValueless,
{
    #[inline]
    fn any_valueless(&self) -> bool {
        self.0.is_valueless() || self.1.any_valueless()
    }
}

unsafe impl<'a, L, P, E, Rest, H, Prefix> Participants<H, Prefix> for (&'a Variant<L, P, E>, Rest)
where
    L: Dispatch<'a, Shared, Stage<H, Prefix, Rest>>,
    P: Policy<L>,
    E: Encode<L, P>,
    Rest: AnyValueless,
{
    type Output = <L as Dispatch<'a, Shared, Stage<H, Prefix, Rest>>>::Output;

    #[inline]
    unsafe fn dispatch(self, handler: H, prefix: Prefix) -> Self::Output {
        let (value, rest) = self;
        let stage = Stage {
            handler,
            prefix,
            rest,
        };
        // only ever read through, `Shared` hands out `&T`
        L::dispatch(value.repr.as_ptr() as *mut u8, value.index(), stage)
    }
}

unsafe impl<'a, L, P, E, Rest, H, Prefix> Participants<H, Prefix>
    for (&'a mut Variant<L, P, E>, Rest)
where
    L: Dispatch<'a, Exclusive, Stage<H, Prefix, Rest>>,
    P: Policy<L>,
    E: Encode<L, P>,
    Rest: AnyValueless,
{
    type Output = <L as Dispatch<'a, Exclusive, Stage<H, Prefix, Rest>>>::Output;

    #[inline]
    unsafe fn dispatch(self, handler: H, prefix: Prefix) -> Self::Output {
        let (value, rest) = self;
        let index = value.index();
        let stage = Stage {
            handler,
            prefix,
            rest,
        };
        L::dispatch(value.repr.as_mut_ptr(), index, stage)
    }
}

/// The handler passed down while resolving a participant: it appends the alternative it's
/// called with to the prefix and moves on to the remaining participants.
pub struct Stage<H, Prefix, Rest> {
    handler: H,
    prefix: Prefix,
    rest: Rest,
}

impl<H, Prefix, Rest, X> Handler<(X,)> for Stage<H, Prefix, Rest>
where
    Prefix: Append<X>,
    Rest: Participants<H, <Prefix as Append<X>>::Output>,
{
    type Output = <Rest as Participants<H, <Prefix as Append<X>>::Output>>::Output;

    #[inline]
    fn call(self, (x,): (X,)) -> Self::Output {
        // SAFETY: a `Stage` is only built by `Participants::dispatch`, which `visit` only calls
        // after checking that no participant is valueless
        unsafe { self.rest.dispatch(self.handler, self.prefix.append(x)) }
    }
}

/// Calls `handler` with the active alternatives of every participant.
///
/// Usually called through the [`visit!`](crate::visit!) macro, which builds the participant
/// list.
///
/// # Errors
/// Returns [`BadVariantAccess`] without calling `handler` if any participant is valueless.
pub fn visit<H, Ps>(handler: H, participants: Ps) -> Result<Ps::Output, BadVariantAccess>
where
    Ps: Participants<H, ()>,
{
    if participants.any_valueless() {
        log::trace!("visitation rejected, a participant is valueless");
        return Err(BadVariantAccess::valueless());
    }
    // SAFETY: we just checked that every participant holds an alternative
    Ok(unsafe { participants.dispatch(handler, ()) })
}

#[cfg(test)]
mod tests {
    use std::panic::{
        self,
        AssertUnwindSafe,
    };

    use super::*;
    use crate::policy::Auto;
    use crate::repr::discriminant::Tagged;

    struct Name;

    impl Handler<(&i32,)> for Name {
        type Output = &'static str;
        fn call(self, _: (&i32,)) -> &'static str {
            "i32"
        }
    }

    impl Handler<(&String,)> for Name {
        type Output = &'static str;
        fn call(self, _: (&String,)) -> &'static str {
            "String"
        }
    }

    #[derive(Default)]
    struct Calls(Vec<(usize, usize)>);

    macro_rules! pair_handlers {
        ($(($a:ty, $i:literal, $b:ty, $j:literal)),+) => {
            $(
                impl Handler<(&$a, &$b)> for &mut Calls {
                    type Output = ();
                    fn call(self, _: (&$a, &$b)) {
                        self.0.push(($i, $j));
                    }
                }
            )+
        };
    }

    pair_handlers!((u8, 0, bool, 0), (u8, 0, char, 1), (u16, 1, bool, 0), (u16, 1, char, 1));

    #[test]
    fn test_single_participant() {
        let v: Variant<(i32, String)> = Variant::new(String::from("x"));
        assert_eq!(visit(Name, (&v, ())).unwrap(), "String");

        let v: Variant<(i32, String)> = Variant::new(1_i32);
        assert_eq!(visit(Name, (&v, ())).unwrap(), "i32");
    }

    #[test]
    fn test_pair_calls_the_live_combination_once() {
        let a: Variant<(u8, u16)> = Variant::new(1_u8);
        let b: Variant<(bool, char)> = Variant::new('c');

        let mut calls = Calls::default();
        visit(&mut calls, (&a, (&b, ()))).unwrap();
        assert_eq!(calls.0, [(0, 1)]);

        let a: Variant<(u8, u16)> = Variant::new(1_u16);
        visit(&mut calls, (&a, (&b, ()))).unwrap();
        assert_eq!(calls.0, [(0, 1), (1, 1)]);
    }

    #[test]
    fn test_exclusive_participants() {
        struct Double;
        impl Handler<(&mut i32,)> for Double {
            type Output = ();
            fn call(self, (n,): (&mut i32,)) {
                *n *= 2;
            }
        }
        impl Handler<(&mut String,)> for Double {
            type Output = ();
            fn call(self, (s,): (&mut String,)) {
                s.push_str(&s.clone());
            }
        }

        let mut v: Variant<(i32, String)> = Variant::new(21_i32);
        visit(Double, (&mut v, ())).unwrap();
        assert_eq!(v.get::<i32, _>(), Ok(&42));
    }

    #[test]
    fn test_closures_are_handlers() {
        let v: Variant<(u32,)> = Variant::new(7_u32);
        let doubled = visit(|n: &u32| n * 2, (&v, ())).unwrap();
        assert_eq!(doubled, 14);
    }

    #[test]
    fn test_append() {
        assert_eq!(().append(1), (1,));
        assert_eq!((1, "a").append('b'), (1, "a", 'b'));
    }

    #[test]
    fn test_valueless_is_rejected() {
        let mut v = Variant::<(i32, String), Auto, Tagged>::new(1_i32);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            v.emplace_with::<String, _, _>(|| panic!("boom"));
        }));
        assert!(result.is_err());

        assert_eq!(visit(Name, (&v, ())), Err(BadVariantAccess::valueless()));
    }
}
