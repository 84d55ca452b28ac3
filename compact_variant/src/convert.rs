//! Picking, and performing, the conversion of a value into one of the alternatives.
//!
//! [`Variant::from_value`](crate::Variant::from_value) and [`Variant::assign`](crate::Variant::assign)
//! accept any [`Alternative`] and store it as whichever alternative accepts it best. Every
//! candidate is given a [`Rank`], the candidate with the single best rank wins, and a tie or
//! the absence of any candidate rejects the call when the program is compiled.
//!
//! | from                  | to                           | rank            |
//! |-----------------------|------------------------------|-----------------|
//! | `T`                   | `T`                          | `Exact`         |
//! | integer narrower than `i32` | `i32`                  | `Promoted`      |
//! | `f32`                 | `f64`                        | `Promoted`      |
//! | integer               | float with a wide enough mantissa | `LosslessFloat` |
//! | integer               | wider integer                | `Converted`     |
//! | `char`                | integer of 32 bits or more   | `Converted`     |
//! | `&'static str`        | `String`, `Box<str>`         | `Converted`     |
//! | `String`              | `Box<str>` (and back)        | `Converted`     |
//!
//! Narrowing conversions, anything into `bool` or `char` that isn't already one, and anything
//! involving an opaque type other than the type itself are never considered.

use core::any::Any;
use core::mem;
use std::borrow::Cow;

use castaway::{
    cast,
    match_type,
};

use crate::list::ConvertList;
use crate::traits::Alternative;

/// What kind of value a type holds, as far as conversions are concerned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Class {
    Bool,
    Char,
    Int(IntKind),
    /// A float with the given number of bits.
    Float(u32),
    Text(TextKind),
    /// A type that only ever matches itself, identified by a hash of its path.
    Opaque(u64),
    /// A type that never takes part in conversions, references and pointers among others.
    Unranked,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IntKind {
    pub signed: bool,
    pub bits: u32,
    /// `usize` and `isize`, which are distinct from the fixed width integers of the same size.
    pub pointer: bool,
}

impl IntKind {
    pub const fn new(signed: bool, bits: u32) -> Self {
        IntKind {
            signed,
            bits,
            pointer: false,
        }
    }

    pub const fn pointer(signed: bool) -> Self {
        IntKind {
            signed,
            bits: (mem::size_of::<usize>() * 8) as u32,
            pointer: true,
        }
    }

    /// Bits that carry magnitude, not sign.
    #[inline]
    const fn value_bits(&self) -> u32 {
        self.bits - self.signed as u32
    }

    /// Every value of `self` is a value of `other`.
    const fn fits_in(&self, other: &IntKind) -> bool {
        match (self.signed, other.signed) {
            (false, false) | (true, true) => other.bits >= self.bits,
            (false, true) => other.bits > self.bits,
            (true, false) => false,
        }
    }

    const fn is_plain_i32(&self) -> bool {
        self.signed && self.bits == 32 && !self.pointer
    }

    const fn eq(&self, other: &IntKind) -> bool {
        self.signed == other.signed && self.bits == other.bits && self.pointer == other.pointer
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextKind {
    /// `&'static str`
    Static,
    /// `String`
    Owned,
    /// `Box<str>`
    Boxed,
}

impl Class {
    const fn eq(&self, other: &Class) -> bool {
        match (self, other) {
            (Class::Bool, Class::Bool) | (Class::Char, Class::Char) => true,
            (Class::Int(a), Class::Int(b)) => a.eq(b),
            (Class::Float(a), Class::Float(b)) => *a == *b,
            (Class::Text(a), Class::Text(b)) => *a as u8 == *b as u8,
            (Class::Opaque(a), Class::Opaque(b)) => *a == *b,
            _ => false,
        }
    }
}

/// How good a match a candidate alternative is, best first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Exact,
    Promoted,
    /// An integer into a float that holds every value of it.
    LosslessFloat,
    Converted,
}

/// Ranks the conversion of a `src` value into a `dst` alternative, `None` if it isn't allowed.
pub const fn rank(src: Class, dst: Class) -> Option<Rank> {
    if let Class::Unranked = src {
        return None;
    }
    if src.eq(&dst) {
        return Some(Rank::Exact);
    }

    match (src, dst) {
        (Class::Bool, Class::Int(dst)) => Some(promoted(&IntKind::new(false, 1), &dst)),
        (Class::Int(src), Class::Int(dst)) => {
            if src.fits_in(&dst) {
                Some(promoted(&src, &dst))
            } else {
                None
            }
        }
        (Class::Int(src), Class::Float(bits)) => {
            if src.value_bits() <= mantissa_digits(bits) {
                Some(Rank::LosslessFloat)
            } else {
                None
            }
        }
        (Class::Float(32), Class::Float(64)) => Some(Rank::Promoted),
        (Class::Char, Class::Int(dst)) => {
            if dst.value_bits() >= 21 {
                Some(Rank::Converted)
            } else {
                None
            }
        }
        (Class::Text(TextKind::Static), Class::Text(TextKind::Owned | TextKind::Boxed))
        | (Class::Text(TextKind::Owned), Class::Text(TextKind::Boxed))
        | (Class::Text(TextKind::Boxed), Class::Text(TextKind::Owned)) => Some(Rank::Converted),
        _ => None,
    }
}

const fn promoted(src: &IntKind, dst: &IntKind) -> Rank {
    if dst.is_plain_i32() && src.bits < 32 {
        Rank::Promoted
    } else {
        Rank::Converted
    }
}

const fn mantissa_digits(float_bits: u32) -> u32 {
    match float_bits {
        32 => f32::MANTISSA_DIGITS,
        64 => f64::MANTISSA_DIGITS,
        _ => 0,
    }
}

/// Why no single alternative could be picked.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No alternative accepts the value.
    NoMatch,
    /// More than one alternative accepts the value equally well.
    Ambiguous,
}

impl core::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ResolveError::NoMatch => "no alternative accepts the value",
            ResolveError::Ambiguous => "more than one alternative accepts the value equally well",
        };
        core::fmt::Display::fmt(msg, f)
    }
}

impl std::error::Error for ResolveError {}

/// Position of the single best candidate for a `src` value.
pub const fn resolve(src: Class, candidates: &[Class]) -> Result<usize, ResolveError> {
    let mut best: Option<(usize, Rank)> = None;
    let mut tied = false;

    let mut i = 0;
    while i < candidates.len() {
        if let Some(rank) = rank(src, candidates[i]) {
            match best {
                Some((_, current)) if (rank as u8) > (current as u8) => {}
                Some((_, current)) if rank as u8 == current as u8 => tied = true,
                _ => {
                    best = Some((i, rank));
                    tied = false;
                }
            }
        }
        i += 1;
    }

    match best {
        None => Err(ResolveError::NoMatch),
        Some(_) if tied => Err(ResolveError::Ambiguous),
        Some((index, _)) => Ok(index),
    }
}

/// The position a value of type `X` converts into, for the alternatives `L`.
///
/// Evaluating [`Resolution::INDEX`] for a value no alternative accepts, or that more than one
/// accepts equally well, fails the build.
pub struct Resolution<X, L>(core::marker::PhantomData<(X, L)>);

impl<X: Alternative, L: ConvertList> Resolution<X, L> {
    pub const INDEX: usize = match resolve(X::CLASS, L::CLASSES) {
        Ok(index) => index,
        Err(ResolveError::NoMatch) => panic!("no alternative accepts a value of this type"),
        Err(ResolveError::Ambiguous) => {
            panic!("a value of this type converts equally well into several alternatives")
        }
    };
}

/// A value that isn't opaque, widened so it can be lowered into any compatible alternative.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Char(char),
    Signed(i128),
    Unsigned(u128),
    Float(f64),
    Text(Cow<'static, str>),
}

impl Primitive {
    /// Widens `value`, or hands it back if it's not of a primitive class.
    fn lift<X: 'static>(value: X) -> Result<Primitive, X> {
        match_type!(value, {
            bool as v => Ok(Primitive::Bool(v)),
            char as v => Ok(Primitive::Char(v)),
            u8 as v => Ok(Primitive::Unsigned(v as u128)),
            u16 as v => Ok(Primitive::Unsigned(v as u128)),
            u32 as v => Ok(Primitive::Unsigned(v as u128)),
            u64 as v => Ok(Primitive::Unsigned(v as u128)),
            u128 as v => Ok(Primitive::Unsigned(v)),
            usize as v => Ok(Primitive::Unsigned(v as u128)),
            i8 as v => Ok(Primitive::Signed(v as i128)),
            i16 as v => Ok(Primitive::Signed(v as i128)),
            i32 as v => Ok(Primitive::Signed(v as i128)),
            i64 as v => Ok(Primitive::Signed(v as i128)),
            i128 as v => Ok(Primitive::Signed(v)),
            isize as v => Ok(Primitive::Signed(v as i128)),
            f32 as v => Ok(Primitive::Float(v as f64)),
            f64 as v => Ok(Primitive::Float(v)),
            String as v => Ok(Primitive::Text(Cow::Owned(v))),
            Box<str> as v => Ok(Primitive::Text(Cow::Owned(v.into_string()))),
            &'static str as v => Ok(Primitive::Text(Cow::Borrowed(v))),
            v => Err(v),
        })
    }

    /// Narrows `self` into a `T`, which the resolver has already proven lossless.
    fn lower<T: Alternative + 'static>(self) -> Option<T> {
        match (T::CLASS, self) {
            (Class::Bool, Primitive::Bool(v)) => cast!(v, T).ok(),
            (Class::Char, Primitive::Char(v)) => cast!(v, T).ok(),
            (Class::Int(_), Primitive::Bool(v)) => lower_int(v as u128),
            (Class::Int(_), Primitive::Char(v)) => lower_int(v as u32 as u128),
            (Class::Int(_), Primitive::Unsigned(v)) => lower_int(v),
            (Class::Int(_), Primitive::Signed(v)) => lower_int(v as u128),
            (Class::Float(_), Primitive::Unsigned(v)) => lower_float(v as f64),
            (Class::Float(_), Primitive::Signed(v)) => lower_float(v as f64),
            (Class::Float(_), Primitive::Float(v)) => lower_float(v),
            (Class::Text(TextKind::Owned), Primitive::Text(v)) => cast!(v.into_owned(), T).ok(),
            (Class::Text(TextKind::Boxed), Primitive::Text(v)) => {
                cast!(v.into_owned().into_boxed_str(), T).ok()
            }
            (Class::Text(TextKind::Static), Primitive::Text(Cow::Borrowed(v))) => cast!(v, T).ok(),
            _ => None,
        }
    }
}

/// Truncates the two's complement bits in `v` to whichever integer `T` is.
fn lower_int<T: 'static>(v: u128) -> Option<T> {
    macro_rules! try_ints {
        ($($int:ty),+) => {
            $(
                if let Ok(out) = cast!(v as $int, T) {
                    return Some(out);
                }
            )+
        };
    }
    try_ints!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);
    None
}

fn lower_float<T: 'static>(v: f64) -> Option<T> {
    if let Ok(out) = cast!(v, T) {
        return Some(out);
    }
    cast!(v as f32, T).ok()
}

/// Type-erased conversion into one alternative.
#[derive(Copy, Clone)]
pub struct ConvertFns {
    /// Lowers a primitive into the uninitialized `dst`, returns `false` if it doesn't fit.
    lower: unsafe fn(Primitive, *mut u8) -> bool,
    /// Moves an opaque value out of a `&mut Option<T>` into the uninitialized `dst`, returns
    /// `false` if it holds something else.
    take: unsafe fn(&mut dyn Any, *mut u8) -> bool,
}

impl ConvertFns {
    pub const fn of<T: Alternative + 'static>() -> Self {
        ConvertFns {
            lower: lower_erased::<T>,
            take: take_erased::<T>,
        }
    }
}

unsafe fn lower_erased<T: Alternative + 'static>(value: Primitive, dst: *mut u8) -> bool {
    match value.lower::<T>() {
        Some(value) => {
            dst.cast::<T>().write(value);
            true
        }
        None => false,
    }
}

unsafe fn take_erased<T: 'static>(value: &mut dyn Any, dst: *mut u8) -> bool {
    match value.downcast_mut::<Option<T>>().and_then(Option::take) {
        Some(value) => {
            dst.cast::<T>().write(value);
            true
        }
        None => false,
    }
}

/// Converts `value` into the alternative at position `index` of `L`, writing it to `dst`.
///
/// # Panics
/// * if `index` wasn't produced by resolving `X` against `L`
///
/// # Safety
/// * `dst` must be valid for a write of the alternative at `index`
pub(crate) unsafe fn convert_into<X, L>(value: X, index: usize, dst: *mut u8)
where
    X: Alternative + 'static,
    L: ConvertList,
{
    let fns = &L::CONVERT[index];
    let written = match Primitive::lift(value) {
        Ok(primitive) => (fns.lower)(primitive, dst),
        Err(opaque) => {
            let mut slot = Some(opaque);
            (fns.take)(&mut slot, dst)
        }
    };
    assert!(written, "resolved alternative {index} rejected the value");
}
