//! A tagged union over a fixed list of alternatives, stored in a single inline block of memory
//! with as little overhead as the alternatives allow.
//!
//! ```
//! use compact_variant::Variant;
//!
//! // starts out holding the first alternative
//! let mut v: Variant<(i32, String)> = Variant::default();
//! assert_eq!(v.get::<i32, _>(), Ok(&0));
//!
//! // a string literal converts into the `String` alternative
//! v.assign("abc");
//! assert_eq!(v.index(), 1);
//! assert_eq!(v.get::<String, _>().unwrap(), "abc");
//!
//! v.emplace(0_i32);
//! assert!(v.get::<String, _>().is_err());
//! ```
//!
//! ## Layout
//! By default the alternatives are stored as the variants of a plain Rust enum, and the
//! compiler picks the layout. When the largest alternative has bit patterns it never uses and
//! every other alternative is zero sized, the index of the active alternative is folded into
//! those patterns and the value is exactly as large as that alternative. Otherwise it gets a
//! tag. [`Variant::NICHE`] tells which of the two a list gets:
//!
//! ```
//! use std::mem::size_of;
//! use compact_variant::{Empty, NeverValueless, Variant};
//!
//! type Maybe = Variant<(&'static u64, Empty), NeverValueless>;
//! assert!(Maybe::NICHE.is_some());
//! assert_eq!(size_of::<Maybe>(), size_of::<&u64>());
//!
//! type Number = Variant<(u32, Empty), NeverValueless>;
//! assert!(Number::NICHE.is_none());
//! assert_eq!(size_of::<Number>(), 2 * size_of::<u32>());
//! ```
//!
//! The [`Tagged`] and [`Niched`] encodings pin the layout down instead, to a union of the
//! alternatives plus a `u8`, or to the niche mapping computed by [`repr::niche::analyze`].
//!
//! ## Panics during replacement
//! Replacing the active alternative can panic halfway through, when building the new value
//! panics after the old one was destroyed. The [`policy`] picked for a `Variant` decides what
//! it holds afterwards: nothing at all ([`Auto`]), its first alternative ([`FallbackFirst`]),
//! or, by never destroying before building, the old value ([`NeverValueless`]).

use core::cmp::Ordering;
use core::fmt;
use core::hash::{
    Hash,
    Hasher,
};
use core::mem::ManuallyDrop;

mod asserts;
mod macros;

pub mod convert;
pub mod index;
pub mod list;
pub mod policy;
pub mod repr;
pub mod traits;
pub mod visit;

use convert::{
    convert_into,
    Resolution,
};
use index::Index;
use list::{
    AltList,
    CloneList,
    ConvertList,
    DebugList,
    EqList,
    HashList,
    Has,
    NicheList,
    OrdList,
    PartialOrdList,
    TotalEqList,
};
pub use policy::{
    Auto,
    FallbackFirst,
    NeverValueless,
};
use policy::{
    status_count,
    Policy,
};
pub use repr::discriminant::{
    Native,
    Niched,
    Tagged,
};
use repr::discriminant::Encode;
use repr::niche::{
    analyze,
    NicheMapping,
};
use repr::Repr;
pub use traits::Alternative;
use visit::Participants;

#[cfg(test)]
mod tests;

/// A value holding exactly one of the alternatives in the tuple `L`.
///
/// * `P` is the [`Policy`] that decides what happens when replacing the active alternative
///   panics, and with it whether the value can end up valueless.
/// * `E` is the encoding of the discriminant. [`Native`] lets the compiler fold it into the
///   largest alternative when it can, [`Tagged`] always keeps an explicit byte, [`Niched`]
///   always folds it.
///
/// Alternatives are named either by type, when it appears once in the list, or by position
/// with the markers in [`index`]:
///
/// ```
/// use compact_variant::index::U1;
/// use compact_variant::Variant;
///
/// let by_type: Variant<(u8, String)> = Variant::new(String::from("nyc"));
/// let by_position: Variant<(u8, u8)> = Variant::new::<_, U1>(7);
///
/// assert_eq!(by_type.index(), 1);
/// assert_eq!(by_position.get::<_, U1>(), Ok(&7));
/// ```
///
/// Naming a type that isn't in the list, or a position past its end, doesn't compile:
///
/// ```compile_fail
/// use compact_variant::Variant;
///
/// let v: Variant<(u8, String)> = Variant::new(1.5_f64);
/// ```
pub struct Variant<L, P = Auto, E = Native>
where
    L: AltList,
    P: Policy<L>,
    E: Encode<L, P>,
{
    repr: Repr<L, P, E>,
}

impl<L, P, E> Variant<L, P, E>
where
    L: AltList,
    P: Policy<L>,
    E: Encode<L, P>,
{
    /// The number of statuses a value can be in, one per alternative plus one for the
    /// valueless state if the policy allows for it.
    pub const STATUS_COUNT: usize = status_count::<L, P>();

    /// What [`Variant::index`] returns for a valueless value.
    pub const VALUELESS_INDEX: usize = L::LEN;

    /// The niche mapping the discriminant is stored with by [`Niched`], `None` for the other
    /// encodings. See [`Variant::NICHE`] for the layout [`Native`] ends up with.
    pub const ENCODED_NICHE: Option<NicheMapping> = E::NICHE;

    /// Creates a value holding `value`.
    ///
    /// # Examples
    /// ```
    /// use compact_variant::Variant;
    ///
    /// let v: Variant<(i32, String)> = Variant::new(42_i32);
    /// assert_eq!(v.index(), 0);
    /// ```
    #[inline]
    pub fn new<T, I: Index>(value: T) -> Self
    where
        L: Has<T, I>,
    {
        // SAFETY: `Has` guarantees `T` is the alternative at `I::VALUE`
        let repr = unsafe { Repr::from_write(I::VALUE, |dst| dst.cast::<T>().write(value)) };
        Variant { repr }
    }

    /// Creates a value holding the alternative returned by `f`.
    ///
    /// # Examples
    /// ```
    /// use compact_variant::index::U1;
    /// use compact_variant::Variant;
    ///
    /// let v: Variant<(String, String)> = Variant::with::<_, U1, _>(|| "hello".repeat(2));
    /// assert_eq!(v.get::<_, U1>().unwrap(), "hellohello");
    /// ```
    #[inline]
    pub fn with<T, I, F>(f: F) -> Self
    where
        L: Has<T, I>,
        I: Index,
        F: FnOnce() -> T,
    {
        // SAFETY: `Has` guarantees `T` is the alternative at `I::VALUE`
        let repr = unsafe { Repr::from_write(I::VALUE, |dst| dst.cast::<T>().write(f())) };
        Variant { repr }
    }

    /// Creates a value holding whichever alternative `value` converts into best.
    ///
    /// See [`convert`] for how the alternative is picked. A value that converts into no
    /// alternative, or into several equally well, fails to compile.
    ///
    /// # Examples
    /// ```
    /// use compact_variant::Variant;
    ///
    /// // an `i32` fits an `f64` exactly, but not an `f32`
    /// let v: Variant<(f32, i64, f64)> = Variant::from_value(7_i32);
    /// assert_eq!(v.get::<f64, _>(), Ok(&7.0));
    /// ```
    ///
    /// ```compile_fail
    /// use compact_variant::Variant;
    ///
    /// // widens into both equally well
    /// let v: Variant<(i64, i128)> = Variant::from_value(7_i32);
    /// ```
    #[inline]
    pub fn from_value<X>(value: X) -> Self
    where
        X: Alternative + 'static,
        L: ConvertList,
    {
        let index = Resolution::<X, L>::INDEX;
        // SAFETY: `index` was resolved for `X`, `convert_into` writes that alternative
        let repr =
            unsafe { Repr::from_write(index, |dst| convert_into::<X, L>(value, index, dst)) };
        Variant { repr }
    }

    /// The position of the active alternative, or [`Self::VALUELESS_INDEX`] if there is none.
    #[inline]
    pub fn index(&self) -> usize {
        self.repr.index()
    }

    /// Returns `true` if the value holds no alternative, which only happens after replacing
    /// the active alternative panicked.
    #[inline]
    pub fn is_valueless(&self) -> bool {
        self.repr.is_valueless()
    }

    /// Returns `true` if the active alternative is `T`, at position `I`.
    #[inline]
    pub fn holds<T, I: Index>(&self) -> bool
    where
        L: Has<T, I>,
    {
        self.index() == I::VALUE
    }

    /// Returns a reference to the active alternative, if it's `T`.
    ///
    /// # Errors
    /// Returns [`BadVariantAccess`] if another alternative is active, or none is.
    #[inline]
    pub fn get<T, I: Index>(&self) -> Result<&T, BadVariantAccess>
    where
        L: Has<T, I>,
    {
        self.get_if::<T, I>().ok_or_else(|| self.mismatch(I::VALUE))
    }

    /// Returns a mutable reference to the active alternative, if it's `T`.
    ///
    /// # Errors
    /// Returns [`BadVariantAccess`] if another alternative is active, or none is.
    #[inline]
    pub fn get_mut<T, I: Index>(&mut self) -> Result<&mut T, BadVariantAccess>
    where
        L: Has<T, I>,
    {
        if self.holds::<T, I>() {
            // SAFETY: we just checked that a `T` is live
            Ok(unsafe { &mut *self.repr.as_mut_ptr().cast::<T>() })
        } else {
            Err(self.mismatch(I::VALUE))
        }
    }

    /// Returns a reference to the active alternative if it's `T`, `None` otherwise.
    #[inline]
    pub fn get_if<T, I: Index>(&self) -> Option<&T>
    where
        L: Has<T, I>,
    {
        if self.holds::<T, I>() {
            // SAFETY: we just checked that a `T` is live
            Some(unsafe { &*self.repr.as_ptr().cast::<T>() })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the active alternative if it's `T`, `None` otherwise.
    #[inline]
    pub fn get_if_mut<T, I: Index>(&mut self) -> Option<&mut T>
    where
        L: Has<T, I>,
    {
        self.get_mut::<T, I>().ok()
    }

    /// Moves the active alternative out, if it's `T`, handing the value back otherwise.
    #[inline]
    pub fn into_inner<T, I: Index>(self) -> Result<T, Self>
    where
        L: Has<T, I>,
    {
        if !self.holds::<T, I>() {
            return Err(self);
        }
        let this = ManuallyDrop::new(self);
        // SAFETY: a `T` is live, and `this` is never dropped, so it's only moved out once
        Ok(unsafe { this.repr.as_ptr().cast::<T>().read() })
    }

    /// Destroys the active alternative and replaces it with `value`, returning a reference to
    /// it.
    ///
    /// # Examples
    /// ```
    /// use compact_variant::Variant;
    ///
    /// let mut v: Variant<(i32, String)> = Variant::new(1_i32);
    /// v.emplace(String::from("chicago")).push_str(" style");
    /// assert_eq!(v.get::<String, _>().unwrap(), "chicago style");
    /// ```
    #[inline]
    pub fn emplace<T, I: Index>(&mut self, value: T) -> &mut T
    where
        L: Has<T, I>,
    {
        self.emplace_with::<T, I, _>(move || value)
    }

    /// Destroys the active alternative and replaces it with the one `f` returns.
    ///
    /// If `f` panics, the value is left in the state the policy `P` decides on.
    pub fn emplace_with<T, I, F>(&mut self, f: F) -> &mut T
    where
        L: Has<T, I>,
        I: Index,
        F: FnOnce() -> T,
    {
        // SAFETY: `Has` guarantees `T` is the alternative at `I::VALUE`, which is live after
        // `replace_with` returns
        unsafe {
            self.repr.replace_with(I::VALUE, |dst| dst.cast::<T>().write(f()));
            &mut *self.repr.as_mut_ptr().cast::<T>()
        }
    }

    /// Assigns `value` to the alternative `T`: an in place assignment if `T` is active, a
    /// replacement otherwise.
    #[inline]
    pub fn set<T, I: Index>(&mut self, value: T)
    where
        L: Has<T, I>,
    {
        // SAFETY: `Has` guarantees `T` is the alternative at `I::VALUE`
        unsafe { self.repr.assign_with(I::VALUE, |dst| dst.cast::<T>().write(value)) }
    }

    /// Converts `value` into whichever alternative it converts into best, and assigns it.
    ///
    /// The alternative is picked like [`Variant::from_value`] picks it.
    #[inline]
    pub fn assign<X>(&mut self, value: X)
    where
        X: Alternative + 'static,
        L: ConvertList,
    {
        let index = Resolution::<X, L>::INDEX;
        // SAFETY: `index` was resolved for `X`, `convert_into` writes that alternative
        unsafe {
            self.repr
                .assign_with(index, |dst| convert_into::<X, L>(value, index, dst))
        }
    }

    /// Exchanges the contents of two values.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        self.repr.swap(&mut other.repr)
    }

    /// Calls `handler` with a reference to the active alternative.
    ///
    /// See [`visit`](mod@visit) for how handlers are written, and [`visit!`] for visiting
    /// several values at once.
    ///
    /// # Errors
    /// Returns [`BadVariantAccess`] without calling `handler` if the value is valueless.
    #[inline]
    pub fn visit<'a, H>(
        &'a self,
        handler: H,
    ) -> Result<<(&'a Self, ()) as Participants<H, ()>>::Output, BadVariantAccess>
    where
        (&'a Self, ()): Participants<H, ()>,
    {
        visit::visit(handler, (self, ()))
    }

    /// Calls `handler` with a mutable reference to the active alternative.
    ///
    /// # Errors
    /// Returns [`BadVariantAccess`] without calling `handler` if the value is valueless.
    #[inline]
    pub fn visit_mut<'a, H>(
        &'a mut self,
        handler: H,
    ) -> Result<<(&'a mut Self, ()) as Participants<H, ()>>::Output, BadVariantAccess>
    where
        (&'a mut Self, ()): Participants<H, ()>,
    {
        visit::visit(handler, (self, ()))
    }

    #[inline]
    fn mismatch(&self, expected: usize) -> BadVariantAccess {
        let found = if self.is_valueless() {
            None
        } else {
            Some(self.index())
        };
        BadVariantAccess {
            expected: Some(expected),
            found,
        }
    }

    /// Orders valueless before every alternative, and alternatives by position.
    #[inline]
    fn order_key(&self) -> usize {
        if self.is_valueless() {
            0
        } else {
            self.index() + 1
        }
    }
}

impl<L, P, E> Variant<L, P, E>
where
    L: NicheList,
    P: Policy<L>,
    E: Encode<L, P>,
{
    /// How the discriminant of these alternatives fits into a niche, `None` if it doesn't.
    ///
    /// When this is `Some`, a [`Native`] value is exactly as large as the union of its
    /// alternatives, otherwise it carries a tag. [`Niched`] is only usable for lists where
    /// this is `Some`.
    ///
    /// ```
    /// use compact_variant::{Empty, Variant};
    ///
    /// assert!(Variant::<(bool, Empty)>::NICHE.is_some());
    /// assert!(Variant::<(u32, Empty)>::NICHE.is_none());
    /// ```
    pub const NICHE: Option<NicheMapping> = analyze(L::SHAPES, status_count::<L, P>());
}

impl<L, P, E> Clone for Variant<L, P, E>
where
    L: CloneList,
    P: Policy<L>,
    E: Encode<L, P>,
{
    #[inline]
    fn clone(&self) -> Self {
        Variant {
            repr: self.repr.clone(),
        }
    }

    #[inline]
    fn clone_from(&mut self, source: &Self) {
        self.repr.clone_from(&source.repr)
    }
}

impl<L, P, E> Default for Variant<L, P, E>
where
    L: AltList,
    L::Head: Default,
    P: Policy<L>,
    E: Encode<L, P>,
{
    /// A value holding the default of the first alternative.
    #[inline]
    fn default() -> Self {
        // SAFETY: `Head` is the alternative at position 0
        let repr =
            unsafe { Repr::from_write(0, |dst| dst.cast::<L::Head>().write(L::Head::default())) };
        Variant { repr }
    }
}

impl<L, P, E> PartialEq for Variant<L, P, E>
where
    L: EqList,
    P: Policy<L>,
    E: Encode<L, P>,
{
    fn eq(&self, other: &Self) -> bool {
        let index = self.index();
        if index != other.index() {
            return false;
        }
        if index == L::LEN {
            return true;
        }
        // SAFETY: both hold the alternative at `index`
        unsafe { (L::EQ[index])(self.repr.as_ptr(), other.repr.as_ptr()) }
    }
}

impl<L, P, E> Eq for Variant<L, P, E>
where
    L: TotalEqList,
    P: Policy<L>,
    E: Encode<L, P>,
{
}

impl<L, P, E> PartialOrd for Variant<L, P, E>
where
    L: PartialOrdList,
    P: Policy<L>,
    E: Encode<L, P>,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.order_key().cmp(&other.order_key()) {
            Ordering::Equal => (),
            unequal => return Some(unequal),
        }
        let index = self.index();
        if index == L::LEN {
            return Some(Ordering::Equal);
        }
        // SAFETY: both hold the alternative at `index`
        unsafe { (L::PARTIAL_CMP[index])(self.repr.as_ptr(), other.repr.as_ptr()) }
    }
}

impl<L, P, E> Ord for Variant<L, P, E>
where
    L: OrdList + TotalEqList,
    P: Policy<L>,
    E: Encode<L, P>,
{
    fn cmp(&self, other: &Self) -> Ordering {
        match self.order_key().cmp(&other.order_key()) {
            Ordering::Equal => (),
            unequal => return unequal,
        }
        let index = self.index();
        if index == L::LEN {
            return Ordering::Equal;
        }
        // SAFETY: both hold the alternative at `index`
        unsafe { (L::CMP[index])(self.repr.as_ptr(), other.repr.as_ptr()) }
    }
}

impl<L, P, E> Hash for Variant<L, P, E>
where
    L: HashList,
    P: Policy<L>,
    E: Encode<L, P>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        let index = self.index();
        index.hash(state);
        if index < L::LEN {
            // SAFETY: the alternative at `index` is live
            unsafe { (L::HASH[index])(self.repr.as_ptr(), state) }
        }
    }
}

impl<L, P, E> fmt::Debug for Variant<L, P, E>
where
    L: DebugList,
    P: Policy<L>,
    E: Encode<L, P>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Active<L: DebugList> {
            ptr: *const u8,
            index: usize,
            _list: core::marker::PhantomData<L>,
        }

        impl<L: DebugList> fmt::Debug for Active<L> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // SAFETY: only built for a live alternative at `index`
                unsafe { (L::DEBUG[self.index])(self.ptr, f) }
            }
        }

        if self.is_valueless() {
            return f.write_str("Variant(<valueless>)");
        }
        let active = Active::<L> {
            ptr: self.repr.as_ptr(),
            index: self.index(),
            _list: core::marker::PhantomData,
        };
        f.debug_tuple("Variant").field(&self.index()).field(&active).finish()
    }
}

/// The error returned when asking a [`Variant`] for an alternative that isn't active.
///
/// # Examples
/// ```
/// use compact_variant::Variant;
///
/// let v: Variant<(i32, String)> = Variant::new(5_i32);
/// let err = v.get::<String, _>().unwrap_err();
///
/// assert_eq!(err.expected(), Some(1));
/// assert_eq!(err.found(), Some(0));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BadVariantAccess {
    expected: Option<usize>,
    found: Option<usize>,
}

impl BadVariantAccess {
    /// The error for a visitation with a valueless participant.
    #[inline]
    pub(crate) const fn valueless() -> Self {
        BadVariantAccess {
            expected: None,
            found: None,
        }
    }

    /// The position of the alternative that was asked for, `None` for a visitation.
    #[inline]
    pub fn expected(&self) -> Option<usize> {
        self.expected
    }

    /// The position of the active alternative, `None` if the value was valueless.
    #[inline]
    pub fn found(&self) -> Option<usize> {
        self.found
    }

    /// Returns `true` if the access failed because the value was valueless.
    #[inline]
    pub fn is_valueless(&self) -> bool {
        self.found.is_none()
    }
}

impl fmt::Display for BadVariantAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.expected, self.found) {
            (Some(expected), Some(found)) => write!(
                f,
                "bad variant access: expected alternative {expected}, found alternative {found}"
            ),
            (Some(expected), None) => write!(
                f,
                "bad variant access: expected alternative {expected}, found a valueless variant"
            ),
            (None, _) => fmt::Display::fmt("bad variant access: the variant is valueless", f),
        }
    }
}

impl std::error::Error for BadVariantAccess {}

/// An alternative that holds nothing, for lists where "none of the others" is a valid state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Empty;
