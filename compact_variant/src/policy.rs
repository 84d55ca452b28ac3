//! What happens when replacing the active alternative panics halfway through.
//!
//! Replacing the active alternative takes two steps: the old alternative is destroyed and the
//! new one is built. There are two ways to order them.
//!
//! * **staged**: build the new alternative in a temporary, then move it in and destroy the
//!   old one. A move is a bitwise copy and never panics, so a panic while building leaves the
//!   variant untouched. It costs a second copy of the storage for the duration of the call.
//! * **in place**: destroy the old alternative, then build the new one directly into the
//!   storage. If building panics there is nothing left in the storage, and the policy decides
//!   what the variant holds afterwards.
//!
//! A [`Policy`] picks the order for every alternative of a list, and how to recover from a
//! panic during an in place replacement.

use core::convert::Infallible;

use crate::list::AltList;

/// A replacement strategy for the alternatives `L`.
///
/// # Safety
/// * if `VALUELESS` is `false`, every replacement must either be staged, or be recovered by
///   `recover` building the alternative at `RECOVERS_TO`
/// * `Hole` must be an inhabited zero sized type with an alignment of `1` when `VALUELESS` is
///   `true`, and uninhabited otherwise
/// * `recover` must build the alternative at `RECOVERS_TO`, or do nothing when that's `L::LEN`
pub unsafe trait Policy<L: AltList> {
    /// Whether a value can end up holding nothing at all.
    const VALUELESS: bool;

    /// The status a panicking in place replacement leaves behind.
    const RECOVERS_TO: usize;

    /// What a [`Native`](crate::repr::discriminant::Native) block holds when it's valueless.
    type Hole;

    /// Whether a replacement with the alternative at `index` is staged.
    fn stages(index: usize) -> bool;

    /// Called after an in place replacement panicked, builds whatever the value holds now at
    /// `dst`.
    ///
    /// # Safety
    /// * `dst` must be valid for writes of any alternative
    unsafe fn recover(dst: *mut u8);
}

/// Number of statuses a value can be in, its alternatives plus the valueless state if there is
/// one.
pub const fn status_count<L: AltList, P: Policy<L>>() -> usize {
    L::LEN + P::VALUELESS as usize
}

/// Stage replacements that are cheap to stage, replace the rest in place and become valueless
/// if that fails.
///
/// An alternative is cheap to stage when it has no drop glue and is at most
/// [`STAGE_LIMIT`](crate::repr::cell::STAGE_LIMIT) bytes. The valueless state is always
/// reserved, even for lists where every alternative is cheap to stage and it's never reached.
/// [`NeverValueless`] gives up the status for the tightest layout.
#[derive(Debug, Copy, Clone, Default)]
pub struct Auto;

unsafe impl<L: AltList> Policy<L> for Auto {
    const VALUELESS: bool = true;
    const RECOVERS_TO: usize = L::LEN;
    type Hole = ();

    #[inline]
    fn stages(index: usize) -> bool {
        L::CELLS[index].is_stageable()
    }

    unsafe fn recover(_dst: *mut u8) {}
}

/// Stage every replacement, a value is never valueless.
///
/// Moves can't panic, so every list of alternatives can use this policy, the price is a
/// temporary copy of the storage on every replacement.
#[derive(Debug, Copy, Clone, Default)]
pub struct NeverValueless;

unsafe impl<L: AltList> Policy<L> for NeverValueless {
    const VALUELESS: bool = false;
    const RECOVERS_TO: usize = L::LEN;
    type Hole = Infallible;

    #[inline]
    fn stages(_index: usize) -> bool {
        true
    }

    unsafe fn recover(_dst: *mut u8) {
        unreachable!("every replacement is staged")
    }
}

/// Replace in place, and fall back to a default constructed first alternative if that fails.
///
/// The first alternative has to implement [`Default`], and its `default` must not panic.
#[derive(Debug, Copy, Clone, Default)]
pub struct FallbackFirst;

unsafe impl<L: AltList> Policy<L> for FallbackFirst
where
    L::Head: Default,
{
    const VALUELESS: bool = false;
    const RECOVERS_TO: usize = 0;
    type Hole = Infallible;

    #[inline]
    fn stages(_index: usize) -> bool {
        false
    }

    unsafe fn recover(dst: *mut u8) {
        dst.cast::<L::Head>().write(L::Head::default());
    }
}
