//! The untyped engine behind [`Variant`](crate::Variant).
//!
//! [`Repr`] owns a block holding one alternative and the discriminant, laid out by the
//! [`Encode`] in use, and knows how to replace, clone, swap and drop whatever alternative is
//! active using the per-position tables of the list. It never learns the concrete type of the
//! active alternative, the typed front door in `lib.rs` is responsible for only ever handing it
//! pointers to the alternative it names.

use core::marker::PhantomData;
use core::mem::{
    self,
    MaybeUninit,
};
use core::ptr;

pub mod cell;
pub mod discriminant;
pub mod niche;
mod storage;

use discriminant::Encode;
pub use storage::RawStorage;

use crate::list::{
    AltList,
    CloneList,
};
use crate::policy::Policy;

pub(crate) struct Repr<L: AltList, P: Policy<L>, E: Encode<L, P>> {
    block: E::Block,
    _policy: PhantomData<(L, P)>,
}

impl<L: AltList, P: Policy<L>, E: Encode<L, P>> Repr<L, P, E> {
    /// Builds a value holding the alternative at `index`, which `write` writes to the pointer it
    /// receives.
    ///
    /// # Safety
    /// * `write` must initialize the alternative at `index`
    #[inline]
    pub unsafe fn from_write<F: FnOnce(*mut u8)>(index: usize, write: F) -> Self {
        debug_assert!(index < L::LEN);
        Self::init(index, write)
    }

    /// A value holding nothing.
    ///
    /// # Safety
    /// * the policy must allow for valueless values
    #[inline]
    unsafe fn valueless() -> Self {
        debug_assert!(P::VALUELESS);
        Self::init(L::LEN, |_| ())
    }

    #[inline(always)]
    unsafe fn init<F: FnOnce(*mut u8)>(index: usize, write: F) -> Self {
        let mut block = MaybeUninit::<E::Block>::uninit();
        E::init(block.as_mut_ptr(), index, write);

        Repr {
            block: block.assume_init(),
            _policy: PhantomData,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        // SAFETY: the block is only ever changed through `init`
        unsafe { E::index(&self.block) }
    }

    #[inline]
    pub fn is_valueless(&self) -> bool {
        P::VALUELESS && self.index() == L::LEN
    }

    /// Pointer to the active alternative, only meaningful when there is one.
    #[inline(always)]
    pub fn as_ptr(&self) -> *const u8 {
        // SAFETY: the block was set up by `init`
        unsafe { E::as_ptr(&self.block) }
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        // SAFETY: the block was set up by `init`
        unsafe { E::as_mut_ptr(&mut self.block) }
    }

    /// Replaces the active alternative with the one at `index`, following the policy.
    ///
    /// # Safety
    /// * `write` must initialize the alternative at `index`
    pub unsafe fn replace_with<F: FnOnce(*mut u8)>(&mut self, index: usize, write: F) {
        debug_assert!(index < L::LEN);
        let old_index = self.index();

        if P::stages(index) {
            let mut staged = MaybeUninit::<E::Block>::uninit();
            E::init(staged.as_mut_ptr(), index, write);

            let mut old = mem::replace(&mut self.block, staged.assume_init());
            if old_index < L::LEN {
                L::CELLS[old_index].drop_in_place(E::as_mut_ptr(&mut old));
            }
        } else {
            let guard = Recover { repr: &mut *self };
            if old_index < L::LEN {
                L::CELLS[old_index].drop_in_place(guard.repr.as_mut_ptr());
            }
            E::init(&mut guard.repr.block, index, write);
            mem::forget(guard);
        }
    }

    /// Assigns the alternative at `index`: an in place assignment if it's already active, a
    /// replacement otherwise.
    ///
    /// # Safety
    /// * `write` must initialize the alternative at `index`
    pub unsafe fn assign_with<F: FnOnce(*mut u8)>(&mut self, index: usize, write: F) {
        if self.index() == index {
            let mut staged = RawStorage::<L>::uninit();
            write(staged.as_mut_ptr());
            L::CELLS[index].assign(self.as_mut_ptr(), staged.as_mut_ptr());
        } else {
            self.replace_with(index, write);
        }
    }

    /// Drops the active alternative, leaving the value valueless.
    ///
    /// # Safety
    /// * the policy must allow for valueless values
    unsafe fn clear(&mut self) {
        drop(mem::replace(self, Self::valueless()));
    }

    /// Exchanges the active alternatives of two values.
    pub fn swap(&mut self, other: &mut Self) {
        let index = self.index();
        if index == other.index() && index < L::LEN {
            let size = L::CELLS[index].size();
            // SAFETY: both hold a live alternative of the same type, in two distinct blocks,
            // swapping the bytes swaps the values
            unsafe { ptr::swap_nonoverlapping(self.as_mut_ptr(), other.as_mut_ptr(), size) };
        } else {
            mem::swap(self, other);
        }
    }
}

impl<L: CloneList, P: Policy<L>, E: Encode<L, P>> Clone for Repr<L, P, E> {
    fn clone(&self) -> Self {
        let index = self.index();
        if index == L::LEN {
            // SAFETY: only a policy that allows for it produces valueless values
            return unsafe { Self::valueless() };
        }

        let src = self.as_ptr();
        // SAFETY: the alternative at `index` is live, the clone fn writes a copy of it
        unsafe { Self::from_write(index, |dst| (L::CLONE[index].clone)(src, dst)) }
    }

    fn clone_from(&mut self, source: &Self) {
        let index = source.index();
        let src = source.as_ptr();

        // SAFETY: every branch hands the tables pointers to the alternative they describe
        unsafe {
            if index == L::LEN {
                self.clear();
            } else if index == self.index() {
                (L::CLONE[index].clone_from)(src, self.as_mut_ptr());
            } else {
                self.replace_with(index, |dst| (L::CLONE[index].clone)(src, dst));
            }
        }
    }
}

impl<L: AltList, P: Policy<L>, E: Encode<L, P>> Drop for Repr<L, P, E> {
    fn drop(&mut self) {
        let index = self.index();
        if index < L::LEN {
            // SAFETY: the discriminant says the alternative at `index` is live
            unsafe { L::CELLS[index].drop_in_place(self.as_mut_ptr()) }
        }
    }
}

/// Puts a [`Repr`] back into a consistent state when an in place replacement unwinds.
struct Recover<'a, L: AltList, P: Policy<L>, E: Encode<L, P>> {
    repr: &'a mut Repr<L, P, E>,
}

impl<L: AltList, P: Policy<L>, E: Encode<L, P>> Drop for Recover<'_, L, P, E> {
    fn drop(&mut self) {
        let index = P::RECOVERS_TO;
        // SAFETY: we only get dropped while unwinding out of `replace_with`, after the old
        // alternative was dropped and before the new one was marked active
        unsafe { E::init(&mut self.repr.block, index, |dst| P::recover(dst)) };
        log::debug!(
            "replacement panicked, recovered to {}",
            if index == L::LEN { "valueless" } else { "a fallback alternative" },
        );
    }
}
