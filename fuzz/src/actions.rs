//! Various actions we take on a [`Subject`] and its [`Control`], asserting invariants along
//! the way.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{
    Hash,
    Hasher,
};

use arbitrary::Arbitrary;
use compact_variant::index::{
    U2,
    U3,
};
use compact_variant::visit::Handler;
use compact_variant::{
    visit,
    Empty,
};

use crate::{
    poison,
    Control,
    Subject,
};

#[derive(Arbitrary, Debug)]
pub enum Action<'a> {
    /// Emplace a byte
    EmplaceByte(u8),
    /// Set the `i64`, assigning in place if it's already active
    SetInt(i64),
    /// Assign a `u16`, which converts into the `i64`
    AssignShort(u16),
    /// Assign a `String`
    AssignText(&'a str),
    /// Emplace a `Box<str>` by position
    EmplaceBoxed(&'a str),
    /// Emplace `Empty`
    EmplaceNothing,
    /// Append to the `String`, if it's active
    PushStr(&'a str),
    /// Replace with a constructor that panics
    Poison,
    /// Swap with the other value
    Swap,
    /// Clone the other value into this one
    CloneFrom,
    /// Compare, hash and visit both values
    Compare,
    /// Move the active alternative out, if it's the `String`
    TakeText,
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Names the pair of active alternatives.
struct Pair;

macro_rules! pair_impls {
    ($($a:ty => $an:literal),+) => {
        pair_impls!(@rows [$($a => $an),+] $($a => $an),+);
    };
    (@rows $cols:tt $($a:ty => $an:literal),+) => {
        $( pair_impls!(@row $a => $an; $cols); )+
    };
    (@row $a:ty => $an:literal; [$($b:ty => $bn:literal),+]) => {
        $(
            impl Handler<(&$a, &$b)> for Pair {
                type Output = (usize, usize);
                fn call(self, _: (&$a, &$b)) -> (usize, usize) {
                    ($an, $bn)
                }
            }
        )+
    };
}

pair_impls!(u8 => 0, i64 => 1, String => 2, Box<str> => 3, Empty => 4);

impl Action<'_> {
    pub fn perform(
        self,
        subject: &mut Subject,
        control: &mut Control,
        other: &mut Subject,
        other_control: &mut Control,
    ) {
        use Action::*;

        match self {
            EmplaceByte(b) => {
                assert_eq!(*subject.emplace(b), b);
                *control = Control::Byte(b);
            }
            SetInt(n) => {
                subject.set(n);
                *control = Control::Int(n);
            }
            AssignShort(n) => {
                subject.assign(n);
                *control = Control::Int(n as i64);
            }
            AssignText(s) => {
                subject.assign(s.to_owned());
                *control = Control::Text(s.to_owned());
            }
            EmplaceBoxed(s) => {
                subject.emplace::<_, U3>(Box::<str>::from(s));
                *control = Control::Boxed(Box::from(s));
            }
            EmplaceNothing => {
                subject.emplace(Empty);
                *control = Control::Nothing;
            }
            PushStr(s) => {
                let pushed = subject.get_if_mut::<_, U2>().map(|text| text.push_str(s));
                if let Control::Text(text) = control {
                    text.push_str(s);
                    assert!(pushed.is_some());
                } else {
                    assert!(pushed.is_none());
                }
            }
            Poison => {
                poison(subject);
                *control = Control::Valueless;
            }
            Swap => {
                subject.swap(other);
                std::mem::swap(control, other_control);
            }
            CloneFrom => {
                subject.clone_from(other);
                *control = other_control.clone();
            }
            Compare => {
                let (subject, other): (&Subject, &Subject) = (subject, other);
                let expected = (*control).cmp(other_control);
                assert_eq!(subject.cmp(other), expected);
                assert_eq!(subject.partial_cmp(other), Some(expected));
                assert_eq!(subject == other, expected == Ordering::Equal);
                if subject == other {
                    assert_eq!(hash_of(subject), hash_of(other));
                }

                let pair = visit!(Pair, subject, other);
                if subject.is_valueless() || other.is_valueless() {
                    assert!(pair.unwrap_err().is_valueless());
                } else {
                    assert_eq!(pair, Ok((control.index(), other_control.index())));
                }
            }
            TakeText => {
                let taken = std::mem::take(subject).into_inner::<String, U2>();
                match (taken, control.clone()) {
                    (Ok(text), Control::Text(expected)) => {
                        assert_eq!(text, expected);
                        *control = Control::Byte(0);
                    }
                    (Err(back), _) => *subject = back,
                    (Ok(text), expected) => panic!("took {:?} out of {:?}", text, expected),
                }
            }
        }
    }
}
