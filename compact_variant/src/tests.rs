use std::collections::hash_map::DefaultHasher;
use std::hash::{
    Hash,
    Hasher,
};
use std::panic::{
    self,
    AssertUnwindSafe,
};

use proptest::prelude::*;
use test_strategy::proptest;

use crate::index::*;
use crate::visit::Handler;
use crate::{
    Empty,
    FallbackFirst,
    NeverValueless,
    Niched,
    Variant,
};

type Value = Variant<(i32, String, Empty)>;

/// The same alternatives as a plain enum, whose derived traits are what a `Value` must agree
/// with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Control {
    Int(i32),
    Text(String),
    Nothing,
}

impl Control {
    fn to_value(&self) -> Value {
        match self {
            Control::Int(n) => Variant::new(*n),
            Control::Text(s) => Variant::new(s.clone()),
            Control::Nothing => Variant::new(Empty),
        }
    }
}

fn control() -> impl Strategy<Value = Control> {
    prop_oneof![
        any::<i32>().prop_map(Control::Int),
        "[a-z]{0,12}".prop_map(Control::Text),
        Just(Control::Nothing),
    ]
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn poisoned() -> Value {
    let mut v = Value::new(1_i32);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        v.emplace_with::<String, _, _>(|| panic!("boom"));
    }));
    assert!(result.is_err());
    assert!(v.is_valueless());
    v
}

#[proptest]
#[cfg_attr(miri, ignore)]
fn test_ordering_matches_control(
    #[strategy(control())] a: Control,
    #[strategy(control())] b: Control,
) {
    let (va, vb) = (a.to_value(), b.to_value());
    prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
    prop_assert_eq!(va.partial_cmp(&vb), Some(a.cmp(&b)));
    prop_assert_eq!(va == vb, a == b);
}

#[proptest]
#[cfg_attr(miri, ignore)]
fn test_equal_values_hash_equal(#[strategy(control())] a: Control) {
    let va = a.to_value();
    let vb = va.clone();
    prop_assert_eq!(&va, &vb);
    prop_assert_eq!(hash_of(&va), hash_of(&vb));
}

#[proptest]
#[cfg_attr(miri, ignore)]
fn test_clone_from_matches_source(
    #[strategy(control())] a: Control,
    #[strategy(control())] b: Control,
) {
    let source = a.to_value();
    let mut target = b.to_value();
    target.clone_from(&source);
    prop_assert_eq!(target.index(), source.index());
    prop_assert_eq!(target, source);
}

#[proptest]
#[cfg_attr(miri, ignore)]
fn test_swap_exchanges(#[strategy(control())] a: Control, #[strategy(control())] b: Control) {
    let mut va = a.to_value();
    let mut vb = b.to_value();
    va.swap(&mut vb);
    prop_assert_eq!(va, b.to_value());
    prop_assert_eq!(vb, a.to_value());
}

proptest! {
    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_set_keeps_latest(values in proptest::collection::vec(control(), 1..16)) {
        let mut v = Value::default();
        for value in &values {
            match value.clone() {
                Control::Int(n) => v.set(n),
                Control::Text(s) => v.set(s),
                Control::Nothing => v.set(Empty),
            }
        }
        let last = values.last().cloned().unwrap_or(Control::Int(0));
        prop_assert_eq!(v, last.to_value());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_integer_conversion_picks_exact(n in any::<i64>()) {
        let v: Variant<(f64, i64, String)> = Variant::from_value(n);
        prop_assert_eq!(v.get::<i64, _>(), Ok(&n));
    }
}

#[test]
fn test_valueless_orders_first() {
    let valueless = poisoned();
    for control in [
        Control::Int(i32::MIN),
        Control::Text(String::new()),
        Control::Nothing,
    ] {
        let live = control.to_value();
        assert!(valueless < live);
        assert!(live > valueless);
        assert_ne!(valueless, live);
    }
    assert_eq!(valueless, poisoned());
    assert_eq!(valueless.cmp(&poisoned()), std::cmp::Ordering::Equal);
}

#[test]
fn test_valueless_recovers_on_emplace() {
    let mut v = poisoned();
    let err = v.get::<i32, _>().unwrap_err();
    assert!(err.is_valueless());
    assert_eq!(err.expected(), Some(0));
    assert_eq!(v.index(), Value::VALUELESS_INDEX);
    assert_eq!(format!("{v:?}"), "Variant(<valueless>)");

    v.emplace(String::from("back"));
    assert_eq!(v.get::<String, _>().unwrap(), "back");
}

struct Width;

impl Handler<(&i32,)> for Width {
    type Output = usize;
    fn call(self, (n,): (&i32,)) -> usize {
        n.to_string().len()
    }
}

impl Handler<(&String,)> for Width {
    type Output = usize;
    fn call(self, (s,): (&String,)) -> usize {
        s.len()
    }
}

#[test]
fn test_end_to_end() {
    let mut v: Variant<(i32, String)> = Variant::default();
    assert_eq!(v.index(), 0);
    assert_eq!(v.get::<i32, _>(), Ok(&0));

    v.assign("abc");
    assert_eq!(v.index(), 1);
    assert_eq!(v.get::<String, _>().unwrap(), "abc");

    assert_eq!(v.visit(Width), Ok(3));

    v.assign(String::from("abcd"));
    *v.get_mut::<String, _>().unwrap() += "e";
    assert_eq!(v.get_if::<String, _>().map(String::as_str), Some("abcde"));

    v.emplace(7_i32);
    assert_eq!(v.into_inner::<i32, _>().ok(), Some(7));
}

#[test]
fn test_conversions_pick_the_best_alternative() {
    // f32 -> f64 is a promotion, better than a lossy conversion into an integer
    let v: Variant<(i64, f64)> = Variant::from_value(1.5_f32);
    assert_eq!(v.get::<f64, _>(), Ok(&1.5));

    // bool promotes into i32 but only converts into u64
    let v: Variant<(u64, i32)> = Variant::from_value(true);
    assert_eq!(v.get::<i32, _>(), Ok(&1));

    // small integers promote into i32
    let v: Variant<(i64, i32)> = Variant::from_value(7_u8);
    assert_eq!(v.get::<i32, _>(), Ok(&7));

    // text converts into an owned string
    let v: Variant<(bool, String)> = Variant::from_value("text");
    assert_eq!(v.get::<String, _>().unwrap(), "text");

    let v: Variant<(char, u32)> = Variant::from_value('x');
    assert_eq!(v.get::<char, _>(), Ok(&'x'));
}

#[test]
fn test_repeated_alternatives_by_position() {
    let mut v: Variant<(String, String)> = Variant::new::<_, U0>(String::from("a"));
    assert!(v.holds::<_, U0>());
    assert!(!v.holds::<_, U1>());

    v.emplace::<_, U1>(String::from("b"));
    assert_eq!(v.index(), 1);
    assert_eq!(v.get::<_, U1>().unwrap(), "b");
    assert_eq!(v.get::<_, U0>().unwrap_err().found(), Some(1));
}

#[test]
fn test_fallback_first_after_panic() {
    let mut v: Variant<(u32, String), FallbackFirst> = Variant::new(String::from("x"));
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        v.emplace_with::<String, _, _>(|| panic!("boom"));
    }));
    assert!(result.is_err());
    assert!(!v.is_valueless());
    assert_eq!(v.get::<u32, _>(), Ok(&0));
}

#[test]
fn test_never_valueless_keeps_old_value() {
    let mut v: Variant<(u32, String), NeverValueless> = Variant::new(String::from("x"));
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        v.emplace_with::<u32, _, _>(|| panic!("boom"));
    }));
    assert!(result.is_err());
    assert_eq!(v.get::<String, _>().unwrap(), "x");
}

#[test]
fn test_niched_round_trips_every_alternative() {
    let mut v: Variant<(bool, Empty, ()), NeverValueless, Niched> = Variant::new(true);
    assert_eq!(v.get::<bool, _>(), Ok(&true));

    v.emplace(Empty);
    assert_eq!(v.index(), 1);
    v.emplace(());
    assert_eq!(v.index(), 2);
    v.emplace(false);
    assert_eq!(v.get::<bool, _>(), Ok(&false));
}
