use std::cell::Cell;
use std::panic::{
    self,
    AssertUnwindSafe,
};
use std::rc::Rc;

use compact_variant::visit::Handler;
use compact_variant::{
    visit,
    FallbackFirst,
    NeverValueless,
    Variant,
};

/// Counts its live instances, and panics when cloned if asked to.
#[derive(Debug)]
struct Tracked {
    live: Rc<Cell<isize>>,
    poison: bool,
}

impl Tracked {
    fn new(live: &Rc<Cell<isize>>, poison: bool) -> Self {
        live.set(live.get() + 1);
        Tracked {
            live: Rc::clone(live),
            poison,
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        if self.poison {
            panic!("poisoned clone");
        }
        Tracked::new(&self.live, false)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.poison == other.poison
    }
}

type Value = Variant<(u32, Tracked)>;

fn make_valueless(live: &Rc<Cell<isize>>) -> Value {
    let source: Value = Variant::new(Tracked::new(live, true));
    let mut target: Value = Variant::new(7_u32);

    let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
    assert!(result.is_err());
    target
}

#[test]
fn test_panicking_clone_leaves_valueless() {
    let live = Rc::new(Cell::new(0));
    {
        let v = make_valueless(&live);
        assert!(v.is_valueless());
        assert_eq!(v.index(), Value::VALUELESS_INDEX);
        assert_eq!(Value::STATUS_COUNT, 3);

        // only the source was ever built, and it's gone
        assert_eq!(live.get(), 0);
    }
    assert_eq!(live.get(), 0);
}

#[test]
fn test_accessors_on_valueless() {
    let live = Rc::new(Cell::new(0));
    let mut v = make_valueless(&live);

    let err = v.get::<u32, _>().unwrap_err();
    assert_eq!(err.expected(), Some(0));
    assert_eq!(err.found(), None);
    assert!(err.is_valueless());
    assert_eq!(
        err.to_string(),
        "bad variant access: expected alternative 0, found a valueless variant"
    );

    assert!(v.get_mut::<Tracked, _>().is_err());
    assert!(v.get_if::<u32, _>().is_none());
    assert!(!v.holds::<u32, _>());
    assert!(v.into_inner::<u32, _>().is_err());
}

struct Name;

impl Handler<(&u32,)> for Name {
    type Output = &'static str;
    fn call(self, _: (&u32,)) -> &'static str {
        "u32"
    }
}

impl Handler<(&Tracked,)> for Name {
    type Output = &'static str;
    fn call(self, _: (&Tracked,)) -> &'static str {
        "tracked"
    }
}

#[test]
fn test_visiting_valueless_is_rejected() {
    let live = Rc::new(Cell::new(0));
    let valueless = make_valueless(&live);
    let live_value: Value = Variant::new(1_u32);

    assert_eq!(live_value.visit(Name), Ok("u32"));

    let err = valueless.visit(Name).unwrap_err();
    assert!(err.is_valueless());
    assert_eq!(err.expected(), None);

    let called = Cell::new(false);
    let result = visit!(
        |_: &u32, _: &u32| called.set(true),
        &Variant::<(u32,)>::new(1_u32),
        &Variant::<(u32,)>::new(2_u32),
    );
    assert!(result.is_ok());
    assert!(called.get());
}

#[test]
fn test_valueless_compares_and_clones() {
    let live = Rc::new(Cell::new(0));
    let a = make_valueless(&live);
    let b = a.clone();

    assert!(b.is_valueless());
    assert_eq!(a, b);
    assert_ne!(a, Variant::new(0_u32));
    assert_eq!(format!("{:?}", a), "Variant(<valueless>)");

    let mut c: Value = Variant::new(Tracked::new(&live, false));
    assert_eq!(live.get(), 1);
    c.clone_from(&a);
    assert!(c.is_valueless());
    assert_eq!(live.get(), 0);
}

#[test]
fn test_leaving_valueless() {
    let live = Rc::new(Cell::new(0));
    let mut v = make_valueless(&live);

    v.set(Tracked::new(&live, false));
    assert_eq!(v.index(), 1);
    assert_eq!(live.get(), 1);

    let mut w = make_valueless(&live);
    w.swap(&mut v);
    assert!(v.is_valueless());
    assert_eq!(w.index(), 1);

    v.emplace(3_u32);
    assert_eq!(v.get::<u32, _>(), Ok(&3));
}

#[test]
fn test_other_policies_never_go_valueless() {
    let live = Rc::new(Cell::new(0));

    {
        let source: Variant<(u32, Tracked), NeverValueless> =
            Variant::new(Tracked::new(&live, true));
        let mut target: Variant<(u32, Tracked), NeverValueless> = Variant::new(7_u32);
        let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
        assert!(result.is_err());
        assert_eq!(target.get::<u32, _>(), Ok(&7));
        assert_eq!(Variant::<(u32, Tracked), NeverValueless>::STATUS_COUNT, 2);
    }
    assert_eq!(live.get(), 0);

    let source: Variant<(u32, Tracked), FallbackFirst> = Variant::new(Tracked::new(&live, true));
    let mut target: Variant<(u32, Tracked), FallbackFirst> =
        Variant::new(Tracked::new(&live, false));
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        target.emplace_with::<Tracked, _, _>(|| source.get::<Tracked, _>().unwrap().clone());
    }));
    assert!(result.is_err());
    assert_eq!(target.get::<u32, _>(), Ok(&0));

    drop((source, target));
    assert_eq!(live.get(), 0);
}
