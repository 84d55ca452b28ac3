use std::panic::{
    self,
    AssertUnwindSafe,
};
use std::sync::Once;

use arbitrary::Arbitrary;
use compact_variant::index::{
    U0,
    U1,
    U2,
    U3,
    U4,
};
use compact_variant::{
    Empty,
    Variant,
};

mod actions;
mod creation;

pub use actions::Action;
pub use creation::Creation;

/// The variant under test. `String` and `Box<str>` have drop glue, so a panicking replacement
/// leaves it valueless.
pub type Subject = Variant<(u8, i64, String, Box<str>, Empty)>;

/// What the [`Subject`] should hold, as a plain enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Control {
    // declared first, valueless orders before every live value
    Valueless,
    Byte(u8),
    Int(i64),
    Text(String),
    Boxed(Box<str>),
    Nothing,
}

impl Control {
    pub fn index(&self) -> usize {
        match self {
            Control::Byte(_) => 0,
            Control::Int(_) => 1,
            Control::Text(_) => 2,
            Control::Boxed(_) => 3,
            Control::Nothing => 4,
            Control::Valueless => Subject::VALUELESS_INDEX,
        }
    }
}

/// Asserts that `subject` holds exactly what `control` describes.
pub fn assert_matches(subject: &Subject, control: &Control) {
    assert_eq!(subject.index(), control.index(), "{:?} vs {:?}", subject, control);
    assert_eq!(subject.is_valueless(), *control == Control::Valueless);

    match control {
        Control::Byte(b) => assert_eq!(subject.get::<_, U0>(), Ok(b)),
        Control::Int(n) => assert_eq!(subject.get::<_, U1>(), Ok(n)),
        Control::Text(s) => assert_eq!(subject.get::<_, U2>(), Ok(s)),
        Control::Boxed(s) => assert_eq!(subject.get::<_, U3>(), Ok(s)),
        Control::Nothing => assert_eq!(subject.get::<_, U4>(), Ok(&Empty)),
        Control::Valueless => {
            let err = subject.get::<_, U0>().unwrap_err();
            assert!(err.is_valueless());
        }
    }
}

/// Replaces the active alternative of `subject` with a constructor that panics.
pub fn poison(subject: &mut Subject) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        subject.emplace_with::<String, U2, _>(|| panic!("poisoned"));
    }));
    assert!(result.is_err());
}

/// A framework to generate a [`Subject`] and a [`Control`], run a series of actions on both
/// and assert they agree after each one.
#[derive(Arbitrary, Debug)]
pub struct Scenario<'a> {
    pub creation: Creation<'a>,
    /// A second value, the partner of swaps, clones and comparisons
    pub other: Creation<'a>,
    pub actions: Vec<Action<'a>>,
}

impl<'a> Scenario<'a> {
    /// Run the provided scenario, asserting for correct behavior
    pub fn run(self) {
        let (mut subject, mut control) = self.creation.create();
        let (mut other, mut other_control) = self.other.create();
        assert_matches(&subject, &control);
        assert_matches(&other, &other_control);

        for action in self.actions {
            action.perform(&mut subject, &mut control, &mut other, &mut other_control);
            assert_matches(&subject, &control);
            assert_matches(&other, &other_control);
        }
    }
}

/// Installs a panic hook that stays quiet about the panics the scenarios cause on purpose.
pub fn silence_poison() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let default = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let poisoned = info
                .payload()
                .downcast_ref::<&str>()
                .map_or(false, |msg| *msg == "poisoned");
            if !poisoned {
                default(info);
            }
        }));
    });
}
