//! Type-level alternative positions.
//!
//! A [`Variant`](crate::Variant) is accessed either by the type of an alternative or by its
//! position. Positions are spelled as the marker types below so that an out of range index is
//! rejected when the program is compiled, not when it runs.
//!
//! ```
//! use compact_variant::index::{Index, U2};
//!
//! assert_eq!(U2::VALUE, 2);
//! ```

/// A compile-time alternative position.
pub trait Index {
    /// The position as a runtime value.
    const VALUE: usize;
}

macro_rules! positions {
    ($($name:ident = $value:literal),+ $(,)?) => {
        $(
            #[doc = concat!("Alternative position ", stringify!($value), ".")]
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
            pub struct $name;

            impl Index for $name {
                const VALUE: usize = $value;
            }
        )+
    };
}

positions! {
    U0 = 0,
    U1 = 1,
    U2 = 2,
    U3 = 3,
    U4 = 4,
    U5 = 5,
    U6 = 6,
    U7 = 7,
}
