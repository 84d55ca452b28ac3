/// Names a [`Variant`](crate::Variant) type from its alternatives, and optionally its policy
/// and encoding.
///
/// # Examples
/// ```
/// use compact_variant::{variant, Niched, NeverValueless, Variant};
///
/// type Number = variant![i64, f64];
/// type MaybeRef<'a> = variant![&'a u8, (); NeverValueless, Niched];
///
/// let n: Number = Variant::new(1.5_f64);
/// assert_eq!(n.index(), 1);
///
/// let byte = 7_u8;
/// let r: MaybeRef<'_> = Variant::new(&byte);
/// assert_eq!(r.get::<&u8, _>().map(|b| **b), Ok(7));
/// ```
#[macro_export]
macro_rules! variant {
    ($($alt:ty),+ $(,)?) => {
        $crate::Variant<($($alt,)+)>
    };
    ($($alt:ty),+ ; $policy:ty) => {
        $crate::Variant<($($alt,)+), $policy>
    };
    ($($alt:ty),+ ; $policy:ty, $encoding:ty) => {
        $crate::Variant<($($alt,)+), $policy, $encoding>
    };
}

/// Calls a handler with the active alternatives of every value listed, passed as `&value` or
/// `&mut value`.
///
/// Returns [`Result<_, BadVariantAccess>`](crate::BadVariantAccess), the handler isn't called
/// if any value is valueless. See [`visit`](mod@crate::visit) for how handlers are written.
///
/// # Examples
/// ```
/// use compact_variant::{visit, Variant};
///
/// let a: Variant<(u8,)> = Variant::new(2_u8);
/// let b: Variant<(u16,)> = Variant::new(40_u16);
///
/// let sum = visit!(|a: &u8, b: &u16| *a as u16 + *b, &a, &b).unwrap();
/// assert_eq!(sum, 42);
/// ```
///
/// A handler has to produce the same type for every combination:
///
/// ```compile_fail
/// use compact_variant::visit::Handler;
/// use compact_variant::{visit, Variant};
///
/// struct Mixed;
///
/// impl Handler<(&i32,)> for Mixed {
///     type Output = i32;
///     fn call(self, (n,): (&i32,)) -> i32 { *n }
/// }
///
/// impl Handler<(&String,)> for Mixed {
///     type Output = String;
///     fn call(self, (s,): (&String,)) -> String { s.clone() }
/// }
///
/// let v: Variant<(i32, String)> = Variant::new(1_i32);
/// let _ = visit!(Mixed, &v);
/// ```
#[macro_export]
macro_rules! visit {
    (@cons) => { () };
    (@cons $head:expr $(, $tail:expr)*) => {
        ($head, $crate::visit!(@cons $($tail),*))
    };
    ($handler:expr, $($value:expr),+ $(,)?) => {
        $crate::visit::visit($handler, $crate::visit!(@cons $($value),+))
    };
}

#[cfg(test)]
mod tests {
    use crate::visit::Handler;
    use crate::{
        NeverValueless,
        Niched,
        Variant,
    };

    struct Sum;

    macro_rules! sum_impls {
        ($($a:ty, $b:ty, $c:ty);+) => {
            $(
                impl Handler<(&$a, &$b, &$c)> for Sum {
                    type Output = i64;
                    fn call(self, (a, b, c): (&$a, &$b, &$c)) -> i64 {
                        *a as i64 + *b as i64 + *c as i64
                    }
                }
            )+
        };
    }

    sum_impls!(i8, u8, i32; i8, u16, i32; i16, u8, i32; i16, u16, i32);

    #[test]
    fn test_variant_type() {
        let v: variant![u8, String] = Variant::new(3_u8);
        assert_eq!(v.index(), 0);

        let v: variant![&'static u8, (); NeverValueless, Niched] = Variant::new(());
        assert_eq!(v.index(), 1);
        assert_eq!(core::mem::size_of_val(&v), core::mem::size_of::<usize>());
    }

    #[test]
    fn test_visit_three() {
        let a: Variant<(i8, i16)> = Variant::new(-3_i16);
        let b: Variant<(u8, u16)> = Variant::new(5_u8);
        let c: Variant<(i32,)> = Variant::new(100_i32);

        assert_eq!(visit!(Sum, &a, &b, &c), Ok(102));
    }

    #[test]
    fn test_visit_mut() {
        let mut a: Variant<(u32,)> = Variant::new(1_u32);
        let b: Variant<(u32,)> = Variant::new(41_u32);

        visit!(|a: &mut u32, b: &u32| *a += *b, &mut a, &b).unwrap();
        assert_eq!(a.get::<u32, _>(), Ok(&42));
    }
}
