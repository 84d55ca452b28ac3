use compact_variant::visit::Handler;
use compact_variant::{
    visit,
    Empty,
    Variant,
};
use criterion::{
    black_box,
    criterion_group,
    criterion_main,
    Criterion,
};

type Value = Variant<(u8, u16, u32, u64, i8, i16, i32, Empty)>;

struct Widen;

macro_rules! widen {
    ($($t:ty),+) => {
        $(
            impl Handler<(&$t,)> for Widen {
                type Output = i64;
                fn call(self, (v,): (&$t,)) -> i64 {
                    *v as i64
                }
            }
        )+
    };
}

widen!(u8, u16, u32, u64, i8, i16, i32);

impl Handler<(&Empty,)> for Widen {
    type Output = i64;
    fn call(self, _: (&Empty,)) -> i64 {
        0
    }
}

struct Sum;

impl<A, B> Handler<(A, B)> for Sum
where
    Widen: Handler<(A,), Output = i64> + Handler<(B,), Output = i64>,
{
    type Output = i64;
    fn call(self, (a, b): (A, B)) -> i64 {
        Widen.call((a,)) + Widen.call((b,))
    }
}

fn values() -> Vec<Value> {
    vec![
        Variant::new(1_u8),
        Variant::new(2_u16),
        Variant::new(3_u32),
        Variant::new(4_u64),
        Variant::new(-5_i8),
        Variant::new(-6_i16),
        Variant::new(-7_i32),
        Variant::new(Empty),
    ]
}

fn bench_visit(c: &mut Criterion) {
    let values = values();

    c.bench_function("visit one of eight", |b| {
        b.iter(|| {
            black_box(&values)
                .iter()
                .map(|v| v.visit(Widen).unwrap_or_default())
                .sum::<i64>()
        })
    });

    c.bench_function("visit pairs of eight", |b| {
        b.iter(|| {
            let values = black_box(&values);
            let mut total = 0;
            for a in values {
                for b in values {
                    total += visit!(Sum, a, b).unwrap_or_default();
                }
            }
            total
        })
    });

    c.bench_function("index and get", |b| {
        b.iter(|| {
            black_box(&values)
                .iter()
                .filter_map(|v| v.get::<u64, _>().ok())
                .sum::<u64>()
        })
    });
}

criterion_group!(visitation, bench_visit);
criterion_main!(visitation);
