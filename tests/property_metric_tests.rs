use approx::relative_eq;
use chrono::DateTime;
use cubism_rs::api::{Completion, Context, Cubism, RequestFn};
use cubism_rs::HeadlessBackend;
use proptest::prelude::*;

fn context(size: usize) -> Context<HeadlessBackend> {
    let epoch = DateTime::from_timestamp(1_400_000_000, 0).expect("valid epoch");
    let context = Cubism::new(HeadlessBackend::at(epoch))
        .context()
        .expect("context");
    context.set_size(size).expect("valid size");
    context
}

fn sample() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => -1.0e6f64..1.0e6,
        1 => Just(f64::NAN),
    ]
}

proptest! {
    #[test]
    fn constant_sums_are_pointwise(
        a in -1.0e9f64..1.0e9,
        b in -1.0e9f64..1.0e9,
        index in 0usize..1440,
    ) {
        let context = context(1440);
        let sum = context.constant(a).add(&context.constant(b)).expect("same context");
        let value = sum.value_at(index).expect("constants are defined everywhere");
        prop_assert!(relative_eq!(value, a + b, max_relative = 1e-12));
    }

    #[test]
    fn extent_bounds_every_known_sample(values in prop::collection::vec(sample(), 1..64)) {
        let context = context(values.len());
        let data = values.clone();
        let metric = context.new_metric(
            RequestFn::new(move |_, _, _, done: Completion| done.complete(data.clone())),
            "generated",
        );
        metric.on_change(|_| {});

        let known: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        match metric.extent() {
            Some(extent) => {
                prop_assert!(extent.min <= extent.max);
                for value in &known {
                    prop_assert!(extent.contains(*value));
                }
                prop_assert!(known.contains(&extent.min));
                prop_assert!(known.contains(&extent.max));
            }
            None => prop_assert!(known.is_empty()),
        }
    }

    #[test]
    fn missing_samples_propagate_through_arithmetic(
        values in prop::collection::vec(sample(), 1..32),
        offset in -100.0f64..100.0,
    ) {
        let context = context(values.len());
        let data = values.clone();
        let metric = context.new_metric(
            RequestFn::new(move |_, _, _, done: Completion| done.complete(data.clone())),
            "generated",
        );
        let shifted = metric.add(&context.constant(offset)).expect("same context");
        shifted.on_change(|_| {});

        for (index, value) in values.iter().enumerate() {
            match shifted.value_at(index) {
                Some(sum) => prop_assert!(relative_eq!(sum, value + offset, max_relative = 1e-12)),
                None => prop_assert!(value.is_nan()),
            }
        }
    }
}
