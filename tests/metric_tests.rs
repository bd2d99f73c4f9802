use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use approx::assert_relative_eq;
use chrono::{DateTime, TimeDelta, Utc};
use cubism_rs::api::{Completion, Context, ContextConfig, Cubism, Metric, RequestFn};
use cubism_rs::core::{Extent, TimeRange};
use cubism_rs::{CubismError, EventType, HeadlessBackend};

const EPOCH_SECS: i64 = 1_400_000_000;

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(EPOCH_SECS, 0).expect("valid epoch")
}

/// One-second steps, ten samples, no delays: the displayed window is the ten seconds before now.
fn setup() -> (HeadlessBackend, Context<HeadlessBackend>) {
    let backend = HeadlessBackend::at(epoch());
    let context = Cubism::new(backend.clone()).context().expect("context");
    context
        .configure(
            &ContextConfig::default()
                .with_step(Duration::from_secs(1))
                .with_size(10)
                .with_server_delay(Duration::ZERO)
                .with_client_delay(Duration::ZERO),
        )
        .expect("valid config");
    (backend, context)
}

/// Sample value at `time`: seconds since the epoch plus 100.
fn ramp_values(start: DateTime<Utc>, stop: DateTime<Utc>, step: Duration) -> Vec<f64> {
    let step_secs = step.as_secs() as i64;
    let count = (stop - start).num_seconds() / step_secs;
    (0..count)
        .map(|i| (start.timestamp() + i * step_secs - EPOCH_SECS + 100) as f64)
        .collect()
}

fn ramp(context: &Context<HeadlessBackend>, calls: Rc<Cell<usize>>) -> Metric<HeadlessBackend> {
    context.new_metric(
        RequestFn::new(move |start, stop, step, done: Completion| {
            calls.set(calls.get() + 1);
            done.complete(ramp_values(start, stop, step));
        }),
        "ramp",
    )
}

#[test]
fn requested_metric_fetches_only_once_listened_to() {
    let (_, context) = setup();
    let calls = Rc::new(Cell::new(0));
    let metric = ramp(&context, Rc::clone(&calls));
    assert_eq!(metric.value_at(0), None);
    assert_eq!(calls.get(), 0);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    metric.on_change(move |range| sink.borrow_mut().push(range));

    assert_eq!(calls.get(), 1);
    assert_eq!(metric.value_at(0), Some(90.0));
    assert_eq!(metric.value_at(9), Some(99.0));
    assert_eq!(metric.value_at(10), None);
    assert_eq!(metric.binding().retained_samples(), Some(10));
    assert_eq!(
        *seen.borrow(),
        vec![TimeRange::new(epoch() - TimeDelta::seconds(10), epoch())]
    );
}

#[test]
fn window_scrolls_with_the_context() {
    let (backend, context) = setup();
    let calls = Rc::new(Cell::new(0));
    let metric = ramp(&context, Rc::clone(&calls));
    let changes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&changes);
    metric.on_change(move |_| counter.set(counter.get() + 1));

    context.start();
    backend.event_loop().advance(Duration::from_secs(1));

    // Only the second cycle has a new step to fetch.
    assert_eq!(calls.get(), 2);
    assert_eq!(metric.value_at(0), Some(91.0));
    assert_eq!(metric.value_at(9), Some(100.0));
    assert_eq!(metric.binding().retained_samples(), Some(10));
    assert_eq!(changes.get(), 2);
}

#[test]
fn fetching_stops_with_the_last_listener() {
    let (backend, context) = setup();
    let calls = Rc::new(Cell::new(0));
    let metric = ramp(&context, Rc::clone(&calls));
    metric.on_change(|_| {});
    metric.add_listener("change.second", |_| {});
    metric.remove_listener("change");
    assert!(!metric.has_change_listener());
    assert!(metric.has_listener(&EventType::change().with_namespace("second")));

    context.start();
    backend.event_loop().advance(Duration::from_secs(2));
    assert_eq!(calls.get(), 3);

    metric.remove_listener("change.second");
    backend.event_loop().advance(Duration::from_secs(5));
    assert_eq!(calls.get(), 3);
}

#[test]
fn asynchronous_completion_raises_change() {
    let (_, context) = setup();
    let pending: Rc<RefCell<Option<Completion>>> = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&pending);
    let metric = context.new_metric(
        RequestFn::new(move |_, _, _, done| {
            *slot.borrow_mut() = Some(done);
        }),
        "later",
    );
    let changes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&changes);
    metric.on_change(move |_| counter.set(counter.get() + 1));
    assert_eq!(metric.value_at(0), None);
    assert_eq!(changes.get(), 1);

    let done = pending.borrow_mut().take().expect("request issued");
    done.complete(vec![1.0; 10]);

    assert_eq!(metric.value_at(5), Some(1.0));
    assert_eq!(changes.get(), 2);
}

#[test]
fn failed_request_leaves_window_empty() {
    let (_, context) = setup();
    let metric = context.new_metric(
        RequestFn::new(|_, _, _, done: Completion| done.fail("backend unavailable")),
        "broken",
    );
    metric.on_change(|_| {});
    assert_eq!(metric.value_at(0), None);
    assert_eq!(metric.extent(), None);
}

#[test]
fn missing_samples_read_as_none() {
    let (_, context) = setup();
    let metric = context.new_metric(
        RequestFn::new(|_, _, _, done: Completion| {
            let mut values = vec![2.0; 10];
            values[3] = f64::NAN;
            done.complete(values);
        }),
        "gappy",
    );
    metric.on_change(|_| {});
    assert_eq!(metric.value_at(3), None);
    assert_eq!(metric.value_at(4), Some(2.0));
    assert_eq!(metric.extent(), Some(Extent { min: 2.0, max: 2.0 }));
}

#[test]
fn arithmetic_is_pointwise() {
    let (_, context) = setup();
    let metric = ramp(&context, Rc::new(Cell::new(0)));
    let two = context.constant(2.0);

    let sum = metric.add(&context.constant(0.5)).expect("same context");
    let difference = metric.subtract(&two).expect("same context");
    let product = metric.multiply(&two).expect("same context");
    let quotient = metric.divide(&two).expect("same context");

    // Listening on a derived metric loads its operands.
    sum.on_change(|_| {});
    assert!(sum.has_change_listener());
    assert!(metric.has_change_listener());

    assert_relative_eq!(sum.value_at(0).expect("value"), 90.5);
    assert_relative_eq!(difference.value_at(9).expect("value"), 97.0);
    assert_relative_eq!(product.value_at(1).expect("value"), 182.0);
    assert_relative_eq!(quotient.value_at(9).expect("value"), 49.5);

    // Operands are unchanged.
    assert_eq!(metric.value_at(0), Some(90.0));
}

#[test]
fn derived_metrics_describe_their_expression() {
    let (_, context) = setup();
    let metric = ramp(&context, Rc::new(Cell::new(0)));
    let expression = metric
        .divide(&context.constant(2.0))
        .and_then(|half| half.subtract(&context.constant(1.5)))
        .expect("same context");

    assert_eq!(metric.to_string(), "ramp");
    assert_eq!(context.constant(1.5).to_string(), "1.5");
    assert_eq!(expression.to_string(), "ramp / 2 - 1.5");
}

#[test]
fn metrics_of_different_contexts_do_not_combine() {
    let (backend, context) = setup();
    let other = Cubism::new(backend).context().expect("context");
    let result = context.constant(1.0).add(&other.constant(2.0));
    assert!(matches!(result, Err(CubismError::ContextMismatch)));
}

#[test]
fn shift_reads_the_past() {
    let (_, context) = setup();
    let metric = ramp(&context, Rc::new(Cell::new(0)));
    let earlier = metric.shift(-2);
    earlier.on_change(|_| {});

    assert_eq!(earlier.value_at(0), Some(88.0));
    assert_eq!(earlier.value_at(9), Some(97.0));
    assert_eq!(earlier.to_string(), "ramp");

    let constant = context.constant(4.0).shift(-3);
    assert_eq!(constant.value_at(0), Some(4.0));
}

#[test]
fn extent_covers_the_window() {
    let (_, context) = setup();
    let metric = ramp(&context, Rc::new(Cell::new(0)));
    assert_eq!(metric.extent(), None);

    metric.on_change(|_| {});
    assert_eq!(metric.extent(), Some(Extent { min: 90.0, max: 99.0 }));
    assert_eq!(
        context.constant(-3.0).extent(),
        Some(Extent { min: -3.0, max: -3.0 })
    );
}

#[test]
fn only_change_events_are_accepted() {
    let (_, context) = setup();
    let metric = ramp(&context, Rc::new(Cell::new(0)));
    let result = metric.on(&EventType::focus(), |_| {});
    assert_eq!(
        result,
        Err(CubismError::UnsupportedEventType("focus".to_owned()))
    );
    metric
        .on(&EventType::change().with_namespace("chart"), |_| {})
        .expect("change is supported");
    assert!(metric.has_listener(&EventType::change().with_namespace("chart")));
}

#[test]
#[should_panic(expected = "unsupported event type")]
fn string_listener_rejects_context_only_events() {
    let (_, context) = setup();
    ramp(&context, Rc::new(Cell::new(0))).add_listener("prepare.x", |_| {});
}
