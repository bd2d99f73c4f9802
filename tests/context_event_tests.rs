use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use cubism_rs::api::{Context, Cubism};
use cubism_rs::core::TimeRange;
use cubism_rs::{ContextEvent, EventKind, EventType, HeadlessBackend};

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_400_000_000, 0).expect("valid epoch")
}

fn setup() -> (HeadlessBackend, Context<HeadlessBackend>) {
    let backend = HeadlessBackend::at(epoch());
    let context = Cubism::new(backend.clone()).context().expect("context");
    (backend, context)
}

fn record(context: &Context<HeadlessBackend>) -> Rc<RefCell<Vec<ContextEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in EventKind::ALL {
        let log = Rc::clone(&log);
        context.on(&EventType::namespaced(kind, "log"), move |event| {
            log.borrow_mut().push(event);
        });
    }
    log
}

fn window(start_offset_s: i64, stop_offset_s: i64) -> TimeRange {
    TimeRange::new(
        epoch() + TimeDelta::seconds(start_offset_s),
        epoch() + TimeDelta::seconds(stop_offset_s),
    )
}

#[test]
fn change_listener_replays_displayed_window() {
    let (_, context) = setup();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    context.on_change(move |range| sink.borrow_mut().push(range));

    // Default delays put both windows ten seconds behind an aligned clock.
    assert_eq!(*seen.borrow(), vec![window(-14_410, -10)]);
}

#[test]
fn focus_listener_receives_typed_index() {
    let (_, context) = setup();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    context.on_focus(move |index| sink.borrow_mut().push(index));

    context.focus(42);
    context.no_focus();

    assert_eq!(*seen.borrow(), vec![None, Some(42), None]);
    assert_eq!(context.focus_index(), None);
}

#[test]
fn namespaced_listeners_coexist() {
    let (_, context) = setup();
    let count = Rc::new(RefCell::new((0, 0)));
    let first = Rc::clone(&count);
    context.on_focus(move |_| first.borrow_mut().0 += 1);
    let second = Rc::clone(&count);
    context.add_listener("focus.other", move |_| second.borrow_mut().1 += 1);

    context.focus(3);
    assert_eq!(*count.borrow(), (2, 2));

    context.remove_listener("focus.other");
    context.focus(4);
    assert_eq!(*count.borrow(), (3, 2));
    assert!(context.has_listener(&EventType::focus()));
    assert!(!context.has_listener(&EventType::focus().with_namespace("other")));
}

#[test]
fn reregistering_a_name_replaces_the_listener() {
    let (_, context) = setup();
    let log = Rc::new(RefCell::new(Vec::new()));
    let first = Rc::clone(&log);
    context.add_listener("focus.chart", move |_| first.borrow_mut().push("first"));
    let second = Rc::clone(&log);
    context.add_listener("focus.chart", move |_| second.borrow_mut().push("second"));
    log.borrow_mut().clear();

    context.focus(1);
    assert_eq!(*log.borrow(), vec!["second"]);
}

#[test]
#[should_panic(expected = "unsupported event type")]
fn unknown_event_name_panics() {
    let (_, context) = setup();
    context.add_listener("bogus", |_| {});
}

#[test]
#[should_panic(expected = "unsupported event type")]
fn removing_unknown_event_name_panics() {
    let (_, context) = setup();
    context.remove_listener("bogus.ns");
}

#[test]
fn refresh_cycle_raises_events_in_order() {
    let (backend, context) = setup();
    let log = record(&context);
    log.borrow_mut().clear();

    context.start();
    backend.event_loop().advance(Duration::from_secs(10));

    let kinds: Vec<EventKind> = log.borrow().iter().map(|event| event.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Prepare,
            EventKind::BeforeChange,
            EventKind::Change,
            EventKind::Focus,
        ]
    );
    let expected = window(-14_400, 0);
    assert_eq!(log.borrow()[0], ContextEvent::Prepare(expected));
    assert_eq!(log.borrow()[2], ContextEvent::Change(expected));
    assert_eq!(log.borrow()[3], ContextEvent::Focus(None));
}

#[test]
fn prepare_waits_for_server_delay_and_change_for_client_delay() {
    let (backend, context) = setup();
    let log = record(&context);
    log.borrow_mut().clear();
    context.start();

    backend.event_loop().advance(Duration::from_millis(4_999));
    assert!(log.borrow().is_empty());

    backend.event_loop().advance(Duration::from_millis(1));
    assert_eq!(log.borrow().len(), 1);

    backend.event_loop().advance(Duration::from_millis(4_999));
    assert_eq!(log.borrow().len(), 1);

    backend.event_loop().advance(Duration::from_millis(1));
    assert_eq!(log.borrow().len(), 4);
}

#[test]
fn displayed_window_advances_one_step_per_cycle() {
    let (backend, context) = setup();
    context.start();
    backend.event_loop().advance(Duration::from_secs(60));

    let scale = context.scale().expect("scale");
    let (start, stop) = scale.domain().expect("finite domain");
    assert_eq!(stop, epoch() + TimeDelta::seconds(50));
    assert_eq!(stop - start, TimeDelta::seconds(14_400));
    assert_eq!(scale.range(), (0.0, 1440.0));
}

#[test]
fn stop_cancels_pending_change() {
    let (backend, context) = setup();
    let log = record(&context);
    log.borrow_mut().clear();
    context.start();
    assert!(context.binding().is_running());

    backend.event_loop().advance(Duration::from_secs(5));
    context.stop();
    assert!(!context.binding().is_running());
    backend.event_loop().advance(Duration::from_secs(60));

    let kinds: Vec<EventKind> = log.borrow().iter().map(|event| event.kind()).collect();
    assert_eq!(kinds, vec![EventKind::Prepare]);
    assert_eq!(backend.event_loop().pending(), 0);
}

#[test]
fn restart_does_not_double_schedule() {
    let (backend, context) = setup();
    let log = record(&context);
    log.borrow_mut().clear();
    context.start();
    context.start();

    backend.event_loop().advance(Duration::from_secs(10));
    let prepares = log
        .borrow()
        .iter()
        .filter(|event| event.kind() == EventKind::Prepare)
        .count();
    assert_eq!(prepares, 1);
}

#[test]
fn removed_listener_stops_receiving() {
    let (backend, context) = setup();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    context.on_change(move |_| *sink.borrow_mut() += 1);
    context.remove(&EventType::change());
    assert!(!context.has_listener(&EventType::change()));

    context.start();
    backend.event_loop().advance(Duration::from_secs(30));
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn step_change_realigns_window() {
    let (_, context) = setup();
    context
        .set_step(Duration::from_secs(60))
        .expect("valid step");
    context.set_size(60).expect("valid size");

    let (start, stop) = context
        .scale()
        .expect("scale")
        .domain()
        .expect("finite domain");
    // 1_400_000_000 - 10 = 1_399_999_990, floored to the minute.
    assert_eq!(stop.timestamp(), 1_399_999_980);
    assert_eq!(stop - start, TimeDelta::minutes(60));
}
