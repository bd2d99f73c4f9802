use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cubism_rs::api::{Completion, Context, ContextConfig, Cubism, Metric, RequestFn};
use cubism_rs::core::color::{default_comparison_colors, default_horizon_colors, palette};
use cubism_rs::core::{HorizonMode, Orientation};
use cubism_rs::headless::{NodeContent, Surface};
use cubism_rs::{EventType, HeadlessBackend};

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_400_000_000, 0).expect("valid epoch")
}

fn setup() -> (HeadlessBackend, Context<HeadlessBackend>) {
    let backend = HeadlessBackend::at(epoch());
    let context = Cubism::new(backend.clone()).context().expect("context");
    (backend, context)
}

/// Ten one-second samples with no delays.
fn small_context() -> Context<HeadlessBackend> {
    let (_, context) = setup();
    context
        .configure(
            &ContextConfig::default()
                .with_step(Duration::from_secs(1))
                .with_size(10)
                .with_server_delay(Duration::ZERO)
                .with_client_delay(Duration::ZERO),
        )
        .expect("valid config");
    context
}

fn fixed(context: &Context<HeadlessBackend>, name: &str, values: Vec<f64>) -> Metric<HeadlessBackend> {
    context.new_metric(
        RequestFn::new(move |_, _, _, done: Completion| done.complete(values.clone())),
        name,
    )
}

fn ascending(context: &Context<HeadlessBackend>) -> Metric<HeadlessBackend> {
    fixed(context, "load", (90..100).map(f64::from).collect())
}

#[test]
fn apply_and_remove_manage_one_child() {
    let (_, context) = setup();
    let surface = Surface::new();
    surface.append_static("header");
    let horizon = context.new_horizon();

    horizon.apply(&surface).expect("apply");
    assert_eq!(surface.child_count(), 2);

    let renders = |surface: &Surface| {
        surface
            .node(horizon.binding().id())
            .expect("attached")
            .renders
    };
    let first = renders(&surface);

    horizon.apply(&surface).expect("apply again");
    assert_eq!(surface.child_count(), 2);
    assert!(renders(&surface) > first);

    horizon.remove(&surface).expect("remove");
    assert_eq!(surface.child_count(), 1);
    assert!(surface.node(horizon.binding().id()).is_none());
}

#[test]
fn listeners_live_while_any_surface_is_attached() {
    let (_, context) = setup();
    let rule = context.new_rule();
    let focus_listener = EventType::focus().with_namespace(format!("rule-{}", rule.binding().id().0));
    let first = Surface::new();
    let second = Surface::new();

    rule.apply(&first).expect("apply");
    rule.apply(&second).expect("apply");
    assert!(context.has_listener(&focus_listener));

    rule.remove(&first).expect("remove");
    assert!(context.has_listener(&focus_listener));

    rule.remove(&second).expect("remove");
    assert!(!context.has_listener(&focus_listener));
}

#[test]
fn dropped_surfaces_release_listeners_on_next_redraw() {
    let context = small_context();
    let metric = ascending(&context);
    let horizon = context.new_horizon();
    horizon.set_metric(&metric);
    let namespace = format!("horizon-{}", horizon.binding().id().0);
    let focus_listener = EventType::focus().with_namespace(namespace.clone());
    let change_listener = EventType::change().with_namespace(namespace);

    {
        let surface = Surface::new();
        horizon.apply(&surface).expect("apply");
        assert!(metric.has_listener(&change_listener));
    }

    context.focus(1);
    assert!(!context.has_listener(&focus_listener));
    assert!(!metric.has_listener(&change_listener));
}

#[test]
fn horizon_defaults() {
    let (_, context) = setup();
    let horizon = context.new_horizon();
    assert_eq!(horizon.mode(), HorizonMode::default());
    assert_eq!(horizon.height(), 30);
    assert_eq!(horizon.colors(), default_horizon_colors());
    assert!(horizon.metric().is_none());
    assert_eq!(horizon.title(), None);
    assert_eq!((horizon.format())(1234.0), "1.2k");
}

#[test]
fn horizon_configuration_round_trips() {
    let (_, context) = setup();
    let horizon = context.new_horizon();
    let colors = palette(&["#fff", "#000000"]).expect("valid palette");
    horizon.set_colors(colors.clone());
    horizon.set_height(48);
    horizon.set_mode(HorizonMode::Mirror);
    horizon.set_title(Some("requests"));

    assert_eq!(horizon.colors(), colors);
    assert_eq!(horizon.height(), 48);
    assert_eq!(horizon.mode(), HorizonMode::Mirror);
    assert_eq!(horizon.title().as_deref(), Some("requests"));

    let surface = Surface::new();
    horizon.apply(&surface).expect("apply");
    let node = surface.node(horizon.binding().id()).expect("attached");
    assert_eq!(
        node.content,
        NodeContent::Horizon {
            title: Some("requests".to_owned()),
            value_label: None,
            mode: HorizonMode::Mirror,
            height: 48,
            bands: 1,
        }
    );
}

#[test]
fn horizon_labels_follow_focus() {
    let context = small_context();
    let horizon = context.new_horizon();
    horizon.set_metric(&ascending(&context));
    let surface = Surface::new();
    horizon.apply(&surface).expect("apply");

    let label = |surface: &Surface| match surface.node(horizon.binding().id()).map(|n| n.content) {
        Some(NodeContent::Horizon {
            title, value_label, ..
        }) => (title, value_label),
        other => panic!("unexpected node {other:?}"),
    };

    assert_eq!(label(&surface), (Some("load".to_owned()), Some("99".to_owned())));

    context.focus(3);
    assert_eq!(label(&surface).1.as_deref(), Some("93"));

    context.no_focus();
    assert_eq!(label(&surface).1.as_deref(), Some("99"));
}

#[test]
fn clearing_the_metric_drops_the_label() {
    let context = small_context();
    let horizon = context.new_horizon();
    let metric = ascending(&context);
    horizon.set_metric(&metric);
    let listener =
        EventType::change().with_namespace(format!("horizon-{}", horizon.binding().id().0));
    let surface = Surface::new();
    horizon.apply(&surface).expect("apply");
    assert!(metric.has_listener(&listener));

    horizon.clear_metric();
    horizon.apply(&surface).expect("reapply");
    assert!(!metric.has_listener(&listener));
    match surface.node(horizon.binding().id()).map(|n| n.content) {
        Some(NodeContent::Horizon {
            title, value_label, ..
        }) => {
            assert_eq!(title, None);
            assert_eq!(value_label, None);
        }
        other => panic!("unexpected node {other:?}"),
    }
}

#[test]
fn rule_marks_non_zero_samples() {
    let context = small_context();
    let mut values = vec![0.0; 10];
    values[1] = 1.0;
    values[3] = -2.0;
    values[5] = f64::NAN;
    let rule = context.new_rule();
    rule.set_metric(&fixed(&context, "events", values));
    let surface = Surface::new();
    rule.apply(&surface).expect("apply");

    context.focus(2);
    let node = surface.node(rule.binding().id()).expect("attached");
    assert_eq!(
        node.content,
        NodeContent::Rule {
            marks: vec![1, 3],
            focus: Some(2),
        }
    );
}

#[test]
fn comparison_reports_relative_change() {
    let context = small_context();
    let comparison = context.new_comparison();
    assert_eq!(comparison.height(), 120);
    assert_eq!(comparison.colors(), default_comparison_colors());
    assert!((comparison.stroke_width() - 1.5).abs() < f64::EPSILON);

    comparison.set_primary(&context.constant(150.0));
    comparison.set_secondary(&context.constant(100.0));
    let surface = Surface::new();
    comparison.apply(&surface).expect("apply");

    let node = surface.node(comparison.binding().id()).expect("attached");
    assert_eq!(
        node.content,
        NodeContent::Comparison {
            title: Some("150".to_owned()),
            primary_label: Some("150".to_owned()),
            change_label: Some("+50%".to_owned()),
            height: 120,
        }
    );
}

#[test]
fn comparison_without_secondary_has_no_change() {
    let context = small_context();
    let comparison = context.new_comparison();
    comparison.set_primary(&ascending(&context));
    comparison.set_title(Some("load vs. yesterday"));
    let surface = Surface::new();
    comparison.apply(&surface).expect("apply");

    match surface.node(comparison.binding().id()).map(|n| n.content) {
        Some(NodeContent::Comparison {
            title,
            primary_label,
            change_label,
            ..
        }) => {
            assert_eq!(title.as_deref(), Some("load vs. yesterday"));
            assert_eq!(primary_label.as_deref(), Some("99"));
            assert_eq!(change_label, None);
        }
        other => panic!("unexpected node {other:?}"),
    }
}

#[test]
fn axis_labels_track_the_window() {
    let (backend, context) = setup();
    let axis = context.new_axis();
    assert_eq!(axis.orientation(), Orientation::default());
    assert_eq!(axis.tick_padding(), 3);
    axis.set_tick_format(Rc::new(|time: DateTime<Utc>| time.format("%H:%M:%S").to_string()));
    let surface = Surface::new();
    axis.apply(&surface).expect("apply");

    let labels = |surface: &Surface| match surface.node(axis.binding().id()).map(|n| n.content) {
        Some(NodeContent::Axis {
            range_labels,
            focus_label,
            ..
        }) => (range_labels, focus_label),
        other => panic!("unexpected node {other:?}"),
    };

    assert_eq!(
        labels(&surface),
        (Some(("12:53:10".to_owned(), "16:53:10".to_owned())), None)
    );

    context.focus(0);
    assert_eq!(labels(&surface).1.as_deref(), Some("12:53:10"));

    context.start();
    backend.event_loop().advance(Duration::from_secs(10));
    assert_eq!(
        labels(&surface).0,
        Some(("12:53:20".to_owned(), "16:53:20".to_owned()))
    );
}

#[test]
fn axis_default_format_depends_on_step() {
    let (_, context) = setup();
    let axis = context.new_axis();
    assert_eq!((axis.tick_format())(epoch()), "04:53:20 PM");

    context
        .set_step(Duration::from_secs(60))
        .expect("valid step");
    assert_eq!((axis.tick_format())(epoch()), "04:53 PM");
}

#[test]
fn surface_nodes_serialize_with_their_kind() {
    let (_, context) = setup();
    let rule = context.new_rule();
    let surface = Surface::new();
    rule.apply(&surface).expect("apply");

    let json = serde_json::to_string(&surface.children()).expect("serialize");
    assert!(json.contains(r#""kind":"rule""#));
}
