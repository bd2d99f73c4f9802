use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::DateTime;
use cubism_rs::api::{Context, Cubism};
use cubism_rs::core::Summarize;
use cubism_rs::headless::{CannedTransport, HttpRequest};
use cubism_rs::{CubismError, HeadlessBackend};

/// Three ten-second samples ending ten seconds before 2014-05-13T16:53:20Z.
fn context_with(transport: &CannedTransport) -> Context<HeadlessBackend> {
    let epoch = DateTime::from_timestamp(1_400_000_000, 0).expect("valid epoch");
    let backend = HeadlessBackend::at(epoch).with_transport(transport.clone());
    let context = Cubism::new(backend).context().expect("context");
    context.set_size(3).expect("valid size");
    context
}

#[test]
fn graphite_requests_raw_render_window() {
    let transport = CannedTransport::new().route(
        "http://graphite.test/render",
        "cpu,1399999940,1399999990,10|9,1.0,2.0,None\n",
    );
    let context = context_with(&transport);
    let graphite = context.graphite("http://graphite.test/");
    assert_eq!(graphite.url(), "http://graphite.test");

    let metric = graphite.metric("cpu");
    assert_eq!(metric.to_string(), "cpu");
    metric.on_change(|_| {});

    assert_eq!(
        transport.requests(),
        vec![HttpRequest::get(
            "http://graphite.test/render?format=raw&target=alias(cpu%2C'')&from=1399999940&until=1399999989"
        )]
    );
    assert_eq!(metric.value_at(0), Some(1.0));
    assert_eq!(metric.value_at(1), Some(2.0));
    assert_eq!(metric.value_at(2), None);
}

#[test]
fn graphite_summarizes_coarse_steps() {
    let transport = CannedTransport::new().route("http://graphite.test/render", "m,0,0,60|0,5");
    let context = context_with(&transport);
    context
        .set_step(Duration::from_secs(60))
        .expect("valid step");
    context.set_size(1).expect("valid size");

    let metric = context
        .graphite("http://graphite.test")
        .metric_summarized("hits", Summarize::Max);
    metric.on_change(|_| {});

    let url = &transport.requests()[0].url;
    assert!(
        url.contains("target=alias(summarize(hits%2C'1min'%2C'max')%2C'')"),
        "unexpected url {url}"
    );
    assert_eq!(metric.value_at(0), Some(5.0));
}

#[test]
fn graphite_find_lists_paths() {
    let transport = CannedTransport::new().route(
        "http://graphite.test/metrics/find?format=completer&query=servers.*",
        r#"{"metrics":[{"path":"servers.a.cpu","name":"cpu"},{"path":"servers.b.cpu","name":"cpu"}]}"#,
    );
    let context = context_with(&transport);
    let found = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&found);

    context
        .graphite("http://graphite.test")
        .find("servers.*", move |result| *sink.borrow_mut() = Some(result));

    assert_eq!(
        found.borrow_mut().take(),
        Some(Ok(vec!["servers.a.cpu".to_owned(), "servers.b.cpu".to_owned()]))
    );
}

#[test]
fn graphite_find_reports_transport_errors() {
    let transport = CannedTransport::new();
    let context = context_with(&transport);
    let found = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&found);

    context
        .graphite("http://graphite.test")
        .find("servers.*", move |result| *sink.borrow_mut() = Some(result));

    assert!(matches!(
        found.borrow_mut().take(),
        Some(Err(CubismError::Transport(_)))
    ));
}

#[test]
fn cube_requests_iso_window() {
    let transport = CannedTransport::new().route(
        "http://cube.test/1.0/metric",
        r#"[{"time":"2014-05-13T16:52:40.000Z","value":1},{"time":"2014-05-13T16:52:50.000Z","value":2},{"time":"2014-05-13T16:53:00.000Z"}]"#,
    );
    let context = context_with(&transport);
    let cube = context.cube("http://cube.test");
    assert_eq!(cube.url(), "http://cube.test");

    let metric = cube.metric("sum(request)");
    metric.on_change(|_| {});

    assert_eq!(
        transport.requests()[0].url,
        "http://cube.test/1.0/metric?expression=sum(request)&start=2014-05-13T16:52:40.000Z&stop=2014-05-13T16:53:10.000Z&step=10000"
    );
    assert_eq!(metric.value_at(0), Some(1.0));
    assert_eq!(metric.value_at(1), Some(2.0));
    assert_eq!(metric.value_at(2), None);
}

#[test]
fn librato_authenticates_and_buckets_measurements() {
    let transport = CannedTransport::new().route(
        "https://metrics-api.librato.com/v1/metrics/cpu?source=web1",
        r#"{"measurements":{"web1":[{"measure_time":1399999960,"value":4.0},{"measure_time":1399999975,"value":5.0}]},"query":{}}"#,
    );
    let context = context_with(&transport);
    let metric = context.librato("user", "token").metric("cpu", "web1");
    metric.on_change(|_| {});

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        HttpRequest::get(
            "https://metrics-api.librato.com/v1/metrics/cpu?source=web1&start_time=1399999960&end_time=1399999990&resolution=1"
        )
        .with_authorization("Basic dXNlcjp0b2tlbg==")
    );
    assert_eq!(metric.value_at(0), Some(4.0));
    assert_eq!(metric.value_at(1), Some(5.0));
    assert_eq!(metric.value_at(2), None);
}

#[test]
fn librato_follows_pagination() {
    let base = "https://metrics-api.librato.com/v1/metrics/cpu?source=web1";
    let transport = CannedTransport::new()
        .route(
            format!("{base}&start_time=1399999960"),
            r#"{"measurements":{"web1":[{"measure_time":1399999960,"value":4.0}]},"query":{"next_time":1399999980}}"#,
        )
        .route(
            format!("{base}&start_time=1399999980"),
            r#"{"measurements":{"web1":[{"measure_time":1399999980,"value":6.0}]}}"#,
        );
    let context = context_with(&transport);
    let metric = context.librato("user", "token").metric("cpu", "web1");
    metric.on_change(|_| {});

    assert_eq!(transport.requests().len(), 2);
    assert_eq!(metric.value_at(0), Some(4.0));
    assert_eq!(metric.value_at(1), None);
    assert_eq!(metric.value_at(2), Some(6.0));
}

#[test]
fn failed_fetch_leaves_metric_empty() {
    let transport = CannedTransport::new().route("http://graphite.test/render", "garbage");
    let context = context_with(&transport);
    let metric = context.graphite("http://graphite.test").metric("cpu");
    metric.on_change(|_| {});

    assert_eq!(transport.requests().len(), 1);
    assert_eq!(metric.value_at(0), None);
    assert_eq!(metric.extent(), None);
}

#[test]
fn offline_backend_never_panics() {
    let epoch = DateTime::from_timestamp(1_400_000_000, 0).expect("valid epoch");
    let context = Cubism::new(HeadlessBackend::at(epoch))
        .context()
        .expect("context");
    let metric = context.cube("http://cube.test").metric("sum(request)");
    metric.on_change(|_| {});
    assert_eq!(metric.value_at(0), None);
}
