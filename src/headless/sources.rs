use std::fmt::Write as _;
use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::binding::{
    Completion, ContextBinding, CubeBinding, FindCallback, GraphiteBinding, LibratoBinding,
    RawRequest, RequestWindow,
};
use crate::core::Summarize;
use crate::core::types::millis_to_datetime;
use crate::error::{CubismError, CubismResult};

use super::transport::{HttpRequest, Transport};
use super::{HeadlessBackend, HeadlessContext, HeadlessMetric};

/// Graphite's native resolution; coarser steps need a summarize target.
const GRAPHITE_NATIVE_STEP_MS: f64 = 1e4;
const LIBRATO_API: &str = "https://metrics-api.librato.com/v1/metrics";
const LIBRATO_RESOLUTIONS_SECS: [u64; 4] = [1, 60, 900, 3600];

/// Percent-encodes `input` the way browsers' `encodeURIComponent` does.
#[must_use]
pub fn encode_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(char::from(byte)),
            other => {
                let _ = write!(encoded, "%{other:02X}");
            }
        }
    }
    encoded
}

/// Parses Graphite's raw render format, `name,start,end,step|v,v,...`.
///
/// The first value is dropped; `None` and unparseable values become NaN.
pub fn parse_graphite_raw(text: &str) -> CubismResult<Vec<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CubismError::Parse("empty graphite response".to_owned()));
    }
    let (_, values) = text
        .split_once('|')
        .ok_or_else(|| CubismError::Parse(format!("malformed graphite response: {text}")))?;
    Ok(values
        .split(',')
        .skip(1)
        .map(|value| value.trim().parse::<f64>().unwrap_or(f64::NAN))
        .collect())
}

#[derive(Deserialize)]
struct FindResponse {
    metrics: Vec<FoundMetric>,
}

#[derive(Deserialize)]
struct FoundMetric {
    path: String,
}

/// Parses the `format=completer` response of Graphite's metric finder.
pub fn parse_graphite_find(text: &str) -> CubismResult<Vec<String>> {
    let response: FindResponse = serde_json::from_str(text)
        .map_err(|err| CubismError::Parse(format!("graphite find response: {err}")))?;
    Ok(response.metrics.into_iter().map(|found| found.path).collect())
}

#[derive(Deserialize)]
struct CubeSample {
    #[serde(default)]
    value: Option<f64>,
}

/// Parses a Cube metric response; samples without a value become NaN.
pub fn parse_cube_json(text: &str) -> CubismResult<Vec<f64>> {
    let samples: Vec<CubeSample> = serde_json::from_str(text)
        .map_err(|err| CubismError::Parse(format!("cube response: {err}")))?;
    Ok(samples
        .into_iter()
        .map(|sample| sample.value.unwrap_or(f64::NAN))
        .collect())
}

fn graphite_target(expression: &str, summarize: Summarize, step_ms: f64) -> String {
    if step_ms == GRAPHITE_NATIVE_STEP_MS {
        return expression.to_owned();
    }
    let interval = if step_ms % 3.6e6 == 0.0 {
        format!("{}hour", step_ms / 3.6e6)
    } else if step_ms % 6e4 == 0.0 {
        format!("{}min", step_ms / 6e4)
    } else {
        format!("{}sec", step_ms / 1e3)
    };
    format!(
        "summarize({expression},'{interval}','{}')",
        summarize.as_str()
    )
}

fn epoch_seconds(time_ms: f64) -> i64 {
    (time_ms / 1000.0).floor() as i64
}

fn cube_time(time_ms: f64) -> String {
    millis_to_datetime(time_ms)
        .map(|time| time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        .unwrap_or_default()
}

/// Fetches `request` and hands the parsed body to `completion`.
fn fetch_into(
    transport: &Rc<dyn Transport>,
    request: HttpRequest,
    parse: fn(&str) -> CubismResult<Vec<f64>>,
    completion: Completion,
) {
    transport.fetch(
        request,
        Box::new(move |body| completion.finish(body.and_then(|text| parse(&text)))),
    );
}

/// Graphite data source of the headless runtime.
#[derive(Clone)]
pub struct HeadlessGraphite {
    context: HeadlessContext,
    host: String,
}

impl HeadlessGraphite {
    pub(crate) fn new(context: HeadlessContext, host: &str) -> Self {
        Self {
            context,
            host: host.trim_end_matches('/').to_owned(),
        }
    }

    /// URL of the render request for `expression` over `window`.
    #[must_use]
    pub fn render_url(&self, expression: &str, summarize: Summarize, window: RequestWindow) -> String {
        let target = graphite_target(expression, summarize, window.step_ms);
        format!(
            "{}/render?format=raw&target={}&from={}&until={}",
            self.host,
            encode_component(&format!("alias({target},'')")),
            epoch_seconds(window.start_ms - 2.0 * window.step_ms),
            epoch_seconds(window.stop_ms - 1000.0),
        )
    }
}

impl GraphiteBinding<HeadlessBackend> for HeadlessGraphite {
    fn metric(&self, expression: &str, summarize: Summarize) -> HeadlessMetric {
        let source = self.clone();
        let transport = self.context.backend().transport();
        let target = expression.to_owned();
        let request: RawRequest = Rc::new(move |window, completion| {
            let url = source.render_url(&target, summarize, window);
            fetch_into(&transport, HttpRequest::get(url), parse_graphite_raw, completion);
        });
        self.context.metric(request, Some(expression))
    }

    fn find(&self, pattern: &str, callback: FindCallback) {
        let url = format!(
            "{}/metrics/find?format=completer&query={}",
            self.host,
            encode_component(pattern)
        );
        self.context.backend().transport().fetch(
            HttpRequest::get(url),
            Box::new(move |body| callback(body.and_then(|text| parse_graphite_find(&text)))),
        );
    }

    fn host(&self) -> String {
        self.host.clone()
    }
}

/// Cube data source of the headless runtime.
#[derive(Clone)]
pub struct HeadlessCube {
    context: HeadlessContext,
    host: String,
}

impl HeadlessCube {
    pub(crate) fn new(context: HeadlessContext, host: &str) -> Self {
        Self {
            context,
            host: host.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn metric_url(&self, expression: &str, window: RequestWindow) -> String {
        format!(
            "{}/1.0/metric?expression={}&start={}&stop={}&step={}",
            self.host,
            encode_component(expression),
            cube_time(window.start_ms),
            cube_time(window.stop_ms),
            window.step_ms,
        )
    }
}

impl CubeBinding<HeadlessBackend> for HeadlessCube {
    fn metric(&self, expression: &str) -> HeadlessMetric {
        let source = self.clone();
        let transport = self.context.backend().transport();
        let owned = expression.to_owned();
        let request: RawRequest = Rc::new(move |window, completion| {
            let url = source.metric_url(&owned, window);
            fetch_into(&transport, HttpRequest::get(url), parse_cube_json, completion);
        });
        self.context.metric(request, Some(expression))
    }

    fn host(&self) -> String {
        self.host.clone()
    }
}

#[derive(Deserialize)]
struct LibratoPage {
    #[serde(default)]
    measurements: IndexMap<String, Vec<LibratoMeasurement>>,
    #[serde(default)]
    query: Option<LibratoQuery>,
}

#[derive(Deserialize)]
struct LibratoMeasurement {
    measure_time: i64,
    value: f64,
}

#[derive(Deserialize)]
struct LibratoQuery {
    #[serde(default)]
    next_time: Option<i64>,
}

/// Librato data source of the headless runtime.
#[derive(Clone)]
pub struct HeadlessLibrato {
    context: HeadlessContext,
    authorization: String,
}

impl HeadlessLibrato {
    pub(crate) fn new(context: HeadlessContext, user: &str, token: &str) -> Self {
        Self {
            context,
            authorization: format!("Basic {}", STANDARD.encode(format!("{user}:{token}"))),
        }
    }

    /// Coarsest Librato resolution not exceeding the step.
    #[must_use]
    pub fn resolution_secs(step_ms: f64) -> u64 {
        let step_secs = (step_ms / 1000.0).floor().max(0.0) as u64;
        LIBRATO_RESOLUTIONS_SECS
            .into_iter()
            .filter(|resolution| *resolution <= step_secs)
            .max()
            .unwrap_or(LIBRATO_RESOLUTIONS_SECS[0])
    }

    #[must_use]
    pub fn page_url(name: &str, source: &str, start_secs: i64, end_secs: i64, step_ms: f64) -> String {
        format!(
            "{LIBRATO_API}/{}?source={}&start_time={start_secs}&end_time={end_secs}&resolution={}",
            encode_component(name),
            encode_component(source),
            Self::resolution_secs(step_ms),
        )
    }
}

struct LibratoFetch {
    transport: Rc<dyn Transport>,
    authorization: String,
    name: String,
    source: String,
    window: RequestWindow,
    values: Vec<f64>,
}

impl LibratoFetch {
    fn next_page(self, start_secs: i64, completion: Completion) {
        let end_secs = epoch_seconds(self.window.stop_ms);
        let url = HeadlessLibrato::page_url(
            &self.name,
            &self.source,
            start_secs,
            end_secs,
            self.window.step_ms,
        );
        let request = HttpRequest::get(url).with_authorization(self.authorization.clone());
        let transport = Rc::clone(&self.transport);
        transport.fetch(
            request,
            Box::new(move |body| {
                let page = body.and_then(|text| {
                    serde_json::from_str::<LibratoPage>(&text)
                        .map_err(|err| CubismError::Parse(format!("librato response: {err}")))
                });
                match page {
                    Ok(page) => self.receive(page, start_secs, completion),
                    Err(err) => completion.finish(Err(err)),
                }
            }),
        );
    }

    fn receive(mut self, page: LibratoPage, start_secs: i64, completion: Completion) {
        for measurement in page.measurements.values().flatten() {
            let offset = (measurement.measure_time as f64 * 1000.0 - self.window.start_ms)
                / self.window.step_ms;
            let index = offset.floor();
            if index >= 0.0 && (index as usize) < self.values.len() {
                self.values[index as usize] = measurement.value;
            }
        }
        match page.query.and_then(|query| query.next_time) {
            Some(next) if next > start_secs => {
                tracing::trace!(metric = %self.name, next, "following librato pagination");
                self.next_page(next, completion);
            }
            _ => completion.complete(self.values),
        }
    }
}

impl LibratoBinding<HeadlessBackend> for HeadlessLibrato {
    fn metric(&self, name: &str, source: &str) -> HeadlessMetric {
        let transport = self.context.backend().transport();
        let authorization = self.authorization.clone();
        let (owned_name, owned_source) = (name.to_owned(), source.to_owned());
        let request: RawRequest = Rc::new(move |window: RequestWindow, completion| {
            let fetch = LibratoFetch {
                transport: Rc::clone(&transport),
                authorization: authorization.clone(),
                name: owned_name.clone(),
                source: owned_source.clone(),
                window,
                values: vec![f64::NAN; window.sample_count()],
            };
            fetch.next_page(epoch_seconds(window.start_ms), completion);
        });
        self.context.metric(request, Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_component_keeps_unreserved_marks() {
        assert_eq!(encode_component("alias(a.b,'')"), "alias(a.b%2C'')");
        assert_eq!(encode_component("sum(*) x"), "sum(*)%20x");
        assert_eq!(encode_component("é"), "%C3%A9");
    }

    #[test]
    fn graphite_raw_drops_first_value_and_maps_none() {
        let values = parse_graphite_raw("cpu,100,130,10|1.0,2.0,None,4.5\n").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 2.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 4.5);
    }

    #[test]
    fn graphite_raw_rejects_empty_body() {
        assert!(matches!(parse_graphite_raw(""), Err(CubismError::Parse(_))));
        assert!(matches!(parse_graphite_raw("no-separator"), Err(CubismError::Parse(_))));
    }

    #[test]
    fn summarize_target_tracks_step_unit() {
        assert_eq!(graphite_target("a", Summarize::Sum, 1e4), "a");
        assert_eq!(
            graphite_target("a", Summarize::Sum, 7.2e6),
            "summarize(a,'2hour','sum')"
        );
        assert_eq!(
            graphite_target("a", Summarize::Max, 6e4),
            "summarize(a,'1min','max')"
        );
        assert_eq!(
            graphite_target("a", Summarize::Avg, 5e3),
            "summarize(a,'5sec','avg')"
        );
    }

    #[test]
    fn cube_samples_without_value_are_missing() {
        let values =
            parse_cube_json(r#"[{"time":"2014-01-01T00:00:00.000Z","value":3},{"time":"x"}]"#)
                .unwrap();
        assert_eq!(values[0], 3.0);
        assert!(values[1].is_nan());
    }

    #[test]
    fn librato_resolution_is_coarsest_fitting() {
        assert_eq!(HeadlessLibrato::resolution_secs(500.0), 1);
        assert_eq!(HeadlessLibrato::resolution_secs(1e4), 1);
        assert_eq!(HeadlessLibrato::resolution_secs(6e4), 60);
        assert_eq!(HeadlessLibrato::resolution_secs(3.6e6), 3600);
        assert_eq!(HeadlessLibrato::resolution_secs(8.64e7), 3600);
    }
}
