use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{CubismError, CubismResult};

/// An HTTP GET issued by a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    /// Value of the `Authorization` header, if any.
    pub authorization: Option<String>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authorization: None,
        }
    }

    #[must_use]
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }
}

/// Receives the response body of a fetch.
pub type FetchCallback = Box<dyn FnOnce(CubismResult<String>)>;

/// Network seam of the headless data sources.
///
/// Implementations may invoke the callback synchronously or hold it until a
/// response arrives.
pub trait Transport {
    fn fetch(&self, request: HttpRequest, callback: FetchCallback);
}

/// Transport for environments without network access; every fetch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

impl Transport for OfflineTransport {
    fn fetch(&self, request: HttpRequest, callback: FetchCallback) {
        tracing::debug!(url = %request.url, "offline transport refused request");
        callback(Err(CubismError::Transport(format!(
            "no network transport configured for {}",
            request.url
        ))));
    }
}

#[derive(Default)]
struct CannedState {
    routes: IndexMap<String, String>,
    log: Vec<HttpRequest>,
}

/// Transport answering from canned bodies keyed by URL prefix.
///
/// Clones share routes and the request log, so a test can keep one handle
/// while the backend owns another. The longest matching prefix wins.
#[derive(Clone, Default)]
pub struct CannedTransport {
    state: Rc<RefCell<CannedState>>,
}

impl CannedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for every URL starting with `prefix`.
    #[must_use]
    pub fn route(self, prefix: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(prefix, body);
        self
    }

    pub fn insert(&self, prefix: impl Into<String>, body: impl Into<String>) {
        self.state
            .borrow_mut()
            .routes
            .insert(prefix.into(), body.into());
    }

    /// Every request seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.borrow().log.clone()
    }

    fn lookup(&self, url: &str) -> Option<String> {
        self.state
            .borrow()
            .routes
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, body)| body.clone())
    }
}

impl Transport for CannedTransport {
    fn fetch(&self, request: HttpRequest, callback: FetchCallback) {
        let body = self.lookup(&request.url);
        tracing::trace!(url = %request.url, hit = body.is_some(), "canned transport request");
        let url = request.url.clone();
        self.state.borrow_mut().log.push(request);
        callback(body.ok_or_else(|| CubismError::Transport(format!("no canned response for {url}"))));
    }
}
