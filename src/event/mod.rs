//! Typed events raised by contexts and metrics.
//!
//! The wrapped runtime addresses listeners with strings such as
//! `"change.myChart"`: an event name plus an optional namespace that lets
//! several listeners of the same kind coexist. Here the name is a closed
//! enumeration, parsed once at registration, and the positional foreign
//! callback arguments are translated into typed payloads.

mod dispatch;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::TimeRange;
use crate::error::{CubismError, CubismResult};

pub use dispatch::Dispatch;

/// Events a context (or, for `Change`, a metric) can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A new window is about to be requested from data sources.
    Prepare,
    /// The displayed window is about to advance.
    BeforeChange,
    /// The displayed window advanced.
    Change,
    /// The shared focus cursor moved or was cleared.
    Focus,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Prepare,
        EventKind::BeforeChange,
        EventKind::Change,
        EventKind::Focus,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::BeforeChange => "beforechange",
            Self::Change => "change",
            Self::Focus => "focus",
        }
    }

    /// Whether listeners of this kind receive a time range (as opposed to a focus index).
    #[must_use]
    pub const fn carries_range(self) -> bool {
        !matches!(self, Self::Focus)
    }
}

impl FromStr for EventKind {
    type Err = CubismError;

    fn from_str(input: &str) -> CubismResult<Self> {
        match input {
            "prepare" => Ok(Self::Prepare),
            "beforechange" => Ok(Self::BeforeChange),
            "change" => Ok(Self::Change),
            "focus" => Ok(Self::Focus),
            other => Err(CubismError::UnsupportedEventType(other.to_owned())),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event kind plus optional listener namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventType {
    kind: EventKind,
    namespace: Option<String>,
}

impl EventType {
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            namespace: None,
        }
    }

    #[must_use]
    pub fn namespaced(kind: EventKind, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            kind,
            namespace: (!namespace.is_empty()).then_some(namespace),
        }
    }

    #[must_use]
    pub fn change() -> Self {
        Self::new(EventKind::Change)
    }

    #[must_use]
    pub fn before_change() -> Self {
        Self::new(EventKind::BeforeChange)
    }

    #[must_use]
    pub fn prepare() -> Self {
        Self::new(EventKind::Prepare)
    }

    #[must_use]
    pub fn focus() -> Self {
        Self::new(EventKind::Focus)
    }

    /// Returns the same kind under another namespace.
    #[must_use]
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        Self::namespaced(self.kind, namespace)
    }

    /// Parses `"kind"` or `"kind.namespace"`; everything after the first dot is the namespace.
    pub fn parse(input: &str) -> CubismResult<Self> {
        let (name, namespace) = match input.split_once('.') {
            Some((name, namespace)) => (name, namespace),
            None => (input, ""),
        };
        let kind = name
            .parse::<EventKind>()
            .map_err(|_| CubismError::UnsupportedEventType(input.to_owned()))?;
        Ok(Self::namespaced(kind, namespace))
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl FromStr for EventType {
    type Err = CubismError;

    fn from_str(input: &str) -> CubismResult<Self> {
        Self::parse(input)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}.{namespace}", self.kind),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

impl From<EventKind> for EventType {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}

/// Arguments exactly as the foreign runtime passes them to a listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForeignEvent {
    /// Start and stop as epoch milliseconds; unfetched windows report non-finite bounds.
    Range { start_ms: f64, stop_ms: f64 },
    /// Focus position; `None` when focus is cleared.
    Focus { index: Option<f64> },
}

/// Listener in the foreign runtime's calling convention.
pub type RawListener = Rc<dyn Fn(ForeignEvent)>;

/// Typed payload delivered to context listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextEvent {
    Prepare(TimeRange),
    BeforeChange(TimeRange),
    Change(TimeRange),
    Focus(Option<usize>),
}

impl ContextEvent {
    #[must_use]
    pub fn kind(self) -> EventKind {
        match self {
            Self::Prepare(_) => EventKind::Prepare,
            Self::BeforeChange(_) => EventKind::BeforeChange,
            Self::Change(_) => EventKind::Change,
            Self::Focus(_) => EventKind::Focus,
        }
    }

    #[must_use]
    pub fn range(self) -> Option<TimeRange> {
        match self {
            Self::Prepare(range) | Self::BeforeChange(range) | Self::Change(range) => Some(range),
            Self::Focus(_) => None,
        }
    }
}

/// Translates foreign listener arguments for `kind` into a typed event.
///
/// Returns `None` when the arguments do not describe a usable event, such as
/// the unbounded window a metric reports before its first fetch.
#[must_use]
pub fn translate(kind: EventKind, event: ForeignEvent) -> Option<ContextEvent> {
    match (kind, event) {
        (EventKind::Focus, ForeignEvent::Focus { index }) => {
            Some(ContextEvent::Focus(index.and_then(focus_index)))
        }
        (EventKind::Prepare, ForeignEvent::Range { start_ms, stop_ms }) => {
            TimeRange::from_millis(start_ms, stop_ms).map(ContextEvent::Prepare)
        }
        (EventKind::BeforeChange, ForeignEvent::Range { start_ms, stop_ms }) => {
            TimeRange::from_millis(start_ms, stop_ms).map(ContextEvent::BeforeChange)
        }
        (EventKind::Change, ForeignEvent::Range { start_ms, stop_ms }) => {
            TimeRange::from_millis(start_ms, stop_ms).map(ContextEvent::Change)
        }
        (kind, event) => {
            tracing::warn!(%kind, ?event, "listener arguments do not match event kind");
            None
        }
    }
}

fn focus_index(raw: f64) -> Option<usize> {
    (raw.is_finite() && raw >= 0.0).then_some(raw.round() as usize)
}

/// Wraps a typed handler into the foreign calling convention for `kind`.
pub fn raw_listener(kind: EventKind, handler: Rc<dyn Fn(ContextEvent)>) -> RawListener {
    Rc::new(move |event| {
        if let Some(typed) = translate(kind, event) {
            tracing::trace!(?typed, "dispatching typed event");
            handler(typed);
        }
    })
}
