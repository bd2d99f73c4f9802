use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::binding::{ContextBinding, RawRequest};
use crate::core::TimeScale;
use crate::core::types::{
    DEFAULT_CLIENT_DELAY_MS, DEFAULT_SERVER_DELAY_MS, DEFAULT_SIZE, DEFAULT_STEP_MS,
};
use crate::error::CubismResult;
use crate::event::{Dispatch, EventKind, EventType, ForeignEvent, RawListener};

use super::event_loop::TimerId;
use super::{
    HeadlessAxis, HeadlessBackend, HeadlessComparison, HeadlessCube, HeadlessGraphite,
    HeadlessHorizon, HeadlessLibrato, HeadlessMetric, HeadlessRule,
};

struct Window {
    step_ms: f64,
    size: usize,
    server_delay_ms: f64,
    client_delay_ms: f64,
    /// Currently displayed window.
    start0: f64,
    stop0: f64,
    /// Window the next prepare event announces.
    start1: f64,
    stop1: f64,
    focus: Option<usize>,
    prepare_timer: Option<TimerId>,
    change_timer: Option<TimerId>,
}

impl Window {
    fn update(&mut self, now_ms: f64) {
        let span = self.size as f64 * self.step_ms;
        self.stop0 = ((now_ms - self.server_delay_ms - self.client_delay_ms) / self.step_ms)
            .floor()
            * self.step_ms;
        self.start0 = self.stop0 - span;
        self.stop1 = ((now_ms - self.server_delay_ms) / self.step_ms).floor() * self.step_ms;
        self.start1 = self.stop1 - span;
    }
}

pub(crate) struct ContextInner {
    backend: HeadlessBackend,
    window: RefCell<Window>,
    events: RefCell<Dispatch<RawListener>>,
}

/// Context handle of the headless runtime.
#[derive(Clone)]
pub struct HeadlessContext {
    inner: Rc<ContextInner>,
}

impl HeadlessContext {
    pub(crate) fn new(backend: HeadlessBackend) -> Self {
        let mut window = Window {
            step_ms: DEFAULT_STEP_MS,
            size: DEFAULT_SIZE,
            server_delay_ms: DEFAULT_SERVER_DELAY_MS,
            client_delay_ms: DEFAULT_CLIENT_DELAY_MS,
            start0: 0.0,
            stop0: 0.0,
            start1: 0.0,
            stop1: 0.0,
            focus: None,
            prepare_timer: None,
            change_timer: None,
        };
        window.update(backend.event_loop().now_ms());
        Self {
            inner: Rc::new(ContextInner {
                backend,
                window: RefCell::new(window),
                events: RefCell::new(Dispatch::new(&EventKind::ALL)),
            }),
        }
    }

    pub(crate) fn backend(&self) -> &HeadlessBackend {
        &self.inner.backend
    }

    /// Whether both handles alias the same context.
    #[must_use]
    pub fn same_context(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Currently displayed window as `(start, stop)` epoch milliseconds.
    #[must_use]
    pub fn displayed_window_ms(&self) -> (f64, f64) {
        let window = self.inner.window.borrow();
        (window.start0, window.stop0)
    }

    /// Whether the refresh cycle is scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.window.borrow().prepare_timer.is_some()
    }

    fn configure(&self, change: impl FnOnce(&mut Window)) {
        let now = self.inner.backend.event_loop().now_ms();
        let mut window = self.inner.window.borrow_mut();
        change(&mut window);
        window.update(now);
    }

    fn emit(&self, kind: EventKind, event: ForeignEvent) {
        let listeners = self.inner.events.borrow().listeners(kind);
        tracing::trace!(%kind, listeners = listeners.len(), "context event");
        for listener in listeners {
            listener(event);
        }
    }

    fn range(start_ms: f64, stop_ms: f64) -> ForeignEvent {
        ForeignEvent::Range { start_ms, stop_ms }
    }

    fn focus_event(focus: Option<usize>) -> ForeignEvent {
        ForeignEvent::Focus {
            index: focus.map(|index| index as f64),
        }
    }

    fn schedule_prepare(weak: Weak<ContextInner>, delay_ms: f64) -> Option<TimerId> {
        let inner = weak.upgrade()?;
        let id = inner
            .backend
            .event_loop()
            .set_timeout(delay_ms, move || Self::prepare(weak));
        Some(id)
    }

    fn prepare(weak: Weak<ContextInner>) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let context = Self { inner };
        let event_loop = context.inner.backend.event_loop().clone();
        let (start1, stop1, step, client_delay) = {
            let mut window = context.inner.window.borrow_mut();
            let now = event_loop.now_ms();
            window.stop1 = ((now - window.server_delay_ms) / window.step_ms).floor() * window.step_ms;
            window.start1 = window.stop1 - window.size as f64 * window.step_ms;
            (
                window.start1,
                window.stop1,
                window.step_ms,
                window.client_delay_ms,
            )
        };

        context.emit(EventKind::Prepare, Self::range(start1, stop1));

        let change_weak = Rc::downgrade(&context.inner);
        let change_timer = event_loop.set_timeout(client_delay, move || {
            if let Some(inner) = change_weak.upgrade() {
                Self { inner }.advance_window(start1, stop1);
            }
        });
        let prepare_timer = Self::schedule_prepare(Rc::downgrade(&context.inner), step);

        let mut window = context.inner.window.borrow_mut();
        window.change_timer = Some(change_timer);
        window.prepare_timer = prepare_timer;
    }

    fn advance_window(&self, start: f64, stop: f64) {
        let focus = {
            let mut window = self.inner.window.borrow_mut();
            window.start0 = start;
            window.stop0 = stop;
            window.change_timer = None;
            window.focus
        };
        self.emit(EventKind::BeforeChange, Self::range(start, stop));
        self.emit(EventKind::Change, Self::range(start, stop));
        self.emit(EventKind::Focus, Self::focus_event(focus));
    }

    fn clear_timers(&self) {
        let event_loop = self.inner.backend.event_loop();
        let mut window = self.inner.window.borrow_mut();
        for timer in [window.prepare_timer.take(), window.change_timer.take()]
            .into_iter()
            .flatten()
        {
            event_loop.clear_timeout(timer);
        }
    }
}

impl ContextBinding<HeadlessBackend> for HeadlessContext {
    fn step_ms(&self) -> f64 {
        self.inner.window.borrow().step_ms
    }

    fn set_step_ms(&self, step_ms: f64) {
        self.configure(|window| window.step_ms = step_ms);
    }

    fn size(&self) -> usize {
        self.inner.window.borrow().size
    }

    fn set_size(&self, size: usize) {
        self.configure(|window| window.size = size);
    }

    fn server_delay_ms(&self) -> f64 {
        self.inner.window.borrow().server_delay_ms
    }

    fn set_server_delay_ms(&self, delay_ms: f64) {
        self.configure(|window| window.server_delay_ms = delay_ms);
    }

    fn client_delay_ms(&self) -> f64 {
        self.inner.window.borrow().client_delay_ms
    }

    fn set_client_delay_ms(&self, delay_ms: f64) {
        self.configure(|window| window.client_delay_ms = delay_ms);
    }

    fn graphite(&self, host: &str) -> HeadlessGraphite {
        HeadlessGraphite::new(self.clone(), host)
    }

    fn cube(&self, host: &str) -> HeadlessCube {
        HeadlessCube::new(self.clone(), host)
    }

    fn librato(&self, user: &str, token: &str) -> HeadlessLibrato {
        HeadlessLibrato::new(self.clone(), user, token)
    }

    fn constant(&self, value: f64) -> HeadlessMetric {
        HeadlessMetric::constant(self.clone(), value)
    }

    fn metric(&self, request: RawRequest, name: Option<&str>) -> HeadlessMetric {
        HeadlessMetric::requested(self.clone(), request, name.map(str::to_owned))
    }

    fn axis(&self) -> HeadlessAxis {
        HeadlessAxis::new(self.clone())
    }

    fn rule(&self) -> HeadlessRule {
        HeadlessRule::new(self.clone())
    }

    fn horizon(&self) -> HeadlessHorizon {
        HeadlessHorizon::new(self.clone())
    }

    fn comparison(&self) -> HeadlessComparison {
        HeadlessComparison::new(self.clone())
    }

    fn scale(&self) -> CubismResult<TimeScale> {
        let window = self.inner.window.borrow();
        TimeScale::from_millis((window.start0, window.stop0), (0.0, window.size as f64))
    }

    fn start(&self) {
        self.clear_timers();
        let now = self.inner.backend.event_loop().now_ms();
        let delay = {
            let window = self.inner.window.borrow();
            let mut delay = window.stop1 + window.server_delay_ms - now;
            // Too late for this window's prepare: wait for the next one.
            if delay < window.client_delay_ms {
                delay += window.step_ms;
            }
            delay
        };
        tracing::debug!(delay_ms = delay, "context refresh cycle started");
        let timer = Self::schedule_prepare(Rc::downgrade(&self.inner), delay);
        self.inner.window.borrow_mut().prepare_timer = timer;
    }

    fn stop(&self) {
        self.clear_timers();
        tracing::debug!("context refresh cycle stopped");
    }

    fn on(&self, event: &EventType, listener: Option<RawListener>) {
        self.inner.events.borrow_mut().on(event, listener.clone());
        let Some(listener) = listener else {
            return;
        };
        // Late listeners catch up with the current state immediately.
        let replay = {
            let window = self.inner.window.borrow();
            match event.kind() {
                EventKind::Prepare => Self::range(window.start1, window.stop1),
                EventKind::BeforeChange | EventKind::Change => {
                    Self::range(window.start0, window.stop0)
                }
                EventKind::Focus => Self::focus_event(window.focus),
            }
        };
        listener(replay);
    }

    fn has_listener(&self, event: &EventType) -> bool {
        self.inner.events.borrow().get(event).is_some()
    }

    fn focus(&self, index: Option<usize>) {
        self.inner.window.borrow_mut().focus = index;
        self.emit(EventKind::Focus, Self::focus_event(index));
    }

    fn focus_index(&self) -> Option<usize> {
        self.inner.window.borrow().focus
    }
}

