use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::binding::{ContextBinding, MetricBinding};
use crate::error::CubismResult;
use crate::event::{EventType, RawListener};

use super::surface::{ElementId, NodeContent, Surface, WeakSurface};
use super::{HeadlessContext, HeadlessMetric};

/// An event the element redraws on.
pub(crate) enum Subscription {
    Context(EventType),
    Metric(HeadlessMetric, EventType),
}

/// Configuration and rendering of one chart element kind.
pub(crate) trait ElementState: 'static {
    const CLASS: &'static str;

    fn render(&self, context: &HeadlessContext) -> NodeContent;

    /// Events that should trigger a redraw, given the current configuration.
    fn subscriptions(&self) -> Vec<Subscription>;
}

/// Apply/remove lifecycle shared by the chart elements.
pub(crate) struct Element<S> {
    id: ElementId,
    context: HeadlessContext,
    state: RefCell<S>,
    surfaces: RefCell<Vec<WeakSurface>>,
    active: RefCell<Vec<Subscription>>,
}

impl<S: ElementState> Element<S> {
    pub(crate) fn new(context: HeadlessContext, state: S) -> Rc<Self> {
        Rc::new(Self {
            id: ElementId(context.backend().next_id()),
            context,
            state: RefCell::new(state),
            surfaces: RefCell::new(Vec::new()),
            active: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn id(&self) -> ElementId {
        self.id
    }

    pub(crate) fn context(&self) -> &HeadlessContext {
        &self.context
    }

    pub(crate) fn state(&self) -> Ref<'_, S> {
        self.state.borrow()
    }

    pub(crate) fn update(&self, change: impl FnOnce(&mut S)) {
        change(&mut self.state.borrow_mut());
    }

    fn namespace(&self) -> String {
        format!("{}-{}", S::CLASS, self.id.0)
    }

    pub(crate) fn apply(self: &Rc<Self>, surface: &Surface) -> CubismResult<()> {
        {
            let mut surfaces = self.surfaces.borrow_mut();
            surfaces.retain(|weak| weak.upgrade().is_some());
            if !surfaces
                .iter()
                .filter_map(WeakSurface::upgrade)
                .any(|known| known.same_surface(surface))
            {
                surfaces.push(surface.downgrade());
            }
        }
        tracing::debug!(class = S::CLASS, id = self.id.0, "applying chart element");
        self.render_into(surface);
        self.resubscribe();
        Ok(())
    }

    pub(crate) fn remove(&self, surface: &Surface) -> CubismResult<()> {
        let detached = surface.detach(self.id);
        let remaining = {
            let mut surfaces = self.surfaces.borrow_mut();
            surfaces.retain(|weak| {
                weak.upgrade()
                    .is_some_and(|known| !known.same_surface(surface))
            });
            surfaces.len()
        };
        if remaining == 0 {
            self.unsubscribe();
        }
        tracing::debug!(
            class = S::CLASS,
            id = self.id.0,
            detached,
            remaining,
            "removed chart element"
        );
        Ok(())
    }

    fn resubscribe(self: &Rc<Self>) {
        self.unsubscribe();
        let subscriptions = self.state.borrow().subscriptions();
        let namespace = self.namespace();
        for subscription in &subscriptions {
            let weak: Weak<Self> = Rc::downgrade(self);
            let listener: RawListener = Rc::new(move |_| {
                if let Some(element) = weak.upgrade() {
                    element.render_all();
                }
            });
            self.attach(subscription, &namespace, Some(listener));
        }
        *self.active.borrow_mut() = subscriptions;
    }

    fn unsubscribe(&self) {
        let active = std::mem::take(&mut *self.active.borrow_mut());
        let namespace = self.namespace();
        for subscription in &active {
            self.attach(subscription, &namespace, None);
        }
    }

    fn attach(&self, subscription: &Subscription, namespace: &str, listener: Option<RawListener>) {
        match subscription {
            Subscription::Context(event) => {
                let event = event.clone().with_namespace(namespace);
                self.context.on(&event, listener);
            }
            Subscription::Metric(metric, event) => {
                let event = event.clone().with_namespace(namespace);
                metric.on(&event, listener);
            }
        }
    }

    fn render_into(&self, surface: &Surface) {
        let content = self.state.borrow().render(&self.context);
        surface.upsert(self.id, content);
    }

    fn render_all(&self) {
        let surfaces: Vec<Surface> = self
            .surfaces
            .borrow()
            .iter()
            .filter_map(WeakSurface::upgrade)
            .collect();
        if surfaces.is_empty() {
            tracing::debug!(class = S::CLASS, id = self.id.0, "all surfaces dropped");
            self.unsubscribe();
            return;
        }
        let content = self.state.borrow().render(&self.context);
        tracing::trace!(class = S::CLASS, id = self.id.0, "redrawing chart element");
        for surface in surfaces {
            surface.upsert(self.id, content.clone());
        }
    }
}

/// Index shown by value labels: the focus, or the newest sample.
pub(crate) fn display_index(context: &HeadlessContext) -> Option<usize> {
    context
        .focus_index()
        .or_else(|| context.size().checked_sub(1))
}

/// Value of `metric` at the displayed index, if it is a number.
pub(crate) fn displayed_value(context: &HeadlessContext, metric: &HeadlessMetric) -> Option<f64> {
    let value = metric.value_at(display_index(context)?);
    (!value.is_nan()).then_some(value)
}
