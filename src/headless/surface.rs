use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::core::{HorizonMode, Orientation, TickSpec};

/// Identity of a chart element across surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub u64);

/// Summary of what an element would draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeContent {
    /// Host-owned node, not produced by a chart element.
    Static(String),
    Axis {
        orientation: Orientation,
        ticks: TickSpec,
        /// Formatted start and stop of the displayed window.
        range_labels: Option<(String, String)>,
        focus_label: Option<String>,
    },
    Rule {
        /// Indices where the bound metric is non-zero.
        marks: Vec<usize>,
        focus: Option<usize>,
    },
    Horizon {
        title: Option<String>,
        value_label: Option<String>,
        mode: HorizonMode,
        height: u32,
        /// Number of color bands each side of the baseline.
        bands: usize,
    },
    Comparison {
        title: Option<String>,
        primary_label: Option<String>,
        change_label: Option<String>,
        height: u32,
    },
}

/// A child of a [`Surface`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceNode {
    pub owner: Option<ElementId>,
    pub content: NodeContent,
    /// How many times the owner has rendered into this node.
    pub renders: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SurfaceState {
    children: Vec<SurfaceNode>,
}

/// Headless stand-in for a DOM selection: an ordered list of child nodes.
///
/// Clones alias the same surface.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    inner: Rc<RefCell<SurfaceState>>,
}

impl Surface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node not owned by any chart element.
    pub fn append_static(&self, label: impl Into<String>) {
        self.inner.borrow_mut().children.push(SurfaceNode {
            owner: None,
            content: NodeContent::Static(label.into()),
            renders: 0,
        });
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.inner.borrow().children.len()
    }

    #[must_use]
    pub fn children(&self) -> Vec<SurfaceNode> {
        self.inner.borrow().children.clone()
    }

    /// The node rendered by `owner`, if attached.
    #[must_use]
    pub fn node(&self, owner: ElementId) -> Option<SurfaceNode> {
        self.inner
            .borrow()
            .children
            .iter()
            .find(|node| node.owner == Some(owner))
            .cloned()
    }

    #[must_use]
    pub fn same_surface(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Renders `content` for `owner`, updating its node in place when present.
    pub(crate) fn upsert(&self, owner: ElementId, content: NodeContent) {
        let mut state = self.inner.borrow_mut();
        match state
            .children
            .iter_mut()
            .find(|node| node.owner == Some(owner))
        {
            Some(node) => {
                node.content = content;
                node.renders += 1;
            }
            None => state.children.push(SurfaceNode {
                owner: Some(owner),
                content,
                renders: 1,
            }),
        }
    }

    /// Removes the node of `owner`. Returns whether one was attached.
    pub(crate) fn detach(&self, owner: ElementId) -> bool {
        let mut state = self.inner.borrow_mut();
        let before = state.children.len();
        state.children.retain(|node| node.owner != Some(owner));
        state.children.len() != before
    }

    pub(crate) fn downgrade(&self) -> WeakSurface {
        WeakSurface {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WeakSurface {
    inner: Weak<RefCell<SurfaceState>>,
}

impl WeakSurface {
    pub(crate) fn upgrade(&self) -> Option<Surface> {
        self.inner.upgrade().map(|inner| Surface { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_updates_in_place() {
        let surface = Surface::new();
        surface.append_static("header");
        let id = ElementId(7);
        let content = NodeContent::Rule {
            marks: vec![],
            focus: None,
        };
        surface.upsert(id, content.clone());
        surface.upsert(id, content);
        assert_eq!(surface.child_count(), 2);
        assert_eq!(surface.node(id).map(|node| node.renders), Some(2));
        assert!(surface.detach(id));
        assert!(!surface.detach(id));
        assert_eq!(surface.child_count(), 1);
    }
}
