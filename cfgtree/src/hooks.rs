//! Lifecycle hooks.
//!
//! Each [`Section`] holds an ordered list of handlers. When an event is raised
//! on a section, its handlers run in registration order and the event then
//! travels to the parent section, so a handler on the root observes the whole
//! tree. A handler returning `Ok(Some(node))` stops the walk and its node
//! becomes the result of the dispatch. An `Err` stops it too and is returned
//! to whoever raised the event.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::item::Item;
use crate::section::{Node, Section};

/// The kinds of event a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// A name did not resolve.
    NotFound,
    /// An item was attached to a section.
    ItemAdded,
    /// A section was attached to a section.
    SectionAdded,
    /// An item's stored value changed.
    ValueChanged,
}

/// Before and after state of one value mutation.
///
/// Values are the stored values, not the effective ones: a `None` here means
/// the item had no custom value, whatever its default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Change {
    /// Stored value before the mutation.
    pub old_value: Option<Value>,
    /// Stored value after the mutation.
    pub new_value: Option<Value>,
    /// Raw string before the mutation.
    pub old_raw_str_value: Option<String>,
    /// Raw string after the mutation.
    pub new_raw_str_value: Option<String>,
}

impl Change {
    /// Whether the value or its raw notation differs between both sides.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.old_value != self.new_value || self.old_raw_str_value != self.new_raw_str_value
    }
}

/// An event travelling up the tree.
#[derive(Debug)]
pub enum Event<'a> {
    /// `name` was looked up in `section` and is not there.
    NotFound {
        /// The section that was searched.
        section: &'a Section,
        /// The missing name.
        name: &'a str,
    },
    /// `item` was attached to `section` under `alias`.
    ItemAdded {
        /// The new parent.
        section: &'a Section,
        /// The key it was added under.
        alias: &'a str,
        /// The attached item.
        item: &'a Item,
    },
    /// `subject` was attached to `section` under `alias`.
    SectionAdded {
        /// The new parent.
        section: &'a Section,
        /// The key it was added under.
        alias: &'a str,
        /// The attached section.
        subject: &'a Section,
    },
    /// `item` changed.
    ValueChanged {
        /// The mutated item.
        item: &'a Item,
        /// What changed.
        change: &'a Change,
    },
}

impl Event<'_> {
    /// The kind of this event.
    #[must_use]
    pub const fn kind(&self) -> HookKind {
        match self {
            Self::NotFound { .. } => HookKind::NotFound,
            Self::ItemAdded { .. } => HookKind::ItemAdded,
            Self::SectionAdded { .. } => HookKind::SectionAdded,
            Self::ValueChanged { .. } => HookKind::ValueChanged,
        }
    }
}

/// A registered handler.
pub type HookHandler = Rc<dyn Fn(&Event<'_>) -> Result<Option<Node>>>;

/// Identifies a registration so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

#[derive(Default)]
pub(crate) struct Hooks {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(HookId, HookKind, HookHandler)>>,
}

impl Hooks {
    pub(crate) fn register(&self, kind: HookKind, handler: HookHandler) -> HookId {
        let id = HookId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, kind, handler));
        id
    }

    pub(crate) fn unregister(&self, id: HookId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(hid, _, _)| *hid != id);
        handlers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Runs the handlers for `event` in order until one produces a node.
    ///
    /// Handlers are collected before any runs, so a handler may register or
    /// remove hooks on this same section.
    pub(crate) fn run(&self, event: &Event<'_>) -> Result<Option<Node>> {
        let kind = event.kind();
        let matching: Vec<HookHandler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect();
        for handler in matching {
            if let Some(node) = handler(event)? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("handlers", &self.len()).finish()
    }
}
