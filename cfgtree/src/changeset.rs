//! Tracking and rolling back value changes.
//!
//! A [`ChangesetContext`] watches the `value_changed` events of a section
//! while it is active and keeps, per item, the list of changes seen. The
//! log can be inspected as net changes or rolled back.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::hooks::{Change, HookId};
use crate::item::Item;
use crate::section::Section;

type ChangeLog = Vec<(Item, Vec<Change>)>;

struct ContextInner {
    section: Section,
    log: RefCell<ChangeLog>,
    hook: Cell<Option<HookId>>,
    auto_reset: bool,
}

impl ContextInner {
    fn record(&self, item: &Item, change: &Change) {
        let mut log = self.log.borrow_mut();
        match log.iter_mut().find(|(tracked, _)| tracked.ptr_eq(item)) {
            Some((_, changes)) => changes.push(change.clone()),
            None => log.push((item.clone(), vec![change.clone()])),
        }
    }
}

/// Records value changes below a section.
///
/// # Examples
///
/// ```
/// use cfgtree::Config;
/// use serde_json::json;
///
/// let config = Config::from_schema(json!({"threads": 1, "name": "svc"})).unwrap();
/// let changeset = config.changeset_context(false);
/// {
///     let _scope = changeset.scope().unwrap();
///     config.set_value("threads", 4).unwrap();
///     config.set_value("threads", 8).unwrap();
/// }
/// assert_eq!(changeset.len(), 1);
/// changeset.reset();
/// assert_eq!(config.get("threads").unwrap(), Some(json!(1)));
/// ```
#[derive(Clone)]
pub struct ChangesetContext {
    inner: Rc<ContextInner>,
}

impl ChangesetContext {
    /// Creates an inactive context over `section`. With `auto_reset`, every
    /// [`pop`](Self::pop) rolls the recorded changes back.
    #[must_use]
    pub fn new(section: Section, auto_reset: bool) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                section,
                log: RefCell::new(Vec::new()),
                hook: Cell::new(None),
                auto_reset,
            }),
        }
    }

    /// Whether changes are currently being recorded.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.hook.get().is_some()
    }

    /// Starts recording.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Changeset`] if the context is already active or the
    /// tree has hooks disabled.
    pub fn push(&self) -> Result<()> {
        if self.is_active() {
            return Err(Error::Changeset {
                message: "changeset context is already active".to_string(),
            });
        }
        if self.inner.section.with_settings(|s| s.hooks_enabled == Some(false)) {
            return Err(Error::Changeset {
                message: "hooks are disabled for this tree".to_string(),
            });
        }
        let weak: Weak<ContextInner> = Rc::downgrade(&self.inner);
        let id = self.inner.section.on_value_changed(move |item, change| {
            if let Some(inner) = weak.upgrade() {
                inner.record(item, change);
            }
            Ok(())
        });
        self.inner.hook.set(Some(id));
        Ok(())
    }

    /// Stops recording, rolling back first if the context auto-resets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Changeset`] if the context is not active.
    pub fn pop(&self) -> Result<()> {
        let Some(id) = self.inner.hook.take() else {
            return Err(Error::Changeset {
                message: "changeset context is not active".to_string(),
            });
        };
        self.inner.section.unregister_hook(id);
        if self.inner.auto_reset {
            self.reset();
        }
        Ok(())
    }

    /// Starts recording until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Fails like [`push`](Self::push).
    pub fn scope(&self) -> Result<ChangesetGuard<'_>> {
        self.push()?;
        Ok(ChangesetGuard {
            context: self,
            active: true,
        })
    }

    /// New value per changed item.
    ///
    /// An item changed once is reported whenever that change took effect,
    /// even if only its raw string differs. An item changed several times
    /// is reported only if its value differs from before the first change.
    #[must_use]
    pub fn values(&self) -> Vec<(Item, Option<Value>)> {
        self.inner
            .log
            .borrow()
            .iter()
            .filter_map(|(item, changes)| match changes.as_slice() {
                [only] => only
                    .is_effective()
                    .then(|| (item.clone(), only.new_value.clone())),
                [first, .., last] => (first.old_value != last.new_value)
                    .then(|| (item.clone(), last.new_value.clone())),
                [] => None,
            })
            .collect()
    }

    /// Collapsed change per item whose value or raw string differs from
    /// before the first recorded change.
    #[must_use]
    pub fn changes(&self) -> Vec<(Item, Change)> {
        self.inner
            .log
            .borrow()
            .iter()
            .filter_map(|(item, changes)| {
                let first = changes.first()?;
                let last = changes.last()?;
                let change = Change {
                    old_value: first.old_value.clone(),
                    new_value: last.new_value.clone(),
                    old_raw_str_value: first.old_raw_str_value.clone(),
                    new_raw_str_value: last.new_raw_str_value.clone(),
                };
                change.is_effective().then(|| (item.clone(), change))
            })
            .collect()
    }

    /// Number of items with an effective change.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes().len()
    }

    /// Whether no item has an effective change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Puts every tracked item back to its state before the first recorded
    /// change and clears the log. Raises no events.
    pub fn reset(&self) {
        let log = std::mem::take(&mut *self.inner.log.borrow_mut());
        for (item, changes) in log.into_iter().rev() {
            if let Some(first) = changes.into_iter().next() {
                item.restore(first.old_value, first.old_raw_str_value);
            }
        }
    }

    /// Rolls back one item. Returns false if it has no recorded changes.
    pub fn reset_item(&self, item: &Item) -> bool {
        let entry = {
            let mut log = self.inner.log.borrow_mut();
            let index = log.iter().position(|(tracked, _)| tracked.ptr_eq(item));
            index.map(|index| log.remove(index))
        };
        match entry {
            Some((tracked, changes)) => {
                if let Some(first) = changes.into_iter().next() {
                    tracked.restore(first.old_value, first.old_raw_str_value);
                }
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ChangesetContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangesetContext")
            .field("active", &self.is_active())
            .field("tracked", &self.inner.log.borrow().len())
            .field("auto_reset", &self.inner.auto_reset)
            .finish()
    }
}

/// Keeps a [`ChangesetContext`] active until dropped.
#[must_use = "recording stops as soon as the guard is dropped"]
pub struct ChangesetGuard<'a> {
    context: &'a ChangesetContext,
    active: bool,
}

impl ChangesetGuard<'_> {
    /// The guarded context.
    #[must_use]
    pub const fn context(&self) -> &ChangesetContext {
        self.context
    }

    /// Stops recording now.
    ///
    /// # Errors
    ///
    /// Fails like [`ChangesetContext::pop`].
    pub fn finish(mut self) -> Result<()> {
        self.active = false;
        self.context.pop()
    }
}

impl Drop for ChangesetGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.context.pop() {
                log::warn!("failed to close changeset scope: {e}");
            }
        }
    }
}

impl fmt::Debug for ChangesetGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangesetGuard")
            .field("active", &self.active)
            .finish()
    }
}
