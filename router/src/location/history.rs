use super::LocationSegments;
use crate::RouterError;
use core::fmt;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// How the history stack moved to reach a new location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Push,
    Replace,
    Pop,
}

/// A description of a completed move through the history stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    pub location: LocationSegments,
    pub action: HistoryAction,
}

/// Callback invoked after every location change.
pub type HistoryCallback = Rc<dyn Fn(&LocationChange)>;

/// The navigation primitives a router needs from its host: a browser's
/// `window.history`, a hash-based shim, or [`MemoryHistory`].
pub trait RouterHistory {
    /// The entry the history currently points at.
    fn location(&self) -> LocationSegments;

    /// Adds a new entry, discarding any forward entries.
    fn push(&self, path: &str) -> Result<(), RouterError>;

    /// Overwrites the current entry.
    fn replace(&self, path: &str) -> Result<(), RouterError>;

    /// Moves `delta` entries through the stack.
    fn go(&self, delta: isize) -> Result<(), RouterError>;

    fn go_back(&self) -> Result<(), RouterError> {
        self.go(-1)
    }

    fn go_forward(&self) -> Result<(), RouterError> {
        self.go(1)
    }

    /// Calls `callback` after every location change until the returned
    /// handle is dropped or removed.
    fn listen(&self, callback: HistoryCallback) -> HistoryListener;
}

/// Keeps a history callback registered. Dropping it unregisters the
/// callback.
#[must_use = "the history callback is removed as soon as this is dropped"]
pub struct HistoryListener {
    remove: Option<Box<dyn FnOnce()>>,
}

impl HistoryListener {
    pub fn new(remove: impl FnOnce() + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    pub fn remove(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for HistoryListener {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for HistoryListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryListener")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

/// A history stack held entirely in memory.
#[derive(Clone)]
pub struct MemoryHistory {
    inner: Rc<MemoryHistoryInner>,
}

struct MemoryHistoryInner {
    entries: RefCell<Vec<LocationSegments>>,
    index: Cell<usize>,
    listeners: RefCell<Vec<(usize, HistoryCallback)>>,
    next_listener: Cell<usize>,
}

impl fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHistory")
            .field("entries", &self.inner.entries.borrow())
            .field("index", &self.inner.index.get())
            .finish_non_exhaustive()
    }
}

impl MemoryHistory {
    /// Creates a stack holding a single entry for `initial`.
    pub fn new(initial: &str) -> Result<Self, RouterError> {
        let location = LocationSegments::parse(initial)?;
        Ok(Self {
            inner: Rc::new(MemoryHistoryInner {
                entries: RefCell::new(vec![location]),
                index: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        })
    }

    pub fn entries(&self) -> Vec<LocationSegments> {
        self.inner.entries.borrow().clone()
    }

    pub fn index(&self) -> usize {
        self.inner.index.get()
    }

    fn notify(&self, action: HistoryAction) {
        let change = LocationChange {
            location: self.location(),
            action,
        };
        // callbacks may navigate again, so none of our borrows can be live
        let listeners = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect::<Vec<_>>();
        for callback in listeners {
            callback(&change);
        }
    }
}

impl RouterHistory for MemoryHistory {
    fn location(&self) -> LocationSegments {
        self.inner.entries.borrow()[self.inner.index.get()].clone()
    }

    fn push(&self, path: &str) -> Result<(), RouterError> {
        let location = LocationSegments::parse(path)?;
        {
            let mut entries = self.inner.entries.borrow_mut();
            let index = self.inner.index.get();
            entries.truncate(index + 1);
            entries.push(location);
            self.inner.index.set(index + 1);
        }
        self.notify(HistoryAction::Push);
        Ok(())
    }

    fn replace(&self, path: &str) -> Result<(), RouterError> {
        let location = LocationSegments::parse(path)?;
        self.inner.entries.borrow_mut()[self.inner.index.get()] = location;
        self.notify(HistoryAction::Replace);
        Ok(())
    }

    fn go(&self, delta: isize) -> Result<(), RouterError> {
        let len = self.inner.entries.borrow().len();
        let target = self
            .inner
            .index
            .get()
            .checked_add_signed(delta)
            .filter(|target| *target < len)
            .ok_or(RouterError::HistoryExhausted { delta })?;
        self.inner.index.set(target);
        self.notify(HistoryAction::Pop);
        Ok(())
    }

    fn listen(&self, callback: HistoryCallback) -> HistoryListener {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, callback));

        let inner = Rc::downgrade(&self.inner);
        HistoryListener::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.borrow_mut().retain(|(other, _)| *other != id);
            }
        })
    }
}
