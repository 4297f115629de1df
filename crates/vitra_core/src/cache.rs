//! Single-slot texture cache with change notification

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`TextureCache::on_update`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Rc<dyn Fn(Option<&T>)>;

/// Holds the most recently captured backdrop texture
///
/// Every [`set`](Self::set) notifies each listener exactly once, including
/// transitions to empty, so renderers know when to redraw. Listeners may read
/// the cache (or even set it) from inside their callback.
pub struct TextureCache<T> {
    slot: RefCell<Option<T>>,
    listeners: RefCell<Vec<(ListenerId, Listener<T>)>>,
    next_listener: Cell<u64>,
    generation: Cell<u64>,
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self {
            slot: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            generation: Cell::new(0),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for TextureCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureCache")
            .field("slot", &self.slot)
            .field("listeners", &self.listeners.borrow().len())
            .field("generation", &self.generation.get())
            .finish()
    }
}

impl<T: Clone> TextureCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached texture, if any
    pub fn current(&self) -> Option<T> {
        self.slot.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.borrow().is_none()
    }

    /// Number of `set` calls so far
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Replace the cached value and notify listeners
    pub fn set(&self, texture: Option<T>) {
        // drop the old value outside the borrow
        let _previous = self.slot.replace(texture);
        self.generation.set(self.generation.get() + 1);

        let snapshot: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        let current = self.current();
        for listener in snapshot {
            listener(current.as_ref());
        }
    }

    /// Register a callback run after every update
    pub fn on_update(&self, listener: impl Fn(Option<&T>) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Unregister a callback. Returns false if it was already gone.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(l, _)| *l != id);
        listeners.len() != before
    }
}
