//! Observable values.
//!
//! A [`Property<T>`] holds a value together with the [`Signal`] that reports
//! its transitions. Assigning an equal value is not a transition and emits
//! nothing. Controls keep their recorded validation failure in one.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use horizon_facet_core::Property;
//!
//! let title = Property::new(String::from("Untitled"));
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = seen.clone();
//! title.changed().connect(move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! assert!(title.set("Orders".into()));
//! assert!(!title.set("Orders".into()));
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::signal::Signal;

pub struct Property<T> {
    value: RwLock<T>,
    changed: Signal<T>,
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            changed: Signal::new(),
        }
    }

    /// A clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Inspect the value in place.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Store `value` and emit [`changed`](Self::changed) if it differs from
    /// the current one. Returns whether it did.
    ///
    /// The lock is released before slots run, so a slot may read or set the
    /// property again.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.changed.emit(value);
        true
    }

    /// Emitted with the new value after each transition.
    pub fn changed(&self) -> &Signal<T> {
        &self.changed
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.value.read()).finish()
    }
}
