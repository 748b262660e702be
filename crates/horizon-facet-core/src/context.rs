//! Binding contexts.
//!
//! A [`BindingContext`] is the data object currently in scope for a subtree of
//! controls. It is a shared handle: a store holding one structured value, plus
//! a base path into that store. Cloning a context shares the store.
//!
//! Rebinding a subtree (a table row, a nested form section) derives a
//! [`child`](BindingContext::child) context with a longer base path over the
//! same store, so edits made through the child are visible to every other
//! holder of the store. Callers that need isolation take a
//! [`snapshot`](BindingContext::snapshot) and build a fresh context from it.
//!
//! # Example
//!
//! ```
//! use horizon_facet_core::{BindingContext, DataKey};
//! use serde_json::json;
//!
//! let ctx = BindingContext::new(json!({"rows": [{"id": 1, "name": "A"}]}));
//! let row = ctx.child(&DataKey::parse("rows")).row(0);
//!
//! row.write(&DataKey::parse("name"), json!("Alpha")).unwrap();
//! assert_eq!(ctx.read(&DataKey::parse("rows[0].name")), Some(json!("Alpha")));
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::BindingError;
use crate::logging::targets;
use crate::path::{self, DataKey, DataPath};

/// Shared, rebindable view onto a structured value.
#[derive(Clone)]
pub struct BindingContext {
    store: Arc<RwLock<Value>>,
    base: DataPath,
}

impl BindingContext {
    /// Create a context owning a new store.
    pub fn new(value: Value) -> Self {
        Self {
            store: Arc::new(RwLock::new(value)),
            base: DataPath::root(),
        }
    }

    /// Create a context over an empty mapping.
    pub fn empty() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }

    /// The path of this context inside its store.
    pub fn base(&self) -> &DataPath {
        &self.base
    }

    /// Whether two contexts share the same store.
    pub fn shares_store(&self, other: &BindingContext) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    /// Derive a context rebased at `key` relative to this one.
    ///
    /// The self-reference key yields an equivalent context.
    pub fn child(&self, key: &DataKey) -> BindingContext {
        Self {
            store: self.store.clone(),
            base: self.base.join(key),
        }
    }

    /// Derive a context for element `index` of the sequence this context addresses.
    pub fn row(&self, index: usize) -> BindingContext {
        Self {
            store: self.store.clone(),
            base: self.base.with_index(index),
        }
    }

    /// Run `f` against the value addressed by `key`, without cloning.
    pub fn with_value<F, R>(&self, key: &DataKey, f: F) -> R
    where
        F: FnOnce(Option<&Value>) -> R,
    {
        let store = self.store.read();
        let context = path::read(Some(&*store), &DataKey::from(self.base.clone()));
        f(path::read(context, key))
    }

    /// Read (a clone of) the value addressed by `key`.
    pub fn read(&self, key: &DataKey) -> Option<Value> {
        self.with_value(key, |value| value.cloned())
    }

    /// Whether this context currently resolves to a non-null value.
    pub fn is_defined(&self) -> bool {
        self.with_value(&DataKey::SelfRef, |value| value.is_some_and(|v| !v.is_null()))
    }

    /// Length of the sequence at `key`, or 0 if it is not a sequence.
    pub fn sequence_len(&self, key: &DataKey) -> usize {
        self.with_value(key, |value| value.and_then(Value::as_array).map_or(0, Vec::len))
    }

    /// Write `value` at `key`.
    ///
    /// Fails with [`BindingError::UndefinedContext`] if this context's base no
    /// longer resolves, or resolves to null.
    pub fn write(&self, key: &DataKey, value: Value) -> Result<(), BindingError> {
        let mut store = self.store.write();
        let context = path::read_mut(Some(&mut *store), &DataKey::from(self.base.clone()));
        let result = path::write(context, key, value).map_err(|err| err.at(&self.base.join(key)));
        drop(store);

        match &result {
            Ok(()) => {
                tracing::trace!(target: targets::BINDING, base = %self.base, %key, "binding write");
            }
            Err(err) => {
                tracing::debug!(target: targets::BINDING, %err, "binding write rejected");
            }
        }
        result
    }

    /// Remove the value at `key` from its parent.
    pub fn remove(&self, key: &DataKey) -> Option<Value> {
        let mut store = self.store.write();
        let context = path::read_mut(Some(&mut *store), &DataKey::from(self.base.clone()));
        path::remove(context, key)
    }

    /// Clone of the whole value this context addresses (null if unresolvable).
    pub fn snapshot(&self) -> Value {
        self.read(&DataKey::SelfRef).unwrap_or(Value::Null)
    }

    /// Replace the whole value this context addresses.
    pub fn replace(&self, value: Value) -> Result<(), BindingError> {
        self.write(&DataKey::SelfRef, value)
    }

    /// Create a weak handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakBindingContext {
        WeakBindingContext {
            store: Arc::downgrade(&self.store),
            base: self.base.clone(),
        }
    }
}

impl Default for BindingContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("base", &self.base.to_string())
            .field("value", &self.snapshot())
            .finish()
    }
}

/// A non-owning handle to a [`BindingContext`].
///
/// Deferred completions (network responses, timers) hold this instead of a
/// strong context, so that once the owning view is torn down the completion
/// degrades to a no-op.
#[derive(Clone)]
pub struct WeakBindingContext {
    store: Weak<RwLock<Value>>,
    base: DataPath,
}

impl WeakBindingContext {
    /// Upgrade to a strong context if the store is still alive.
    pub fn upgrade(&self) -> Option<BindingContext> {
        self.store.upgrade().map(|store| BindingContext {
            store,
            base: self.base.clone(),
        })
    }

    /// Whether the store has been released.
    pub fn is_released(&self) -> bool {
        self.store.strong_count() == 0
    }

    /// Write through if the context is still alive.
    ///
    /// Returns `None` when the context has been released.
    pub fn write_if_alive(&self, key: &DataKey, value: Value) -> Option<Result<(), BindingError>> {
        match self.upgrade() {
            Some(ctx) => Some(ctx.write(key, value)),
            None => {
                tracing::debug!(
                    target: targets::BINDING,
                    base = %self.base,
                    %key,
                    "context released, dropping deferred write"
                );
                None
            }
        }
    }
}

impl fmt::Debug for WeakBindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakBindingContext")
            .field("base", &self.base.to_string())
            .field("released", &self.is_released())
            .finish()
    }
}
