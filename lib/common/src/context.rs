use rdf_adaptive_model::Operation;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed token for accessing an entry of an [ActionContext].
pub struct ContextKey<T> {
    name: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> Debug for ContextKey<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContextKey({})", self.name)
    }
}

/// An immutable dictionary that threads configuration through (recursive) mediator calls.
///
/// Modifications return a new context and leave the original untouched. Entries are shared
/// between the copies.
#[derive(Clone, Default)]
pub struct ActionContext {
    entries: Arc<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context in which `key` maps to `value`.
    #[must_use]
    pub fn set<T: Any + Send + Sync>(&self, key: ContextKey<T>, value: T) -> Self {
        let mut entries = HashMap::clone(&self.entries);
        entries.insert(key.name, Arc::new(value));
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns a copy of this context without `key`.
    #[must_use]
    pub fn delete<T>(&self, key: ContextKey<T>) -> Self {
        if !self.entries.contains_key(key.name) {
            return self.clone();
        }

        let mut entries = HashMap::clone(&self.entries);
        entries.remove(key.name);
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn get<T: Any + Send + Sync>(&self, key: ContextKey<T>) -> Option<&T> {
        self.entries
            .get(key.name)
            .and_then(|value| (**value).downcast_ref::<T>())
    }

    pub fn has<T>(&self, key: ContextKey<T>) -> bool {
        self.entries.contains_key(key.name)
    }
}

impl Debug for ActionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut keys = self.entries.keys().collect::<Vec<_>>();
        keys.sort();
        f.debug_struct("ActionContext").field("keys", &keys).finish()
    }
}

/// Context entries that control the adaptive join.
pub struct KeysRdfJoin;

impl KeysRdfJoin {
    /// Disables adaptive join actors for all joins that are executed with this context.
    pub const SKIP_ADAPTIVE_JOIN: ContextKey<bool> =
        ContextKey::new("urn:rdf-adaptive:join#skip-adaptive-join");
    /// The operations that have already been wrapped by an adaptive join further up.
    pub const WRAPPED_OPERATIONS: ContextKey<Vec<Operation>> =
        ContextKey::new("urn:rdf-adaptive:join#wrapped-operations");
}

/// Context entries that describe the operation that is currently evaluated.
pub struct KeysQueryOperation;

impl KeysQueryOperation {
    /// The operation that is currently being evaluated.
    pub const OPERATION: ContextKey<Operation> =
        ContextKey::new("urn:rdf-adaptive:query-operation#operation");
    /// The identifiers of the sources the current operation is evaluated against.
    pub const SOURCE_IDS: ContextKey<Vec<String>> =
        ContextKey::new("urn:rdf-adaptive:query-operation#source-ids");
}
