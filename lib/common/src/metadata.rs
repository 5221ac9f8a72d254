use crate::error::JoinResult;
use async_trait::async_trait;
use rdf_adaptive_model::{Cardinality, Variable};
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type InvalidateListener = Box<dyn FnOnce() + Send>;

struct ValidationInner {
    valid: bool,
    listeners: Vec<InvalidateListener>,
}

/// Tracks whether a [Metadata] snapshot is still up-to-date.
///
/// Listeners are one-shot. Once the state has been invalidated, every registered listener has
/// been called exactly once and the state stays invalid forever. Consumers that want to observe
/// further changes must fetch the metadata again and register a listener on the new state.
#[derive(Clone)]
pub struct MetadataValidationState {
    inner: Arc<Mutex<ValidationInner>>,
}

impl MetadataValidationState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ValidationInner {
                valid: true,
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ValidationInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_valid(&self) -> bool {
        self.lock().valid
    }

    /// Registers a listener that is called once this state is invalidated.
    ///
    /// If the state is already invalid, the listener is called immediately.
    pub fn add_invalidate_listener(&self, listener: impl FnOnce() + Send + 'static) {
        let mut inner = self.lock();
        if inner.valid {
            inner.listeners.push(Box::new(listener));
        } else {
            drop(inner);
            listener();
        }
    }

    /// Marks the state as invalid and notifies all listeners.
    ///
    /// Invalidating an invalid state does nothing.
    pub fn invalidate(&self) {
        let listeners = {
            let mut inner = self.lock();
            if !inner.valid {
                return;
            }
            inner.valid = false;
            std::mem::take(&mut inner.listeners)
        };

        for listener in listeners {
            listener();
        }
    }

    /// Returns a future that completes once this state has been invalidated.
    pub fn invalidated(&self) -> impl Future<Output = ()> + Send + 'static {
        let (sender, receiver) = tokio::sync::oneshot::channel::<()>();
        self.add_invalidate_listener(move || {
            sender.send(()).ok();
        });
        async move {
            receiver.await.ok();
        }
    }

    /// Returns whether `self` and `other` track the same snapshot.
    pub fn same_state(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for MetadataValidationState {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MetadataValidationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataValidationState")
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// A point-in-time snapshot of the metadata of a bindings stream.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub cardinality: Cardinality,
    pub state: MetadataValidationState,
    pub variables: Vec<Variable>,
}

impl Metadata {
    pub fn new(cardinality: Cardinality, variables: Vec<Variable>) -> Self {
        Self {
            cardinality,
            state: MetadataValidationState::new(),
            variables,
        }
    }
}

/// Provides the current metadata of a bindings stream.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Returns a snapshot of the current metadata.
    async fn metadata(&self) -> JoinResult<Metadata>;
}

pub type MetadataSourceRef = Arc<dyn MetadataSource>;

/// A [MetadataSource] whose cardinality can be updated while it is being consumed.
#[derive(Debug)]
pub struct MetadataCell {
    current: Mutex<Metadata>,
}

impl MetadataCell {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            current: Mutex::new(metadata),
        }
    }

    pub fn current(&self) -> Metadata {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs a new snapshot with `cardinality` and invalidates the previous one.
    pub fn update_cardinality(&self, cardinality: Cardinality) {
        let previous = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            let updated = Metadata {
                cardinality,
                state: MetadataValidationState::new(),
                variables: current.variables.clone(),
            };
            std::mem::replace(&mut *current, updated)
        };
        previous.state.invalidate();
    }
}

#[async_trait]
impl MetadataSource for MetadataCell {
    async fn metadata(&self) -> JoinResult<Metadata> {
        Ok(self.current())
    }
}
