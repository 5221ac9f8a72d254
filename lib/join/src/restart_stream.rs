use crate::ledger::FingerprintLedger;
use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use rdf_adaptive_common::mediators::HashFunction;
use rdf_adaptive_common::{JoinResult, SendableBindingsStream};
use rdf_adaptive_model::Bindings;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{ready, Context, Poll, Waker};
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// Creates a fresh source for a [RestartableBindingsStream].
pub type CreateSourceFn =
    Arc<dyn Fn() -> BoxFuture<'static, JoinResult<SendableBindingsStream>> + Send + Sync>;

type OnEnd = Box<dyn FnOnce() + Send>;

struct RestartState {
    /// The active source. [None] while a replacement is being created or after termination.
    source: Option<SendableBindingsStream>,
    /// The replacement that is being created.
    pending_source: Option<BoxFuture<'static, JoinResult<SendableBindingsStream>>>,
    create_source: CreateSourceFn,
    hash_function: HashFunction,
    ledger: FingerprintLedger,
    /// When the source is swapped automatically, unless it has been swapped before.
    swap_deadline: Option<Instant>,
    /// Created on the first poll after `swap_deadline` has been set.
    swap_timer: Option<Pin<Box<Sleep>>>,
    swap_count: usize,
    /// The waker of the last consumer poll.
    waker: Option<Waker>,
    ended: bool,
}

impl RestartState {
    fn clear_timer(&mut self) {
        self.swap_deadline = None;
        self.swap_timer = None;
    }

    fn swap_source(&mut self) -> bool {
        if self.ended || self.pending_source.is_some() {
            return false;
        }
        let Some(source) = self.source.take() else {
            return false;
        };

        self.clear_timer();
        drop(source);
        self.ledger.start_generation();
        self.pending_source = Some((self.create_source)());
        self.swap_count += 1;

        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
        true
    }

    fn terminate(&mut self) {
        self.ended = true;
        self.source = None;
        self.pending_source = None;
        self.clear_timer();
        self.ledger.clear();
        self.waker = None;
    }

    fn poll_swap_timer(&mut self, cx: &mut Context<'_>) {
        let Some(deadline) = self.swap_deadline else {
            return;
        };

        let timer = self
            .swap_timer
            .get_or_insert_with(|| Box::pin(tokio::time::sleep_until(deadline)));
        if timer.as_mut().poll(cx).is_ready() {
            self.clear_timer();
            self.swap_source();
        }
    }

    fn poll_inner(&mut self, cx: &mut Context<'_>) -> Poll<Option<JoinResult<Bindings>>> {
        loop {
            if self.ended {
                return Poll::Ready(None);
            }
            self.waker = Some(cx.waker().clone());
            self.poll_swap_timer(cx);

            if let Some(pending_source) = &mut self.pending_source {
                let created = ready!(pending_source.as_mut().poll(cx));
                self.pending_source = None;
                match created {
                    Ok(source) => self.source = Some(source),
                    Err(error) => {
                        self.terminate();
                        return Poll::Ready(Some(Err(error)));
                    }
                }
            }

            let Some(source) = &mut self.source else {
                self.terminate();
                return Poll::Ready(None);
            };

            match ready!(source.poll_next_unpin(cx)) {
                Some(Ok(bindings)) => {
                    let fingerprint = (self.hash_function)(&bindings, bindings.variables());
                    if self.ledger.admit(fingerprint) {
                        return Poll::Ready(Some(Ok(bindings)));
                    }
                }
                Some(Err(error)) => {
                    self.terminate();
                    return Poll::Ready(Some(Err(error)));
                }
                None => {
                    self.terminate();
                    return Poll::Ready(None);
                }
            }
        }
    }
}

/// A bindings stream whose source can be replaced while it is being consumed.
///
/// After a swap, the new source re-derives rows that the abandoned sources have already
/// produced. These rows are suppressed based on their fingerprints (see [FingerprintLedger]).
/// This only yields correct results if all sources produce the same multiset of rows, e.g., if
/// they are differently ordered executions of the same join.
///
/// Dropping the stream, or reaching its end, destroys the active source and runs the
/// [RestartableBindingsStream::with_on_end] hook exactly once.
pub struct RestartableBindingsStream {
    state: Arc<Mutex<RestartState>>,
    on_end: Option<OnEnd>,
}

impl RestartableBindingsStream {
    /// Creates a new [RestartableBindingsStream] that starts with `source`. Replacements are
    /// created with `create_source`.
    pub fn new(
        source: SendableBindingsStream,
        create_source: CreateSourceFn,
        hash_function: HashFunction,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(RestartState {
                source: Some(source),
                pending_source: None,
                create_source,
                hash_function,
                ledger: FingerprintLedger::new(),
                swap_deadline: None,
                swap_timer: None,
                swap_count: 0,
                waker: None,
                ended: false,
            })),
            on_end: None,
        }
    }

    /// Swaps the source once after `timeout`, unless the source is swapped before.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.lock().swap_deadline = Some(Instant::now() + timeout);
        self
    }

    /// Registers a hook that runs once the stream has ended or is dropped.
    #[must_use]
    pub fn with_on_end(mut self, on_end: impl FnOnce() + Send + 'static) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }

    fn lock(&self) -> MutexGuard<'_, RestartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a handle that can swap the source without owning the stream.
    pub fn handle(&self) -> SwapHandle {
        SwapHandle {
            state: Arc::downgrade(&self.state),
        }
    }

    /// Destroys the active source and starts creating a replacement.
    ///
    /// Returns `false` if the stream has ended or if a replacement is already being created.
    pub fn swap_source(&self) -> bool {
        self.lock().swap_source()
    }

    /// The number of rows that have been forwarded so far.
    pub fn total_bindings_produced(&self) -> usize {
        self.lock().ledger.total_emitted()
    }

    pub fn swap_count(&self) -> usize {
        self.lock().swap_count
    }

    fn run_on_end(&mut self) {
        if let Some(on_end) = self.on_end.take() {
            on_end();
        }
    }
}

impl Stream for RestartableBindingsStream {
    type Item = JoinResult<Bindings>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let (result, ended) = {
            let mut state = self.lock();
            let result = state.poll_inner(cx);
            (result, state.ended)
        };

        if ended {
            self.run_on_end();
        }
        result
    }
}

impl Drop for RestartableBindingsStream {
    fn drop(&mut self) {
        self.lock().terminate();
        self.run_on_end();
    }
}

impl Debug for RestartableBindingsStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RestartableBindingsStream")
            .field("swap_count", &state.swap_count)
            .field("produced", &state.ledger.total_emitted())
            .field("ended", &state.ended)
            .finish_non_exhaustive()
    }
}

/// A non-owning handle to a [RestartableBindingsStream].
///
/// Once the stream has been dropped, the handle behaves as if the stream had ended.
#[derive(Clone)]
pub struct SwapHandle {
    state: Weak<Mutex<RestartState>>,
}

impl SwapHandle {
    fn with_state<T>(&self, default: T, f: impl FnOnce(&mut RestartState) -> T) -> T {
        match self.state.upgrade() {
            Some(state) => f(&mut state.lock().unwrap_or_else(PoisonError::into_inner)),
            None => default,
        }
    }

    /// See [RestartableBindingsStream::swap_source].
    pub fn swap_source(&self) -> bool {
        self.with_state(false, RestartState::swap_source)
    }

    pub fn total_bindings_produced(&self) -> usize {
        self.with_state(0, |state| state.ledger.total_emitted())
    }

    pub fn swap_count(&self) -> usize {
        self.with_state(0, |state| state.swap_count)
    }

    pub fn is_ended(&self) -> bool {
        self.with_state(true, |state| state.ended)
    }
}

impl Debug for SwapHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapHandle")
            .field("ended", &self.is_ended())
            .finish()
    }
}
