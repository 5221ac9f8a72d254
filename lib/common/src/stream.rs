use crate::error::JoinError;
use futures::{Stream, StreamExt};
use rdf_adaptive_model::Bindings;
use std::fmt::{Debug, Formatter};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

/// A stream of bindings. Dropping the stream destroys it.
pub type SendableBindingsStream =
    Pin<Box<dyn Stream<Item = Result<Bindings, JoinError>> + Send>>;

/// Creates a [SendableBindingsStream] that yields `bindings` in order.
pub fn bindings_stream_from_vec(bindings: Vec<Bindings>) -> SendableBindingsStream {
    Box::pin(futures::stream::iter(bindings.into_iter().map(Ok)))
}

enum SourceState {
    Open(SendableBindingsStream),
    Ended,
    Destroyed,
    Failed(JoinError),
}

struct SharedSource {
    state: SourceState,
    /// Everything that has been read from the source so far.
    history: Vec<Bindings>,
    /// Readers that are waiting for the source to make progress.
    waiting: Vec<Waker>,
    destroyed: bool,
}

impl SharedSource {
    fn wake_waiting(&mut self) {
        for waker in self.waiting.drain(..) {
            waker.wake();
        }
    }
}

/// The bindings stream of a join entry, which can be read multiple times.
///
/// Every call to [ClonableBindingsStream::clone_stream] returns an independent reader that first
/// replays what has already been read from the source and then continues reading the source.
/// The source itself is consumed at most once.
#[derive(Clone)]
pub struct ClonableBindingsStream {
    shared: Arc<Mutex<SharedSource>>,
}

impl ClonableBindingsStream {
    pub fn new(source: SendableBindingsStream) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SharedSource {
                state: SourceState::Open(source),
                history: Vec::new(),
                waiting: Vec::new(),
                destroyed: false,
            })),
        }
    }

    pub fn from_vec(bindings: Vec<Bindings>) -> Self {
        Self::new(bindings_stream_from_vec(bindings))
    }

    fn lock(&self) -> MutexGuard<'_, SharedSource> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a new reader of this stream.
    pub fn clone_stream(&self) -> ClonedBindingsStream {
        ClonedBindingsStream {
            shared: Arc::clone(&self.shared),
            position: 0,
            done: false,
        }
    }

    /// Destroys the source. Readers finish after replaying what has already been read.
    ///
    /// Returns `false` if the stream had already been destroyed.
    pub fn destroy(&self) -> bool {
        let mut shared = self.lock();
        if shared.destroyed {
            return false;
        }

        shared.destroyed = true;
        if matches!(shared.state, SourceState::Open(_)) {
            shared.state = SourceState::Destroyed;
        }
        shared.wake_waiting();
        true
    }

    /// Destroys the source with `error`. Readers yield `error` once they have replayed what has
    /// already been read.
    ///
    /// Returns `false` if the stream had already been destroyed.
    pub fn destroy_with_error(&self, error: JoinError) -> bool {
        let mut shared = self.lock();
        if shared.destroyed {
            return false;
        }

        shared.destroyed = true;
        if matches!(shared.state, SourceState::Open(_)) {
            shared.state = SourceState::Failed(error);
        }
        shared.wake_waiting();
        true
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    /// Returns whether the source has been consumed completely.
    pub fn is_ended(&self) -> bool {
        matches!(self.lock().state, SourceState::Ended)
    }
}

impl Debug for ClonableBindingsStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let shared = self.lock();
        f.debug_struct("ClonableBindingsStream")
            .field("buffered", &shared.history.len())
            .field("destroyed", &shared.destroyed)
            .finish()
    }
}

/// A reader of a [ClonableBindingsStream].
pub struct ClonedBindingsStream {
    shared: Arc<Mutex<SharedSource>>,
    /// The position of the next element in the history.
    position: usize,
    done: bool,
}

impl Stream for ClonedBindingsStream {
    type Item = Result<Bindings, JoinError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        let shared = Arc::clone(&self.shared);
        let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(bindings) = shared.history.get(self.position) {
            let bindings = bindings.clone();
            self.position += 1;
            return Poll::Ready(Some(Ok(bindings)));
        }

        let SourceState::Open(source) = &mut shared.state else {
            self.done = true;
            return match &shared.state {
                SourceState::Failed(error) => Poll::Ready(Some(Err(error.clone()))),
                _ => Poll::Ready(None),
            };
        };

        match source.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(bindings))) => {
                shared.history.push(bindings.clone());
                shared.wake_waiting();
                self.position += 1;
                Poll::Ready(Some(Ok(bindings)))
            }
            Poll::Ready(Some(Err(error))) => {
                shared.state = SourceState::Failed(error.clone());
                shared.wake_waiting();
                self.done = true;
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                shared.state = SourceState::Ended;
                shared.wake_waiting();
                self.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => {
                if !shared.waiting.iter().any(|w| w.will_wake(cx.waker())) {
                    shared.waiting.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl Drop for ClonedBindingsStream {
    fn drop(&mut self) {
        // The source may only know the waker of this reader.
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .wake_waiting();
    }
}
