use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::Stream;

use crate::error::{classify, ErrorCategory, OperationResult};
use crate::store::RemoteStoreError;

/// Releases one underlying subscription. Must be invoked at most once;
/// [`ListenerHandle`] enforces that.
pub type CancelFn = Box<dyn FnOnce() + Send + 'static>;

struct CancelSlot {
    cancelled: bool,
    release: Option<CancelFn>,
}

struct HandleInner {
    // Mirror of the slot's `cancelled` flag, readable without the lock on
    // the event delivery path.
    cancelled: AtomicBool,
    slot: Mutex<CancelSlot>,
}

/// Cancelable token returned alongside every subscription stream.
///
/// `cancel` is idempotent and safe to call from any thread, including
/// concurrently with an in-flight event delivery: the racing event is either
/// delivered and then the stream stops, or not delivered at all. The
/// underlying subscription is released exactly once.
#[derive(Clone)]
pub struct ListenerHandle {
    inner: Arc<HandleInner>,
}

impl ListenerHandle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                cancelled: AtomicBool::new(false),
                slot: Mutex::new(CancelSlot {
                    cancelled: false,
                    release: None,
                }),
            }),
        }
    }

    /// Stops all future delivery and releases the underlying subscription.
    /// Calling this a second time is a no-op.
    pub fn cancel(&self) {
        let release = {
            let mut slot = self.inner.slot.lock().unwrap();
            if slot.cancelled {
                return;
            }
            slot.cancelled = true;
            self.inner.cancelled.store(true, Ordering::SeqCst);
            slot.release.take()
        };
        if let Some(release) = release {
            release();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Installs the release function once the subscribe call has returned
    /// it. If cancellation already happened in the meantime (a terminal
    /// event fired during registration), the release runs immediately.
    fn attach(&self, release: CancelFn) {
        let run_now = {
            let mut slot = self.inner.slot.lock().unwrap();
            if slot.cancelled {
                true
            } else {
                slot.release = Some(release);
                return;
            }
        };
        if run_now {
            release();
        }
    }
}

/// Per-event callback handed to the store's subscribe primitive. Each
/// invocation carries either a raw payload or the underlying failure.
pub struct EventSink<S> {
    callback: Arc<dyn Fn(Result<S, RemoteStoreError>) + Send + Sync + 'static>,
}

impl<S> Clone for EventSink<S> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<S> EventSink<S> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Result<S, RemoteStoreError>) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn emit(&self, event: Result<S, RemoteStoreError>) {
        (self.callback)(event);
    }
}

/// Push-driven sequence of transformed subscription events.
///
/// The stream ends after the first terminal failure or after the paired
/// handle is canceled; a fresh subscribe call is required to observe further
/// changes.
pub struct ListenerStream<T> {
    receiver: async_channel::Receiver<OperationResult<T>>,
}

impl<T> Stream for ListenerStream<T> {
    type Item = OperationResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

/// Bridges a subscribe/cancel-handle primitive into a stream plus handle.
///
/// `subscribe` registers the per-event sink with the underlying source and
/// returns its cancel function. `transform` maps each raw payload to a
/// stream item; a transform error is terminal for the stream, as is any
/// error reported by the source itself (classified under `category`).
pub fn bridge<S, T, Sub, Map>(
    category: ErrorCategory,
    subscribe: Sub,
    transform: Map,
) -> (ListenerStream<T>, ListenerHandle)
where
    S: Send + 'static,
    T: Send + 'static,
    Sub: FnOnce(EventSink<S>) -> CancelFn,
    Map: Fn(S) -> OperationResult<T> + Send + Sync + 'static,
{
    let (sender, receiver) = async_channel::unbounded();
    let handle = ListenerHandle::new();

    let sink_handle = handle.clone();
    let sink_sender = sender.clone();
    let sink = EventSink::new(move |event: Result<S, RemoteStoreError>| {
        if sink_handle.is_cancelled() {
            return;
        }
        let outcome = match event {
            Ok(raw) => transform(raw),
            Err(error) => Err(classify(category, Some(Arc::new(error)))),
        };
        match outcome {
            Ok(item) => {
                let _ = sink_sender.try_send(Ok(item));
            }
            Err(error) => {
                log::debug!("subscription ended with terminal error: {error}");
                let _ = sink_sender.try_send(Err(error));
                sink_sender.close();
                sink_handle.cancel();
            }
        }
    });

    let release = subscribe(sink);
    handle.attach(Box::new(move || {
        release();
        sender.close();
    }));

    (ListenerStream { receiver }, handle)
}
