use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

struct Shared<T> {
    outcome: Option<T>,
    settled: bool,
    waker: Option<Waker>,
}

/// Completion callback handed to a one-shot registration function.
///
/// Resolves the paired [`SingleResult`] at most once; the first resolution
/// wins and every later one is discarded. Clonable so that misbehaving
/// sources holding several copies still cannot deliver twice.
pub struct Resolver<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Resolver<T> {
    /// Delivers the terminal outcome. A second call is a no-op.
    pub fn resolve(&self, value: T) {
        let mut shared = self.shared.lock().unwrap();
        if shared.settled {
            log::debug!("discarding duplicate resolution from underlying source");
            return;
        }
        shared.settled = true;
        shared.outcome = Some(value);
        if let Some(waker) = shared.waker.take() {
            drop(shared);
            waker.wake();
        }
    }
}

/// Future side of a one-shot callback registration.
///
/// Resolves exactly once with whatever the registration function's callback
/// delivered, on whatever execution context that callback ran on. If the
/// callback is never invoked the future never resolves; timeouts are the
/// caller's concern.
pub struct SingleResult<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Future for SingleResult<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut shared = self.shared.lock().unwrap();
        match shared.outcome.take() {
            Some(value) => Poll::Ready(value),
            None => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Runs `register`, handing it a [`Resolver`], and returns the future that
/// observes the single resolution. `register` is invoked synchronously, so
/// no outcome can be observed before registration happened.
pub fn single_result<T, F>(register: F) -> SingleResult<T>
where
    F: FnOnce(Resolver<T>),
{
    let shared = Arc::new(Mutex::new(Shared {
        outcome: None,
        settled: false,
        waker: None,
    }));
    register(Resolver {
        shared: Arc::clone(&shared),
    });
    SingleResult { shared }
}
