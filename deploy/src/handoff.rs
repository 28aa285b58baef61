//! Single-writer, single-reader cell bridging an event listener to the
//! task that needs the value it observed.
use std::{fmt, time::Duration};

use tokio::sync::oneshot::{self, error::TryRecvError};

/// Create a connected writer and reader.
#[must_use]
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = oneshot::channel();
    (Sender { inner: tx }, Receiver { inner: rx, ready: None, closed: false })
}

/// Observable state of a [`Receiver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No value yet, writer still alive.
    Pending,
    /// A value was set.
    Ready,
    /// The writer was dropped without setting a value.
    Closed,
}

/// Why [`Receiver::wait`] returned without a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffError {
    /// Nothing was set within the timeout.
    TimedOut(Duration),
    /// The writer went away without setting a value.
    Closed,
}

impl fmt::Display for HandoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut(after) => {
                write!(f, "value not set after {}s", after.as_secs())
            }
            Self::Closed => f.write_str("writer dropped before setting a value"),
        }
    }
}

impl std::error::Error for HandoffError {}

/// Writing half. Setting consumes it, so a value is written at most once.
#[derive(Debug)]
pub struct Sender<T> {
    inner: oneshot::Sender<T>,
}

impl<T> Sender<T> {
    /// Publish `value` to the reader.
    ///
    /// # Errors
    ///
    /// Returns the value back if the reader is gone.
    pub fn set(self, value: T) -> Result<(), T> {
        self.inner.send(value)
    }
}

/// Reading half.
#[derive(Debug)]
pub struct Receiver<T> {
    inner: oneshot::Receiver<T>,
    ready: Option<T>,
    // `inner` must not be polled again once `try_recv` reported it closed.
    closed: bool,
}

impl<T> Receiver<T> {
    /// Current state, without blocking.
    pub fn state(&mut self) -> State {
        if self.ready.is_some() {
            return State::Ready;
        }
        if self.closed {
            return State::Closed;
        }
        match self.inner.try_recv() {
            Ok(value) => {
                self.ready = Some(value);
                State::Ready
            }
            Err(TryRecvError::Empty) => State::Pending,
            Err(TryRecvError::Closed) => {
                self.closed = true;
                State::Closed
            }
        }
    }

    /// Wait for the value for at most `timeout`.
    ///
    /// # Errors
    ///
    /// Fails if the timeout elapses or the writer is dropped first.
    pub async fn wait(mut self, timeout: Duration) -> Result<T, HandoffError> {
        if let Some(value) = self.ready.take() {
            return Ok(value);
        }
        if self.closed {
            return Err(HandoffError::Closed);
        }
        match tokio::time::timeout(timeout, self.inner).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(HandoffError::Closed),
            Err(_) => Err(HandoffError::TimedOut(timeout)),
        }
    }
}
