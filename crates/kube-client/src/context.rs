//! Cancellation and deadline signal carried by every request.

use std::{future, time::Duration};

use futures::future::select_all;
use tokio::{
    sync::watch,
    time::{Instant, sleep_until},
};

use crate::error::TransportError;

/// Why a [`Context`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    Cancelled,
    DeadlineExceeded,
}

impl From<ContextError> for TransportError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => TransportError::Cancelled,
            ContextError::DeadlineExceeded => TransportError::DeadlineExceeded,
        }
    }
}

/// Request-scoped cancellation signal with an optional deadline.
///
/// Derived contexts inherit the cancellation signals and deadline of their
/// parent; cancelling a parent cancels every context derived from it.
#[derive(Clone, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets the deadline unless the current one is earlier.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        self.cancel.push(receiver);
        (self, CancelHandle { sender })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Reports whether the context is already done. Cancellation wins over
    /// an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel.iter().any(|receiver| *receiver.borrow()) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        let cancelled = async {
            if self.cancel.is_empty() {
                future::pending::<()>().await;
            }
            let waiters = self
                .cancel
                .iter()
                .cloned()
                .map(|receiver| Box::pin(wait_cancelled(receiver)));
            select_all(waiters).await;
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => ContextError::Cancelled,
            _ = expired => ContextError::DeadlineExceeded,
        }
    }
}

async fn wait_cancelled(mut receiver: watch::Receiver<bool>) {
    // A dropped handle can no longer cancel.
    if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
        future::pending::<()>().await;
    }
}
