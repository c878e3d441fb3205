/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Login completion signal.
//!
//! One connect attempt owns the signal at a time: it resets it, starts the
//! transport and waits. The router sets it when Logon or Logout arrives.

use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// How a wait on the [`LoginSignal`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginWait {
    /// The signal was set.
    Signaled,
    /// The timeout elapsed first.
    TimedOut,
    /// The cancellation token fired first.
    Cancelled,
}

/// Resettable single-writer gate backed by a `watch` channel.
#[derive(Debug)]
pub struct LoginSignal {
    state: watch::Sender<bool>,
}

impl LoginSignal {
    /// Creates an unset signal.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    /// Clears the signal before a new attempt.
    pub fn reset(&self) {
        self.state.send_replace(false);
    }

    /// Sets the signal.
    ///
    /// Returns `false` if it was already set during this attempt.
    pub fn set(&self) -> bool {
        self.state.send_if_modified(|set| {
            if *set {
                false
            } else {
                *set = true;
                true
            }
        })
    }

    /// Returns true if the signal is currently set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.state.borrow()
    }

    /// Waits until the signal is set, `timeout` elapses or `cancel` fires.
    ///
    /// A signal set before the call returns immediately.
    pub async fn wait(&self, timeout: Duration, cancel: &CancellationToken) -> LoginWait {
        let mut rx = self.state.subscribe();
        let signaled = async move { rx.wait_for(|set| *set).await.is_ok() };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => LoginWait::Cancelled,
            result = tokio::time::timeout(timeout, signaled) => match result {
                Ok(true) => LoginWait::Signaled,
                Ok(false) => LoginWait::Cancelled,
                Err(_) => LoginWait::TimedOut,
            },
        }
    }
}

impl Default for LoginSignal {
    fn default() -> Self {
        Self::new()
    }
}
