//! Session and identity state of one client.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    session_id: Option<String>,
    starting: bool,
    customer_unique_id: Option<String>,
}

/// Current session id and customer identity.
///
/// The lock is never held across an `.await`; state changes only after the
/// corresponding response has been observed.
#[derive(Debug, Default)]
pub(crate) struct ClientState {
    inner: Mutex<Inner>,
}

impl ClientState {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn session_id(&self) -> Option<String> {
        self.lock().session_id.clone()
    }

    pub(crate) fn set_session_id(&self, session_id: impl Into<String>) {
        self.lock().session_id = Some(session_id.into());
    }

    pub(crate) fn clear_session(&self) {
        self.lock().session_id = None;
    }

    pub(crate) fn customer_unique_id(&self) -> Option<String> {
        self.lock().customer_unique_id.clone()
    }

    pub(crate) fn set_customer_unique_id(&self, unique_id: impl Into<String>) {
        self.lock().customer_unique_id = Some(unique_id.into());
    }

    /// Claim the right to start a session.
    ///
    /// Returns `None` if a session is active or another start is in flight.
    /// The flag is released when the returned guard drops, including when
    /// the start future is cancelled.
    pub(crate) fn begin_start(&self) -> Option<StartGuard<'_>> {
        let mut inner = self.lock();
        if inner.session_id.is_some() || inner.starting {
            return None;
        }
        inner.starting = true;
        Some(StartGuard { state: self })
    }
}

/// In-flight marker for `sessions/start`.
#[derive(Debug)]
pub(crate) struct StartGuard<'a> {
    state: &'a ClientState,
}

impl StartGuard<'_> {
    /// Record the session id returned by the server.
    pub(crate) fn complete(self, session_id: impl Into<String>) {
        self.state.set_session_id(session_id);
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().starting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let state = ClientState::default();
        assert_eq!(state.session_id(), None);
        assert_eq!(state.customer_unique_id(), None);
    }

    #[test]
    fn test_start_guard_blocks_second_start() {
        let state = ClientState::default();

        let guard = state.begin_start().unwrap();
        assert!(state.begin_start().is_none());

        drop(guard);
        assert!(state.begin_start().is_some());
    }

    #[test]
    fn test_completed_start_keeps_session() {
        let state = ClientState::default();

        state.begin_start().unwrap().complete("s1");

        assert_eq!(state.session_id().as_deref(), Some("s1"));
        assert!(state.begin_start().is_none());
    }

    #[test]
    fn test_clear_session_allows_new_start() {
        let state = ClientState::default();
        state.set_session_id("s1");

        state.clear_session();

        assert!(state.begin_start().is_some());
    }

    #[test]
    fn test_identity_is_independent_of_session() {
        let state = ClientState::default();
        state.set_customer_unique_id("u1");
        state.clear_session();

        assert_eq!(state.customer_unique_id().as_deref(), Some("u1"));
    }
}
