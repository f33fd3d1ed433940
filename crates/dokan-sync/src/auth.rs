//! # Auth Boundary
//!
//! The coordinator never signs anyone in. It watches a
//! `watch::Receiver<Option<Owner>>` fed by whatever identity provider the
//! embedding app uses; [`AuthSession`] owns the sending side.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

/// The signed-in shop owner whose remote document is synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Stable account id; keys the remote document.
    pub uid: String,
    pub email: String,
}

impl Owner {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Owner {
            uid: uid.into(),
            email: email.into(),
        }
    }
}

/// Publishes sign-in and sign-out to coordinators.
#[derive(Debug)]
pub struct AuthSession {
    tx: watch::Sender<Option<Owner>>,
}

impl AuthSession {
    /// A session with nobody signed in.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        AuthSession { tx }
    }

    /// A receiver for [`SyncCoordinator::spawn`](crate::SyncCoordinator::spawn).
    pub fn subscribe(&self) -> watch::Receiver<Option<Owner>> {
        self.tx.subscribe()
    }

    pub fn sign_in(&self, owner: Owner) {
        info!(uid = %owner.uid, email = %owner.email, "Owner signed in");
        self.tx.send_replace(Some(owner));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("Owner signed out");
        }
    }

    pub fn current(&self) -> Option<Owner> {
        self.tx.borrow().clone()
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_and_out_are_observed() {
        let session = AuthSession::new();
        let mut rx = session.subscribe();
        assert!(rx.borrow_and_update().is_none());

        session.sign_in(Owner::new("u1", "owner@example.com"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|o| o.uid.as_str()), Some("u1"));

        session.sign_out();
        assert!(rx.has_changed().unwrap());
        assert!(session.current().is_none());
    }
}
