//! The signed-in user, shared read-only across every view.
//!
//! A [`SessionStore`] is created once at startup and handed to the
//! [`AuthProvider`](crate::auth::AuthProvider), which is the only thing that publishes to it. Views get a
//! [`Session`] reader injected instead of reaching for a global. Dropping the last store ends
//! every [`SessionStore::changes`] stream.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::watch;
use tracing::info;

use crate::types::{Email, Identity};

#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Identity>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn session(&self) -> Session {
        Session {
            rx: self.tx.subscribe(),
        }
    }

    /// Yields the new identity (or `None` on sign-out) every time the session changes.
    pub fn changes(&self) -> impl Stream<Item = Option<Identity>> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async_stream::stream! {
            while rx.changed().await.is_ok() {
                let identity = rx.borrow_and_update().clone();
                yield identity;
            }
        }
    }

    pub(crate) fn publish(&self, identity: Option<Identity>) {
        match &identity {
            Some(identity) => info!(%identity, "signed in"),
            None => info!("signed out"),
        }
        self.tx.send_replace(identity);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the current session.
#[derive(Debug, Clone)]
pub struct Session {
    rx: watch::Receiver<Option<Identity>>,
}

impl Session {
    pub fn identity(&self) -> Option<Identity> {
        self.rx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Whether the signed-in user is the one with `email`. Always false when signed out.
    pub fn is(&self, email: &Email) -> bool {
        self.rx
            .borrow()
            .as_ref()
            .is_some_and(|identity| identity.email() == email)
    }
}
