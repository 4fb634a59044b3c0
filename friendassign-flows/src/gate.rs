//! Checks that the signed-in user owns something before acting on it.
//!
//! The list a user clicked on may be out of date, so the gate always fetches the target again and
//! compares owners on the fresh copy. The server still makes the final call.

use std::future::Future;

use anyhow::Result;
use friendassign_api::assignment::Assignment;
use friendassign_api::session::Session;
use friendassign_api::types::{Email, Identity};
use tracing::{debug, warn};

/// Anything with an owner that can be checked against the session.
pub trait Owned {
    fn owner_email(&self) -> &Email;
}

impl Owned for Assignment {
    fn owner_email(&self) -> &Email {
        self.owner().email()
    }
}

#[derive(Debug)]
pub enum Gated<T> {
    /// Nobody is signed in. The fetch was never started.
    LoginRequired,
    /// Signed in as someone other than the owner. The action was never started.
    Unauthorized,
    FetchFailed(anyhow::Error),
    Allowed(T),
}

impl<T> Gated<T> {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Gated::Allowed(_))
    }
}

/// Runs `action` only when someone is signed in and a fresh `fetch` says they own the target.
///
/// `fetch` is only called once the session check has passed, and `action` only once ownership has.
pub async fn gated<Entity, T, Fetch, FetchFut, Action, ActionFut>(
    session: &Session,
    fetch: Fetch,
    action: Action,
) -> Gated<T>
where
    Entity: Owned,
    Fetch: FnOnce() -> FetchFut,
    FetchFut: Future<Output = Result<Entity>>,
    Action: FnOnce(Identity, Entity) -> ActionFut,
    ActionFut: Future<Output = T>,
{
    let Some(identity) = session.identity() else {
        return Gated::LoginRequired;
    };

    let entity = match fetch().await {
        Ok(entity) => entity,
        Err(err) => {
            warn!("could not verify ownership: {err:#}");
            return Gated::FetchFailed(err);
        }
    };

    if entity.owner_email() != identity.email() {
        debug!(
            owner = %entity.owner_email(),
            actor = %identity.email(),
            "refusing action on someone else's entity"
        );
        return Gated::Unauthorized;
    }

    Gated::Allowed(action(identity, entity).await)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use anyhow::anyhow;
    use friendassign_api::session::SessionStore;
    use friendassign_api::testing::FakeAuth;

    use super::*;

    struct Doc {
        owner: Email,
    }

    impl Owned for Doc {
        fn owner_email(&self) -> &Email {
            &self.owner
        }
    }

    fn doc(owner: &str) -> Doc {
        Doc {
            owner: Email::from(owner),
        }
    }

    #[tokio::test]
    async fn signed_out_never_fetches() {
        let store = SessionStore::new();
        let fetched = Cell::new(false);

        let gated = gated(
            &store.session(),
            || async {
                fetched.set(true);
                Ok::<_, anyhow::Error>(doc("a@x.com"))
            },
            |_, _| async {},
        )
        .await;

        assert!(matches!(gated, Gated::LoginRequired));
        assert!(!fetched.get());
    }

    #[tokio::test]
    async fn non_owner_is_refused_before_acting() {
        let store = SessionStore::new();
        FakeAuth::new(store.clone()).sign_in_as("b@x.com", "Bea");
        let acted = Cell::new(false);

        let gated = gated(
            &store.session(),
            || async { Ok::<_, anyhow::Error>(doc("a@x.com")) },
            |_, _| async { acted.set(true) },
        )
        .await;

        assert!(matches!(gated, Gated::Unauthorized));
        assert!(!acted.get());
    }

    #[tokio::test]
    async fn owner_runs_the_action() {
        let store = SessionStore::new();
        FakeAuth::new(store.clone()).sign_in_as("a@x.com", "Ana");

        let gated = gated(
            &store.session(),
            || async { Ok::<_, anyhow::Error>(doc("a@x.com")) },
            |identity, _| async move { identity.display_name().to_string() },
        )
        .await;

        match gated {
            Gated::Allowed(name) => assert_eq!(name, "Ana"),
            other => panic!("expected the action to run, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_failure_is_reported() {
        let store = SessionStore::new();
        FakeAuth::new(store.clone()).sign_in_as("a@x.com", "Ana");

        let gated = gated(
            &store.session(),
            || async { Err::<Doc, _>(anyhow!("connection refused")) },
            |_, _| async {},
        )
        .await;

        assert!(matches!(gated, Gated::FetchFailed(_)));
    }
}
