//! The assignment list screen and the actions on each card: view, edit and delete.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use friendassign_api::assignment::{Assignment, AssignmentId, Difficulty};
use friendassign_api::client::Client;
use friendassign_api::services::api_service::{ApiService, ServerError};
use friendassign_api::session::Session;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::gate::{Gated, gated};
use crate::listing::sort::Sort;
use crate::listing::{Listing, ListingView};
use crate::notice::{Notice, Outcome, Route, TOAST_DURATION};

pub const VERIFY_FAILED_MESSAGE: &str = "Failed to verify assignment ownership.";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete assignment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MutationState {
    #[default]
    Idle,
    Navigating,
    VerifyingOwnership,
    ConfirmPending,
    Deleting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmPrompt {
    pub title: String,
    pub text: String,
    pub confirm_label: String,
    /// What an unanswered prompt means. Always "no" for destructive actions.
    pub default: bool,
}

impl ConfirmPrompt {
    pub fn delete(assignment: &Assignment) -> Self {
        Self {
            title: "Are you sure?".to_owned(),
            text: format!("\"{}\" will be deleted for everyone.", assignment.title()),
            confirm_label: "Yes, delete it!".to_owned(),
            default: false,
        }
    }
}

/// Asks the user to confirm a destructive action.
pub trait Confirmer {
    fn confirm(&self, prompt: &ConfirmPrompt) -> impl Future<Output = bool> + Send;
}

#[derive(Debug)]
enum Deletion {
    Cancelled,
    Deleted,
    Failed(anyhow::Error),
}

/// View-model for the assignment list. Owns the listing plus the one-action-at-a-time lock that
/// greys out every card's buttons while an action is running.
#[derive(Debug)]
pub struct AssignmentBoard<Service> {
    client: Client<Service>,
    session: Session,
    listing: Listing,
    action_loading: AtomicBool,
    state: watch::Sender<MutationState>,
}

impl<Service: ApiService> AssignmentBoard<Service> {
    pub fn new(client: Client<Service>, session: Session, listing: Listing) -> Self {
        let (state, _) = watch::channel(MutationState::Idle);
        Self {
            client,
            session,
            listing,
            action_loading: AtomicBool::new(false),
            state,
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn view_model(&self) -> ListingView {
        self.listing.view()
    }

    pub fn mutation_state(&self) -> MutationState {
        *self.state.borrow()
    }

    pub fn watch_mutation_state(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    pub fn is_action_loading(&self) -> bool {
        self.action_loading.load(Ordering::Acquire)
    }

    /// Fetches the list for the current filter. Returns the notice to show if the fetch failed.
    pub async fn refresh(&mut self) -> Outcome {
        let ticket = self.listing.begin_fetch();
        let result = self.client.list_assignments(self.listing.query()).await;
        match self.listing.complete_fetch(ticket, result) {
            Some(notice) => Outcome::show(notice),
            None => Outcome::nothing(),
        }
    }

    pub async fn set_difficulty(&mut self, difficulty: Option<Difficulty>) -> Outcome {
        if self.listing.set_difficulty(difficulty) {
            self.refresh().await
        } else {
            Outcome::nothing()
        }
    }

    pub async fn set_search(&mut self, search: String) -> Outcome {
        if self.listing.set_search(search) {
            self.refresh().await
        } else {
            Outcome::nothing()
        }
    }

    pub fn set_sort(&mut self, sort: Sort) {
        self.listing.set_sort(sort);
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.listing.go_to_page(page);
    }

    /// Opens the detail page. Reading is open to everyone.
    pub fn view(&mut self, id: &AssignmentId) -> Outcome {
        let Some(_action) = ActionGuard::acquire(&self.action_loading, &self.state) else {
            return Outcome::nothing();
        };
        self.set_state(MutationState::Navigating);
        Outcome::navigate(Route::AssignmentDetail(id.clone()))
    }

    /// Opens the edit form, but only for the assignment's owner.
    pub async fn edit(&mut self, id: &AssignmentId) -> Outcome {
        let Some(_action) = ActionGuard::acquire(&self.action_loading, &self.state) else {
            return Outcome::nothing();
        };

        let this = &*self;
        let result = gated(
            &this.session,
            || {
                this.set_state(MutationState::VerifyingOwnership);
                this.client.get_assignment(id)
            },
            |_, _| async move { this.set_state(MutationState::Navigating) },
        )
        .await;

        let outcome = match result {
            Gated::Allowed(()) => Outcome::navigate(Route::EditAssignment(id.clone())),
            Gated::Unauthorized => Outcome::show(Notice::unauthorized(
                "You can only edit your own assignments.",
            )),
            Gated::LoginRequired => login_required(),
            Gated::FetchFailed(_) => Outcome::show(Notice::error(VERIFY_FAILED_MESSAGE)),
        };
        outcome
    }

    /// Deletes the assignment after checking ownership and asking `confirmer`. The request carries
    /// the signed-in email so the server can check ownership too.
    pub async fn delete(&mut self, id: &AssignmentId, confirmer: &impl Confirmer) -> Outcome {
        let Some(_action) = ActionGuard::acquire(&self.action_loading, &self.state) else {
            return Outcome::nothing();
        };

        let this = &*self;
        let result = gated(
            &this.session,
            || {
                this.set_state(MutationState::VerifyingOwnership);
                this.client.get_assignment(id)
            },
            |identity, assignment| async move {
                this.set_state(MutationState::ConfirmPending);
                if !confirmer.confirm(&ConfirmPrompt::delete(&assignment)).await {
                    return Deletion::Cancelled;
                }

                this.set_state(MutationState::Deleting);
                match this.client.delete_assignment(id, identity.email()).await {
                    Ok(()) => Deletion::Deleted,
                    Err(err) => Deletion::Failed(err),
                }
            },
        )
        .await;

        let outcome = match result {
            Gated::Allowed(Deletion::Deleted) => {
                self.listing.remove(id);
                info!(%id, "removed deleted assignment from the list");
                Outcome::show(
                    Notice::success("Deleted!", "Assignment deleted.").dismiss_after(TOAST_DURATION),
                )
            }
            Gated::Allowed(Deletion::Cancelled) => {
                debug!(%id, "delete cancelled");
                Outcome::nothing()
            }
            Gated::Allowed(Deletion::Failed(err)) => Outcome::show(Notice::error(
                server_message_or(&err, DELETE_FAILED_MESSAGE),
            )),
            Gated::Unauthorized => Outcome::show(Notice::unauthorized(
                "You can only delete your own assignments.",
            )),
            Gated::LoginRequired => login_required(),
            Gated::FetchFailed(_) => Outcome::show(Notice::error(VERIFY_FAILED_MESSAGE)),
        };
        outcome
    }

    fn set_state(&self, state: MutationState) {
        self.state.send_replace(state);
    }
}

/// Holds the one-action-at-a-time lock. Released on drop, so an action whose future is dropped
/// part way through still frees the board.
struct ActionGuard<'a> {
    busy: &'a AtomicBool,
    state: &'a watch::Sender<MutationState>,
}

impl<'a> ActionGuard<'a> {
    fn acquire(busy: &'a AtomicBool, state: &'a watch::Sender<MutationState>) -> Option<Self> {
        if busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(state = ?*state.borrow(), "ignoring action while another is running");
            return None;
        }
        Some(Self { busy, state })
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        self.state.send_replace(MutationState::Idle);
    }
}

pub(crate) fn login_required() -> Outcome {
    Outcome::show(Notice::login_required("Not Logged In", "Please log in."))
        .and_navigate(Route::Login)
}

/// The server's own explanation when it sent one, otherwise `fallback`.
pub(crate) fn server_message_or(err: &anyhow::Error, fallback: &str) -> String {
    ServerError::message_in(err).unwrap_or(fallback).to_owned()
}
