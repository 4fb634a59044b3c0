use anyhow::Result;
use friendassign_api::assignment::{Assignment, Difficulty};
use friendassign_api::client::Client;
use friendassign_api::services::api_service::ApiService;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::debounce::{DEBOUNCE_DELAY, Debounced, debounce};
use crate::notice::Notice;

use super::sort::Sort;
use super::{FetchTicket, Listing, ListingView};

#[derive(Debug)]
enum Command {
    Difficulty(Option<Difficulty>),
    Sort(Sort),
    Page(usize),
}

/// Keeps a [`Listing`] up to date on a background task.
///
/// Search text goes through [`debounce`]; difficulty, sort and page changes apply immediately.
/// Only one fetch is ever in flight: a newer query aborts the older request, and the fetch ticket
/// catches any response that slips through anyway. Cancelling the token passed to
/// [`ListingPipeline::spawn`] (or dropping the pipeline) stops everything, and no fetch completes
/// into the listing after that.
#[derive(Debug)]
pub struct ListingPipeline {
    search: watch::Sender<String>,
    commands: mpsc::UnboundedSender<Command>,
    views: watch::Receiver<ListingView>,
    notices: mpsc::UnboundedReceiver<Notice>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ListingPipeline {
    pub fn spawn<Service: ApiService>(
        client: Client<Service>,
        initial: Listing,
        cancel: &CancellationToken,
    ) -> Self {
        let cancel = cancel.child_token();
        let (search, search_rx) = watch::channel(initial.query().search.clone());
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (views_tx, views) = watch::channel(initial.view());
        let (notices_tx, notices) = mpsc::unbounded_channel();
        // Settled before the task first runs, so a search set right after spawning is a change.
        let settled_search = debounce(search_rx, DEBOUNCE_DELAY, &cancel);

        let task = tokio::spawn(run(
            client,
            initial,
            settled_search,
            commands_rx,
            views_tx,
            notices_tx,
            cancel.clone(),
        ));

        Self {
            search,
            commands,
            views,
            notices,
            cancel,
            task: Some(task),
        }
    }

    pub fn set_search(&self, search: impl Into<String>) {
        self.search.send_replace(search.into());
    }

    pub fn set_difficulty(&self, difficulty: Option<Difficulty>) {
        self.send(Command::Difficulty(difficulty));
    }

    pub fn set_sort(&self, sort: Sort) {
        self.send(Command::Sort(sort));
    }

    pub fn go_to_page(&self, page: usize) {
        self.send(Command::Page(page));
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("listing pipeline already stopped");
        }
    }

    pub fn view(&self) -> ListingView {
        self.views.borrow().clone()
    }

    /// A receiver that wakes whenever the view changes.
    pub fn views(&self) -> watch::Receiver<ListingView> {
        self.views.clone()
    }

    /// The next notice raised by a failed fetch, or `None` once the pipeline has stopped.
    pub async fn next_notice(&mut self) -> Option<Notice> {
        self.notices.recv().await
    }

    /// Cancels the pipeline and waits for its task to wind down.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(%err, "listing pipeline task failed");
            }
        }
    }
}

impl Drop for ListingPipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

type Fetches = JoinSet<(FetchTicket, Result<Vec<Assignment>>)>;

async fn run<Service: ApiService>(
    client: Client<Service>,
    mut listing: Listing,
    mut search: Debounced<String>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    views: watch::Sender<ListingView>,
    notices: mpsc::UnboundedSender<Notice>,
    cancel: CancellationToken,
) {
    let mut fetches = Fetches::new();

    start_fetch(&client, &mut listing, &mut fetches);
    views.send_replace(listing.view());

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            settled = search.changed() => {
                let Ok(text) = settled else { break };
                if listing.set_search(text) {
                    start_fetch(&client, &mut listing, &mut fetches);
                }
            }
            Some(command) = commands.recv() => match command {
                Command::Difficulty(difficulty) => {
                    if listing.set_difficulty(difficulty) {
                        start_fetch(&client, &mut listing, &mut fetches);
                    }
                }
                Command::Sort(sort) => listing.set_sort(sort),
                Command::Page(page) => listing.go_to_page(page),
            },
            Some(joined) = fetches.join_next() => match joined {
                Ok((ticket, result)) => {
                    if let Some(notice) = listing.complete_fetch(ticket, result) {
                        let _ = notices.send(notice);
                    }
                }
                Err(err) if err.is_cancelled() => {}
                Err(err) => error!(%err, "assignment fetch panicked"),
            },
        }
        views.send_replace(listing.view());
    }

    fetches.abort_all();
    debug!("listing pipeline stopped");
}

fn start_fetch<Service: ApiService>(
    client: &Client<Service>,
    listing: &mut Listing,
    fetches: &mut Fetches,
) {
    fetches.abort_all();
    let ticket = listing.begin_fetch();
    let query = listing.query().clone();
    let client = client.clone();
    debug!(?query, "fetching assignments");
    fetches.spawn(async move { (ticket, client.list_assignments(&query).await) });
}
