//! The assignment list: filter on the server, then sort and paginate locally.
//!
//! [`Listing`] is the synchronous state machine and knows nothing about timing. Every fetch it
//! starts gets a [`FetchTicket`], and a completion carrying an older ticket than the latest is
//! dropped, so a slow response can never overwrite a newer one. [`pipeline::ListingPipeline`]
//! drives a `Listing` from debounced user input on a background task.

use anyhow::Result;
use friendassign_api::assignment::{Assignment, AssignmentId, Difficulty};
use serde::Serialize;
use tracing::{debug, warn};

use crate::notice::Notice;

use self::paginate::{PageControl, Pagination};
use self::sort::{Sort, sort_assignments};

pub mod paginate;
pub mod pipeline;
pub mod sort;

pub use friendassign_api::assignment::AssignmentFilter as ListQuery;

pub const EMPTY_MESSAGE: &str = "No assignments found.";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load assignments.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct Listing {
    query: ListQuery,
    sort: Sort,
    pagination: Pagination,
    items: Vec<Assignment>,
    loading: bool,
    generation: u64,
}

impl Listing {
    pub fn new(pagination: Pagination) -> Self {
        Self {
            query: ListQuery::default(),
            sort: Sort::default(),
            pagination,
            items: Vec::new(),
            loading: false,
            generation: 0,
        }
    }

    pub fn with_query(mut self, query: ListQuery) -> Self {
        self.query = query;
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Assignments in the order the server sent them.
    pub fn items(&self) -> &[Assignment] {
        &self.items
    }

    /// Returns whether the filter actually changed, i.e. whether a refetch is needed.
    pub fn set_difficulty(&mut self, difficulty: Option<Difficulty>) -> bool {
        if self.query.difficulty == difficulty {
            return false;
        }
        self.query.difficulty = difficulty;
        self.pagination.reset();
        true
    }

    /// Returns whether the search text actually changed, i.e. whether a refetch is needed.
    pub fn set_search(&mut self, search: String) -> bool {
        if self.query.search == search {
            return false;
        }
        self.query.search = search;
        self.pagination.reset();
        true
    }

    pub fn set_sort(&mut self, sort: Sort) {
        if self.sort != sort {
            self.sort = sort;
            self.pagination.reset();
        }
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.pagination.go_to(page, self.items.len());
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Applies a fetch result unless a newer fetch has started since `ticket` was issued. A failed
    /// fetch empties the list and yields the notice to show.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Assignment>>,
    ) -> Option<Notice> {
        if !self.is_current(ticket) {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                "ignoring stale assignment list"
            );
            return None;
        }

        self.loading = false;
        match result {
            Ok(items) => {
                debug!(count = items.len(), "assignment list loaded");
                self.items = items;
                self.go_to_page(self.pagination.current());
                None
            }
            Err(err) => {
                warn!("could not load assignments: {err:#}");
                self.items.clear();
                self.pagination.reset();
                Some(Notice::error(LOAD_FAILED_MESSAGE))
            }
        }
    }

    /// Drops an assignment from the local list after the server deleted it.
    pub fn remove(&mut self, id: &AssignmentId) -> bool {
        let before = self.items.len();
        self.items.retain(|assignment| assignment.id() != id);
        self.go_to_page(self.pagination.current());
        self.items.len() != before
    }

    pub fn view(&self) -> ListingView {
        let mut sorted = self.items.clone();
        sort_assignments(&mut sorted, self.sort);

        ListingView {
            items: self.pagination.page(&sorted).to_vec(),
            page: self.pagination.current(),
            page_count: self.pagination.page_count(sorted.len()),
            controls: self.pagination.controls(sorted.len()),
            loading: self.loading,
            is_empty: sorted.is_empty(),
        }
    }
}

impl Default for Listing {
    fn default() -> Self {
        Self::new(Pagination::default())
    }
}

/// What the list screen shows right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    #[serde(skip)]
    pub items: Vec<Assignment>,
    pub page: usize,
    pub page_count: usize,
    pub controls: Vec<PageControl>,
    pub loading: bool,
    pub is_empty: bool,
}

impl ListingView {
    pub fn empty_message(&self) -> Option<&'static str> {
        (self.is_empty && !self.loading).then_some(EMPTY_MESSAGE)
    }
}

impl Default for ListingView {
    fn default() -> Self {
        Listing::default().view()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use friendassign_api::assignment::{AssignmentTitle, DueDate};
    use friendassign_api::types::{DisplayName, Email, Identity, Marks};

    use super::sort::{SortDirection, SortField};
    use super::*;
    use crate::notice::NoticeKind;

    fn assignment(id: usize, marks: f64) -> Assignment {
        Assignment::new(
            AssignmentId::new(id.to_string()),
            AssignmentTitle::new(format!("Assignment {id}")),
            String::new(),
            Marks::new(marks).unwrap(),
            String::new(),
            Difficulty::Easy,
            "2030-01-01".parse::<DueDate>().unwrap(),
            Identity::new(Email::from("a@x.com"), DisplayName::anonymous()),
        )
    }

    fn assignments(count: usize) -> Vec<Assignment> {
        (1..=count).map(|id| assignment(id, id as f64)).collect()
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut listing = Listing::default();
        let first = listing.begin_fetch();
        let second = listing.begin_fetch();

        assert_eq!(listing.complete_fetch(second, Ok(assignments(2))), None);
        assert_eq!(listing.complete_fetch(first, Ok(assignments(5))), None);

        assert_eq!(listing.items().len(), 2);
        assert!(!listing.is_loading());
    }

    #[test]
    fn stale_failure_does_not_clear_newer_results() {
        let mut listing = Listing::default();
        let first = listing.begin_fetch();
        let second = listing.begin_fetch();
        listing.complete_fetch(second, Ok(assignments(3)));

        assert_eq!(listing.complete_fetch(first, Err(anyhow!("timeout"))), None);
        assert_eq!(listing.items().len(), 3);
    }

    #[test]
    fn failure_empties_the_list_and_stops_loading() {
        let mut listing = Listing::default();
        let ticket = listing.begin_fetch();
        listing.complete_fetch(ticket, Ok(assignments(3)));

        let ticket = listing.begin_fetch();
        assert!(listing.is_loading());
        let notice = listing
            .complete_fetch(ticket, Err(anyhow!("connection reset")))
            .unwrap();

        assert_eq!(notice.kind(), NoticeKind::Error);
        assert_eq!(notice.text(), LOAD_FAILED_MESSAGE);
        let view = listing.view();
        assert!(!view.loading);
        assert_eq!(view.empty_message(), Some(EMPTY_MESSAGE));
    }

    #[test]
    fn filter_search_and_sort_reset_the_page() {
        let mut listing = Listing::default();
        let ticket = listing.begin_fetch();
        listing.complete_fetch(ticket, Ok(assignments(20)));

        listing.go_to_page(3);
        assert_eq!(listing.view().page, 3);
        assert!(listing.set_search("rust".to_owned()));
        assert_eq!(listing.view().page, 1);

        listing.go_to_page(2);
        assert!(!listing.set_search("rust".to_owned()));
        assert_eq!(listing.view().page, 2);
        assert!(listing.set_difficulty(Some(Difficulty::Hard)));
        assert_eq!(listing.view().page, 1);

        listing.go_to_page(2);
        listing.set_sort(Sort::by(SortField::Marks, SortDirection::Descending));
        assert_eq!(listing.view().page, 1);
    }

    #[test]
    fn view_sorts_before_paginating() {
        let mut listing = Listing::new(Pagination::new(8).unwrap())
            .with_sort(Sort::by(SortField::Marks, SortDirection::Descending));
        let ticket = listing.begin_fetch();
        listing.complete_fetch(ticket, Ok(assignments(20)));

        listing.go_to_page(3);
        let view = listing.view();
        let marks: Vec<f64> = view.items.iter().map(|a| a.marks().as_f64()).collect();

        assert_eq!(view.page_count, 3);
        assert_eq!(marks, [4.0, 3.0, 2.0, 1.0]);
        assert!(view.controls[2].active);
    }

    #[test]
    fn removing_the_last_item_on_a_page_moves_back() {
        let mut listing = Listing::new(Pagination::new(4).unwrap());
        let ticket = listing.begin_fetch();
        listing.complete_fetch(ticket, Ok(assignments(5)));
        listing.go_to_page(2);

        assert!(listing.remove(&AssignmentId::from("5")));
        assert!(!listing.remove(&AssignmentId::from("5")));
        let view = listing.view();
        assert_eq!(view.page, 1);
        assert_eq!(view.items.len(), 4);
    }
}
