//! Plain-text rendering for the terminal.

use std::fmt::Write;

use friendassign_api::assignment::Assignment;
use friendassign_flows::grading::PendingRow;
use friendassign_flows::listing::ListingView;
use friendassign_flows::listing::paginate::PageControl;
use friendassign_flows::notice::{Notice, NoticeKind, Outcome};
use itertools::Itertools;

pub fn notice(notice: &Notice) -> String {
    let mut out = format!("[{:?}] {notice}", notice.kind());
    for error in notice.field_errors() {
        let _ = write!(out, "\n  - {error}");
    }
    out
}

pub fn outcome(outcome: &Outcome) -> String {
    let mut lines = Vec::new();
    if let Some(notice) = outcome.notice() {
        lines.push(self::notice(notice));
    }
    if let Some(route) = outcome.route() {
        lines.push(format!("-> {route}"));
    }
    lines.join("\n")
}

/// Whether the outcome means the action did not go through.
pub fn is_failure(outcome: &Outcome) -> bool {
    matches!(
        outcome.kind(),
        Some(
            NoticeKind::Error
                | NoticeKind::Unauthorized
                | NoticeKind::LoginRequired
                | NoticeKind::ValidationError
        )
    )
}

pub fn card(assignment: &Assignment) -> String {
    format!(
        "{title} [{id}]\n  {difficulty} | {marks} marks | due {due}\n  by {owner}\n  {thumbnail}\n\n{description}",
        title = assignment.title(),
        id = assignment.id(),
        difficulty = assignment.difficulty(),
        marks = assignment.marks(),
        due = assignment.due_date(),
        owner = assignment.owner(),
        thumbnail = assignment.thumbnail_url(),
        description = assignment.description(),
    )
}

fn row(assignment: &Assignment) -> String {
    format!(
        "{:<12} {:<32} {:<7} {:>6}  {}",
        assignment.id().as_str(),
        assignment.title().as_str(),
        assignment.difficulty().as_str(),
        assignment.marks().to_string(),
        assignment.due_date(),
    )
}

pub fn page_controls(controls: &[PageControl]) -> String {
    controls
        .iter()
        .map(|control| {
            if control.active {
                format!("[{}]", control.number)
            } else {
                control.number.to_string()
            }
        })
        .join(" ")
}

pub fn listing(view: &ListingView) -> String {
    if view.loading {
        return "Loading...".to_owned();
    }
    if let Some(message) = view.empty_message() {
        return message.to_owned();
    }

    let mut out = view.items.iter().map(row).join("\n");
    if view.page_count > 1 {
        let _ = write!(
            out,
            "\n\npage {} of {}: {}",
            view.page,
            view.page_count,
            page_controls(&view.controls)
        );
    }
    out
}

pub fn pending(rows: &[PendingRow<'_>]) -> String {
    if rows.is_empty() {
        return "No pending submissions.".to_owned();
    }
    rows.iter()
        .map(|row| {
            let submission = row.submission;
            format!(
                "{:<12} {:<32} {:>6}  {:<28} {}",
                submission.id().to_string(),
                submission.assignment_title().as_str(),
                submission.assignment_marks().to_string(),
                submission.submitter().display_name().as_str(),
                row.action.label(),
            )
        })
        .join("\n")
}
