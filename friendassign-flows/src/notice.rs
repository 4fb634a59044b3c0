//! What a flow hands back to whoever drives it: something to tell the user and somewhere to go.

use std::fmt;
use std::time::Duration;

use friendassign_api::assignment::AssignmentId;
use serde::Serialize;

use crate::validation::FieldError;

/// How long success toasts stay up before dismissing themselves.
pub const TOAST_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Unauthorized,
    LoginRequired,
    ValidationError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    kind: NoticeKind,
    title: String,
    text: String,
    auto_dismiss: Option<Duration>,
    field_errors: Vec<FieldError>,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            text: text.into(),
            auto_dismiss: None,
            field_errors: Vec::new(),
        }
    }

    pub fn success(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, title, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, "Error", text)
    }

    pub fn warning(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning, title, text)
    }

    pub fn unauthorized(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Unauthorized, "Unauthorized", text)
    }

    pub fn login_required(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NoticeKind::LoginRequired, title, text)
    }

    pub fn validation(text: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Self {
            field_errors,
            ..Self::new(NoticeKind::ValidationError, "Validation Error", text)
        }
    }

    pub fn dismiss_after(mut self, duration: Duration) -> Self {
        self.auto_dismiss = Some(duration);
        self
    }

    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn auto_dismiss(&self) -> Option<Duration> {
        self.auto_dismiss
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.text)
    }
}

/// Destinations a flow can navigate to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Route {
    Login,
    Assignments,
    CreateAssignment,
    AssignmentDetail(AssignmentId),
    EditAssignment(AssignmentId),
    PendingSubmissions,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/auth/login".to_owned(),
            Route::Assignments => "/assignments".to_owned(),
            Route::CreateAssignment => "/auth/createAssignment".to_owned(),
            Route::AssignmentDetail(id) => format!("/auth/services/{id}"),
            Route::EditAssignment(id) => format!("/auth/updateGroup/{id}"),
            Route::PendingSubmissions => "/auth/pending-assignments".to_owned(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// The result of one user action. Either part may be absent, e.g. a refused click does nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome {
    notice: Option<Notice>,
    route: Option<Route>,
}

impl Outcome {
    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn show(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            route: None,
        }
    }

    pub fn navigate(route: Route) -> Self {
        Self {
            notice: None,
            route: Some(route),
        }
    }

    pub fn and_navigate(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn kind(&self) -> Option<NoticeKind> {
        self.notice.as_ref().map(Notice::kind)
    }

    pub fn into_parts(self) -> (Option<Notice>, Option<Route>) {
        (self.notice, self.route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_use_canonical_paths() {
        assert_eq!(Route::Login.path(), "/auth/login");
        assert_eq!(
            Route::EditAssignment("a1".into()).to_string(),
            "/auth/updateGroup/a1"
        );
        assert_eq!(
            Route::AssignmentDetail("a1".into()).path(),
            "/auth/services/a1"
        );
    }

    #[test]
    fn outcome_combines_notice_and_route() {
        let outcome = Outcome::show(Notice::login_required("Not Logged In", "Please log in."))
            .and_navigate(Route::Login);

        assert_eq!(outcome.kind(), Some(NoticeKind::LoginRequired));
        assert_eq!(outcome.route(), Some(&Route::Login));
        assert_eq!(Outcome::nothing().kind(), None);
    }
}
