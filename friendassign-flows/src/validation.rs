//! Form checks that run before anything is sent.

use std::fmt;

use friendassign_api::types::Marks;
use serde::Serialize;
use url::Url;

const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    Title,
    Description,
    Marks,
    ThumbnailUrl,
    DueDate,
    Owner,
    Link,
    ObtainedMarks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    field: Field,
    message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.field, self.message)
    }
}

pub fn has_min_chars(text: &str, min: usize) -> bool {
    text.trim().chars().count() >= min
}

/// A strictly positive whole number, e.g. an assignment's maximum marks.
pub fn parse_positive_marks(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok().filter(|marks| *marks > 0)
}

/// A score a grader hands out: any finite number from zero up.
pub fn parse_obtained_marks(text: &str) -> Option<Marks> {
    let marks: f64 = text.trim().parse().ok()?;
    if marks < 0.0 {
        return None;
    }
    Marks::new(marks).ok()
}

pub fn is_web_url(text: &str) -> bool {
    Url::parse(text.trim())
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

/// An `http(s)` URL that ends in a common image extension, in any case.
pub fn is_image_url(text: &str) -> bool {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    is_web_url(text) && IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
