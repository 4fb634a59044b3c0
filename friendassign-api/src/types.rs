//! Holds the small value types shared by assignments, submissions and the session. None of them
//! "do" much beyond keeping strings and numbers from being mixed up.

use std::cmp::Ordering;
use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email {
    email: String,
}

impl Email {
    pub fn new(email: String) -> Self {
        Self { email }
    }

    pub fn as_str(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.email.fmt(f)
    }
}

impl From<&str> for Email {
    fn from(email: &str) -> Self {
        Self::new(email.to_owned())
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayName {
    name: String,
}

impl DisplayName {
    pub const ANONYMOUS: &'static str = "Anonymous";

    pub fn new(name: String) -> Self {
        Self { name }
    }

    pub fn anonymous() -> Self {
        Self::new(Self::ANONYMOUS.to_owned())
    }

    /// Blank or missing names are shown as "Anonymous" everywhere, so normalize them once here.
    pub fn or_anonymous(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.trim().is_empty() => Self::new(name),
            _ => Self::anonymous(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.name.fmt(f)
    }
}

/// Who is acting: the signed-in user, the owner of an assignment, or the author of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    email: Email,
    display_name: DisplayName,
}

impl Identity {
    pub fn new(email: Email, display_name: DisplayName) -> Self {
        Self {
            email,
            display_name,
        }
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} <{}>", self.display_name, self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marks {
    marks: f64,
}

impl Marks {
    pub const ZERO: Marks = Marks { marks: 0.0 };

    pub fn new(marks: f64) -> Result<Self> {
        if !marks.is_finite() {
            bail!("attempted to construct marks with non-finite value `{marks}`");
        }
        Ok(Self { marks })
    }

    pub fn as_f64(self) -> f64 {
        self.marks
    }

    /// Total order for sorting; construction already excludes NaN.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.marks.total_cmp(&other.marks)
    }
}

impl fmt::Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.marks.fmt(f)
    }
}
