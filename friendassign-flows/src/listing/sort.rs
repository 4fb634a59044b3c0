use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use friendassign_api::assignment::Assignment;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SortField {
    Title,
    Difficulty,
    Marks,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Title, SortField::Difficulty, SortField::Marks];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Difficulty => "difficulty",
            SortField::Marks => "marks",
        }
    }

    pub fn compare(self, a: &Assignment, b: &Assignment) -> Ordering {
        match self {
            SortField::Title => a
                .title()
                .as_str()
                .to_lowercase()
                .cmp(&b.title().as_str().to_lowercase()),
            SortField::Difficulty => a.difficulty().rank().cmp(&b.difficulty().rank()),
            SortField::Marks => a.marks().total_cmp(&b.marks()),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown sort field \"{s}\""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(anyhow!("unknown sort direction \"{s}\"")),
        }
    }
}

/// No field means "as fetched".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Sort {
    pub field: Option<SortField>,
    pub direction: SortDirection,
}

impl Sort {
    pub fn by(field: SortField, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction,
        }
    }
}

/// Stable: assignments that compare equal keep their fetched order in both directions.
pub fn sort_assignments(assignments: &mut [Assignment], sort: Sort) {
    let Some(field) = sort.field else {
        return;
    };
    match sort.direction {
        SortDirection::Ascending => assignments.sort_by(|a, b| field.compare(a, b)),
        SortDirection::Descending => assignments.sort_by(|a, b| field.compare(a, b).reverse()),
    }
}
