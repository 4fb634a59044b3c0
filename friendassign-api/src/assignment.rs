use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};

use crate::types::{DisplayName, Email, Identity, Marks};

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    id: AssignmentId,
    title: AssignmentTitle,
    description: String,
    marks: Marks,
    thumbnail_url: String,
    difficulty: Difficulty,
    due_date: DueDate,
    owner: Identity,
}

impl Assignment {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AssignmentId,
        title: AssignmentTitle,
        description: String,
        marks: Marks,
        thumbnail_url: String,
        difficulty: Difficulty,
        due_date: DueDate,
        owner: Identity,
    ) -> Self {
        Self {
            id,
            title,
            description,
            marks,
            thumbnail_url,
            difficulty,
            due_date,
            owner,
        }
    }

    pub fn id(&self) -> &AssignmentId {
        &self.id
    }

    pub fn title(&self) -> &AssignmentTitle {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn marks(&self) -> Marks {
        self.marks
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn due_date(&self) -> DueDate {
        self.due_date
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }
}

/// The assignment as the server sends it. Fields are loose on purpose; [`Assignment::try_from`] is
/// the one place they get checked.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignmentWire {
    #[serde(rename = "_id")]
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    marks: Option<f64>,
    thumbnail_url: Option<String>,
    difficulty: Option<String>,
    due_date: Option<String>,
    user_email: Option<String>,
    user_name: Option<String>,
}

impl TryFrom<AssignmentWire> for Assignment {
    type Error = anyhow::Error;

    fn try_from(wire: AssignmentWire) -> Result<Self> {
        let id = AssignmentId::new(wire.id.context("assignment is missing `_id`")?);
        let title = wire
            .title
            .with_context(|| format!("assignment `{id}` is missing a title"))?;
        let difficulty = wire
            .difficulty
            .with_context(|| format!("assignment `{id}` is missing a difficulty"))?
            .parse()
            .with_context(|| format!("assignment `{id}` has an invalid difficulty"))?;
        let due_date = wire
            .due_date
            .with_context(|| format!("assignment `{id}` is missing a due date"))?
            .parse()
            .with_context(|| format!("assignment `{id}` has an invalid due date"))?;
        let owner_email = wire
            .user_email
            .with_context(|| format!("assignment `{id}` is missing its owner's email"))?;

        Ok(Self {
            title: AssignmentTitle::new(title),
            description: wire.description.unwrap_or_default(),
            // Missing or non-numeric marks count as zero.
            marks: wire.marks.and_then(|marks| Marks::new(marks).ok()).unwrap_or_default(),
            thumbnail_url: wire.thumbnail_url.unwrap_or_default(),
            difficulty,
            due_date,
            owner: Identity::new(
                Email::new(owner_email),
                DisplayName::or_anonymous(wire.user_name),
            ),
            id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId {
    id: String,
}

impl AssignmentId {
    pub fn new(id: String) -> Self {
        Self { id }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.id.fmt(f)
    }
}

impl From<&str> for AssignmentId {
    fn from(id: &str) -> Self {
        Self::new(id.to_owned())
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentTitle {
    title: String,
}

impl AssignmentTitle {
    pub fn new(title: String) -> Self {
        Self { title }
    }

    pub fn as_str(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for AssignmentTitle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.title.fmt(f)
    }
}

/// Declaration order is the sort order: Easy < Medium < Hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn rank(self) -> u8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Difficulty::ALL
            .into_iter()
            .find(|difficulty| difficulty.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown difficulty \"{s}\""))
    }
}

/// A calendar due date. The server stores an ISO-8601 datetime; only the date part matters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DueDate {
    date: NaiveDate,
}

impl DueDate {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn date(self) -> NaiveDate {
        self.date
    }

    pub fn to_iso8601(self) -> String {
        format!("{}T00:00:00.000Z", self.date.format("%Y-%m-%d"))
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.date.format("%B %-d, %Y"))
    }
}

impl FromStr for DueDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::new(datetime.date_naive()));
        }
        match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Ok(Self::new(date)),
            Err(err) => bail!("could not parse due date \"{s}\": {err}"),
        }
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Server-side filter for the assignment list. Empty values mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentFilter {
    pub difficulty: Option<Difficulty>,
    pub search: String,
}

impl AssignmentFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(difficulty) = self.difficulty {
            pairs.push(("difficulty".to_owned(), difficulty.to_string()));
        }
        if !self.search.is_empty() {
            pairs.push(("search".to_owned(), self.search.clone()));
        }
        pairs
    }
}

/// Body for creating or replacing an assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDraft {
    pub title: String,
    pub description: String,
    pub marks: u32,
    pub thumbnail_url: String,
    pub difficulty: Difficulty,
    pub due_date: DueDate,
    pub user_email: Email,
    pub user_name: DisplayName,
}
