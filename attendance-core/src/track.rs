//! Tracks: the cohorts/programs that own schedule events.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::branch::{Branch, BranchDirectory};
use crate::id::{RawId, TrackId};

/// A track as returned by `GET /attendance/tracks/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    #[serde(default, deserialize_with = "branch_ref")]
    pub default_branch: Option<BranchRef>,
    #[serde(default, deserialize_with = "optional_id")]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub intake: Option<serde_json::Value>,
    #[serde(default)]
    pub program_type_display: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// How a track refers to its default branch: inline, or by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BranchRef {
    Inline(Branch),
    Id(String),
}

impl Track {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Track {
            id: TrackId::new(id),
            name: name.into(),
            default_branch: None,
            branch_id: None,
            intake: None,
            program_type_display: None,
            start_date: None,
        }
    }

    pub fn with_default_branch(mut self, branch: Branch) -> Self {
        self.default_branch = Some(BranchRef::Inline(branch));
        self
    }

    /// Resolve the branch new offline sessions of this track default to.
    ///
    /// An inline `default_branch` wins; otherwise `default_branch` or
    /// `branch_id` is looked up in the directory.
    pub fn resolve_default_branch(&self, directory: &BranchDirectory) -> Option<Branch> {
        match &self.default_branch {
            Some(BranchRef::Inline(branch)) => Some(branch.clone()),
            Some(BranchRef::Id(id)) => directory.get(id).cloned(),
            None => self
                .branch_id
                .as_deref()
                .and_then(|id| directory.get(id))
                .cloned(),
        }
    }

    /// One-line label for pickers, e.g. "Web Development (Intake 44)".
    pub fn label(&self) -> String {
        match &self.intake {
            Some(serde_json::Value::Null) | None => self.name.clone(),
            Some(serde_json::Value::String(s)) => format!("{} (Intake {})", self.name, s),
            Some(other) => format!("{} (Intake {})", self.name, other),
        }
    }
}

/// One page of the paginated track list.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackPage {
    pub results: Vec<Track>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBranchRef {
    Inline(Branch),
    Id(RawId),
}

fn branch_ref<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BranchRef>, D::Error> {
    let raw = Option::<RawBranchRef>::deserialize(deserializer)?;
    Ok(raw.map(|r| match r {
        RawBranchRef::Inline(branch) => BranchRef::Inline(branch),
        RawBranchRef::Id(id) => BranchRef::Id(id.into_string()),
    }))
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(RawId::into_string))
}
