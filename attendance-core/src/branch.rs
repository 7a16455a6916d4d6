//! Physical branches (campus locations) offline sessions take place at.

use serde::{Deserialize, Serialize};

use crate::id::RawId;

/// A branch reference, as carried on events and tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Branch {
    #[serde(deserialize_with = "branch_id")]
    pub id: String,
    pub name: String,
}

impl Branch {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Branch {
            id: id.into(),
            name: name.into(),
        }
    }
}

fn branch_id<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(RawId::into_string)
}

/// The fixed list of branches a session can be assigned to.
#[derive(Debug, Clone, Default)]
pub struct BranchDirectory {
    branches: Vec<Branch>,
}

impl BranchDirectory {
    pub fn new(branches: Vec<Branch>) -> Self {
        BranchDirectory { branches }
    }

    pub fn get(&self, id: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}
