use core::fmt;

use serde::{Deserialize, Serialize};

/// Label chosen by a submitter to identify a physical tree.
///
/// Not a database key: two unrelated trees may share a name, in which case
/// their votes are pooled.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeName(String);

impl TreeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Species or kind of tree proposed by a submission, eg. `Oak`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeType(String);

impl TreeType {
    pub fn new(tree_type: impl Into<String>) -> Self {
        Self(tree_type.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreeType {
    fn from(tree_type: &str) -> Self {
        Self::new(tree_type)
    }
}

/// Physical description of a tree carried by every submission.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    /// Height in meters, always positive
    pub height: f64,

    /// Age in years
    pub age: u32,

    /// Latitude in degrees, within `[-90, 90]`
    pub latitude: f64,

    /// Longitude in degrees, within `[-180, 180]`
    pub longitude: f64,
}

/// A validated submission, ready to be recorded as a vote.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub name: TreeName,
    pub tree_type: TreeType,
    pub measurements: Measurements,
}

/// Identifies one tally over its whole lifetime.
///
/// A fresh id is handed out whenever a tally is opened for a name, so that
/// a name voted on again after a commit gets a different id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TallyId(u64);

impl TallyId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TallyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a tally which reached quorum: the winning type together with
/// the representative measurements of the tally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSubmission {
    pub tally_id: TallyId,
    pub name: TreeName,
    pub tree_type: TreeType,
    pub measurements: Measurements,
}
