use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Reads an explicit `null` as the type's default, the same as a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One page of the `/repo/{id}/builds` collection.
///
/// Every field has a default so that a response missing parts of the
/// envelope still decodes; only structurally wrong JSON is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildsPage {
    #[serde(rename = "@type", deserialize_with = "null_default")]
    pub resource_type: String,
    #[serde(rename = "@href")]
    pub href: Option<String>,
    #[serde(rename = "@representation", deserialize_with = "null_default")]
    pub representation: String,
    #[serde(rename = "@pagination", deserialize_with = "null_default")]
    pub pagination: Pagination,
    #[serde(deserialize_with = "null_default")]
    pub builds: Vec<Build>,
}

/// Position of a page within the full result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    #[serde(deserialize_with = "null_default")]
    pub limit: u64,
    #[serde(deserialize_with = "null_default")]
    pub offset: u64,
    /// Total number of builds in the collection
    #[serde(deserialize_with = "null_default")]
    pub count: u64,
    #[serde(deserialize_with = "null_default")]
    pub is_first: bool,
    #[serde(deserialize_with = "null_default")]
    pub is_last: bool,
    pub next: Option<PageLink>,
    pub prev: Option<PageLink>,
    pub first: Option<PageLink>,
    pub last: Option<PageLink>,
}

impl Pagination {
    /// Offset of the following page, `0` when there is none.
    ///
    /// A legitimate next offset of zero cannot be told apart from the end
    /// of the collection; callers stop on either.
    pub fn next_offset(&self) -> u64 {
        self.next.as_ref().map_or(0, |next| next.offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLink {
    #[serde(rename = "@href")]
    pub href: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub offset: u64,
    #[serde(deserialize_with = "null_default")]
    pub limit: u64,
}

/// A single Travis CI build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Build {
    #[serde(rename = "@type", deserialize_with = "null_default")]
    pub resource_type: String,
    #[serde(rename = "@href")]
    pub href: Option<String>,
    #[serde(rename = "@representation", deserialize_with = "null_default")]
    pub representation: String,
    #[serde(rename = "@permissions", deserialize_with = "null_default")]
    pub permissions: Permissions,
    #[serde(deserialize_with = "null_default")]
    pub id: u64,
    /// Display number, e.g. "1024"
    #[serde(deserialize_with = "null_default")]
    pub number: String,
    /// created, received, started, passed, failed, errored or canceled
    #[serde(deserialize_with = "null_default")]
    pub state: String,
    /// Duration in seconds, absent while the build is running
    pub duration: Option<u64>,
    /// push, pull_request, api or cron
    #[serde(deserialize_with = "null_default")]
    pub event_type: String,
    pub previous_state: Option<String>,
    pub pull_request_title: Option<String>,
    pub pull_request_number: Option<RefValue>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub finished_at: Option<DateTime<FixedOffset>>,
    #[serde(deserialize_with = "null_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_default")]
    pub branch: Branch,
    pub tag: Option<TagValue>,
    pub commit: Option<Commit>,
    #[serde(deserialize_with = "null_default")]
    pub jobs: Vec<JobRef>,
    #[serde(deserialize_with = "null_default")]
    pub stages: Vec<Stage>,
    pub created_by: Option<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    #[serde(deserialize_with = "null_default")]
    pub read: bool,
    #[serde(deserialize_with = "null_default")]
    pub cancel: bool,
    #[serde(deserialize_with = "null_default")]
    pub restart: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    #[serde(rename = "@href")]
    pub href: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub id: u64,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branch {
    #[serde(rename = "@href")]
    pub href: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commit {
    #[serde(deserialize_with = "null_default")]
    pub id: u64,
    #[serde(deserialize_with = "null_default")]
    pub sha: String,
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    pub message: Option<String>,
    pub compare_url: Option<String>,
    pub committed_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRef {
    #[serde(rename = "@href")]
    pub href: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stage {
    #[serde(deserialize_with = "null_default")]
    pub id: u64,
    #[serde(deserialize_with = "null_default")]
    pub number: u64,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    pub state: Option<String>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub finished_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(rename = "@href")]
    pub href: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub id: u64,
    #[serde(deserialize_with = "null_default")]
    pub login: String,
}

/// A field Travis returns as either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefValue {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Build tag: a bare number or name, or the minimal tag resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Number(i64),
    Name(String),
    Resource(TagRef),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagRef {
    pub id: Option<u64>,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Name(name) => f.write_str(name),
            Self::Resource(tag) => f.write_str(&tag.name),
        }
    }
}
