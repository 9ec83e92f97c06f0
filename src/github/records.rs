//! Lenient view over the record shapes GitHub returns
//!
//! Search items, commits and releases share one struct: every field is
//! optional and unknown fields are ignored, so the engine only sees the
//! timestamps and identity fields it extracts.

use serde::Deserialize;

use crate::types::TimestampField;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EventRecord {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub merged_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    /// Present on search items that are pull requests
    #[serde(default)]
    pub pull_request: Option<PullRequestRef>,
    /// Platform account linked to a commit or release (null for unlinked commits)
    #[serde(default)]
    pub author: Option<AccountRef>,
    /// Account that opened an issue or pull request
    #[serde(default)]
    pub user: Option<AccountRef>,
    #[serde(default)]
    pub commit: Option<CommitDetail>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PullRequestRef {
    #[serde(default)]
    pub merged_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AccountRef {
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CommitDetail {
    #[serde(default)]
    pub author: Option<GitSignature>,
}

/// Git-level author (not necessarily linked to an account)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GitSignature {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl EventRecord {
    /// Raw timestamp for `field`, with the fallbacks each field allows.
    ///
    /// Merged falls back to `pull_request.merged_at`, then `closed_at`;
    /// published falls back to `created_at` for draft-less releases.
    pub fn timestamp(&self, field: TimestampField) -> Option<&str> {
        match field {
            TimestampField::Created => non_empty(&self.created_at),
            TimestampField::Closed => non_empty(&self.closed_at),
            TimestampField::Merged => non_empty(&self.merged_at)
                .or_else(|| self.pull_request.as_ref().and_then(|p| non_empty(&p.merged_at)))
                .or_else(|| non_empty(&self.closed_at)),
            TimestampField::Authored => self
                .commit
                .as_ref()
                .and_then(|c| c.author.as_ref())
                .and_then(|a| non_empty(&a.date)),
            TimestampField::Published => {
                non_empty(&self.published_at).or_else(|| non_empty(&self.created_at))
            }
        }
    }

    /// Account login: commit/release `author` first, then issue `user`
    pub fn login(&self) -> Option<&str> {
        self.author
            .as_ref()
            .and_then(|a| non_empty(&a.login))
            .or_else(|| self.user.as_ref().and_then(|u| non_empty(&u.login)))
    }

    /// Git author email from the commit payload
    pub fn email(&self) -> Option<&str> {
        self.commit
            .as_ref()
            .and_then(|c| c.author.as_ref())
            .and_then(|a| non_empty(&a.email))
    }
}
