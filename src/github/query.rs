//! Request builders for the three GitHub collections

use crate::types::{DateWindow, RepoId, SearchEntity, SearchState};

/// One logical query, independent of which page is being requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `GET /search/issues?q=...`
    Search { q: String },
    /// `GET /repos/{owner}/{repo}/commits?since=...&until=...`
    Commits {
        repo: RepoId,
        since: String,
        until: String,
    },
    /// `GET /repos/{owner}/{repo}/releases`
    Releases { repo: RepoId },
}

impl Query {
    pub fn search(
        repo: &RepoId,
        entity: SearchEntity,
        state: SearchState,
        label: Option<&str>,
        chunk: &DateWindow,
    ) -> Self {
        Query::Search {
            q: build_search_query(repo, entity, state, label, chunk),
        }
    }

    pub fn commits(repo: &RepoId, chunk: &DateWindow) -> Self {
        Query::Commits {
            repo: repo.clone(),
            since: chunk.since_timestamp(),
            until: chunk.until_timestamp(),
        }
    }

    pub fn releases(repo: &RepoId) -> Self {
        Query::Releases { repo: repo.clone() }
    }

    /// Path relative to the API base
    pub fn path(&self) -> String {
        match self {
            Query::Search { .. } => "/search/issues".to_string(),
            Query::Commits { repo, .. } => format!("/repos/{}/{}/commits", repo.owner, repo.name),
            Query::Releases { repo } => format!("/repos/{}/{}/releases", repo.owner, repo.name),
        }
    }

    /// Query-string parameters for a numbered page
    pub fn params(&self, page_size: u32, page: u32) -> Vec<(String, String)> {
        let mut params = match self {
            Query::Search { q } => vec![("q".to_string(), q.clone())],
            Query::Commits { since, until, .. } => vec![
                ("since".to_string(), since.clone()),
                ("until".to_string(), until.clone()),
            ],
            Query::Releases { .. } => Vec::new(),
        };
        params.push(("per_page".to_string(), page_size.to_string()));
        params.push(("page".to_string(), page.to_string()));
        params
    }

    /// Key wrapping the record array, if the response is an object
    pub fn items_key(&self) -> Option<&'static str> {
        match self {
            Query::Search { .. } => Some("items"),
            Query::Commits { .. } | Query::Releases { .. } => None,
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::Search { q } => f.write_str(q),
            Query::Commits { since, until, .. } => {
                write!(f, "{} since={} until={}", self.path(), since, until)
            }
            Query::Releases { .. } => f.write_str(&self.path()),
        }
    }
}

/// Build a search query with space-separated qualifiers.
///
/// `repo:o/r is:pr created:2024-01-01..2024-01-30`
pub fn build_search_query(
    repo: &RepoId,
    entity: SearchEntity,
    state: SearchState,
    label: Option<&str>,
    chunk: &DateWindow,
) -> String {
    let kind = match entity {
        SearchEntity::PullRequest => "is:pr",
        SearchEntity::Issue => "is:issue",
    };
    let mut q = format!("repo:{} {}", repo, kind);
    if let Some(label) = label {
        q.push_str(" label:");
        q.push_str(&quote_label(label));
    }
    let range = format!("{}..{}", chunk.start(), chunk.end());
    let qualifier = match state {
        SearchState::Opened => format!("created:{}", range),
        SearchState::Closed => format!("is:closed closed:{}", range),
        SearchState::Merged => format!("is:merged merged:{}", range),
    };
    q.push(' ');
    q.push_str(&qualifier);
    q
}

/// Labels must match exactly; quote them when they would split the query
pub fn quote_label(label: &str) -> String {
    if label.chars().any(|c| c.is_whitespace() || c == '"') {
        format!("\"{}\"", label.replace('"', "\\\""))
    } else {
        label.to_string()
    }
}

/// `"Major decision pending"` -> `major-decision-pending`
pub fn slugify_label(label: &str) -> String {
    let slug: String = label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn repo() -> RepoId {
        RepoId::new("valkey-io", "valkey").unwrap()
    }

    fn chunk() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 30).unwrap(),
        )
        .unwrap()
    }

    // ========== build_search_query tests ==========

    #[test]
    fn test_pr_opened_query() {
        let q = build_search_query(&repo(), SearchEntity::PullRequest, SearchState::Opened, None, &chunk());
        assert_eq!(q, "repo:valkey-io/valkey is:pr created:2024-01-01..2024-01-30");
    }

    #[test]
    fn test_pr_closed_and_merged_queries() {
        let closed = build_search_query(&repo(), SearchEntity::PullRequest, SearchState::Closed, None, &chunk());
        assert_eq!(closed, "repo:valkey-io/valkey is:pr is:closed closed:2024-01-01..2024-01-30");

        let merged = build_search_query(&repo(), SearchEntity::PullRequest, SearchState::Merged, None, &chunk());
        assert_eq!(merged, "repo:valkey-io/valkey is:pr is:merged merged:2024-01-01..2024-01-30");
    }

    #[test]
    fn test_labeled_issue_query_quotes_spaces() {
        let q = build_search_query(
            &repo(),
            SearchEntity::Issue,
            SearchState::Closed,
            Some("Major decision pending"),
            &chunk(),
        );
        assert_eq!(
            q,
            "repo:valkey-io/valkey is:issue label:\"Major decision pending\" is:closed closed:2024-01-01..2024-01-30"
        );
    }

    #[test]
    fn test_quote_label() {
        assert_eq!(quote_label("enhancement"), "enhancement");
        assert_eq!(quote_label("good first issue"), "\"good first issue\"");
        assert_eq!(quote_label("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_slugify_label() {
        assert_eq!(slugify_label("Major decision pending"), "major-decision-pending");
        assert_eq!(slugify_label("enhancement"), "enhancement");
        assert_eq!(slugify_label("  area: core "), "area--core");
    }

    // ========== Query tests ==========

    #[test]
    fn test_commits_query_params() {
        let q = Query::commits(&repo(), &chunk());
        assert_eq!(q.path(), "/repos/valkey-io/valkey/commits");
        let params = q.params(100, 2);
        assert_eq!(
            params,
            vec![
                ("since".to_string(), "2024-01-01T00:00:00Z".to_string()),
                ("until".to_string(), "2024-01-30T23:59:59Z".to_string()),
                ("per_page".to_string(), "100".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(q.items_key(), None);
    }

    #[test]
    fn test_search_query_wraps_items() {
        let q = Query::search(&repo(), SearchEntity::Issue, SearchState::Opened, None, &chunk());
        assert_eq!(q.path(), "/search/issues");
        assert_eq!(q.items_key(), Some("items"));
        assert_eq!(q.params(50, 1)[0].0, "q");
    }

    #[test]
    fn test_releases_query() {
        let q = Query::releases(&repo());
        assert_eq!(q.path(), "/repos/valkey-io/valkey/releases");
        assert_eq!(q.params(100, 1).len(), 2);
        assert_eq!(q.to_string(), "/repos/valkey-io/valkey/releases");
    }
}
