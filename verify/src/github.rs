//! GitHub contribution checker
//!
//! Counts a user's public activity for one UTC day from two sources: the
//! events feed, classified by event type, and a contribution-graph mirror
//! that only reports a daily total. The larger count wins.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::http_client;
use crate::context::{Evidence, EvidenceKind, VerificationContext};
use crate::error::{Result, VerifyError};
use crate::orchestrator::Verifier;
use crate::step::{StageReport, VerificationMethod};

/// Maximum number of repositories listed in a report
const MAX_RECENT_REPOS: usize = 5;

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Base URL of the REST API (default: https://api.github.com)
    pub api_url: String,
    /// Base URL of the contribution-graph service
    pub contributions_url: String,
    /// Optional token; raises the API rate limit
    pub token: Option<String>,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            contributions_url: "https://github-contributions-api.jogruber.de".to_string(),
            token: None,
            user_agent: "GoalForge-App".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubEvent {
    #[serde(rename = "type")]
    kind: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    repo: Option<EventRepo>,
    #[serde(default)]
    payload: EventPayload,
}

#[derive(Debug, Deserialize)]
struct EventRepo {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    #[serde(default)]
    commits: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ContributionGraph {
    #[serde(default)]
    contributions: Vec<ContributionDay>,
}

#[derive(Debug, Deserialize)]
struct ContributionDay {
    date: NaiveDate,
    count: u64,
}

/// Classified activity counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionCounts {
    pub total: u64,
    pub commits: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub reviews: u64,
    #[serde(skip)]
    pub creations: u64,
}

impl ContributionCounts {
    pub fn classified_total(&self) -> u64 {
        self.commits + self.pull_requests + self.issues + self.creations + self.reviews
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubReport {
    pub verified: bool,
    pub username: String,
    pub date: NaiveDate,
    pub contributions: ContributionCounts,
    pub summary: String,
    pub recent_repos: Vec<String>,
}

pub struct GitHubChecker {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

impl GitHubChecker {
    pub fn new(config: GitHubConfig) -> Self {
        let http_client = http_client(config.request_timeout, Some(&config.user_agent));

        Self {
            config,
            http_client,
        }
    }

    pub async fn check(&self, username: &str, date: NaiveDate) -> Result<GitHubReport> {
        let events = self.fetch_events(username).await?;
        let (mut counts, recent_repos) = classify(&events, date);
        let classified = counts.classified_total();

        let graph = self.fetch_graph_count(username, date).await;
        counts.total = classified.max(graph.unwrap_or(0));

        let verified = counts.total > 0;
        let summary = summarize(&counts, date);
        debug!(username, %date, total = counts.total, classified, "GitHub activity checked");

        Ok(GitHubReport {
            verified,
            username: username.to_string(),
            date,
            contributions: counts,
            summary,
            recent_repos,
        })
    }

    async fn fetch_events(&self, username: &str) -> Result<Vec<GitHubEvent>> {
        let url = format!(
            "{}/users/{}/events",
            self.config.api_url.trim_end_matches('/'),
            urlencoding::encode(username)
        );
        let mut request = self
            .http_client
            .get(&url)
            .query(&[("per_page", "100")])
            .header(header::ACCEPT, "application/vnd.github.v3+json");
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(VerifyError::UnknownUser(username.to_string())),
            status if !status.is_success() => {
                return Err(VerifyError::Upstream {
                    service: "github",
                    status: status.as_u16(),
                })
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))
    }

    /// Secondary source. Failures are logged and treated as no data.
    async fn fetch_graph_count(&self, username: &str, date: NaiveDate) -> Option<u64> {
        let url = format!(
            "{}/v4/{}",
            self.config.contributions_url.trim_end_matches('/'),
            urlencoding::encode(username)
        );
        let year = date.year().to_string();

        let response = match self
            .http_client
            .get(&url)
            .query(&[("y", year.as_str())])
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(username, status = %r.status(), "Contribution graph unavailable");
                return None;
            }
            Err(e) => {
                warn!(username, error = %e, "Contribution graph request failed");
                return None;
            }
        };

        match response.json::<ContributionGraph>().await {
            Ok(graph) => graph
                .contributions
                .into_iter()
                .find(|day| day.date == date)
                .map(|day| day.count),
            Err(e) => {
                warn!(username, error = %e, "Contribution graph unreadable");
                None
            }
        }
    }
}

fn classify(events: &[GitHubEvent], date: NaiveDate) -> (ContributionCounts, Vec<String>) {
    let mut counts = ContributionCounts::default();
    let mut repos: Vec<String> = Vec::new();

    for event in events.iter().filter(|e| e.created_at.date_naive() == date) {
        match event.kind.as_str() {
            "PushEvent" => counts.commits += event.payload.commits.len() as u64,
            "PullRequestEvent" => counts.pull_requests += 1,
            "IssuesEvent" | "IssueCommentEvent" => counts.issues += 1,
            "CreateEvent" => counts.creations += 1,
            "PullRequestReviewEvent" => counts.reviews += 1,
            _ => {}
        }
        if let Some(repo) = &event.repo {
            if !repos.contains(&repo.name) {
                repos.push(repo.name.clone());
            }
        }
    }

    repos.truncate(MAX_RECENT_REPOS);
    (counts, repos)
}

fn summarize(counts: &ContributionCounts, date: NaiveDate) -> String {
    let mut parts = Vec::new();
    if counts.commits > 0 {
        parts.push(format!("{} commit(s)", counts.commits));
    }
    if counts.pull_requests > 0 {
        parts.push(format!("{} PR(s)", counts.pull_requests));
    }
    if counts.issues > 0 {
        parts.push(format!("{} issue interaction(s)", counts.issues));
    }
    if counts.creations > 0 {
        parts.push(format!("{} repo/branch creation(s)", counts.creations));
    }
    if counts.reviews > 0 {
        parts.push(format!("{} code review(s)", counts.reviews));
    }

    if !parts.is_empty() {
        format!("Found {} on {}", parts.join(", "), date)
    } else if counts.total > 0 {
        format!("Found {} contribution(s) on {}", counts.total, date)
    } else {
        format!("No contributions found on {}", date)
    }
}

#[async_trait]
impl Verifier for GitHubChecker {
    fn service(&self) -> &'static str {
        "github"
    }

    fn method(&self) -> VerificationMethod {
        VerificationMethod::GithubAuto
    }

    fn applies(&self, ctx: &VerificationContext) -> bool {
        ctx.habit.is_code_habit() && ctx.handle.is_some()
    }

    async fn check(&self, ctx: &VerificationContext) -> Result<StageReport> {
        let username = ctx
            .handle
            .as_deref()
            .ok_or_else(|| VerifyError::InvalidResponse("missing GitHub username".into()))?;
        let report = GitHubChecker::check(self, username, ctx.date).await?;
        let data = serde_json::to_value(&report)
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;

        Ok(StageReport {
            verified: report.verified,
            summary: report.summary,
            evidence: Some(Evidence::new(EvidenceKind::GitHub, data)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str, at: &str, repo: &str, commits: usize) -> GitHubEvent {
        GitHubEvent {
            kind: kind.to_string(),
            created_at: DateTime::parse_from_rfc3339(at).unwrap().with_timezone(&Utc),
            repo: Some(EventRepo {
                name: repo.to_string(),
            }),
            payload: EventPayload {
                commits: vec![serde_json::json!({}); commits],
            },
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn test_classify_counts_only_target_day() {
        let events = vec![
            event("PushEvent", "2026-10-14T09:00:00Z", "a/one", 3),
            event("PullRequestEvent", "2026-10-14T10:00:00Z", "a/two", 0),
            event("IssueCommentEvent", "2026-10-14T11:00:00Z", "a/one", 0),
            event("IssuesEvent", "2026-10-14T12:00:00Z", "a/one", 0),
            event("WatchEvent", "2026-10-14T13:00:00Z", "b/starred", 0),
            event("PushEvent", "2026-10-13T23:59:59Z", "a/old", 5),
        ];
        let (counts, repos) = classify(&events, day());

        assert_eq!(counts.commits, 3);
        assert_eq!(counts.pull_requests, 1);
        assert_eq!(counts.issues, 2);
        assert_eq!(counts.classified_total(), 6);
        assert_eq!(repos, vec!["a/one", "a/two", "b/starred"]);
    }

    #[test]
    fn test_recent_repos_are_bounded() {
        let events: Vec<_> = (0..8)
            .map(|n| event("CreateEvent", "2026-10-14T08:00:00Z", &format!("r/{}", n), 0))
            .collect();
        let (counts, repos) = classify(&events, day());
        assert_eq!(counts.creations, 8);
        assert_eq!(repos.len(), MAX_RECENT_REPOS);
    }

    #[test]
    fn test_summary_forms() {
        let mut counts = ContributionCounts {
            commits: 2,
            pull_requests: 1,
            ..Default::default()
        };
        counts.total = counts.classified_total();
        assert_eq!(summarize(&counts, day()), "Found 2 commit(s), 1 PR(s) on 2026-10-14");

        let graph_only = ContributionCounts {
            total: 4,
            ..Default::default()
        };
        assert_eq!(summarize(&graph_only, day()), "Found 4 contribution(s) on 2026-10-14");

        assert_eq!(
            summarize(&ContributionCounts::default(), day()),
            "No contributions found on 2026-10-14"
        );
    }
}
