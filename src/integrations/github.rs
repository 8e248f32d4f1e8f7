//! GitHub Issues Integration Adapter
//!
//! REST client for the issue, comment and assignee operations the sync engine
//! needs. Pull requests are read through the issues endpoints.

use crate::config::GitHubIntegration;
use crate::link::TicketRef;
use crate::sync::{TicketComment, TicketState, TicketSubject, TicketSystem};
use crate::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for single issue fetches
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for comment listings (up to a full page)
const LIST_TIMEOUT: Duration = Duration::from_secs(20);
/// Per-request timeout for create/update operations
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Comments fetched per listing; links are expected on the first page
const COMMENTS_PER_PAGE: u32 = 100;

/// GitHub REST API client
pub struct GitHubAdapter {
    client: Client,
    rest_base_url: String,
    auth_token: Option<String>,
}

/// GitHub issue (REST API format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub user: Option<GitHubUser>,
    #[serde(default)]
    pub assignees: Vec<GitHubUser>,
    /// Present only when the issue is a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubComment {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<GitHubUser>,
}

#[derive(Debug, Clone, Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct UpdateStateRequest {
    state: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct AssigneesRequest<'a> {
    assignees: &'a [String],
}

impl GitHubAdapter {
    /// Create a new GitHub adapter
    ///
    /// github.com is served from api.github.com; any other host is treated as
    /// GitHub Enterprise with the REST API under `/api/v3`.
    pub fn new(config: &GitHubIntegration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("linear-sync/1.0"),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github.v3+json"),
                );
                headers
            })
            .build()?;

        let base_url = config.url.trim_end_matches('/');
        let rest_base_url = if base_url.contains("api.github.com") {
            base_url.to_string()
        } else if base_url.contains("github.com") {
            "https://api.github.com".to_string()
        } else {
            format!("{}/api/v3", base_url)
        };

        Ok(Self {
            client,
            rest_base_url,
            auth_token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn rest_base_url(&self) -> &str {
        &self.rest_base_url
    }

    fn issue_url(&self, subject: &TicketRef) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}",
            self.rest_base_url, subject.owner, subject.repo, subject.number
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Pass the response through when it has the expected status, map it to an error otherwise
    async fn expect_status(
        response: Response,
        expected: StatusCode,
        operation: &str,
        subject: &TicketRef,
    ) -> Result<Response> {
        match response.status() {
            status if status == expected => Ok(response),
            StatusCode::NOT_FOUND => Err(SyncError::Integration(format!(
                "Issue not found: {}",
                subject
            ))),
            StatusCode::UNAUTHORIZED => Err(SyncError::Integration(
                "GitHub authentication failed".to_string(),
            )),
            StatusCode::FORBIDDEN => Err(SyncError::Integration(
                "GitHub API forbidden (rate limit?)".to_string(),
            )),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(SyncError::Integration(format!(
                    "GitHub {} failed for {}: HTTP {}: {}",
                    operation, subject, status, error_body
                )))
            }
        }
    }

    /// Get a single issue or pull request by number
    pub async fn get_issue(&self, subject: &TicketRef) -> Result<GitHubIssue> {
        debug!(subject = %subject, "Fetching GitHub issue");

        let request = self.authorized(self.client.get(self.issue_url(subject)));
        let response = request.timeout(GET_TIMEOUT).send().await?;
        let response = Self::expect_status(response, StatusCode::OK, "get issue", subject).await?;

        Ok(response.json().await?)
    }

    /// First page of comments, oldest first
    pub async fn get_comments(&self, subject: &TicketRef) -> Result<Vec<GitHubComment>> {
        debug!(subject = %subject, "Listing GitHub comments");

        let url = format!("{}/comments", self.issue_url(subject));
        let request = self
            .authorized(self.client.get(&url))
            .query(&[("per_page", COMMENTS_PER_PAGE)]);
        let response = request.timeout(LIST_TIMEOUT).send().await?;
        let response =
            Self::expect_status(response, StatusCode::OK, "list comments", subject).await?;

        Ok(response.json().await?)
    }

    /// Add a comment to an issue or pull request
    pub async fn add_comment(&self, subject: &TicketRef, body: &str) -> Result<()> {
        info!(subject = %subject, "Adding comment to GitHub issue");

        let url = format!("{}/comments", self.issue_url(subject));
        let request = self
            .authorized(self.client.post(&url))
            .json(&CreateCommentRequest { body });
        let response = request.timeout(WRITE_TIMEOUT).send().await?;
        Self::expect_status(response, StatusCode::CREATED, "comment", subject).await?;

        Ok(())
    }

    /// Open or close an issue
    pub async fn update_state(&self, subject: &TicketRef, state: TicketState) -> Result<()> {
        info!(subject = %subject, state = state.as_str(), "Updating GitHub issue state");

        let request = self
            .authorized(self.client.patch(self.issue_url(subject)))
            .json(&UpdateStateRequest {
                state: state.as_str(),
            });
        let response = request.timeout(WRITE_TIMEOUT).send().await?;
        Self::expect_status(response, StatusCode::OK, "update", subject).await?;

        Ok(())
    }

    pub async fn add_issue_assignees(&self, subject: &TicketRef, logins: &[String]) -> Result<()> {
        info!(subject = %subject, assignees = ?logins, "Adding GitHub assignees");

        let url = format!("{}/assignees", self.issue_url(subject));
        let request = self
            .authorized(self.client.post(&url))
            .json(&AssigneesRequest { assignees: logins });
        let response = request.timeout(WRITE_TIMEOUT).send().await?;
        Self::expect_status(response, StatusCode::CREATED, "add assignees", subject).await?;

        Ok(())
    }

    pub async fn remove_issue_assignees(
        &self,
        subject: &TicketRef,
        logins: &[String],
    ) -> Result<()> {
        info!(subject = %subject, assignees = ?logins, "Removing GitHub assignees");

        let url = format!("{}/assignees", self.issue_url(subject));
        let request = self
            .authorized(self.client.delete(&url))
            .json(&AssigneesRequest { assignees: logins });
        let response = request.timeout(WRITE_TIMEOUT).send().await?;
        Self::expect_status(response, StatusCode::OK, "remove assignees", subject).await?;

        Ok(())
    }
}

impl From<GitHubIssue> for TicketSubject {
    fn from(issue: GitHubIssue) -> Self {
        let state = if issue.state.eq_ignore_ascii_case("closed") {
            TicketState::Closed
        } else {
            TicketState::Open
        };
        Self {
            author: issue.user.map(|u| u.login).unwrap_or_default(),
            title: issue.title,
            url: issue.html_url,
            is_pull_request: issue.pull_request.is_some(),
            state,
        }
    }
}

#[async_trait]
impl TicketSystem for GitHubAdapter {
    async fn get_subject(&self, subject: &TicketRef) -> Result<TicketSubject> {
        Ok(self.get_issue(subject).await?.into())
    }

    async fn list_comments(&self, subject: &TicketRef) -> Result<Vec<TicketComment>> {
        let comments = self.get_comments(subject).await?;
        Ok(comments
            .into_iter()
            .map(|c| TicketComment {
                author: c.user.map(|u| u.login).unwrap_or_default(),
                body: c.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn create_comment(&self, subject: &TicketRef, body: &str) -> Result<()> {
        self.add_comment(subject, body).await
    }

    async fn set_state(&self, subject: &TicketRef, state: TicketState) -> Result<()> {
        self.update_state(subject, state).await
    }

    async fn list_assignees(&self, subject: &TicketRef) -> Result<Vec<String>> {
        let issue = self.get_issue(subject).await?;
        Ok(issue.assignees.into_iter().map(|u| u.login).collect())
    }

    async fn add_assignees(&self, subject: &TicketRef, logins: &[String]) -> Result<()> {
        self.add_issue_assignees(subject, logins).await
    }

    async fn remove_assignees(&self, subject: &TicketRef, logins: &[String]) -> Result<()> {
        self.remove_issue_assignees(subject, logins).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn subject() -> TicketRef {
        TicketRef::new("NomicFoundation", "hardhat", 42)
    }

    fn adapter_for(server: &Server) -> GitHubAdapter {
        let config = GitHubIntegration {
            url: server.url(),
            ..GitHubIntegration::default()
        };
        GitHubAdapter::new(&config)
            .expect("Failed to create adapter")
            .with_token("test-token")
    }

    #[test]
    fn test_public_github_urls() {
        let adapter = GitHubAdapter::new(&GitHubIntegration::default()).unwrap();
        assert_eq!(adapter.rest_base_url(), "https://api.github.com");
    }

    #[test]
    fn test_enterprise_urls() {
        let config = GitHubIntegration {
            url: "https://github.example.com/".to_string(),
            ..GitHubIntegration::default()
        };
        let adapter = GitHubAdapter::new(&config).unwrap();
        assert_eq!(adapter.rest_base_url(), "https://github.example.com/api/v3");
    }

    #[tokio::test]
    async fn test_get_subject_detects_pull_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/repos/NomicFoundation/hardhat/issues/42")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "number": 42,
                    "title": "Fix the thing",
                    "state": "open",
                    "html_url": "https://github.com/NomicFoundation/hardhat/pull/42",
                    "user": { "login": "kanej" },
                    "assignees": [],
                    "pull_request": { "url": "https://api.github.com/..." }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let ticket = adapter_for(&server).get_subject(&subject()).await.unwrap();

        mock.assert_async().await;
        assert!(ticket.is_pull_request);
        assert_eq!(ticket.author, "kanej");
        assert_eq!(ticket.state, TicketState::Open);
    }

    #[tokio::test]
    async fn test_list_comments_in_order() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                "/api/v3/repos/NomicFoundation/hardhat/issues/42/comments",
            )
            .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    { "body": "first", "user": { "login": "a" } },
                    { "body": null, "user": null },
                    { "body": "LINEAR-ID: abc", "user": { "login": "github-actions[bot]" } }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let comments = adapter_for(&server).list_comments(&subject()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[1].body, "");
        assert_eq!(comments[2].author, "github-actions[bot]");
    }

    #[tokio::test]
    async fn test_list_assignees_reads_issue() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v3/repos/NomicFoundation/hardhat/issues/42")
            .with_status(200)
            .with_body(
                json!({
                    "number": 42,
                    "title": "t",
                    "state": "closed",
                    "html_url": "https://github.com/NomicFoundation/hardhat/issues/42",
                    "assignees": [{ "login": "a" }, { "login": "b" }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let assignees = adapter_for(&server).list_assignees(&subject()).await.unwrap();
        assert_eq!(assignees, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_assignee_changes() {
        let mut server = Server::new_async().await;
        let path = "/api/v3/repos/NomicFoundation/hardhat/issues/42/assignees";
        let add = server
            .mock("POST", path)
            .match_body(Matcher::Json(json!({ "assignees": ["kanej"] })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;
        let remove = server
            .mock("DELETE", path)
            .match_body(Matcher::Json(json!({ "assignees": ["a", "b"] })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        adapter
            .add_assignees(&subject(), &["kanej".to_string()])
            .await
            .unwrap();
        adapter
            .remove_assignees(&subject(), &["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        add.assert_async().await;
        remove.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_state_and_comment() {
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", "/api/v3/repos/NomicFoundation/hardhat/issues/42")
            .match_body(Matcher::Json(json!({ "state": "closed" })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let comment = server
            .mock(
                "POST",
                "/api/v3/repos/NomicFoundation/hardhat/issues/42/comments",
            )
            .match_body(Matcher::Json(json!({ "body": "hello" })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        adapter
            .set_state(&subject(), TicketState::Closed)
            .await
            .unwrap();
        adapter.create_comment(&subject(), "hello").await.unwrap();

        patch.assert_async().await;
        comment.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v3/repos/NomicFoundation/hardhat/issues/42")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock(
                "POST",
                "/api/v3/repos/NomicFoundation/hardhat/issues/42/comments",
            )
            .with_status(422)
            .with_body("Validation Failed")
            .create_async()
            .await;

        let adapter = adapter_for(&server);

        match adapter.get_subject(&subject()).await {
            Err(SyncError::Integration(msg)) => {
                assert_eq!(msg, "Issue not found: NomicFoundation/hardhat#42")
            }
            other => panic!("unexpected: {:?}", other),
        }

        match adapter.create_comment(&subject(), "x").await {
            Err(SyncError::Integration(msg)) => {
                assert!(msg.contains("HTTP 422"));
                assert!(msg.contains("Validation Failed"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
