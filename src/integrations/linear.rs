//! Linear Integration Adapter
//!
//! GraphQL client for issue creation/update, workflow state lookup and team
//! membership. Personal API keys go in the `Authorization` header as-is.

use crate::config::LinearIntegration;
use crate::sync::{CreatedRecord, ExternalTracker, Person, RecordUpdate, TeamMember, WorkflowState};
use crate::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for queries
const QUERY_TIMEOUT: Duration = Duration::from_secs(15);
/// Per-request timeout for mutations
const MUTATION_TIMEOUT: Duration = Duration::from_secs(20);

/// Team members fetched in one query
const MEMBERS_PAGE_SIZE: u32 = 250;

const ISSUE_CREATE: &str = r#"
    mutation($teamId: String!, $title: String!, $description: String!) {
        issueCreate(input: { teamId: $teamId, title: $title, description: $description }) {
            success
            issue { id url }
        }
    }
"#;

const ISSUE_UPDATE: &str = r#"
    mutation($id: String!, $input: IssueUpdateInput!) {
        issueUpdate(id: $id, input: $input) {
            success
        }
    }
"#;

const WORKFLOW_STATES: &str = r#"
    query($teamId: ID!, $name: String!, $type: String!) {
        workflowStates(filter: {
            team: { id: { eq: $teamId } },
            name: { eq: $name },
            type: { eq: $type }
        }) {
            nodes { id name type }
        }
    }
"#;

const TEAM_MEMBERS: &str = r#"
    query($teamId: String!, $first: Int!) {
        team(id: $teamId) {
            members(first: $first) {
                nodes { id displayName }
            }
        }
    }
"#;

const USER: &str = r#"
    query($id: String!) {
        user(id: $id) { displayName }
    }
"#;

/// Linear GraphQL API client
pub struct LinearAdapter {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

/// GraphQL response wrapper
#[derive(Debug, Clone, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCreateData {
    issue_create: IssuePayload,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    success: bool,
    issue: Option<IssueNode>,
}

#[derive(Debug, Deserialize)]
struct IssueNode {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueUpdateData {
    issue_update: SuccessPayload,
}

#[derive(Debug, Deserialize)]
struct SuccessPayload {
    success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowStatesData {
    workflow_states: Connection<StateNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StateNode {
    id: String,
    name: String,
    #[serde(rename = "type")]
    category: String,
}

#[derive(Debug, Deserialize)]
struct TeamData {
    team: TeamNode,
}

#[derive(Debug, Deserialize)]
struct TeamNode {
    members: Connection<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    #[serde(default)]
    id: Option<String>,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct UserData {
    user: UserNode,
}

impl LinearAdapter {
    /// Create a new Linear adapter
    pub fn new(config: &LinearIntegration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("linear-sync/1.0"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Execute a GraphQL query
    async fn graphql<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: serde_json::Value,
        timeout: Duration,
    ) -> Result<T> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header(header::AUTHORIZATION, key);
        }

        let response = request.timeout(timeout).send().await?;

        match response.status() {
            StatusCode::OK => {
                let result: GraphQLResponse<T> = response.json().await?;
                if let Some(errors) = result.errors {
                    let error_msg = errors
                        .iter()
                        .map(|e| e.message.clone())
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(SyncError::Integration(format!(
                        "Linear GraphQL error: {}",
                        error_msg
                    )));
                }
                result.data.ok_or_else(|| {
                    SyncError::Integration("No data in Linear GraphQL response".to_string())
                })
            }
            StatusCode::UNAUTHORIZED => Err(SyncError::Integration(
                "Linear authentication failed".to_string(),
            )),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(SyncError::Integration(format!(
                    "Linear API error: HTTP {}: {}",
                    status, error_body
                )))
            }
        }
    }
}

#[async_trait]
impl ExternalTracker for LinearAdapter {
    async fn create_record(
        &self,
        team_id: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<CreatedRecord>> {
        info!(team_id = %team_id, title = %title, "Creating Linear issue");

        let variables = serde_json::json!({
            "teamId": team_id,
            "title": title,
            "description": description,
        });
        let data: IssueCreateData = self
            .graphql(ISSUE_CREATE, variables, MUTATION_TIMEOUT)
            .await?;

        let payload = data.issue_create;
        if !payload.success {
            return Ok(None);
        }
        Ok(payload.issue.map(|issue| CreatedRecord {
            id: issue.id,
            url: issue.url,
        }))
    }

    async fn update_record(&self, id: &str, update: RecordUpdate) -> Result<bool> {
        info!(id = %id, update = ?update, "Updating Linear issue");

        let variables = serde_json::json!({
            "id": id,
            "input": update,
        });
        let data: IssueUpdateData = self
            .graphql(ISSUE_UPDATE, variables, MUTATION_TIMEOUT)
            .await?;

        Ok(data.issue_update.success)
    }

    async fn find_workflow_states(
        &self,
        team_id: &str,
        name: &str,
        category: &str,
    ) -> Result<Vec<WorkflowState>> {
        debug!(team_id = %team_id, name = %name, category = %category, "Looking up workflow states");

        let variables = serde_json::json!({
            "teamId": team_id,
            "name": name,
            "type": category,
        });
        let data: WorkflowStatesData = self
            .graphql(WORKFLOW_STATES, variables, QUERY_TIMEOUT)
            .await?;

        Ok(data
            .workflow_states
            .nodes
            .into_iter()
            .map(|node| WorkflowState {
                id: node.id,
                name: node.name,
                category: node.category,
            })
            .collect())
    }

    async fn team_members(&self, team_id: &str) -> Result<Vec<TeamMember>> {
        debug!(team_id = %team_id, "Listing Linear team members");

        let variables = serde_json::json!({
            "teamId": team_id,
            "first": MEMBERS_PAGE_SIZE,
        });
        let data: TeamData = self.graphql(TEAM_MEMBERS, variables, QUERY_TIMEOUT).await?;

        data.team
            .members
            .nodes
            .into_iter()
            .map(|node| {
                let id = node.id.ok_or_else(|| {
                    SyncError::Parse(format!("Team member '{}' has no id", node.display_name))
                })?;
                Ok(TeamMember {
                    id,
                    display_name: node.display_name,
                })
            })
            .collect()
    }

    async fn get_person(&self, id: &str) -> Result<Person> {
        debug!(id = %id, "Fetching Linear user");

        let variables = serde_json::json!({ "id": id });
        let data: UserData = self.graphql(USER, variables, QUERY_TIMEOUT).await?;

        Ok(Person {
            display_name: data.user.display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn adapter_for(server: &Server) -> LinearAdapter {
        let config = LinearIntegration {
            api_url: format!("{}/graphql", server.url()),
            ..LinearIntegration::default()
        };
        LinearAdapter::new(&config)
            .expect("Failed to create adapter")
            .with_api_key("lin_api_test")
    }

    #[tokio::test]
    async fn test_create_record() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "lin_api_test")
            .match_body(Matcher::PartialJson(json!({
                "variables": {
                    "teamId": "team-1",
                    "title": "Bug [o/r#1]",
                    "description": "desc"
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": {
                        "issueCreate": {
                            "success": true,
                            "issue": { "id": "lin-1", "url": "https://linear.app/x/issue/X-1" }
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let record = adapter_for(&server)
            .create_record("team-1", "Bug [o/r#1]", "desc")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            record,
            Some(CreatedRecord {
                id: "lin-1".to_string(),
                url: "https://linear.app/x/issue/X-1".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_create_record_without_issue() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(json!({ "data": { "issueCreate": { "success": true, "issue": null } } }).to_string())
            .create_async()
            .await;

        let record = adapter_for(&server)
            .create_record("team-1", "t", "d")
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_update_record_sends_only_set_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({
                "variables": { "id": "lin-1", "input": { "stateId": "state-9" } }
            })))
            .with_status(200)
            .with_body(json!({ "data": { "issueUpdate": { "success": false } } }).to_string())
            .create_async()
            .await;

        let update = RecordUpdate {
            state_id: Some("state-9".to_string()),
            ..RecordUpdate::default()
        };
        let success = adapter_for(&server)
            .update_record("lin-1", update)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(!success);
    }

    #[tokio::test]
    async fn test_find_workflow_states() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "workflowStates": {
                            "nodes": [{ "id": "s1", "name": "Autoclosed", "type": "completed" }]
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let states = adapter_for(&server)
            .find_workflow_states("team-1", "Autoclosed", "completed")
            .await
            .unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].category, "completed");
    }

    #[tokio::test]
    async fn test_team_members_and_person() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("team\\(id".to_string()))
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "team": {
                            "members": {
                                "nodes": [
                                    { "id": "u1", "displayName": "pato" },
                                    { "id": "u2", "displayName": "john" }
                                ]
                            }
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("user\\(id".to_string()))
            .with_status(200)
            .with_body(json!({ "data": { "user": { "displayName": "john" } } }).to_string())
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let members = adapter.team_members("team-1").await.unwrap();
        assert_eq!(members[1].id, "u2");

        let person = adapter.get_person("u2").await.unwrap();
        assert_eq!(person.display_name, "john");
    }

    #[tokio::test]
    async fn test_graphql_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                json!({ "errors": [{ "message": "Entity not found" }, { "message": "again" }] })
                    .to_string(),
            )
            .create_async()
            .await;

        match adapter_for(&server).get_person("missing").await {
            Err(SyncError::Integration(msg)) => {
                assert_eq!(msg, "Linear GraphQL error: Entity not found; again")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(401)
            .create_async()
            .await;

        let result = adapter_for(&server).team_members("team-1").await;
        assert!(matches!(result, Err(SyncError::Integration(msg)) if msg.contains("authentication")));
    }
}
