//! HTTP access to the remote task API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use crate::model::task::{Task, TaskId, TaskPayload};
use crate::ops::board_ops::find_duplicate_id;

/// Error type for gateway requests
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// The message the server put in its error body, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            GatewayError::NotFound(m) | GatewayError::Api { message: m, .. } if !m.is_empty() => {
                Some(m.as_str())
            }
            _ => None,
        }
    }

    /// What to tell the user: the server's message, or `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// The four operations the board needs from the remote side
pub trait TaskGateway: Send + Sync {
    /// Fetch every task
    fn list(&self) -> Result<Vec<Task>, GatewayError>;
    /// Create a task. Returns the created task when the server echoes it back.
    fn create(&self, payload: &TaskPayload) -> Result<Option<Task>, GatewayError>;
    /// Patch a task. Returns the updated task when the server echoes it back.
    fn update(&self, id: TaskId, payload: &TaskPayload) -> Result<Option<Task>, GatewayError>;
    fn delete(&self, id: TaskId) -> Result<(), GatewayError>;
}

impl<G: TaskGateway + ?Sized> TaskGateway for Arc<G> {
    fn list(&self) -> Result<Vec<Task>, GatewayError> {
        (**self).list()
    }

    fn create(&self, payload: &TaskPayload) -> Result<Option<Task>, GatewayError> {
        (**self).create(payload)
    }

    fn update(&self, id: TaskId, payload: &TaskPayload) -> Result<Option<Task>, GatewayError> {
        (**self).update(id, payload)
    }

    fn delete(&self, id: TaskId) -> Result<(), GatewayError> {
        (**self).delete(id)
    }
}

#[derive(Deserialize)]
struct TaskListBody {
    tasks: Vec<Task>,
}

/// Create/update bodies come back either bare or wrapped in `{task: ...}`
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskEnvelope {
    Wrapped { task: Task },
    Bare(Task),
}

impl From<TaskEnvelope> for Task {
    fn from(envelope: TaskEnvelope) -> Task {
        match envelope {
            TaskEnvelope::Wrapped { task } | TaskEnvelope::Bare(task) => task,
        }
    }
}

/// Extract a human-readable message from a JSON error body.
///
/// Tries `message`, then `error`, then falls back to the raw body.
fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = json.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    body.trim().to_string()
}

/// `TaskGateway` over HTTP + JSON
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpGateway {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response to a `GatewayError`.
    fn check_response(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = extract_error_message(&body);
        tracing::debug!(status = status.as_u16(), %message, "request rejected");
        match status.as_u16() {
            404 => Err(GatewayError::NotFound(message)),
            code => Err(GatewayError::Api {
                status: code,
                message,
            }),
        }
    }

    /// Decode a create/update body. An undecodable body is not an error: the
    /// request itself succeeded.
    fn decode_task(body: &str) -> Option<Task> {
        match serde_json::from_str::<TaskEnvelope>(body) {
            Ok(envelope) => Some(envelope.into()),
            Err(e) => {
                tracing::debug!(error = %e, "response body is not a task");
                None
            }
        }
    }
}

impl TaskGateway for HttpGateway {
    fn list(&self) -> Result<Vec<Task>, GatewayError> {
        let url = self.url("/task/list");
        tracing::debug!(%url, "GET");
        let response = Self::check_response(self.client.get(&url).send()?)?;
        let body = response.text()?;
        let parsed: TaskListBody =
            serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        if let Some(id) = find_duplicate_id(&parsed.tasks) {
            return Err(GatewayError::Malformed(format!("duplicate task id {id}")));
        }
        tracing::debug!(count = parsed.tasks.len(), "tasks listed");
        Ok(parsed.tasks)
    }

    fn create(&self, payload: &TaskPayload) -> Result<Option<Task>, GatewayError> {
        let url = self.url("/task/new");
        tracing::debug!(%url, "POST");
        let response = Self::check_response(self.client.post(&url).json(payload).send()?)?;
        Ok(Self::decode_task(&response.text()?))
    }

    fn update(&self, id: TaskId, payload: &TaskPayload) -> Result<Option<Task>, GatewayError> {
        let url = self.url(&format!("/task/edit/{id}"));
        tracing::debug!(%url, "PATCH");
        let response = Self::check_response(self.client.patch(&url).json(payload).send()?)?;
        Ok(Self::decode_task(&response.text()?))
    }

    fn delete(&self, id: TaskId) -> Result<(), GatewayError> {
        let url = self.url(&format!("/task/edit/{id}"));
        tracing::debug!(%url, "DELETE");
        Self::check_response(self.client.delete(&url).send()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskStatus;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;

    const TASKS_JSON: &str = r#"{"tasks":[
        {"id":1,"title":"Write report","details":"Quarterly","author":"Ana Paula","createdAt":"2025-02-01T10:00:00.000Z","status":"PENDING"},
        {"id":2,"title":"Review","details":"PR 12","author":"Bruno","createdAt":"2025-02-02T11:00:00.000Z","status":"COMPLETED"}
    ]}"#;

    fn gateway(server: &Server) -> HttpGateway {
        HttpGateway::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_list_decodes_tasks() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/task/list")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(TASKS_JSON)
            .create();

        let tasks = gateway(&server).list().unwrap();
        mock.assert();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "Write report");
        assert_eq!(tasks[1].status, Some(TaskStatus::Completed));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/task/list")
            .with_status(200)
            .with_body(r#"{"tasks":[]}"#)
            .create();

        let gw = HttpGateway::new(&format!("{}/", server.url()), Duration::from_secs(5)).unwrap();
        assert!(gw.list().unwrap().is_empty());
        mock.assert();
    }

    #[test]
    fn test_list_rejects_body_without_tasks() {
        let mut server = Server::new();
        server
            .mock("GET", "/task/list")
            .with_status(200)
            .with_body(r#"{"items":[]}"#)
            .create();

        let err = gateway(&server).list().unwrap_err();
        assert!(matches!(err, GatewayError::Malformed(_)));
    }

    #[test]
    fn test_list_rejects_duplicate_ids() {
        let mut server = Server::new();
        server
            .mock("GET", "/task/list")
            .with_status(200)
            .with_body(
                r#"{"tasks":[
                    {"id":1,"title":"a","createdAt":"2025-02-01T10:00:00Z","status":"PENDING"},
                    {"id":1,"title":"b","createdAt":"2025-02-01T10:00:00Z","status":"PENDING"}
                ]}"#,
            )
            .create();

        let err = gateway(&server).list().unwrap_err();
        assert_eq!(err.to_string(), "malformed response: duplicate task id 1");
    }

    #[test]
    fn test_list_server_error_carries_message() {
        let mut server = Server::new();
        server
            .mock("GET", "/task/list")
            .with_status(500)
            .with_body(r#"{"message":"database offline"}"#)
            .create();

        let err = gateway(&server).list().unwrap_err();
        assert!(matches!(err, GatewayError::Api { status: 500, .. }));
        assert_eq!(err.user_message("failed to load tasks"), "database offline");
    }

    #[test]
    fn test_create_posts_payload() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/task/new")
            .match_body(Matcher::Json(serde_json::json!({
                "title": "New",
                "details": "Something",
                "author": "Carla",
                "status": "PENDING"
            })))
            .with_status(201)
            .with_body(
                r#"{"id":9,"title":"New","details":"Something","author":"Carla","createdAt":"2025-02-03T09:00:00Z","status":"PENDING"}"#,
            )
            .create();

        let payload = TaskPayload {
            title: Some("New".into()),
            details: Some("Something".into()),
            author: Some("Carla".into()),
            status: Some(TaskStatus::Pending),
        };
        let created = gateway(&server).create(&payload).unwrap();
        mock.assert();
        assert_eq!(created.map(|t| t.id), Some(9));
    }

    #[test]
    fn test_update_sends_status_only() {
        let mut server = Server::new();
        let mock = server
            .mock("PATCH", "/task/edit/1")
            .match_body(Matcher::Json(serde_json::json!({"status": "IN_PROGRESS"})))
            .with_status(200)
            .with_body(
                r#"{"task":{"id":1,"title":"a","createdAt":"2025-02-01T10:00:00Z","status":"IN_PROGRESS"}}"#,
            )
            .create();

        let updated = gateway(&server)
            .update(1, &TaskPayload::status_only(TaskStatus::InProgress))
            .unwrap();
        mock.assert();
        assert_eq!(
            updated.and_then(|t| t.status),
            Some(TaskStatus::InProgress)
        );
    }

    #[test]
    fn test_update_with_unrecognized_body_still_succeeds() {
        let mut server = Server::new();
        server
            .mock("PATCH", "/task/edit/3")
            .with_status(200)
            .with_body("ok")
            .create();

        let updated = gateway(&server)
            .update(3, &TaskPayload::status_only(TaskStatus::Completed))
            .unwrap();
        assert!(updated.is_none());
    }

    #[test]
    fn test_delete_not_found() {
        let mut server = Server::new();
        server
            .mock("DELETE", "/task/edit/42")
            .with_status(404)
            .with_body(r#"{"message":"Task not found"}"#)
            .create();

        let err = gateway(&server).delete(42).unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(ref m) if m == "Task not found"));
    }

    #[test]
    fn test_delete_ok() {
        let mut server = Server::new();
        let mock = server
            .mock("DELETE", "/task/edit/2")
            .with_status(200)
            .with_body(r#"{"message":"deleted"}"#)
            .create();

        gateway(&server).delete(2).unwrap();
        mock.assert();
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(extract_error_message(r#"{"message":"nope"}"#), "nope");
        assert_eq!(extract_error_message(r#"{"error":"bad"}"#), "bad");
        assert_eq!(extract_error_message("plain text\n"), "plain text");
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = GatewayError::Api {
            status: 502,
            message: String::new(),
        };
        assert_eq!(err.user_message("failed to delete task"), "failed to delete task");
        let err = GatewayError::Malformed("x".into());
        assert_eq!(err.user_message("failed to load tasks"), "failed to load tasks");
    }
}
