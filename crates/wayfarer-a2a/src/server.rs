//! A2A server: receives tasks from peer agents over HTTP
//!
//! Tasks run on spawned tokio tasks; callers poll `GET /a2a/tasks/{id}` until
//! a terminal status. The task table lives in memory only.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::extract::{Path, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

use crate::error::A2aError;
use crate::protocol::*;

/// Upper bound on remembered tasks before finished ones are evicted
const MAX_TASKS: usize = 1000;

/// What a task handler produced
#[derive(Debug, Clone, Default)]
pub struct TaskOutput {
    pub text: String,
    pub data: Option<Value>,
}

/// The agent behind an A2A server
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, request: TaskRequest) -> Result<TaskOutput>;
}

#[derive(Default)]
struct TaskStore {
    tasks: RwLock<HashMap<String, TaskResponse>>,
}

impl TaskStore {
    async fn insert(&self, task: TaskResponse) {
        let mut tasks = self.tasks.write().await;
        while tasks.len() >= MAX_TASKS {
            let oldest = tasks
                .values()
                .filter(|t| t.status.is_terminal())
                .min_by_key(|t| t.created_at)
                .map(|t| t.task_id.clone());
            match oldest {
                Some(id) => {
                    tasks.remove(&id);
                }
                None => break,
            }
        }
        tasks.insert(task.task_id.clone(), task);
    }

    async fn get(&self, task_id: &str) -> Option<TaskResponse> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Record a handler outcome; a task cancelled in the meantime stays cancelled
    async fn finish(&self, task_id: &str, outcome: Result<TaskOutput>) {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(task_id) else {
            return;
        };
        if task.status.is_terminal() {
            debug!("Task {} already {}, dropping handler result", task_id, task.status);
            return;
        }

        match outcome {
            Ok(output) => {
                task.status = TaskStatus::Completed;
                task.result = Some(output.text);
                task.data = output.data;
            }
            Err(e) => {
                warn!("Task {} failed: {:#}", task_id, e);
                task.status = TaskStatus::Failed;
                task.result = Some(format!("{:#}", e));
            }
        }
        task.completed_at = Some(Utc::now());
    }

    async fn cancel(&self, task_id: &str) -> Option<TaskResponse> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(task_id)?;
        if !task.status.is_terminal() {
            task.status = TaskStatus::Cancelled;
            task.completed_at = Some(Utc::now());
        }
        Some(task.clone())
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }
}

struct ServerState {
    card: AgentCard,
    handler: Arc<dyn TaskHandler>,
    tasks: TaskStore,
    auth_token: Option<String>,
}

/// HTTP front for a [`TaskHandler`]
pub struct A2aServer {
    card: AgentCard,
    handler: Arc<dyn TaskHandler>,
    auth_token: Option<String>,
}

impl A2aServer {
    pub fn new(card: AgentCard, handler: Arc<dyn TaskHandler>) -> Self {
        Self {
            card,
            handler,
            auth_token: None,
        }
    }

    /// Require `Authorization: Bearer <token>` on task routes
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Build the axum router for this agent
    pub fn router(self) -> Router {
        self.router_with(Router::new())
    }

    /// Build the agent router merged with `extra` routes (e.g. plain JSON
    /// endpoints served next to A2A). CORS covers both.
    pub fn router_with(mut self, extra: Router) -> Router {
        let schemes = &mut self.card.authentication.schemes;
        if self.auth_token.is_some() && !schemes.iter().any(|s| s == "bearer") {
            schemes.push("bearer".to_string());
        }

        info!(
            "A2A agent '{}' ready ({} capabilities, auth: {})",
            self.card.name,
            self.card.capabilities.len(),
            if self.auth_token.is_some() { "bearer" } else { "none" }
        );

        let state = Arc::new(ServerState {
            card: self.card,
            handler: self.handler,
            tasks: TaskStore::default(),
            auth_token: self.auth_token,
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let task_routes = Router::new()
            .route(TASKS_PATH, post(submit_task))
            .route("/a2a/tasks/{task_id}", get(get_task).delete(cancel_task))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

        Router::new()
            .route(AGENT_CARD_PATH, get(agent_card))
            .merge(task_routes)
            .with_state(state)
            .merge(extra)
            .layer(cors)
    }
}

async fn require_bearer(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, A2aError> {
    if let Some(expected) = &state.auth_token {
        let provided = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if provided != Some(expected.as_str()) {
            warn!("Rejected unauthenticated A2A request to {}", request.uri().path());
            return Err(A2aError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

async fn agent_card(State(state): State<Arc<ServerState>>) -> Json<AgentCard> {
    Json(state.card.clone())
}

async fn submit_task(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<TaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), A2aError> {
    if request.prompt.trim().is_empty() && request.context.is_null() {
        return Err(A2aError::BadRequest(
            "task needs a prompt or a context".to_string(),
        ));
    }

    let task = TaskResponse {
        task_id: uuid::Uuid::new_v4().to_string(),
        status: TaskStatus::Working,
        result: None,
        data: None,
        created_at: Utc::now(),
        completed_at: None,
    };
    let task_id = task.task_id.clone();
    info!(
        "Task {} accepted: {}",
        task_id,
        request.prompt.chars().take(100).collect::<String>()
    );
    state.tasks.insert(task.clone()).await;

    let worker = state.clone();
    tokio::spawn(async move {
        let handler = worker.handler.clone();
        let outcome = match tokio::spawn(async move { handler.handle(request).await }).await {
            Ok(outcome) => outcome,
            Err(e) => Err(anyhow!("Task handler panicked: {}", e)),
        };
        worker.tasks.finish(&task_id, outcome).await;
    });

    Ok((StatusCode::ACCEPTED, Json(task)))
}

async fn get_task(
    State(state): State<Arc<ServerState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, A2aError> {
    let task = state.tasks.get(&task_id).await;
    task.map(Json).ok_or(A2aError::TaskNotFound(task_id))
}

async fn cancel_task(
    State(state): State<Arc<ServerState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, A2aError> {
    let cancelled = state.tasks.cancel(&task_id).await;
    let task = cancelled.ok_or(A2aError::TaskNotFound(task_id))?;
    info!("Task {} is {}", task.task_id, task.status);
    Ok(Json(task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{A2aClient, AgentEndpoint};
    use crate::serve::serve;
    use std::time::Duration;

    struct UppercaseHandler;

    #[async_trait]
    impl TaskHandler for UppercaseHandler {
        async fn handle(&self, request: TaskRequest) -> Result<TaskOutput> {
            Ok(TaskOutput {
                text: request.prompt.to_uppercase(),
                data: Some(serde_json::json!({ "context": request.context })),
            })
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl TaskHandler for FailingHandler {
        async fn handle(&self, _request: TaskRequest) -> Result<TaskOutput> {
            Err(anyhow!("lookup backend offline"))
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl TaskHandler for SlowHandler {
        async fn handle(&self, request: TaskRequest) -> Result<TaskOutput> {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(TaskOutput {
                text: request.prompt,
                data: None,
            })
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl TaskHandler for PanickingHandler {
        async fn handle(&self, _request: TaskRequest) -> Result<TaskOutput> {
            panic!("handler bug");
        }
    }

    fn card() -> AgentCard {
        AgentCard {
            name: "test_agent".to_string(),
            description: "Test agent".to_string(),
            url: "http://127.0.0.1".to_string(),
            capabilities: vec!["shout".to_string()],
            authentication: AuthConfig::default(),
        }
    }

    fn peer(url: String, token: Option<&str>) -> AgentEndpoint {
        AgentEndpoint {
            name: "test_agent".to_string(),
            url,
            token: token.map(str::to_string),
        }
    }

    fn client() -> A2aClient {
        A2aClient::new(Duration::from_secs(5)).unwrap()
    }

    fn finished(status: TaskStatus) -> TaskResponse {
        TaskResponse {
            task_id: uuid::Uuid::new_v4().to_string(),
            status,
            result: None,
            data: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_agent_card_and_completed_task() {
        let router = A2aServer::new(card(), Arc::new(UppercaseHandler)).router();
        let handle = serve(router, "127.0.0.1:0").await.unwrap();
        let peer = peer(handle.url(), None);

        let fetched = client().fetch_agent_card(&peer).await.unwrap();
        assert_eq!(fetched.name, "test_agent");

        let task = client()
            .submit_and_wait(
                &peer,
                "hello",
                serde_json::json!({"city": "Tokyo"}),
                Duration::from_millis(20),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_deref(), Some("HELLO"));
        assert_eq!(task.data.unwrap()["context"]["city"], "Tokyo");
        assert!(task.completed_at.is_some());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_task_carries_error() {
        let router = A2aServer::new(card(), Arc::new(FailingHandler)).router();
        let handle = serve(router, "127.0.0.1:0").await.unwrap();

        let task = client()
            .submit_and_wait(
                &peer(handle.url(), None),
                "anything",
                Value::Null,
                Duration::from_millis(20),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.result.unwrap().contains("lookup backend offline"));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_task_rejected() {
        let router = A2aServer::new(card(), Arc::new(UppercaseHandler)).router();
        let handle = serve(router, "127.0.0.1:0").await.unwrap();

        let err = client()
            .submit_task(&peer(handle.url(), None), "  ", Value::Null)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("400"));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let router = A2aServer::new(card(), Arc::new(UppercaseHandler)).router();
        let handle = serve(router, "127.0.0.1:0").await.unwrap();
        let peer = peer(handle.url(), None);

        let err = client().get_task_status(&peer, "missing").await.unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(client().cancel_task(&peer, "missing").await.is_err());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bearer_token_required() {
        let router = A2aServer::new(card(), Arc::new(UppercaseHandler))
            .with_auth_token(Some("s3cret".to_string()))
            .router();
        let handle = serve(router, "127.0.0.1:0").await.unwrap();

        // The card stays public and advertises the scheme
        let fetched = client()
            .fetch_agent_card(&peer(handle.url(), None))
            .await
            .unwrap();
        assert_eq!(fetched.authentication.schemes, vec!["bearer".to_string()]);

        let err = client()
            .submit_task(&peer(handle.url(), Some("wrong")), "hi", Value::Null)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));

        let ok = client()
            .submit_task(&peer(handle.url(), Some("s3cret")), "hi", Value::Null)
            .await
            .unwrap();
        assert_eq!(ok.status, TaskStatus::Working);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_task_stays_cancelled() {
        let router = A2aServer::new(card(), Arc::new(SlowHandler)).router();
        let handle = serve(router, "127.0.0.1:0").await.unwrap();
        let peer = peer(handle.url(), None);

        let task = client().submit_task(&peer, "slow", Value::Null).await.unwrap();
        let cancelled = client().cancel_task(&peer, &task.task_id).await.unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let after = client().get_task_status(&peer, &task.task_id).await.unwrap();
        assert_eq!(after.status, TaskStatus::Cancelled);
        assert!(after.result.is_none());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_handler_fails_task() {
        let router = A2aServer::new(card(), Arc::new(PanickingHandler)).router();
        let handle = serve(router, "127.0.0.1:0").await.unwrap();

        let task = client()
            .submit_and_wait(
                &peer(handle.url(), None),
                "boom",
                Value::Null,
                Duration::from_millis(20),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.result.unwrap().contains("panicked"));
        assert!(task.completed_at.is_some());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_timed_out_wait_cancels_remote_task() {
        let router = A2aServer::new(card(), Arc::new(SlowHandler)).router();
        let handle = serve(router, "127.0.0.1:0").await.unwrap();
        let peer = peer(handle.url(), None);

        let err = client()
            .submit_and_wait(
                &peer,
                "slow",
                serde_json::json!({"id": "timeout-check"}),
                Duration::from_millis(10),
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("timed out"));

        // "Task <id> timed out after ..."
        let task_id = message.split_whitespace().nth(1).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        let after = client().get_task_status(&peer, task_id).await.unwrap();
        assert_eq!(after.status, TaskStatus::Cancelled);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_cors_covers_extra_routes() {
        let extra = Router::new().route("/ping", get(|| async { "pong" }));
        let router = A2aServer::new(card(), Arc::new(UppercaseHandler)).router_with(extra);
        let handle = serve(router, "127.0.0.1:0").await.unwrap();

        for path in ["/ping", AGENT_CARD_PATH] {
            let resp = reqwest::Client::new()
                .get(format!("{}{}", handle.url(), path))
                .header("Origin", "http://example.com")
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{}", path);
            assert_eq!(
                resp.headers()
                    .get("access-control-allow-origin")
                    .and_then(|v| v.to_str().ok()),
                Some("*"),
                "{}",
                path
            );
        }

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_store_evicts_oldest_finished_task() {
        let store = TaskStore::default();
        let mut first = finished(TaskStatus::Completed);
        first.created_at = Utc::now() - chrono::Duration::hours(1);
        let first_id = first.task_id.clone();
        store.insert(first).await;
        for _ in 1..MAX_TASKS {
            store.insert(finished(TaskStatus::Completed)).await;
        }
        assert_eq!(store.len().await, MAX_TASKS);

        store.insert(finished(TaskStatus::Working)).await;
        assert_eq!(store.len().await, MAX_TASKS);
        assert!(store.get(&first_id).await.is_none());
    }

    #[tokio::test]
    async fn test_store_keeps_running_tasks() {
        let store = TaskStore::default();
        for _ in 0..MAX_TASKS {
            store.insert(finished(TaskStatus::Working)).await;
        }
        store.insert(finished(TaskStatus::Working)).await;
        assert_eq!(store.len().await, MAX_TASKS + 1);
    }
}
