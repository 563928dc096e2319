//! HTTP endpoints for the interview: the browser page, intake, progress
//! polling and the finished document.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::error;

use crate::error::InterviewError;

use super::manager::InterviewManager;
use super::model::ChatModel;
use super::state::InterviewStep;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared state for interview routes.
#[derive(Clone)]
pub struct InterviewRouteState {
    pub manager: Arc<InterviewManager>,
}

impl IntoResponse for InterviewError {
    fn into_response(self) -> Response {
        let status = match &self {
            InterviewError::InvalidStep { .. } | InterviewError::Superseded => {
                StatusCode::CONFLICT
            }
            InterviewError::NotReady => StatusCode::NOT_FOUND,
            InterviewError::Export { .. } => {
                error!(error = %self, "Document export failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StartRequest {
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NextRequest {
    #[serde(default)]
    input: String,
    /// Step the client believes the session is at.
    #[serde(default)]
    step: Option<InterviewStep>,
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "market-brief"
    }))
}

/// GET /api/models
async fn list_models() -> impl IntoResponse {
    let models: Vec<_> = ChatModel::ALL
        .iter()
        .map(|m| serde_json::json!({"id": m.as_str(), "label": m.label()}))
        .collect();
    Json(serde_json::json!({
        "models": models,
        "default": ChatModel::default().as_str(),
    }))
}

/// POST /start
///
/// Resets the session and returns the assistant's opening reply. The body is
/// optional; without one the default model is used.
async fn start(
    State(state): State<InterviewRouteState>,
    body: Option<Json<StartRequest>>,
) -> Result<impl IntoResponse, InterviewError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let reply = state.manager.start_session(body.model.as_deref()).await?;
    Ok(Json(reply))
}

/// POST /next
///
/// Submits the niche or the offer, depending on the current step.
async fn next(
    State(state): State<InterviewRouteState>,
    Json(body): Json<NextRequest>,
) -> Result<impl IntoResponse, InterviewError> {
    let reply = state.manager.submit_step(body.step, &body.input).await?;
    Ok(Json(reply))
}

/// GET /progress
async fn progress(State(state): State<InterviewRouteState>) -> impl IntoResponse {
    Json(state.manager.progress().await)
}

/// GET /get_final_response
async fn final_response(
    State(state): State<InterviewRouteState>,
) -> Result<impl IntoResponse, InterviewError> {
    let document = state.manager.final_document().await?;
    Ok(Json(serde_json::json!({"response": document})))
}

/// GET /download
async fn download(
    State(state): State<InterviewRouteState>,
) -> Result<impl IntoResponse, InterviewError> {
    let file = state.manager.download_document().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.bytes,
    ))
}

/// Build the interview routes.
pub fn interview_routes(state: InterviewRouteState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/models", get(list_models))
        .route("/start", post(start))
        .route("/next", post(next))
        .route("/progress", get(progress))
        .route("/get_final_response", get(final_response))
        .route("/download", get(download))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::InterviewConfig;
    use crate::interview::testing::ScriptedLlm;

    fn router() -> (Router, Arc<InterviewManager>) {
        let manager = Arc::new(InterviewManager::new(
            ScriptedLlm::new(),
            InterviewConfig {
                step_delay: Duration::ZERO,
                ..Default::default()
            },
        ));
        let router = interview_routes(InterviewRouteState {
            manager: Arc::clone(&manager),
        });
        (router, manager)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn index_serves_html() {
        let (router, _) = router();
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Marketing Research Assistant"));
    }

    #[tokio::test]
    async fn models_lists_supported_ids() {
        let (router, _) = router();
        let response = router
            .oneshot(Request::get("/api/models").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["default"], "gpt-4o");
        assert_eq!(body["models"].as_array().unwrap().len(), 4);
        assert_eq!(body["models"][3]["id"], "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn start_returns_opening_reply() {
        let (router, manager) = router();
        let response = router
            .oneshot(post_json("/start", serde_json::json!({"model": "gpt-4"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["response"], "reply 1");
        assert_eq!(body["step"], "awaiting_niche");
        assert_eq!(body["user_prompt"], "Please enter your target niche information:");
        assert_eq!(manager.progress().await.model, ChatModel::Gpt4);
    }

    #[tokio::test]
    async fn start_without_body_uses_default_model() {
        let (router, manager) = router();
        let response = router
            .oneshot(Request::post("/start").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["step"], "awaiting_niche");
        assert_eq!(manager.progress().await.model, ChatModel::Gpt4o);
    }

    #[tokio::test]
    async fn start_with_empty_object_uses_default_model() {
        let (router, manager) = router();
        let response = router
            .oneshot(post_json("/start", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(manager.progress().await.model, ChatModel::Gpt4o);
    }

    #[tokio::test]
    async fn next_before_start_is_conflict() {
        let (router, _) = router();
        let response = router
            .oneshot(post_json("/next", serde_json::json!({"input": "dog walkers"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("not_started"));
    }

    #[tokio::test]
    async fn document_routes_are_not_found_until_complete() {
        let (router, _) = router();
        for uri in ["/get_final_response", "/download"] {
            let response = router
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            let body = json_body(response).await;
            assert_eq!(body["error"], "Document not ready yet");
        }
    }

    #[tokio::test]
    async fn progress_reports_idle_session() {
        let (router, _) = router();
        let response = router
            .oneshot(Request::get("/progress").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["step"], "not_started");
        assert_eq!(body["progress"], 0);
        assert_eq!(body["total_prompts"], 11);
        assert_eq!(body["complete"], false);
        assert_eq!(body["is_processing"], false);
        assert!(body["started_at"].is_null());
    }
}
