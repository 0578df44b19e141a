//! HTTP request handlers

use super::assets::{serve_index, serve_static};
use super::sessions::{ChatEntry, SessionHandle};
use super::types::{
    ChatRequest, ChatResponse, ConfigResponse, ErrorResponse, SessionResponse, SettingsRequest,
    SuccessResponse,
};
use super::AppState;
use crate::agent::RunConfig;
use crate::session::SessionError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/assets/*path", get(serve_static))
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/settings", put(update_settings))
        // Conversation
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/clear", post(clear_conversation))
        .route("/api/config", get(get_config))
        .route("/version", get(get_version))
        .with_state(state)
}

async fn lookup(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let (id, handle) = state.sessions.create().await;
    let session = handle.lock().await;
    (StatusCode::CREATED, Json(SessionResponse::new(id, &session)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = lookup(&state, &id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionResponse::new(id, &session)))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let handle = state
        .sessions
        .remove(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;

    // Nobody can derive the random seed again once the session is gone, so
    // its thread is unreachable. Patient threads stay for later sessions.
    let session = handle.lock().await;
    if let Some(thread_id) = session.context.anonymous_thread_id() {
        state.agent.reset_thread(&thread_id).await;
    }

    Ok(Json(SuccessResponse { success: true }))
}

/// Apply sidebar settings and resolve the session's thread id.
///
/// Switching to a patient id whose thread already has history brings that
/// history back into an empty transcript.
async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = lookup(&state, &id).await?;
    let mut session = handle.lock().await;

    session.user_name = req
        .user_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    session.context.set_stable_id(req.user_id.as_deref());
    let thread_id = session.context.thread_id()?;

    if session.transcript.is_empty() && session.context.stable_id().is_some() {
        let history = state.agent.history(&thread_id).await;
        if !history.is_empty() {
            tracing::info!(session_id = %id, thread_id = %thread_id, messages = history.len(), "Resumed thread");
            session.transcript = ChatEntry::from_history(&history);
        }
    }

    Ok(Json(SessionResponse::new(id, &session)))
}

// ============================================================
// Conversation
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Message is empty".to_string()));
    }

    let handle = lookup(&state, &id).await?;
    // Held for the whole exchange: one message at a time per session
    let mut session = handle.lock().await;
    let thread_id = session.context.thread_id()?;

    session.transcript.push(ChatEntry::user(req.text.as_str()));

    let config = RunConfig {
        thread_id,
        user_name: session.user_name.clone(),
        user_id: session.context.stable_id().map(str::to_string),
    };

    let reply = match state.agent.invoke(&config, &req.text).await {
        Ok(answer) => ChatEntry::assistant(answer),
        Err(e) => {
            tracing::warn!(session_id = %id, thread_id = %thread_id, error = %e, "Agent invocation failed");
            ChatEntry::failure(&e.to_string())
        }
    };
    session.transcript.push(reply.clone());

    Ok(Json(ChatResponse { thread_id, reply }))
}

/// Clear the transcript and the agent's memory of the current thread
async fn clear_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let handle = lookup(&state, &id).await?;
    let mut session = handle.lock().await;

    session.transcript.clear();
    if let Some(thread_id) = session.context.current_thread_id() {
        state.agent.reset_thread(&thread_id).await;
    }

    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Info
// ============================================================

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        model: state.model_id.clone(),
        api_key_configured: state.api_key_configured,
    })
}

async fn get_version() -> &'static str {
    concat!("prompt-agent ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::MockLlmService;
    use crate::agent::ReactAgent;
    use crate::llm::{LlmError, LlmResponse};
    use crate::session::{resolve_thread_id, ThreadId};
    use crate::tools::ToolRegistry;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(mock: &Arc<MockLlmService>) -> AppState {
        let agent = ReactAgent::new(mock.clone(), ToolRegistry::empty(), "system".to_string());
        AppState::new(Arc::new(agent), "mock-model", true)
    }

    async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_session(state: &AppState) -> String {
        let (status, body) = call(state, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_new_session_is_uninitialized() {
        let state = test_state(&Arc::new(MockLlmService::new("m")));
        let id = new_session(&state).await;

        let (status, body) = call(&state, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "uninitialized");
        assert!(body["thread_id"].is_null());
    }

    #[tokio::test]
    async fn test_settings_with_patient_id_derive_stable_thread() {
        let state = test_state(&Arc::new(MockLlmService::new("m")));
        let id = new_session(&state).await;

        let (status, body) = call(
            &state,
            "PUT",
            &format!("/api/sessions/{id}/settings"),
            Some(json!({"user_name": "Alice", "user_id": " patient-42 "})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "seeded");
        assert_eq!(body["user_id"], "patient-42");
        assert_eq!(
            body["thread_id"],
            resolve_thread_id(Some("patient-42"), "").unwrap().to_string()
        );
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let mock = Arc::new(MockLlmService::new("m"));
        mock.queue_response(LlmResponse::text_reply("Hello Alice"));
        let state = test_state(&mock);
        let id = new_session(&state).await;

        let (status, body) = call(
            &state,
            "POST",
            &format!("/api/sessions/{id}/chat"),
            Some(json!({"text": "Hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"]["content"], "Hello Alice");

        let (_, session) = call(&state, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(session["messages"].as_array().unwrap().len(), 2);
        assert_eq!(session["thread_id"], body["thread_id"]);
    }

    #[tokio::test]
    async fn test_agent_failure_shown_as_message() {
        let mock = Arc::new(MockLlmService::new("m"));
        mock.queue_error(LlmError::auth("Authentication failed: bad key"));
        let state = test_state(&mock);
        let id = new_session(&state).await;

        let (status, body) = call(
            &state,
            "POST",
            &format!("/api/sessions/{id}/chat"),
            Some(json!({"text": "Hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"]["error"], true);
        assert_eq!(
            body["reply"]["content"],
            "⚠️ Error: Authentication failed: bad key"
        );
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let mock = Arc::new(MockLlmService::new("m"));
        let state = test_state(&mock);
        let id = new_session(&state).await;

        let (status, _) = call(
            &state,
            "POST",
            &format!("/api/sessions/{id}/chat"),
            Some(json!({"text": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(mock.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let state = test_state(&Arc::new(MockLlmService::new("m")));
        let (status, body) = call(&state, "GET", "/api/sessions/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));

        let (status, _) = call(&state, "DELETE", "/api/sessions/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_anonymous_sessions_get_distinct_threads() {
        let mock = Arc::new(MockLlmService::new("m"));
        mock.queue_response(LlmResponse::text_reply("a"));
        mock.queue_response(LlmResponse::text_reply("b"));
        let state = test_state(&mock);
        let first = new_session(&state).await;
        let second = new_session(&state).await;

        let (_, a) = call(&state, "POST", &format!("/api/sessions/{first}/chat"), Some(json!({"text": "x"}))).await;
        let (_, b) = call(&state, "POST", &format!("/api/sessions/{second}/chat"), Some(json!({"text": "y"}))).await;
        assert_ne!(a["thread_id"], b["thread_id"]);
    }

    #[tokio::test]
    async fn test_patient_resumes_in_new_session() {
        let mock = Arc::new(MockLlmService::new("m"));
        mock.queue_response(LlmResponse::text_reply("Noted your allergy."));
        let state = test_state(&mock);
        let settings = json!({"user_id": "patient-42"});

        let today = new_session(&state).await;
        call(&state, "PUT", &format!("/api/sessions/{today}/settings"), Some(settings.clone())).await;
        call(&state, "POST", &format!("/api/sessions/{today}/chat"), Some(json!({"text": "I'm allergic to penicillin"}))).await;

        let tomorrow = new_session(&state).await;
        let (_, body) = call(&state, "PUT", &format!("/api/sessions/{tomorrow}/settings"), Some(settings)).await;

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "I'm allergic to penicillin");
        assert_eq!(messages[1]["content"], "Noted your allergy.");
    }

    #[tokio::test]
    async fn test_clear_resets_transcript_and_thread() {
        let mock = Arc::new(MockLlmService::new("m"));
        mock.queue_response(LlmResponse::text_reply("first"));
        let state = test_state(&mock);
        let id = new_session(&state).await;

        let (_, chat) = call(&state, "POST", &format!("/api/sessions/{id}/chat"), Some(json!({"text": "hi"}))).await;
        let (status, _) = call(&state, "POST", &format!("/api/sessions/{id}/clear"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, session) = call(&state, "GET", &format!("/api/sessions/{id}"), None).await;
        assert!(session["messages"].as_array().unwrap().is_empty());
        // Thread id survives the clear; only its history is gone
        assert_eq!(session["thread_id"], chat["thread_id"]);

        let thread_id: ThreadId = serde_json::from_value(chat["thread_id"].clone()).unwrap();
        assert!(state.agent.history(&thread_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let state = test_state(&Arc::new(MockLlmService::new("m")));
        let id = new_session(&state).await;

        let (status, _) = call(&state, "DELETE", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&state, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_releases_anonymous_thread() {
        let mock = Arc::new(MockLlmService::new("m"));
        mock.queue_response(LlmResponse::text_reply("hello"));
        let state = test_state(&mock);
        let id = new_session(&state).await;

        let (_, chat) = call(&state, "POST", &format!("/api/sessions/{id}/chat"), Some(json!({"text": "hi"}))).await;
        let thread_id: ThreadId = serde_json::from_value(chat["thread_id"].clone()).unwrap();
        assert_eq!(state.agent.history(&thread_id).await.len(), 2);

        let (status, _) = call(&state, "DELETE", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.agent.history(&thread_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_after_switching_to_patient() {
        let mock = Arc::new(MockLlmService::new("m"));
        mock.queue_response(LlmResponse::text_reply("anon"));
        mock.queue_response(LlmResponse::text_reply("patient"));
        let state = test_state(&mock);
        let id = new_session(&state).await;

        let (_, anon) = call(&state, "POST", &format!("/api/sessions/{id}/chat"), Some(json!({"text": "a"}))).await;
        call(&state, "PUT", &format!("/api/sessions/{id}/settings"), Some(json!({"user_id": "patient-42"}))).await;
        let (_, patient) = call(&state, "POST", &format!("/api/sessions/{id}/chat"), Some(json!({"text": "b"}))).await;

        call(&state, "DELETE", &format!("/api/sessions/{id}"), None).await;

        let anon_thread: ThreadId = serde_json::from_value(anon["thread_id"].clone()).unwrap();
        let patient_thread: ThreadId = serde_json::from_value(patient["thread_id"].clone()).unwrap();
        assert!(state.agent.history(&anon_thread).await.is_empty());
        // Patient threads outlive the session so a later visit can resume
        assert_eq!(state.agent.history(&patient_thread).await.len(), 2);
    }

    #[tokio::test]
    async fn test_message_forwarded_as_typed() {
        let mock = Arc::new(MockLlmService::new("m"));
        mock.queue_response(LlmResponse::text_reply("ok"));
        let state = test_state(&mock);
        let id = new_session(&state).await;

        let (status, _) = call(
            &state,
            "POST",
            &format!("/api/sessions/{id}/chat"),
            Some(json!({"text": "  line one\nline two  "})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            mock.recorded_requests()[0].messages[0].text(),
            "  line one\nline two  "
        );

        let (_, session) = call(&state, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(session["messages"][0]["content"], "  line one\nline two  ");
    }

    #[tokio::test]
    async fn test_config_endpoint() {
        let state = test_state(&Arc::new(MockLlmService::new("m")));
        let (status, body) = call(&state, "GET", "/api/config", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], "mock-model");
        assert_eq!(body["api_key_configured"], true);
    }
}
