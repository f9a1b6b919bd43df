use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use common::storage::types::{
    chat_env::ChatEnv,
    message::{Author, ChatMessage, MessageKind},
};

use crate::{api_state::ApiState, error::ApiError, routes::conversation::EnvParams};

#[derive(Debug, Deserialize)]
pub struct SendMessageParams {
    env: Option<String>,
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    #[serde(rename = "type")]
    kind: String,
    content: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: Option<DateTime<Utc>>,
}

/// Persist an inbound message. Text content also runs an agent turn and
/// persists the reply; media content only reserves a content id, the blob
/// arrives through the upload endpoint right after.
pub async fn send_message(
    State(state): State<ApiState>,
    Query(params): Query<SendMessageParams>,
    Json(body): Json<SendMessageBody>,
) -> Result<impl IntoResponse, ApiError> {
    let env = ChatEnv::from_param(params.env.as_deref())?;
    let author: Author = params
        .user
        .as_deref()
        .ok_or_else(|| {
            ApiError::ValidationError("missing either env, user, or body data".to_string())
        })?
        .parse()?;
    let kind: MessageKind = body.kind.parse()?;
    let created_at = body.created_at.unwrap_or_else(Utc::now);

    match kind {
        MessageKind::Text => {
            let content = body
                .content
                .filter(|content| !content.trim().is_empty())
                .ok_or_else(|| {
                    ApiError::ValidationError("missing message content".to_string())
                })?;

            let user_message = ChatMessage::new(author, kind, content.clone(), created_at);
            user_message.save(env, &state.db).await?;

            let agent_message = agent_reply(&state, env, &content).await?;

            Ok(Json(json!({
                "userMessage": user_message,
                "agentResponse": agent_message,
            })))
        }
        MessageKind::Image | MessageKind::Audio => {
            let user_message = ChatMessage::new_media(author, kind, created_at);
            user_message.save(env, &state.db).await?;

            info!(kind = %kind, content_id = %user_message.content, "Reserved media content id");

            Ok(Json(json!({ "userMessage": user_message })))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentResponseBody {
    content: String,
}

/// Run an agent turn on the given content and persist the reply.
pub async fn get_agent_response(
    State(state): State<ApiState>,
    Query(params): Query<EnvParams>,
    Json(body): Json<AgentResponseBody>,
) -> Result<impl IntoResponse, ApiError> {
    let env = ChatEnv::from_param(params.env.as_deref())?;

    let message = agent_reply(&state, env, &body.content).await?;

    Ok(Json(json!({
        "status": "Successfully retrieved agent reply",
        "message": message,
    })))
}

/// One agent turn plus persistence of the assistant message. A provider
/// failure propagates before anything is written.
pub(crate) async fn agent_reply(
    state: &ApiState,
    env: ChatEnv,
    prompt: &str,
) -> Result<ChatMessage, ApiError> {
    let reply = state.agent.chat(prompt).await?;

    let message = ChatMessage::new(Author::Assistant, MessageKind::Text, reply, Utc::now());
    message.save(env, &state.db).await?;

    Ok(message)
}
