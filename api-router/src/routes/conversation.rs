use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use common::storage::types::{chat_env::ChatEnv, message::ChatMessage};

use crate::{api_state::ApiState, error::ApiError};

fn default_page() -> u32 {
    1
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct ConversationParams {
    env: Option<String>,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: usize,
    last_document: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnvParams {
    pub env: Option<String>,
}

/// Page through an environment's messages, most recent first. Pages past
/// the first continue after the `last_document` cursor.
pub async fn get_conversation(
    State(state): State<ApiState>,
    Query(params): Query<ConversationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let env = ChatEnv::from_param(params.env.as_deref())?;

    if params.page > 1 && params.last_document.is_none() {
        return Err(ApiError::ValidationError(
            "last_document is required for paginated queries after the first page".to_string(),
        ));
    }

    let messages = ChatMessage::fetch_page(
        env,
        params.limit,
        params.last_document.as_deref(),
        &state.db,
    )
    .await?;

    Ok(Json(json!({
        "status": "Successfully retrieved conversation",
        "page": params.page,
        "limit": params.limit,
        "total_messages": messages.len(),
        "messages": messages,
    })))
}

/// Purge every message in the environment and reset the agent session.
/// Irreversible.
pub async fn delete_conversation(
    State(state): State<ApiState>,
    Query(params): Query<EnvParams>,
) -> Result<impl IntoResponse, ApiError> {
    let env = ChatEnv::from_param(params.env.as_deref())?;

    ChatMessage::purge(env, &state.db).await?;
    state.agent.reset().await;

    info!(%env, "Conversation deleted and agent session reset");

    Ok(Json(json!({ "status": "Deleted and reset successfully" })))
}
