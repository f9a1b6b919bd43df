use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use common::{
    error::AppError,
    storage::types::{chat_env::ChatEnv, media_object::MediaObject},
};

use crate::{api_state::ApiState, error::ApiError, routes::message::agent_reply};

#[derive(Debug, Deserialize)]
pub struct SendFileParams {
    #[serde(rename = "contentId")]
    content_id: Option<String>,
    env: Option<String>,
}

#[derive(Debug, TryFromMultipart)]
pub struct SendFileUpload {
    #[form_data(limit = "10000000")]
    pub file: Option<FieldData<Bytes>>,
}

/// Store the uploaded blob under its content id, record it, then ask the
/// agent what the image says about the user's emotional state.
pub async fn send_file(
    State(state): State<ApiState>,
    Query(params): Query<SendFileParams>,
    TypedMultipart(upload): TypedMultipart<SendFileUpload>,
) -> Result<impl IntoResponse, ApiError> {
    let env = ChatEnv::from_param(params.env.as_deref())?;
    let content_id = params
        .content_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::ValidationError("missing contentId".to_string()))?;
    let file = upload
        .file
        .ok_or_else(|| ApiError::ValidationError("missing file".to_string()))?;

    let media = MediaObject::from_upload(&content_id, file.metadata.file_name.clone(), &file.contents);
    info!(
        content_id = %media.id,
        mime = %media.mime_type,
        bytes = media.size_bytes,
        "Storing uploaded media"
    );

    state
        .storage
        .put(&content_id, file.contents)
        .await
        .map_err(AppError::from)?;
    state.db.store_item(media).await.map_err(AppError::from)?;

    let prompt = format!(
        "Analyze the image I sent at this URL: {}. Given the context of what we talked about, \
         what does it tell you about my emotional state?",
        state.config.media_url(&content_id)
    );
    let message = agent_reply(&state, env, &prompt).await?;

    Ok(Json(json!({ "agentResponse": message })))
}
