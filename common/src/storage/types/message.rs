#![allow(clippy::module_name_repetitions)]
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient};

use super::{chat_env::ChatEnv, deserialize_datetime, deserialize_flexible_id, serialize_datetime};

/// Who produced a message. The wire names match the persisted records of
/// the deployed application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    #[serde(rename = "user")]
    EndUser,
    #[serde(rename = "ai_coach")]
    Assistant,
}

impl FromStr for Author {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "end-user" => Ok(Author::EndUser),
            "ai_coach" | "assistant" => Ok(Author::Assistant),
            other => Err(AppError::Validation(format!("unknown user '{other}'"))),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Author::EndUser => write!(f, "user"),
            Author::Assistant => write!(f, "ai_coach"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Audio,
}

impl FromStr for MessageKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageKind::Text),
            "image" => Ok(MessageKind::Image),
            "audio" => Ok(MessageKind::Audio),
            other => Err(AppError::Validation(format!(
                "unsupported message type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::Image => write!(f, "image"),
            MessageKind::Audio => write!(f, "audio"),
        }
    }
}

/// One conversation turn. `content` holds literal text for text messages;
/// for image and audio messages it holds the generated content id the blob
/// is uploaded under in a separate call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    #[serde(rename = "user")]
    pub author: Author,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime",
        default
    )]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(
        author: Author,
        kind: MessageKind,
        content: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author,
            kind,
            content,
            created_at,
        }
    }

    /// Message referencing a media blob: the content is a fresh id the
    /// client uploads against afterwards.
    pub fn new_media(author: Author, kind: MessageKind, created_at: DateTime<Utc>) -> Self {
        Self::new(author, kind, Uuid::new_v4().to_string(), created_at)
    }

    pub async fn save(&self, env: ChatEnv, db: &SurrealDbClient) -> Result<(), AppError> {
        let _created: Option<ChatMessage> = db
            .client
            .create((env.table_name(), self.id.as_str()))
            .content(self.clone())
            .await?;

        Ok(())
    }

    /// Most recent messages first. `last_document` is the id of the last
    /// message of the previous page; the page continues strictly after it.
    pub async fn fetch_page(
        env: ChatEnv,
        limit: usize,
        last_document: Option<&str>,
        db: &SurrealDbClient,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let messages = match last_document {
            None => db
                .client
                .query("SELECT * FROM type::table($table) ORDER BY created_at DESC LIMIT $limit")
                .bind(("table", env.table_name()))
                .bind(("limit", limit))
                .await?
                .take(0)?,
            Some(anchor_id) => {
                let anchor: Option<ChatMessage> =
                    db.client.select((env.table_name(), anchor_id)).await?;
                let anchor = anchor
                    .ok_or_else(|| AppError::Validation("unknown last_document".to_string()))?;

                db.client
                    .query(
                        "SELECT * FROM type::table($table) WHERE created_at < $before \
                         ORDER BY created_at DESC LIMIT $limit",
                    )
                    .bind(("table", env.table_name()))
                    .bind(("limit", limit))
                    .bind(("before", surrealdb::sql::Datetime::from(anchor.created_at)))
                    .await?
                    .take(0)?
            }
        };

        Ok(messages)
    }

    /// Remove every message in the environment. Irreversible.
    pub async fn purge(env: ChatEnv, db: &SurrealDbClient) -> Result<(), AppError> {
        let removed: Vec<ChatMessage> = db.client.delete(env.table_name()).await?;
        tracing::info!(table = env.table_name(), count = removed.len(), "Purged conversation");

        Ok(())
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.author, self.content)
    }
}
