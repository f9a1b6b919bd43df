use std::path::Path;
use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use common::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const RECOMMEND_SYSTEM_PROMPT: &str = "You recommend mindfulness practice videos. Pick the \
single video from the library whose transcript summary best fits the reported mood. Reply \
with the video's title and URL, and one sentence on why it fits.";

/// One entry of the precomputed transcript-summary set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub title: String,
    pub url: String,
    pub summary: String,
}

/// The fixed video set the recommendation tool chooses from. Summaries are
/// produced offline; this side only reads them.
#[derive(Debug, Clone, Default)]
pub struct VideoCatalog {
    entries: Vec<VideoSummary>,
}

impl VideoCatalog {
    pub fn new(entries: Vec<VideoSummary>) -> Self {
        Self { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<VideoSummary> = serde_json::from_str(&raw)?;
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn context_json(&self) -> Value {
        json!(self.entries)
    }
}

/// Recommends a mindfulness video for the user's mood from the catalog of
/// transcript summaries, via one completion.
pub struct VideoRecommendTool {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    catalog: VideoCatalog,
}

impl VideoRecommendTool {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String, catalog: VideoCatalog) -> Self {
        Self {
            client,
            model,
            catalog,
        }
    }

    pub fn name(&self) -> &str {
        "recommend_mindfulness_video"
    }

    pub fn description(&self) -> &str {
        "Recommend one mindfulness practice video matching the user's current mood, chosen \
         from a curated set of videos with transcript summaries."
    }

    pub fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "mood": {
                    "type": "string",
                    "description": "The user's mood, in their own words or as understood from the conversation"
                }
            },
            "required": ["mood"]
        })
    }

    pub async fn invoke(&self, arguments: &str) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct Args {
            mood: String,
        }

        let args: Args = serde_json::from_str(arguments).map_err(|e| {
            AppError::LLMParsing(format!("invalid arguments for recommend_mindfulness_video: {e}"))
        })?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages([
                ChatCompletionRequestSystemMessage::from(RECOMMEND_SYSTEM_PROMPT).into(),
                ChatCompletionRequestUserMessage::from(create_user_message(
                    &self.catalog.context_json(),
                    &args.mood,
                ))
                .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| AppError::LLMParsing("No content in recommendation completion".into()))
    }
}

fn create_user_message(catalog_json: &Value, mood: &str) -> String {
    format!(
        r"
        Video library:
        ==================
        {catalog_json}

        Reported mood:
        ==================
        {mood}
        "
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_entries() -> Vec<VideoSummary> {
        vec![
            VideoSummary {
                title: "Body scan for restless evenings".to_string(),
                url: "https://videos.example.com/body-scan".to_string(),
                summary: "A guided body scan easing physical tension and racing thoughts."
                    .to_string(),
            },
            VideoSummary {
                title: "Loving-kindness in five minutes".to_string(),
                url: "https://videos.example.com/loving-kindness".to_string(),
                summary: "Short compassion practice for irritation with loved ones.".to_string(),
            },
        ]
    }

    #[test]
    fn test_catalog_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let entries = sample_entries();
        write!(
            file,
            "{}",
            serde_json::to_string(&entries).expect("serialize catalog")
        )
        .expect("write catalog");

        let catalog = VideoCatalog::load(file.path()).expect("load catalog");
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_catalog_load_rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not a catalog").expect("write junk");

        assert!(VideoCatalog::load(file.path()).is_err());
    }

    #[test]
    fn test_user_message_carries_catalog_and_mood() {
        let catalog = VideoCatalog::new(sample_entries());
        let message = create_user_message(&catalog.context_json(), "anxious and restless");

        assert!(message.contains("Body scan for restless evenings"));
        assert!(message.contains("anxious and restless"));
    }

    #[tokio::test]
    async fn test_invoke_rejects_malformed_arguments() {
        let tool = VideoRecommendTool::new(
            Arc::new(Client::with_config(OpenAIConfig::new())),
            "test-model".to_string(),
            VideoCatalog::new(sample_entries()),
        );

        assert!(tool.invoke("mood: sad").await.is_err());
    }
}
