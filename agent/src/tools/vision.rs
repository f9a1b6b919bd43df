use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrlArgs,
    },
    Client,
};
use common::error::AppError;
use serde::Deserialize;
use serde_json::{json, Value};

const MOOD_PROMPT: &str = "Identify what you see in the image and what mood it conveys, if any.";

/// Describes an uploaded image and the mood it conveys, via a multimodal
/// completion against the configured vision model.
pub struct ImageMoodTool {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl ImageMoodTool {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    pub fn name(&self) -> &str {
        "analyze_image"
    }

    pub fn description(&self) -> &str {
        "Analyze one or more images the user shared and describe what they depict and the \
         mood they convey, if any."
    }

    pub fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image_urls": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "The URL of one or more images that convey the user's mood"
                }
            },
            "required": ["image_urls"]
        })
    }

    pub async fn invoke(&self, arguments: &str) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct Args {
            image_urls: Vec<String>,
        }

        let args: Args = serde_json::from_str(arguments)
            .map_err(|e| AppError::LLMParsing(format!("invalid arguments for analyze_image: {e}")))?;
        if args.image_urls.is_empty() {
            return Err(AppError::LLMParsing(
                "analyze_image requires at least one image URL".into(),
            ));
        }

        let mut parts: Vec<ChatCompletionRequestUserMessageContentPart> =
            vec![ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(MOOD_PROMPT)
                .build()?
                .into()];
        for url in &args.image_urls {
            parts.push(
                ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(ImageUrlArgs::default().url(url.clone()).detail(ImageDetail::Auto).build()?)
                    .build()?
                    .into(),
            );
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .max_tokens(1024_u32)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(parts)
                .build()?
                .into()])
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| AppError::LLMParsing("No content in vision completion".into()))
    }
}
