use std::collections::VecDeque;
use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use common::error::AppError;
use tokio::sync::Mutex;

/// Model output for one completion round: a final reply, a batch of
/// requested tool invocations, or both.
#[derive(Debug, Clone, Default)]
pub struct ChatOutcome {
    pub content: Option<String>,
    pub tool_calls: Vec<ChatCompletionMessageToolCall>,
}

/// Where completions come from. `Scripted` replays canned replies and is
/// used for offline development and handler tests.
#[derive(Clone)]
pub enum ChatBackend {
    OpenAi {
        client: Arc<Client<OpenAIConfig>>,
        model: String,
    },
    Scripted {
        replies: Arc<Mutex<VecDeque<String>>>,
    },
}

impl ChatBackend {
    pub fn new_openai(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self::OpenAi { client, model }
    }

    pub fn new_scripted(replies: Vec<String>) -> Self {
        Self::Scripted {
            replies: Arc::new(Mutex::new(replies.into())),
        }
    }

    pub fn backend_label(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Scripted { .. } => "scripted",
        }
    }

    pub async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: &[ChatCompletionTool],
    ) -> Result<ChatOutcome, AppError> {
        match self {
            Self::OpenAi { client, model } => {
                let mut args = CreateChatCompletionRequestArgs::default();
                args.model(model.as_str()).messages(messages);
                if !tools.is_empty() {
                    args.tools(tools.to_vec());
                }
                let request = args.build()?;

                let response = client.chat().create(request).await?;
                let choice = response.choices.into_iter().next().ok_or_else(|| {
                    AppError::LLMParsing("No choices in chat completion response".into())
                })?;

                Ok(ChatOutcome {
                    content: choice.message.content,
                    tool_calls: choice.message.tool_calls.unwrap_or_default(),
                })
            }
            Self::Scripted { replies } => {
                let mut guard = replies.lock().await;
                let reply = guard
                    .pop_front()
                    .unwrap_or_else(|| "I'm here with you. Tell me more.".to_string());

                Ok(ChatOutcome {
                    content: Some(reply),
                    tool_calls: Vec::new(),
                })
            }
        }
    }
}
