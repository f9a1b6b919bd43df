use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessage,
    },
};
use common::error::AppError;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{backend::ChatBackend, session::ChatSession, tools::ToolRegistry};

/// Persona and guardrails for the emotional-support assistant.
pub const SYSTEM_PROMPT: &str = "You are an emotional support assistant with the expertise of \
an experienced counselor. Your primary role is to assist the user by encouraging them to \
provide a drawing that conveys their mood. You offer professional, friendly, and helpful \
guidance based on current counseling and mindfulness practices. Once you receive the image, \
interpret it to discern what the user might be feeling and confirm with them if your \
observation is correct. If your interpretation does not align with their feelings, engage in \
a dialogue until you accurately understand their mood. Your knowledge is exclusively focused \
on understanding the user's emotions and recommending mindfulness routines using the tool, \
tailored to their mood. Thus, you will only provide responses related to these areas. If a \
question falls outside your area of expertise or if you lack the necessary information, you \
will inform the user by saying, 'Sorry, I do not know the answer to your question.' and then \
prompt for more information related to their feelings. Once they confirm that you have \
correctly understood their feelings, your task is to recommend a suitable mindfulness \
routine using the tool.";

/// Upper bound on completion rounds within one turn. A model that keeps
/// requesting tools past this is cut off.
const MAX_TOOL_ROUNDS: usize = 8;

/// The process-wide conversational agent. One instance is built at startup
/// and shared by handle; the session behind it is guarded so concurrent
/// requests cannot interleave against the same history.
pub struct CoachAgent {
    backend: ChatBackend,
    registry: ToolRegistry,
    session: Mutex<ChatSession>,
    system_prompt: String,
}

impl CoachAgent {
    pub fn new(backend: ChatBackend, registry: ToolRegistry) -> Self {
        Self {
            backend,
            registry,
            session: Mutex::new(ChatSession::new()),
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Run one agent turn: completion rounds with tool dispatch in between,
    /// until the model produces a final reply. The user utterance and the
    /// reply are appended to the session history.
    pub async fn chat(&self, utterance: &str) -> Result<String, AppError> {
        let mut session = self.session.lock().await;

        let definitions = self.registry.definitions();
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        messages.push(ChatCompletionRequestSystemMessage::from(self.system_prompt.clone()).into());
        messages.extend(session.request_messages()?);
        messages.push(ChatCompletionRequestUserMessage::from(utterance.to_string()).into());

        for round in 0..MAX_TOOL_ROUNDS {
            let outcome = self.backend.complete(messages.clone(), &definitions).await?;

            if outcome.tool_calls.is_empty() {
                let reply = outcome.content.ok_or_else(|| {
                    AppError::LLMParsing("No content found in LLM response".into())
                })?;

                session.push_user(utterance);
                session.push_assistant(&reply);
                return Ok(reply);
            }

            debug!(
                round,
                requested = outcome.tool_calls.len(),
                "Dispatching tool calls"
            );
            messages.push(assistant_tool_call_message(
                outcome.content.clone(),
                outcome.tool_calls.clone(),
            )?);

            for call in &outcome.tool_calls {
                let result = match self
                    .registry
                    .dispatch(&call.function.name, &call.function.arguments)
                    .await
                {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(tool = %call.function.name, error = %e, "Tool invocation failed");
                        format!("tool '{}' failed: {e}", call.function.name)
                    }
                };

                messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(call.id.clone())
                        .content(result)
                        .build()?
                        .into(),
                );
            }
        }

        Err(AppError::InternalError(format!(
            "agent exceeded {MAX_TOOL_ROUNDS} tool rounds without a final reply"
        )))
    }

    /// Clear the accumulated turn history.
    pub async fn reset(&self) {
        self.session.lock().await.reset();
    }

    pub async fn turn_count(&self) -> usize {
        self.session.lock().await.turn_count()
    }
}

fn assistant_tool_call_message(
    content: Option<String>,
    calls: Vec<ChatCompletionMessageToolCall>,
) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
    args.tool_calls(calls);
    if let Some(text) = content {
        args.content(text);
    }

    Ok(args.build()?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{GuideSearchTool, SaveSessionTool, Tool};

    fn scripted_agent(replies: Vec<&str>) -> CoachAgent {
        CoachAgent::new(
            ChatBackend::new_scripted(replies.into_iter().map(String::from).collect()),
            ToolRegistry::new(vec![
                Tool::GuideSearch(GuideSearchTool::fixed(
                    "challenging_child",
                    "test guide",
                    "Try box breathing.",
                )),
                Tool::SaveSession(SaveSessionTool),
            ]),
        )
    }

    #[tokio::test]
    async fn test_chat_returns_reply_and_accumulates_history() {
        let agent = scripted_agent(vec!["Hello Ali, how are you feeling?"]);

        let reply = agent.chat("hi I'm Ali").await.expect("chat");
        assert_eq!(reply, "Hello Ali, how are you feeling?");
        assert_eq!(agent.turn_count().await, 2);
    }

    #[tokio::test]
    async fn test_chat_replays_scripted_replies_across_turns() {
        let agent = scripted_agent(vec!["first", "second"]);

        assert_eq!(agent.chat("one").await.expect("chat"), "first");
        assert_eq!(agent.chat("two").await.expect("chat"), "second");
        assert_eq!(agent.turn_count().await, 4);
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let agent = scripted_agent(vec!["reply"]);

        agent.chat("hello").await.expect("chat");
        assert!(agent.turn_count().await > 0);

        agent.reset().await;
        assert_eq!(agent.turn_count().await, 0);
    }

    #[tokio::test]
    async fn test_custom_system_prompt_is_used() {
        let agent = scripted_agent(vec!["ok"]).with_system_prompt("Short test persona.");
        assert_eq!(agent.system_prompt, "Short test persona.");
        agent.chat("hi").await.expect("chat");
    }
}
