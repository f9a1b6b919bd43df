use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestUserMessage,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

/// One remembered dialogue turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

/// Accumulated dialogue history for one agent. Grows until `reset`; the
/// tool-call transcript of a turn is not retained, only the user utterance
/// and the final reply.
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<Turn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: TurnRole::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: TurnRole::Assistant,
            content: content.into(),
        });
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the history as chat-completion request messages.
    pub fn request_messages(&self) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        self.turns
            .iter()
            .map(|turn| match turn.role {
                TurnRole::User => Ok(ChatCompletionRequestUserMessage::from(turn.content.clone()).into()),
                TurnRole::Assistant => Ok(ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()?
                    .into()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_accumulates_turns_in_order() {
        let mut session = ChatSession::new();
        assert!(session.is_empty());

        session.push_user("hi, I'm Ali");
        session.push_assistant("Hello Ali, how are you feeling today?");
        session.push_user("a bit stressed");

        assert_eq!(session.turn_count(), 3);
        let messages = session.request_messages().expect("render messages");
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn test_reset_clears_turn_history() {
        let mut session = ChatSession::new();
        session.push_user("hello");
        session.push_assistant("hi");

        session.reset();

        assert_eq!(session.turn_count(), 0);
        assert!(session.is_empty());
    }
}
