use common::error::AppError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Session save hook. Accepts a summary of the dialogue once the user is
/// done; the summary is acknowledged but not persisted anywhere yet.
#[derive(Debug, Default, Clone)]
pub struct SaveSessionTool;

impl SaveSessionTool {
    pub fn name(&self) -> &str {
        "save_session"
    }

    pub fn description(&self) -> &str {
        "Persist a summary of the chat session. Use this tool when the user is happy with \
         the recommendations and done with the session. Include the user's name in the \
         summary if it was provided."
    }

    pub fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "chat_summary": {
                    "type": "string",
                    "description": "A summary of the chat history, including the user's name if provided"
                }
            },
            "required": ["chat_summary"]
        })
    }

    pub async fn invoke(&self, arguments: &str) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct Args {
            chat_summary: String,
        }

        let args: Args = serde_json::from_str(arguments)
            .map_err(|e| AppError::LLMParsing(format!("invalid arguments for save_session: {e}")))?;

        info!(
            summary_chars = args.chat_summary.len(),
            "Session summary acknowledged"
        );

        Ok(json!({ "saved": true }).to_string())
    }
}
