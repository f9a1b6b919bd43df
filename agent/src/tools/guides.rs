use common::error::AppError;
use serde::Deserialize;
use serde_json::{json, Value};

/// Retrieval over one static mindfulness guide. The index itself lives in
/// an external query service; this side only speaks its request/response
/// contract.
pub struct GuideSearchTool {
    name: String,
    description: String,
    index: GuideIndex,
}

pub enum GuideIndex {
    Http {
        client: reqwest::Client,
        endpoint: String,
    },
    /// Canned answer, for offline development and tests.
    Fixed { answer: String },
}

impl GuideIndex {
    pub async fn query(&self, question: &str) -> Result<String, AppError> {
        match self {
            Self::Http { client, endpoint } => {
                #[derive(Deserialize)]
                struct QueryResponse {
                    answer: String,
                }

                let response = client
                    .post(endpoint)
                    .json(&json!({ "question": question }))
                    .send()
                    .await?
                    .error_for_status()?;

                let body: QueryResponse = response.json().await?;
                Ok(body.answer)
            }
            Self::Fixed { answer } => Ok(answer.clone()),
        }
    }
}

impl GuideSearchTool {
    pub fn remote(
        client: reqwest::Client,
        base_url: &str,
        guide_id: &str,
        description: &str,
    ) -> Self {
        let endpoint = format!("{}/guides/{}/query", base_url.trim_end_matches('/'), guide_id);
        Self {
            name: guide_id.to_string(),
            description: description.to_string(),
            index: GuideIndex::Http { client, endpoint },
        }
    }

    pub fn fixed(guide_id: &str, description: &str, answer: &str) -> Self {
        Self {
            name: guide_id.to_string(),
            description: description.to_string(),
            index: GuideIndex::Fixed {
                answer: answer.to_string(),
            },
        }
    }

    /// The three guides the assistant recommends routines from.
    pub fn catalog(base_url: &str) -> Vec<Self> {
        let client = reqwest::Client::new();
        vec![
            Self::remote(
                client.clone(),
                base_url,
                "challenging_child",
                "The Challenging Child Toolbox: 75 mindfulness based practices, tools and tips \
                 for therapists. Use a detailed plain text question as input to the tool.",
            ),
            Self::remote(
                client.clone(),
                base_url,
                "mindfulness_TB_50",
                "The Mindfulness Toolbox: 50 practical tips, tools and handouts for anxiety, \
                 depression, stress and pain. Use a detailed plain text question as input to \
                 the tool.",
            ),
            Self::remote(
                client,
                base_url,
                "mindfulness_TB_relationships",
                "The Mindfulness Toolbox for Relationships: 50 practical tips, tools and \
                 handouts for building compassionate connections. Use a detailed plain text \
                 question as input to the tool.",
            ),
        ]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "A detailed plain text question about the guide's subject"
                }
            },
            "required": ["question"]
        })
    }

    pub async fn invoke(&self, arguments: &str) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct Args {
            question: String,
        }

        let args: Args = serde_json::from_str(arguments).map_err(|e| {
            AppError::LLMParsing(format!("invalid arguments for {}: {e}", self.name))
        })?;

        self.index.query(&args.question).await
    }
}
