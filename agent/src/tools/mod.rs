use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject},
    Client,
};
use common::{error::AppError, utils::config::AppConfig};
use serde_json::Value;
use tracing::warn;

pub mod guides;
pub mod save;
pub mod videos;
pub mod vision;

pub use guides::GuideSearchTool;
pub use save::SaveSessionTool;
pub use videos::{VideoCatalog, VideoRecommendTool, VideoSummary};
pub use vision::ImageMoodTool;

/// A callable capability exposed to the model, tagged by kind.
pub enum Tool {
    GuideSearch(GuideSearchTool),
    ImageMood(ImageMoodTool),
    SaveSession(SaveSessionTool),
    VideoRecommend(VideoRecommendTool),
}

impl Tool {
    pub fn name(&self) -> &str {
        match self {
            Tool::GuideSearch(tool) => tool.name(),
            Tool::ImageMood(tool) => tool.name(),
            Tool::SaveSession(tool) => tool.name(),
            Tool::VideoRecommend(tool) => tool.name(),
        }
    }

    pub fn definition(&self) -> ChatCompletionTool {
        let (name, description, parameters) = match self {
            Tool::GuideSearch(tool) => (tool.name(), tool.description(), tool.parameters()),
            Tool::ImageMood(tool) => (tool.name(), tool.description(), tool.parameters()),
            Tool::SaveSession(tool) => (tool.name(), tool.description(), tool.parameters()),
            Tool::VideoRecommend(tool) => (tool.name(), tool.description(), tool.parameters()),
        };

        function_tool(name, description, parameters)
    }

    pub async fn invoke(&self, arguments: &str) -> Result<String, AppError> {
        match self {
            Tool::GuideSearch(tool) => tool.invoke(arguments).await,
            Tool::ImageMood(tool) => tool.invoke(arguments).await,
            Tool::SaveSession(tool) => tool.invoke(arguments).await,
            Tool::VideoRecommend(tool) => tool.invoke(arguments).await,
        }
    }
}

fn function_tool(name: &str, description: &str, parameters: Value) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: name.to_string(),
            description: Some(description.to_string()),
            parameters: Some(parameters),
            strict: None,
        },
    }
}

/// The agent's capability set. Tools are registered once at construction;
/// dispatch is by function name.
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Tool>) -> Self {
        Self { tools }
    }

    /// The production registry: three guide-retrieval tools, image mood
    /// analysis, the session save hook, and (when the catalog file loads)
    /// video recommendation.
    pub fn from_config(config: &AppConfig, client: &Arc<Client<OpenAIConfig>>) -> Self {
        let mut tools: Vec<Tool> = GuideSearchTool::catalog(&config.guide_index_url)
            .into_iter()
            .map(Tool::GuideSearch)
            .collect();

        tools.push(Tool::ImageMood(ImageMoodTool::new(
            Arc::clone(client),
            config.vision_model.clone(),
        )));
        tools.push(Tool::SaveSession(SaveSessionTool));

        match VideoCatalog::load(&config.video_catalog_path) {
            Ok(catalog) if !catalog.is_empty() => {
                tools.push(Tool::VideoRecommend(VideoRecommendTool::new(
                    Arc::clone(client),
                    config.chat_model.clone(),
                    catalog,
                )));
            }
            Ok(_) => warn!(
                path = %config.video_catalog_path,
                "Video catalog is empty; recommendation tool disabled"
            ),
            Err(e) => warn!(
                path = %config.video_catalog_path,
                error = %e,
                "Video catalog unavailable; recommendation tool disabled"
            ),
        }

        Self::new(tools)
    }

    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.tools.iter().map(Tool::definition).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn dispatch(&self, name: &str, arguments: &str) -> Result<String, AppError> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| AppError::Validation(format!("unknown tool '{name}'")))?;

        tool.invoke(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_fixed_guide() -> ToolRegistry {
        ToolRegistry::new(vec![
            Tool::GuideSearch(GuideSearchTool::fixed(
                "challenging_child",
                "test guide",
                "Try box breathing with your child.",
            )),
            Tool::SaveSession(SaveSessionTool),
        ])
    }

    #[test]
    fn test_definitions_cover_all_registered_tools() {
        let registry = registry_with_fixed_guide();
        let definitions = registry.definitions();

        assert_eq!(definitions.len(), registry.len());
        let names: Vec<&str> = definitions
            .iter()
            .map(|d| d.function.name.as_str())
            .collect();
        assert!(names.contains(&"challenging_child"));
        assert!(names.contains(&"save_session"));
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_name() {
        let registry = registry_with_fixed_guide();

        let answer = registry
            .dispatch("challenging_child", r#"{"question":"tantrums?"}"#)
            .await
            .expect("dispatch");
        assert_eq!(answer, "Try box breathing with your child.");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_errors() {
        let registry = registry_with_fixed_guide();

        let result = registry.dispatch("time_travel", "{}").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
