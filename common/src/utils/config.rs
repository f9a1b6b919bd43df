use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    Memory,
    S3,
}

fn default_storage_kind() -> StorageKind {
    StorageKind::Local
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    pub http_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_storage_kind")]
    pub storage: StorageKind,
    #[serde(default)]
    pub s3_bucket: Option<String>,
    #[serde(default = "default_media_base_url")]
    pub media_base_url: String,
    #[serde(default = "default_guide_index_url")]
    pub guide_index_url: String,
    #[serde(default = "default_video_catalog_path")]
    pub video_catalog_path: String,
    #[serde(default = "default_upload_max_body_bytes")]
    pub upload_max_body_bytes: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4-1106-preview".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_media_base_url() -> String {
    "https://storage.googleapis.com/willow-conversation-assets/".to_string()
}

fn default_guide_index_url() -> String {
    "http://localhost:8200".to_string()
}

fn default_video_catalog_path() -> String {
    "./data/video_catalog.json".to_string()
}

fn default_upload_max_body_bytes() -> usize {
    10_000_000
}

impl AppConfig {
    /// Public URL where an uploaded blob can be fetched by anyone holding
    /// its content id, including the vision model.
    pub fn media_url(&self, content_id: &str) -> String {
        if self.media_base_url.ends_with('/') {
            format!("{}{}", self.media_base_url, content_id)
        } else {
            format!("{}/{}", self.media_base_url, content_id)
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            chat_model: default_chat_model(),
            vision_model: default_vision_model(),
            surrealdb_address: String::new(),
            surrealdb_username: String::new(),
            surrealdb_password: String::new(),
            surrealdb_namespace: String::new(),
            surrealdb_database: String::new(),
            http_port: 0,
            data_dir: default_data_dir(),
            storage: default_storage_kind(),
            s3_bucket: None,
            media_base_url: default_media_base_url(),
            guide_index_url: default_guide_index_url(),
            video_catalog_path: default_video_catalog_path(),
            upload_max_body_bytes: default_upload_max_body_bytes(),
        }
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url_joins_with_and_without_trailing_slash() {
        let mut config = AppConfig {
            media_base_url: "https://bucket.example.com/assets/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.media_url("abc-123"),
            "https://bucket.example.com/assets/abc-123"
        );

        config.media_base_url = "https://bucket.example.com/assets".into();
        assert_eq!(
            config.media_url("abc-123"),
            "https://bucket.example.com/assets/abc-123"
        );
    }

    #[test]
    fn test_defaults_are_sensible() {
        let config = AppConfig::default();
        assert_eq!(config.storage, StorageKind::Local);
        assert_eq!(config.chat_model, "gpt-4-1106-preview");
        assert!(config.media_base_url.ends_with('/'));
        assert!(config.upload_max_body_bytes > 0);
    }
}
