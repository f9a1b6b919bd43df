use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Deployment environment a conversation belongs to. Each environment owns
/// its own message table; the tables are otherwise identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatEnv {
    Dev,
    Prod,
}

impl ChatEnv {
    pub fn table_name(self) -> &'static str {
        match self {
            ChatEnv::Dev => "message_dev",
            ChatEnv::Prod => "message_prod",
        }
    }

    /// Parse the `env` query parameter, treating an absent value the same
    /// as an unknown one.
    pub fn from_param(param: Option<&str>) -> Result<Self, AppError> {
        param
            .ok_or_else(|| AppError::Validation("Invalid environment".to_string()))?
            .parse()
    }
}

impl FromStr for ChatEnv {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(ChatEnv::Dev),
            "prod" => Ok(ChatEnv::Prod),
            _ => Err(AppError::Validation("Invalid environment".to_string())),
        }
    }
}

impl fmt::Display for ChatEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatEnv::Dev => write!(f, "dev"),
            ChatEnv::Prod => write!(f, "prod"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_environments() {
        assert_eq!("dev".parse::<ChatEnv>().unwrap(), ChatEnv::Dev);
        assert_eq!("prod".parse::<ChatEnv>().unwrap(), ChatEnv::Prod);
    }

    #[test]
    fn test_parse_rejects_unknown_environment() {
        for input in ["staging", "DEV", "", "production"] {
            let result = input.parse::<ChatEnv>();
            assert!(matches!(result, Err(AppError::Validation(_))), "{input}");
        }
    }

    #[test]
    fn test_from_param_rejects_missing_value() {
        assert!(matches!(
            ChatEnv::from_param(None),
            Err(AppError::Validation(_))
        ));
        assert_eq!(ChatEnv::from_param(Some("prod")).unwrap(), ChatEnv::Prod);
    }

    #[test]
    fn test_table_names_are_distinct() {
        assert_ne!(ChatEnv::Dev.table_name(), ChatEnv::Prod.table_name());
    }
}
