use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub mod models;
pub mod summarizer;

pub use models::create_model;
pub use summarizer::{ParseError, SummaryPayload, Summarizer};

pub const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Gemini,
    Dummy,
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "dummy" => Ok(Self::Dummy),
            other => Err(format!("unknown model {:?}, available models: gemini, dummy", other)),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Dummy => write!(f, "dummy"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub kind: ModelKind,
    pub api_key: Option<String>,
    pub model_name: String,
    /// Overrides the provider endpoint
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: ModelKind::Gemini,
            api_key: None,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            base_url: None,
            timeout: Duration::from_secs(60),
        }
    }
}

pub mod prelude {
    pub use super::{Config, ModelKind};
    pub use super::models::create_model;
    pub use super::summarizer::{Summarizer, SummaryPayload};
    pub use sk_core::{LanguageModel, Result, Error};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_from_str() {
        assert_eq!("gemini".parse::<ModelKind>().unwrap(), ModelKind::Gemini);
        assert_eq!(" Dummy ".parse::<ModelKind>().unwrap(), ModelKind::Dummy);
        assert!("ollama".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = Config {
            api_key: Some("secret-key".to_string()),
            ..Config::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }
}
