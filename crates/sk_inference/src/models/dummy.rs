use async_trait::async_trait;
use serde_json::json;
use sk_core::{LanguageModel, Result};
use std::fmt;

/// Offline model. Answers with a JSON summary built from the first words of
/// the text embedded in the prompt.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let text = prompt
            .rsplit_once("Text to analyze:")
            .map(|(_, text)| text)
            .unwrap_or(prompt)
            .trim()
            .trim_matches('"');

        let words: Vec<&str> = text.split_whitespace().collect();
        let title = words.iter().take(8).copied().collect::<Vec<_>>().join(" ");
        let summary = words.iter().take(20).copied().collect::<Vec<_>>().join(" ");

        Ok(json!({
            "summary": summary,
            "tags": ["Saved"],
            "title": title,
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::{build_prompt, parse_summary};

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new();
        let prompt = build_prompt("This is a test article. It has multiple sentences. This is the third sentence.");

        let raw = model.generate(&prompt).await.unwrap();
        let payload = parse_summary(&raw).unwrap();
        assert!(payload.summary.starts_with("This is a test article."));
        assert_eq!(payload.title.as_deref(), Some("This is a test article. It has multiple"));
        assert_eq!(payload.tags, vec!["Saved"]);
    }
}
