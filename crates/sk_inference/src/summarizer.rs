use serde::Deserialize;
use sk_core::{LanguageModel, Result};
use std::sync::Arc;
use thiserror::Error;

pub const FALLBACK_SUMMARY: &str = "Summary generation failed, but link is saved.";
pub const FALLBACK_TAG: &str = "Uncategorized";

/// What the model was asked to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPayload {
    pub title: Option<String>,
    pub summary: String,
    pub tags: Vec<String>,
}

impl SummaryPayload {
    /// Stand-in used when the model answered but its output could not be
    /// parsed, so the link is still saved.
    pub fn fallback(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            summary: FALLBACK_SUMMARY.to_string(),
            tags: vec![FALLBACK_TAG.to_string()],
        }
    }
}

/// The model answered, but not with the requested JSON shape.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("model response is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model response has no summary")]
    MissingSummary,
}

#[derive(Deserialize)]
struct RawSummary {
    summary: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    title: Option<String>,
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following text from a webpage.
Return ONLY a VALID JSON object with exactly these keys:
- "summary": A short paragraph summarizing the content (max 3 sentences).
- "tags": An array of 3-5 short category tags (strings).
- "title": A clean, descriptive title for the content.

Do NOT wrap the output in markdown code blocks. Just return the raw JSON string.

Text to analyze:
"{}"
"#,
        text
    )
}

/// Remove markdown code fence markers (```json and ```) wherever they appear.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_summary(raw: &str) -> std::result::Result<SummaryPayload, ParseError> {
    let cleaned = strip_code_fences(raw);

    let parsed = match serde_json::from_str::<RawSummary>(&cleaned) {
        Ok(parsed) => parsed,
        // Models sometimes wrap the object in prose
        Err(e) => match (cleaned.find('{'), cleaned.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str::<RawSummary>(&cleaned[start..=end]).map_err(|_| e)?
            }
            _ => return Err(e.into()),
        },
    };

    let summary = parsed
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingSummary)?;

    let tags = parsed
        .tags
        .unwrap_or_default()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let title = parsed
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    Ok(SummaryPayload { title, summary, tags })
}

/// Asks a language model for a title, summary and tags.
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Summarize `text`. Errors from the model call propagate; unparsable
    /// output is replaced by [`SummaryPayload::fallback`]. The returned title
    /// is always set, falling back to `fallback_title`.
    pub async fn summarize(&self, text: &str, fallback_title: &str) -> Result<SummaryPayload> {
        let prompt = build_prompt(text);
        tracing::info!("🤖 Generating summary with {}", self.model.name());
        let raw = self.model.generate(&prompt).await?;

        let mut payload = parse_summary(&raw).unwrap_or_else(|e| {
            tracing::warn!("Could not parse {} response ({}), saving with fallback summary", self.model.name(), e);
            tracing::debug!("Unparsable response: {}", raw);
            SummaryPayload::fallback(fallback_title)
        });

        if payload.title.is_none() {
            payload.title = Some(fallback_title.to_string());
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sk_core::Error;

    struct CannedModel(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl LanguageModel for CannedModel {
        fn name(&self) -> &str {
            "Canned"
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(reason) => Err(Error::Inference(reason.to_string())),
            }
        }
    }

    fn summarizer(response: std::result::Result<&'static str, &'static str>) -> Summarizer {
        Summarizer::new(Arc::new(CannedModel(response)))
    }

    const PLAIN: &str = r#"{"title":"Example","summary":"A short summary.","tags":["web","example"]}"#;

    #[test]
    fn test_prompt_embeds_text() {
        let prompt = build_prompt("Example domain content");
        assert!(prompt.contains("\"Example domain content\""));
        assert!(prompt.contains("\"summary\""));
        assert!(prompt.contains("\"tags\""));
        assert!(prompt.contains("\"title\""));
    }

    #[test]
    fn test_fenced_response_parses_like_plain() {
        let fenced = format!("```json\n{}\n```", PLAIN);
        assert_eq!(parse_summary(&fenced).unwrap(), parse_summary(PLAIN).unwrap());

        let bare_fence = format!("```\n{}\n```", PLAIN);
        assert_eq!(parse_summary(&bare_fence).unwrap(), parse_summary(PLAIN).unwrap());

        let payload = parse_summary(PLAIN).unwrap();
        assert_eq!(payload.title.as_deref(), Some("Example"));
        assert_eq!(payload.summary, "A short summary.");
        assert_eq!(payload.tags, vec!["web", "example"]);
    }

    #[test]
    fn test_object_inside_prose() {
        let raw = format!("Sure! Here is the JSON you asked for:\n{}\nHope this helps.", PLAIN);
        assert_eq!(parse_summary(&raw).unwrap(), parse_summary(PLAIN).unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_summary("not json at all"), Err(ParseError::Json(_))));
        assert!(matches!(parse_summary("{\"summary\": \"unterminated"), Err(ParseError::Json(_))));
        assert!(matches!(
            parse_summary(r#"{"title":"x","tags":[]}"#),
            Err(ParseError::MissingSummary)
        ));
        assert!(matches!(
            parse_summary(r#"{"summary":"   ","tags":[]}"#),
            Err(ParseError::MissingSummary)
        ));
    }

    #[test]
    fn test_tags_are_cleaned() {
        let payload = parse_summary(r#"{"summary":"s","tags":[" rust ","", "web"]}"#).unwrap();
        assert_eq!(payload.tags, vec!["rust", "web"]);
        assert_eq!(payload.title, None);
    }

    #[tokio::test]
    async fn test_summarize() {
        let payload = summarizer(Ok(PLAIN)).summarize("text", "Page Title").await.unwrap();
        assert_eq!(payload.title.as_deref(), Some("Example"));
        assert_eq!(payload.summary, "A short summary.");
    }

    #[tokio::test]
    async fn test_missing_title_uses_fallback_title() {
        let payload = summarizer(Ok(r#"{"summary":"s","tags":["a"]}"#))
            .summarize("text", "Page Title")
            .await
            .unwrap();
        assert_eq!(payload.title.as_deref(), Some("Page Title"));
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let payload = summarizer(Ok("{ this is : not json"))
            .summarize("text", "Page Title")
            .await
            .unwrap();
        assert_eq!(payload, SummaryPayload::fallback("Page Title"));
        assert_eq!(payload.summary, FALLBACK_SUMMARY);
        assert_eq!(payload.tags, vec![FALLBACK_TAG]);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let err = summarizer(Err("quota exceeded"))
            .summarize("text", "Page Title")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }
}
