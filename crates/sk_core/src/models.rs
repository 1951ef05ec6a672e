use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    /// Send a single prompt and return the raw text of the model's answer.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
