use std::sync::Arc;
use sk_core::{LanguageModel, Result};
use crate::{Config, ModelKind};

pub mod dummy;
pub mod gemini;

pub use dummy::DummyModel;
pub use gemini::GeminiModel;

/// Build the model named by `config.kind`. A Gemini model without an API key
/// fails with `Error::ConfigMissing`.
pub fn create_model(config: &Config) -> Result<Arc<dyn LanguageModel>> {
    let model: Arc<dyn LanguageModel> = match config.kind {
        ModelKind::Gemini => Arc::new(GeminiModel::from_config(config)?),
        ModelKind::Dummy => Arc::new(DummyModel::new()),
    };
    tracing::info!("🧠 Language model ready (using {})", model.name());
    Ok(model)
}
