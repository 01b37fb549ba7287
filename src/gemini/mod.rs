pub mod builder;
pub mod dispatcher;
pub mod extractor;
pub mod transport;

use crate::{config::StudioConfig, error::Result, storage::CredentialStore};

pub use builder::{build_analyze, build_generate, build_texture_swap, BuiltRequest, THINKING_BUDGET};
pub use dispatcher::{
    AnalyzeInput, Dispatcher, GenerateInput, OperationInput, OperationOutcome, OperationOutput,
    TextureSwapInput,
};
pub use extractor::{extract_image, extract_text, NO_ANALYSIS_TEXT};
pub use transport::{HttpTransport, RemoteCall};

/// Dispatcher wired to the Gemini REST API.
pub type GeminiDispatcher = Dispatcher<HttpTransport>;

impl Dispatcher<HttpTransport> {
    pub fn from_config(config: &StudioConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        let credentials = CredentialStore::from_config(config);

        log::info!("Gemini endpoint: {}", config.base_url);
        Ok(Self::with_models(credentials, transport, config.models.clone()))
    }
}
