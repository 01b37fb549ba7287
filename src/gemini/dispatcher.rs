use std::sync::Arc;

use crate::{
    config::ModelSet,
    error::{Result, StudioError},
    gemini::{
        builder::{self, BuiltRequest},
        extractor,
        transport::RemoteCall,
    },
    logger,
    models::{AspectRatio, Credential, ImagePayload, ImageSize, Operation},
    storage::CredentialStore,
};

#[derive(Debug, Clone, Default)]
pub struct TextureSwapInput {
    pub target: Option<ImagePayload>,
    pub reference: Option<ImagePayload>,
    pub instruction: String,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateInput {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzeInput {
    pub image: Option<ImagePayload>,
    pub prompt: String,
    pub extended_reasoning: bool,
}

#[derive(Debug, Clone)]
pub enum OperationInput {
    TextureSwap(TextureSwapInput),
    Generate(GenerateInput),
    Analyze(AnalyzeInput),
}

impl OperationInput {
    pub fn operation(&self) -> Operation {
        match self {
            OperationInput::TextureSwap(_) => Operation::TextureSwap,
            OperationInput::Generate(_) => Operation::Generate,
            OperationInput::Analyze(_) => Operation::Analyze,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutput {
    Image(ImagePayload),
    Text(String),
}

impl OperationOutput {
    /// Data URL for images, the report itself for text.
    pub fn render(&self) -> String {
        match self {
            OperationOutput::Image(image) => image.to_data_url(),
            OperationOutput::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug)]
pub enum OperationOutcome {
    Succeeded(OperationOutput),
    Failed(StudioError),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded(_))
    }

    pub fn into_result(self) -> Result<OperationOutput> {
        match self {
            OperationOutcome::Succeeded(output) => Ok(output),
            OperationOutcome::Failed(err) => Err(err),
        }
    }
}

impl From<Result<OperationOutput>> for OperationOutcome {
    fn from(result: Result<OperationOutput>) -> Self {
        match result {
            Ok(output) => OperationOutcome::Succeeded(output),
            Err(err) => OperationOutcome::Failed(err),
        }
    }
}

fn require_image(image: Option<&ImagePayload>, what: &str) -> Result<ImagePayload> {
    match image {
        Some(image) if image.data.trim_start().starts_with("data:") => {
            if !image.data.contains(',') {
                return Err(StudioError::MissingRequiredInput(format!(
                    "{} is a data URL without a payload",
                    what
                )));
            }
            let stripped = ImagePayload::from_data_url(&image.data);
            if stripped.is_empty() {
                Err(StudioError::MissingRequiredInput(format!("{} is required", what)))
            } else {
                Ok(stripped)
            }
        }
        Some(image) if !image.is_empty() => Ok(image.clone()),
        _ => Err(StudioError::MissingRequiredInput(format!("{} is required", what))),
    }
}

/// Runs the three studio operations. Holds no per-invocation state, so clones
/// can serve concurrent operations.
pub struct Dispatcher<R: RemoteCall> {
    credentials: CredentialStore,
    transport: Arc<R>,
    models: ModelSet,
}

impl<R: RemoteCall> Clone for Dispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            credentials: self.credentials.clone(),
            transport: Arc::clone(&self.transport),
            models: self.models.clone(),
        }
    }
}

impl<R: RemoteCall> Dispatcher<R> {
    pub fn new(credentials: CredentialStore, transport: R) -> Self {
        Self::with_models(credentials, transport, ModelSet::default())
    }

    pub fn with_models(credentials: CredentialStore, transport: R, models: ModelSet) -> Self {
        Self {
            credentials,
            transport: Arc::new(transport),
            models,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    pub fn transport(&self) -> &R {
        &self.transport
    }

    pub async fn swap_texture(&self, input: TextureSwapInput) -> Result<ImagePayload> {
        let target = require_image(input.target.as_ref(), "target image")?;
        let reference = require_image(input.reference.as_ref(), "reference texture image")?;

        let credential = self.credential().await?;
        let request =
            builder::build_texture_swap(&self.models, &target, &reference, &input.instruction);
        self.call_for_image(&credential, request).await
    }

    pub async fn generate_image(&self, input: GenerateInput) -> Result<ImagePayload> {
        if input.prompt.trim().is_empty() {
            return Err(StudioError::MissingRequiredInput(
                "prompt must not be blank".into(),
            ));
        }

        let credential = self.credential().await?;
        let request = builder::build_generate(
            &self.models,
            &input.prompt,
            input.aspect_ratio,
            input.image_size,
        );
        self.call_for_image(&credential, request).await
    }

    pub async fn analyze_image(&self, input: AnalyzeInput) -> Result<String> {
        let image = require_image(input.image.as_ref(), "image")?;

        let credential = self.credential().await?;
        let request =
            builder::build_analyze(&self.models, &image, &input.prompt, input.extended_reasoning);
        let response = self.call(&credential, &request).await?;
        Ok(extractor::extract_text(&response))
    }

    pub async fn dispatch(&self, input: OperationInput) -> OperationOutcome {
        let operation = input.operation();
        let result = match input {
            OperationInput::TextureSwap(input) => {
                self.swap_texture(input).await.map(OperationOutput::Image)
            }
            OperationInput::Generate(input) => {
                self.generate_image(input).await.map(OperationOutput::Image)
            }
            OperationInput::Analyze(input) => {
                self.analyze_image(input).await.map(OperationOutput::Text)
            }
        };

        if let Err(err) = &result {
            log::warn!("{} failed: {}", operation, err);
        }
        result.into()
    }

    async fn credential(&self) -> Result<Credential> {
        match self.credentials.get().await? {
            Some(credential) if !credential.expose().is_empty() => Ok(credential),
            _ => Err(StudioError::MissingCredential),
        }
    }

    async fn call_for_image(
        &self,
        credential: &Credential,
        request: BuiltRequest,
    ) -> Result<ImagePayload> {
        let response = self.call(credential, &request).await?;
        extractor::extract_image(&response).ok_or_else(|| {
            let reason = extractor::describe_missing_image(&response);
            log::warn!("{} returned no image: {}", request.model, reason);
            StudioError::NoImageReturned(reason)
        })
    }

    async fn call(
        &self,
        credential: &Credential,
        request: &BuiltRequest,
    ) -> Result<crate::models::ResponseEnvelope> {
        log::info!(
            "Dispatching {} to model: {} ({} parts)",
            request.operation,
            request.model,
            request.envelope.parts.len()
        );
        let timer = logger::timer(&format!("{} via {}", request.operation, request.model));

        let response = self
            .transport
            .generate_content(credential, &request.model, &request.envelope)
            .await;

        timer.stop();
        if let Ok(response) = &response {
            if let Some(usage) = &response.usage_metadata {
                log::debug!(
                    "Token usage for {}: prompt={} output={} thoughts={} total={}",
                    request.model,
                    usage.prompt_token_count,
                    usage.candidates_token_count,
                    usage.thoughts_token_count,
                    usage.total_token_count
                );
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenerationConfig, Part, RequestEnvelope, ResponseEnvelope, ResponsePart};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingTransport {
        calls: Mutex<Vec<(String, String, RequestEnvelope)>>,
        reply: Mutex<Option<Result<ResponseEnvelope>>>,
    }

    impl RecordingTransport {
        fn replying(reply: Result<ResponseEnvelope>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: Mutex::new(Some(reply)),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RemoteCall for RecordingTransport {
        async fn generate_content(
            &self,
            credential: &Credential,
            model: &str,
            envelope: &RequestEnvelope,
        ) -> Result<ResponseEnvelope> {
            self.calls.lock().unwrap().push((
                credential.expose().to_string(),
                model.to_string(),
                envelope.clone(),
            ));
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(ResponseEnvelope::default()))
        }
    }

    fn image_reply(data: &str) -> Result<ResponseEnvelope> {
        Ok(ResponseEnvelope::from_parts(vec![ResponsePart::inline(
            "image/png",
            data,
        )]))
    }

    async fn dispatcher_with_key(reply: Result<ResponseEnvelope>) -> Dispatcher<RecordingTransport> {
        let store = CredentialStore::in_memory();
        store.set("X").await.unwrap();
        Dispatcher::new(store, RecordingTransport::replying(reply))
    }

    fn jpeg(data: &str) -> Option<ImagePayload> {
        Some(ImagePayload::new(data, "image/jpeg"))
    }

    #[tokio::test]
    async fn test_missing_inputs_never_reach_network() {
        let dispatcher = dispatcher_with_key(image_reply("AAAA")).await;

        let err = dispatcher
            .swap_texture(TextureSwapInput {
                target: jpeg("TTTT"),
                reference: None,
                instruction: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::MissingRequiredInput(_)));

        let err = dispatcher
            .swap_texture(TextureSwapInput {
                target: Some(ImagePayload::new("", "image/jpeg")),
                reference: jpeg("RRRR"),
                instruction: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::MissingRequiredInput(_)));

        let err = dispatcher
            .generate_image(GenerateInput {
                prompt: "   \n\t".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::MissingRequiredInput(_)));

        let err = dispatcher
            .analyze_image(AnalyzeInput {
                image: None,
                prompt: "describe".into(),
                extended_reasoning: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::MissingRequiredInput(_)));

        assert_eq!(dispatcher.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_never_reaches_network() {
        let dispatcher = Dispatcher::new(
            CredentialStore::in_memory(),
            RecordingTransport::replying(image_reply("AAAA")),
        );

        let inputs = vec![
            OperationInput::TextureSwap(TextureSwapInput {
                target: jpeg("TTTT"),
                reference: jpeg("RRRR"),
                instruction: "marble".into(),
            }),
            OperationInput::Generate(GenerateInput {
                prompt: "a red cube".into(),
                ..Default::default()
            }),
            OperationInput::Analyze(AnalyzeInput {
                image: jpeg("IIII"),
                prompt: "describe".into(),
                extended_reasoning: false,
            }),
        ];

        for input in inputs {
            match dispatcher.dispatch(input).await {
                OperationOutcome::Failed(err) => assert!(err.is_missing_credential()),
                other => panic!("expected missing credential, got {:?}", other),
            }
        }
        assert_eq!(dispatcher.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_input_validation_precedes_credential_check() {
        let dispatcher = Dispatcher::new(
            CredentialStore::in_memory(),
            RecordingTransport::replying(image_reply("AAAA")),
        );
        let err = dispatcher
            .generate_image(GenerateInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::MissingRequiredInput(_)));
    }

    #[tokio::test]
    async fn test_generate_end_to_end() {
        let dispatcher = dispatcher_with_key(image_reply("AAAA")).await;

        let outcome = dispatcher
            .dispatch(OperationInput::Generate(GenerateInput {
                prompt: "a red cube".into(),
                aspect_ratio: AspectRatio::Square,
                image_size: ImageSize::Size1K,
            }))
            .await;

        match outcome {
            OperationOutcome::Succeeded(output) => {
                assert_eq!(output.render(), "data:image/png;base64,AAAA")
            }
            OperationOutcome::Failed(err) => panic!("unexpected failure: {}", err),
        }

        let calls = dispatcher.transport().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (key, model, envelope) = &calls[0];
        assert_eq!(key, "X");
        assert_eq!(model, "gemini-3-pro-image-preview");
        assert_eq!(envelope.parts, vec![Part::text("a red cube")]);
        assert_eq!(
            envelope.config,
            GenerationConfig::Image {
                aspect_ratio: AspectRatio::Square,
                image_size: ImageSize::Size1K,
            }
        );
    }

    #[tokio::test]
    async fn test_texture_swap_strips_data_url_and_keeps_order() {
        let dispatcher = dispatcher_with_key(image_reply("OUT")).await;

        let result = dispatcher
            .swap_texture(TextureSwapInput {
                target: Some(ImagePayload::new("data:image/jpeg;base64,TTTT", "image/jpeg")),
                reference: jpeg("RRRR"),
                instruction: "use the wood grain".into(),
            })
            .await
            .unwrap();
        assert_eq!(result.to_data_url(), "data:image/png;base64,OUT");

        let calls = dispatcher.transport().calls.lock().unwrap();
        let (_, model, envelope) = &calls[0];
        assert_eq!(model, "gemini-2.5-flash-image");
        assert_eq!(envelope.parts[0].as_inline_data().unwrap().data, "TTTT");
        assert_eq!(envelope.parts[1].as_inline_data().unwrap().data, "RRRR");
        assert!(envelope.parts[2]
            .as_text()
            .unwrap()
            .contains("use the wood grain"));
    }

    #[tokio::test]
    async fn test_data_url_without_comma_is_rejected() {
        let dispatcher = dispatcher_with_key(image_reply("AAAA")).await;

        for data in ["data:image/png", "data:image/png;base64"] {
            let err = dispatcher
                .analyze_image(AnalyzeInput {
                    image: Some(ImagePayload::new(data, "image/png")),
                    prompt: "describe".into(),
                    extended_reasoning: false,
                })
                .await
                .unwrap_err();
            assert!(matches!(err, StudioError::MissingRequiredInput(_)));
        }
        assert_eq!(dispatcher.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_image_in_response() {
        let dispatcher = dispatcher_with_key(Ok(ResponseEnvelope::from_parts(vec![
            ResponsePart::text("I can't draw that."),
        ])))
        .await;

        let err = dispatcher
            .generate_image(GenerateInput {
                prompt: "something".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::NoImageReturned(_)));
        assert_eq!(dispatcher.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_passes_message_through() {
        let dispatcher = dispatcher_with_key(Err(StudioError::RemoteCallFailure(
            "HTTP 429: quota exceeded".into(),
        )))
        .await;

        let err = dispatcher
            .analyze_image(AnalyzeInput {
                image: jpeg("IIII"),
                prompt: "describe".into(),
                extended_reasoning: false,
            })
            .await
            .unwrap_err();
        match err {
            StudioError::RemoteCallFailure(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(dispatcher.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_analyze_empty_text_is_success() {
        let dispatcher = dispatcher_with_key(Ok(ResponseEnvelope::default())).await;

        let text = dispatcher
            .analyze_image(AnalyzeInput {
                image: jpeg("IIII"),
                prompt: "describe".into(),
                extended_reasoning: true,
            })
            .await
            .unwrap();
        assert_eq!(text, extractor::NO_ANALYSIS_TEXT);

        let calls = dispatcher.transport().calls.lock().unwrap();
        assert_eq!(calls[0].1, "gemini-3-pro-preview");
        assert_eq!(
            calls[0].2.config,
            GenerationConfig::Thinking {
                budget: builder::THINKING_BUDGET
            }
        );
    }

    #[tokio::test]
    async fn test_blank_stored_credential_counts_as_missing() {
        let store = CredentialStore::in_memory();
        store.set("").await.unwrap();
        let dispatcher = Dispatcher::new(store, RecordingTransport::replying(image_reply("A")));

        let err = dispatcher
            .generate_image(GenerateInput {
                prompt: "p".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_missing_credential());
        assert_eq!(dispatcher.transport().call_count(), 0);
    }
}
