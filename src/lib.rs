//! Storm AI Studio: texture swapping, image generation and image analysis on
//! top of the Gemini `generateContent` API.
//!
//! The [`Dispatcher`] is the entry point. It reads the API key from a
//! [`CredentialStore`], builds the request, performs one remote call through a
//! [`RemoteCall`] transport and extracts the typed result.

pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod storage;

pub use config::{CredentialBackend, ModelSet, StudioConfig};
pub use error::{Result, StudioError};
pub use gemini::{
    AnalyzeInput, Dispatcher, GeminiDispatcher, GenerateInput, HttpTransport, OperationInput,
    OperationOutcome, OperationOutput, RemoteCall, TextureSwapInput, NO_ANALYSIS_TEXT,
};
pub use models::*;
pub use storage::{CredentialStore, EnvStore, FileStore, KeyValueStore, MemoryStore, CREDENTIAL_KEY};
