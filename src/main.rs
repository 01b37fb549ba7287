use std::path::{Path, PathBuf};
use std::process::ExitCode;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Args, Parser, Subcommand};
use stormai::{
    logger::{self, LoggerConfig, LogLevel},
    AnalyzeInput, AspectRatio, GeminiDispatcher, GenerateInput, ImagePayload, ImageSize,
    Operation, OperationInput, OperationOutcome, OperationOutput, StudioConfig, StudioError,
    TextureSwapInput,
};

const DEFAULT_SWAP_PROMPT: &str = "Swap the object's material to match the reference texture.";
const DEFAULT_ANALYZE_PROMPT: &str = "Analyze this image in detail.";

#[derive(Parser)]
#[command(name = "stormai", version, about = "Storm AI Studio on the command line")]
struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the stored Gemini API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Apply the material of a reference texture to an object in a target photo.
    Swap(SwapArgs),
    /// Generate an image from a text prompt.
    Generate(GenerateArgs),
    /// Describe an image, optionally with extended reasoning.
    Analyze(AnalyzeArgs),
    /// List the model used for each operation.
    Models,
}

#[derive(Subcommand)]
enum KeyAction {
    Set { value: String },
    Show,
    Remove,
}

#[derive(Args)]
struct SwapArgs {
    #[arg(long)]
    target: PathBuf,
    #[arg(long)]
    reference: PathBuf,
    #[arg(long, default_value = DEFAULT_SWAP_PROMPT)]
    prompt: String,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long, default_value = "1:1", value_parser = parse_aspect_ratio)]
    aspect_ratio: AspectRatio,
    #[arg(long, default_value = "1K", value_parser = parse_image_size)]
    size: ImageSize,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long, default_value = DEFAULT_ANALYZE_PROMPT)]
    prompt: String,
    /// Spend an extended thinking budget before answering.
    #[arg(long)]
    thinking: bool,
}

fn parse_aspect_ratio(value: &str) -> Result<AspectRatio, String> {
    value.parse().map_err(|e: StudioError| e.to_string())
}

fn parse_image_size(value: &str) -> Result<ImageSize, String> {
    value.parse().map_err(|e: StudioError| e.to_string())
}

fn read_image(path: &Path) -> Result<ImagePayload, StudioError> {
    let bytes = std::fs::read(path)
        .map_err(|e| StudioError::IoError(format!("Cannot read {}: {}", path.display(), e)))?;
    let mime = mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| stormai::DEFAULT_INPUT_MIME_TYPE.to_string());

    log::debug!("Loaded {} ({}, {} bytes)", path.display(), mime, bytes.len());
    Ok(ImagePayload::new(STANDARD.encode(bytes), mime))
}

fn write_image(image: &ImagePayload, out: Option<PathBuf>, operation: Operation) -> Result<PathBuf, StudioError> {
    let path = out.unwrap_or_else(|| {
        PathBuf::from(format!(
            "stormai_{}_{}.png",
            operation,
            chrono::Utc::now().timestamp()
        ))
    });
    let bytes = STANDARD
        .decode(image.data.as_bytes())
        .map_err(|e| StudioError::SerializationError(format!("Invalid base64 image: {}", e)))?;
    std::fs::write(&path, bytes)
        .map_err(|e| StudioError::IoError(format!("Cannot write {}: {}", path.display(), e)))?;
    Ok(path)
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}{}", visible, "*".repeat(key.chars().count().saturating_sub(4).min(12)))
}

async fn run_key(dispatcher: &GeminiDispatcher, action: KeyAction) -> Result<(), StudioError> {
    let store = dispatcher.credentials();
    match action {
        KeyAction::Set { value } => {
            let value = value.trim();
            if value.is_empty() {
                return Err(StudioError::MissingRequiredInput(
                    "API key must not be blank".into(),
                ));
            }
            store.set(value).await?;
            println!("API key saved ({}).", store.backend().backend_name());
        }
        KeyAction::Show => match store.get().await? {
            Some(key) => println!("{}", mask(key.expose())),
            None => println!("No API key stored."),
        },
        KeyAction::Remove => {
            store.remove().await?;
            println!("API key removed.");
        }
    }
    Ok(())
}

async fn run_operation(
    dispatcher: &GeminiDispatcher,
    input: OperationInput,
    out: Option<PathBuf>,
) -> Result<(), StudioError> {
    let operation = input.operation();
    match dispatcher.dispatch(input).await {
        OperationOutcome::Succeeded(OperationOutput::Image(image)) => {
            let path = write_image(&image, out, operation)?;
            println!("{}", path.display());
            Ok(())
        }
        OperationOutcome::Succeeded(OperationOutput::Text(text)) => {
            println!("{}", text);
            Ok(())
        }
        OperationOutcome::Failed(err) => Err(err),
    }
}

async fn run(cli: Cli) -> Result<(), StudioError> {
    let config = StudioConfig::from_env()?;
    logger::log_config_info(&config);
    let dispatcher = GeminiDispatcher::from_config(&config)?;

    match cli.command {
        Command::Key { action } => run_key(&dispatcher, action).await,
        Command::Models => {
            for operation in Operation::all() {
                let output = if operation.produces_image() { "image" } else { "text" };
                println!(
                    "{:<14} {:<16} {:<6} {}",
                    operation.as_str(),
                    operation.display_name(),
                    output,
                    dispatcher.models().for_operation(operation)
                );
            }
            Ok(())
        }
        Command::Swap(args) => {
            let input = TextureSwapInput {
                target: Some(read_image(&args.target)?),
                reference: Some(read_image(&args.reference)?),
                instruction: args.prompt,
            };
            run_operation(&dispatcher, OperationInput::TextureSwap(input), args.out).await
        }
        Command::Generate(args) => {
            let input = GenerateInput {
                prompt: args.prompt,
                aspect_ratio: args.aspect_ratio,
                image_size: args.size,
            };
            run_operation(&dispatcher, OperationInput::Generate(input), args.out).await
        }
        Command::Analyze(args) => {
            let input = AnalyzeInput {
                image: Some(read_image(&args.image)?),
                prompt: args.prompt,
                extended_reasoning: args.thinking,
            };
            run_operation(&dispatcher, OperationInput::Analyze(input), None).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let mut log_config = LoggerConfig::from_env();
    if cli.verbose {
        log_config = log_config.with_level(LogLevel::Debug);
    }
    if let Err(e) = logger::init_with_config(log_config) {
        eprintln!("{}", e);
    }
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(StudioError::MissingCredential) => {
            log::error!("❌ No API key configured");
            eprintln!("No Gemini API key found. Run `stormai key set <KEY>` first.");
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("❌ {}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
