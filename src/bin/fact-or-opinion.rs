use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::error::ReadlineError;
use spinners::{Spinner, Spinners, Stream};

use fact_or_opinion::{
    builder::{LLMBackend, LLMBuilder},
    handler::{IncomingMessage, MessageHandler, Outcome, ReplySink},
    prompt::SYSTEM_PROMPT,
    secret_store::SecretStore,
    Evaluation, Evaluator, LLMError,
};

const BOT_ID: &str = "fact-or-opinion";
const CONSOLE_USER: &str = "console";
const CONSOLE_CHANNEL: &str = "stdin";

/// Sort the sentences of a text into facts and opinions using an LLM.
#[derive(Parser, Debug)]
#[command(name = "fact-or-opinion", version, about)]
struct Cli {
    /// Provider to use (google, openai)
    #[arg(long, short, global = true)]
    backend: Option<String>,

    /// Model name, overrides <PREFIX>_MODEL
    #[arg(long, short, global = true)]
    model: Option<String>,

    /// API root, overrides <PREFIX>_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(long, global = true)]
    temperature: Option<f32>,

    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Do not ask the provider for a JSON-only reply
    #[arg(long, global = true)]
    no_json_mode: bool,

    /// Log at debug level (RUST_LOG still wins when set)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate TEXT, or standard input when TEXT is absent or "-"
    Evaluate { text: Option<String> },
    /// Validate a model reply from FILE or standard input without calling a model
    Normalize { file: Option<PathBuf> },
    /// Interactive session: every line you type is evaluated
    Chat,
    /// Manage stored API keys and settings
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
    /// Serve the HTTP API
    #[cfg(feature = "api")]
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: std::net::SocketAddr,
    },
}

#[derive(Subcommand, Debug)]
enum SecretAction {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

/// Prints replies to standard output.
struct StdoutSink;

#[async_trait]
impl ReplySink for StdoutSink {
    async fn send(&self, _channel_id: &str, text: &str) -> Result<(), LLMError> {
        println!("{text}");
        Ok(())
    }
}

fn open_secrets() -> SecretStore {
    match SecretStore::new() {
        Ok(store) => store,
        Err(e) => {
            log::warn!("secret store unavailable, using environment only: {e}");
            SecretStore::from_env()
        }
    }
}

fn build_evaluator(cli: &Cli, secrets: &SecretStore) -> Result<Evaluator, LLMError> {
    let backend: LLMBackend = match &cli.backend {
        Some(name) => name.parse()?,
        None => match secrets.get("FACT_OR_OPINION_BACKEND") {
            Some(name) => name.parse()?,
            None => LLMBackend::default(),
        },
    };

    let mut builder = LLMBuilder::from_secrets(backend, secrets)
        .system(SYSTEM_PROMPT)
        .json_mode(!cli.no_json_mode);
    if let Some(model) = &cli.model {
        builder = builder.model(model);
    }
    if let Some(base_url) = &cli.base_url {
        builder = builder.base_url(base_url);
    }
    if let Some(temperature) = cli.temperature {
        builder = builder.temperature(temperature);
    }
    if let Some(max_tokens) = cli.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }
    if let Some(timeout) = cli.timeout {
        builder = builder.timeout_seconds(timeout);
    }

    Ok(Evaluator::new(builder.build()?))
}

fn read_input(path: Option<&PathBuf>) -> Result<String, LLMError> {
    match path {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .map_err(|e| LLMError::Generic(format!("Can't read {}: {e}", path.display()))),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| LLMError::Generic(format!("Can't read from stdin: {e}")))?;
            Ok(buf)
        }
    }
}

async fn evaluate(cli: &Cli, text: Option<&str>) -> Result<(), LLMError> {
    let text = match text {
        Some(t) if t != "-" => t.to_string(),
        _ => read_input(None)?,
    };
    let evaluator = build_evaluator(cli, &open_secrets())?;

    let mut spinner = io::stderr().is_terminal().then(|| {
        Spinner::with_stream(Spinners::Dots, "Evaluating".into(), Stream::Stderr)
    });
    let result = evaluator.evaluate(&text).await;
    if let Some(spinner) = spinner.as_mut() {
        spinner.stop_with_newline();
    }

    println!("{}", result?.to_json_pretty()?);
    Ok(())
}

fn normalize(file: Option<&PathBuf>) -> Result<(), LLMError> {
    let raw = read_input(file)?;
    let evaluation: Evaluation = raw.parse()?;
    println!("{}", evaluation.to_json_pretty()?);
    Ok(())
}

async fn chat(cli: &Cli) -> Result<(), LLMError> {
    let evaluator = Arc::new(build_evaluator(cli, &open_secrets())?);
    let handler = MessageHandler::new(evaluator, BOT_ID);
    let mut rl = rustyline::DefaultEditor::new()
        .map_err(|e| LLMError::Generic(format!("Failed to start line editor: {e}")))?;

    eprintln!("{}", "Type some text to evaluate, Ctrl-D to quit.".dimmed());

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                let message = IncomingMessage {
                    author_id: CONSOLE_USER.to_string(),
                    channel_id: CONSOLE_CHANNEL.to_string(),
                    content: line,
                };
                if let Outcome::Failed(reason) = handler.handle(&message, &StdoutSink).await? {
                    log::debug!("evaluation failed: {reason}");
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                return Err(LLMError::Generic(format!("Readline error: {e}")));
            }
        }
    }
    Ok(())
}

fn secret(action: &SecretAction) -> Result<(), LLMError> {
    let mut store = SecretStore::new()?;
    match action {
        SecretAction::Set { key, value } => {
            store.set(key, value)?;
            println!("{} {key}", "Stored".green());
        }
        SecretAction::Get { key } => match store.get(key) {
            Some(value) => println!("{value}"),
            None => {
                return Err(LLMError::InvalidRequest(format!("Secret {key} not set")));
            }
        },
        SecretAction::Delete { key } => {
            store.delete(key)?;
            println!("{} {key}", "Deleted".yellow());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    fact_or_opinion::init_logging(cli.verbose);

    let result = match &cli.command {
        Command::Evaluate { text } => evaluate(&cli, text.as_deref()).await,
        Command::Normalize { file } => normalize(file.as_ref()),
        Command::Chat => chat(&cli).await,
        Command::Secret { action } => secret(action),
        #[cfg(feature = "api")]
        Command::Serve { addr } => match build_evaluator(&cli, &open_secrets()) {
            Ok(evaluator) => fact_or_opinion::api::serve(*addr, Arc::new(evaluator)).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "error:".red().bold());
        process::exit(1);
    }
}
