//! Command-line front end: one-shot prompts, interactive chat, provider listing.

use crate::config::Config;
use crate::provider::{
    self, ChatProvider, Client, CompletionOptions, CompletionResult, Provider, ProviderStatus,
};
use crate::session::Session;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Talk to Gemini, GigaChat and YandexGPT from the terminal
#[derive(Parser, Debug)]
#[command(name = "palaver", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config_dir>/palaver/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a single prompt and print the answer
    Ask(AskArgs),
    /// Interactive conversation over stdin
    Chat(ChatArgs),
    /// List providers and whether credentials are configured
    Providers,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Provider id (gemini, gigachat, yandex)
    #[arg(short, long)]
    pub provider: Option<Provider>,

    /// Model name (vendor default if omitted)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Maximum tokens in the answer
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,
}

impl ModelArgs {
    /// Apply command-line overrides on top of vendor defaults.
    #[must_use]
    pub fn options(&self, mut defaults: CompletionOptions) -> CompletionOptions {
        if let Some(model) = &self.model {
            defaults.model = Some(model.clone());
        }
        if let Some(temperature) = self.temperature {
            defaults.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            defaults.max_tokens = max_tokens;
        }
        defaults
    }
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The prompt (use "-" to read from stdin)
    #[arg(required = true)]
    pub prompt: String,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Output format
    #[arg(short = 'o', long, default_value = "text", value_enum)]
    pub output_format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// JSON output of `ask`.
#[derive(Serialize)]
struct AskOutput<'a> {
    provider: &'static str,
    #[serde(flatten)]
    result: &'a CompletionResult,
}

/// One line typed into the chat loop.
#[derive(Debug, PartialEq, Eq)]
enum ReplInput {
    Empty,
    Reset,
    History,
    Exit,
    Message(String),
}

impl ReplInput {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Empty,
            "/reset" => Self::Reset,
            "/history" => Self::History,
            "/exit" | "/quit" => Self::Exit,
            text => Self::Message(text.to_string()),
        }
    }
}

/// Install the stderr subscriber. `PALAVER_LOG` sets the filter unless
/// `verbose` forces debug output.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("palaver=debug")
    } else {
        EnvFilter::try_from_env("PALAVER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Run a parsed command line.
pub async fn run(cli: Cli) -> ExitCode {
    match run_inner(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", error_message(&e));
            ExitCode::from(1)
        }
    }
}

fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<provider::Error>() {
        Some(e) => e.display_message(),
        None => format!("{err:#}"),
    }
}

async fn run_inner(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if cli.insecure {
        config.transport.verify_tls = false;
    }

    match cli.command {
        Commands::Ask(args) => ask(&config, args).await,
        Commands::Chat(args) => chat(&config, args).await,
        Commands::Providers => {
            list_providers(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_client(config: &Config, args: &ModelArgs) -> Result<Client> {
    let provider = match args.provider {
        Some(p) => p,
        None => config.default_provider()?,
    };
    Ok(Client::from_config(provider, config)?)
}

fn system_prompt(config: &Config, args: &ModelArgs) -> Option<String> {
    args.system
        .clone()
        .or_else(|| config.system_prompt.clone())
        .filter(|s| !s.is_empty())
}

async fn ask(config: &Config, args: AskArgs) -> Result<ExitCode> {
    let prompt = if args.prompt == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer.trim().to_string()
    } else {
        args.prompt.clone()
    };

    if prompt.is_empty() {
        anyhow::bail!("Empty prompt");
    }

    let client = build_client(config, &args.model)?;
    let options = args.model.options(client.default_options());
    let system = system_prompt(config, &args.model);

    let result = client.complete(&prompt, system.as_deref(), &options).await?;

    match args.output_format {
        OutputFormat::Text => println!("{}", result.text),
        OutputFormat::Json => {
            let output = AskOutput {
                provider: client.id(),
                result: &result,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn chat(config: &Config, args: ChatArgs) -> Result<ExitCode> {
    let client = build_client(config, &args.model)?;
    let options = args.model.options(client.default_options());
    let provider_name = client.provider().name();

    let mut session = Session::new(Arc::new(client), system_prompt(config, &args.model))
        .with_options(options);

    eprintln!("Chatting with {provider_name}. Commands: /reset, /history, /exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ReplInput::parse(&line) {
            ReplInput::Empty => {}
            ReplInput::Exit => break,
            ReplInput::Reset => {
                session.reset();
                eprintln!("(conversation cleared)");
            }
            ReplInput::History => {
                for turn in session.history() {
                    println!("[{}] {}", turn.role.as_str(), turn.text);
                }
            }
            ReplInput::Message(text) => match session.send(text).await {
                Ok(reply) => println!("{reply}"),
                Err(e) => eprintln!("Error: {}", e.display_message()),
            },
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn list_providers(config: &Config) {
    for status in ProviderStatus::sorted(ProviderStatus::detect_all(config)) {
        let mark = if status.configured { "configured" } else { "missing credentials" };
        println!(
            "{:<9} {:<10} {:<32} {} ({})",
            status.provider.id(),
            status.provider.name(),
            status.provider.description(),
            mark,
            status.provider.env_vars().join(", ")
        );
    }
}
