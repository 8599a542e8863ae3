//! CLI binary for chatting with hosted LLM providers.

mod terminal;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use parley_chat::{
    AttachmentTray, ChatSession, ConfigStore, FileStorage, NullView, SendOutcome, SkipReason,
};
use parley_llm::{Dispatcher, LoggingMiddleware, ProviderRegistry, ReqwestTransport};
use tokio::io::{AsyncBufReadExt, BufReader};

use terminal::{mask_token, parse_line, prompt, ReplCommand, TerminalView, HELP};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Parser)]
#[command(name = "parley", version, about = "Chat with hosted LLM providers from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Storage file (default: $PARLEY_STORE, then the platform data dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,

    /// Send a single message to the selected provider
    Send {
        /// Message text
        message: String,

        /// Files to attach (only the content-array provider forwards them)
        #[arg(short, long)]
        attach: Vec<PathBuf>,

        /// Print the request that would be sent instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or change stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List available providers
    Providers,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show the selected provider and which tokens are set
    Show,

    /// Select a provider and/or store its token
    Set {
        /// Provider to select
        #[arg(short, long)]
        provider: Option<String>,

        /// Token for the (newly) selected provider
        #[arg(short, long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store_path = resolve_store_path(cli.store);
    tracing::debug!(path = %store_path.display(), "using storage file");

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let session = build_session(&store_path, Box::new(TerminalView))?;
            cmd_chat(session).await?;
        }
        Commands::Send {
            message,
            attach,
            dry_run,
        } => {
            if dry_run {
                let session = build_session(&store_path, Box::new(NullView))?;
                cmd_dry_run(&session, &message, &attach).await?;
            } else {
                let session = build_session(&store_path, Box::new(TerminalView))?;
                cmd_send(session, &message, &attach).await?;
            }
        }
        Commands::Settings { action } => {
            let session = build_session(&store_path, Box::new(NullView))?;
            match action {
                SettingsAction::Show => cmd_settings_show(&session),
                SettingsAction::Set { provider, token } => {
                    cmd_settings_set(session, provider.as_deref(), token)?
                }
            }
        }
        Commands::Providers => {
            let session = build_session(&store_path, Box::new(NullView))?;
            cmd_providers(&session);
        }
    }

    Ok(())
}

fn resolve_store_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Some(path) = std::env::var_os("PARLEY_STORE") {
        return PathBuf::from(path);
    }
    directories::ProjectDirs::from("", "", "parley")
        .map(|dirs| dirs.data_dir().join("storage.json"))
        .unwrap_or_else(|| PathBuf::from(".parley").join("storage.json"))
}

/// `<NAME>_API_KEY` for every provider whose variable is set and non-empty.
fn env_tokens(registry: &ProviderRegistry) -> HashMap<String, String> {
    registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let var = format!("{}_API_KEY", name.to_ascii_uppercase());
            std::env::var(&var)
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| (name.to_string(), v))
        })
        .collect()
}

fn build_session(
    store_path: &Path,
    view: Box<dyn parley_chat::ChatView>,
) -> anyhow::Result<ChatSession> {
    let registry = ProviderRegistry::builtin();
    let fallback = env_tokens(&registry);
    let names: Vec<String> = registry.names().into_iter().map(String::from).collect();

    let store = ConfigStore::new(Arc::new(FileStorage::new(store_path)), names);
    let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)?;
    let dispatcher =
        Dispatcher::new(registry, Arc::new(transport)).with_middleware(LoggingMiddleware);

    Ok(ChatSession::new(store, dispatcher, view).with_fallback_tokens(fallback))
}

async fn cmd_chat(mut session: ChatSession) -> anyhow::Result<()> {
    println!(
        "parley: chatting with {} (/help for commands)",
        session.config().selected
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            ReplCommand::Send(text) => {
                if let SendOutcome::Skipped(SkipReason::UnknownProvider) = session.send(&text).await
                {
                    println!("No provider is available for '{}'.", session.config().selected);
                }
            }
            ReplCommand::Attach(paths) => {
                for path in paths {
                    if let Err(e) = session.attach(&path).await {
                        println!("{e}");
                    }
                }
            }
            ReplCommand::Detach(id) => {
                if !session.detach(id) {
                    println!("No attachment with id {id}.");
                }
            }
            ReplCommand::Tray => {
                if session.tray().is_empty() {
                    println!("No attachments.");
                }
                for entry in session.tray().entries() {
                    println!("  [{}] {} ({})", entry.id, entry.name, entry.media_type);
                }
            }
            ReplCommand::Settings => session.open_settings(),
            ReplCommand::Provider(name) => {
                if !session.settings().is_open() {
                    session.open_settings();
                }
                if let Err(e) = session.change_provider(&name) {
                    println!("{e}");
                }
            }
            ReplCommand::Token(token) => {
                if !session.settings().is_open() {
                    session.open_settings();
                }
                session.set_token_field(token);
            }
            ReplCommand::Save => match session.save_settings() {
                Ok(()) => println!("Settings saved."),
                Err(e) => println!("{e}"),
            },
            ReplCommand::Close => session.close_settings(),
            ReplCommand::Providers => cmd_providers(&session),
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => break,
            ReplCommand::Invalid(message) => println!("{message}"),
        }
        prompt();
    }

    Ok(())
}

async fn cmd_send(
    mut session: ChatSession,
    message: &str,
    attach: &[PathBuf],
) -> anyhow::Result<()> {
    for path in attach {
        session.attach(path).await?;
    }

    match session.send(message).await {
        SendOutcome::Replied(_) => Ok(()),
        SendOutcome::Skipped(SkipReason::EmptyMessage) => {
            anyhow::bail!("message is empty")
        }
        SendOutcome::Skipped(SkipReason::UnknownProvider) => {
            anyhow::bail!("no provider is available for '{}'", session.config().selected)
        }
        SendOutcome::Failed(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

async fn cmd_dry_run(
    session: &ChatSession,
    message: &str,
    attach: &[PathBuf],
) -> anyhow::Result<()> {
    let message = message.trim();
    if message.is_empty() {
        anyhow::bail!("message is empty");
    }

    let mut tray = AttachmentTray::new();
    for path in attach {
        tray.add(path).await?;
    }
    let attachments = tray.read_all().await?;

    let config = session.config();
    let request = session.dispatcher().prepare(
        &config.selected,
        session.effective_token(),
        message,
        &attachments,
    )?;

    println!("POST {}", request.url);
    for (name, value) in &request.headers {
        let secret =
            name.eq_ignore_ascii_case("authorization") || name.eq_ignore_ascii_case("x-api-key");
        println!("{name}: {}", if secret { "<redacted>" } else { value.as_str() });
    }
    println!("{}", serde_json::to_string_pretty(&request.body)?);
    Ok(())
}

fn cmd_settings_show(session: &ChatSession) {
    let config = session.config();
    println!("Selected provider: {}", config.selected);
    for name in session.dispatcher().registry().names() {
        let token = config.token(name).unwrap_or_default();
        println!("  {name}: {}", mask_token(token));
    }
}

fn cmd_settings_set(
    mut session: ChatSession,
    provider: Option<&str>,
    token: Option<String>,
) -> anyhow::Result<()> {
    session.open_settings();
    if let Some(provider) = provider {
        session.change_provider(provider)?;
    }
    if let Some(token) = token {
        session.set_token_field(token);
    }
    session.save_settings()?;

    let config = session.config();
    println!(
        "Saved: {} selected, token {}",
        config.selected,
        mask_token(config.selected_token())
    );
    Ok(())
}

fn cmd_providers(session: &ChatSession) {
    let selected = &session.config().selected;
    for descriptor in session.dispatcher().registry().descriptors() {
        let marker = if &descriptor.name == selected { '*' } else { ' ' };
        println!(
            "{marker} {:<9} {:<28} {}",
            descriptor.name, descriptor.model, descriptor.endpoint
        );
    }
}
