//! Chatline - terminal chat client

use anyhow::{bail, Context, Result};
use chatline_core::capability::stub::UnsupportedVoiceInput;
use chatline_core::{render_with, Capabilities, Conversation, CopyAllSource, FileUploader, I18n};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatline_client::platform::{CommandVoiceOutput, SystemClipboard};
use chatline_client::{repl, Config, WidgetClient};

#[derive(Debug, Parser)]
#[command(name = "chatline", version, about = "Chat with the assistant from the terminal")]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true)]
    server: Option<String>,

    /// Message catalog locale (en, vi)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session
    Chat {
        /// Play each reply as it arrives
        #[arg(long)]
        autoplay: bool,
    },
    /// Send one message and print the reply
    Send {
        text: String,
        /// Upload and attach a file first
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print the rendered markup instead of the raw reply
        #[arg(long)]
        html: bool,
    },
    /// Upload a file and print its server reference
    Upload { path: PathBuf },
    /// Render message text from stdin as an HTML fragment
    Render {
        /// Bind the copy-all control to the raw text
        #[arg(long)]
        raw_copy: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries replies and markup
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(locale) = cli.locale {
        config.locale = Some(locale);
    }

    match cli.command {
        Command::Chat { autoplay } => {
            let mut conversation = conversation(&config)?;
            tracing::info!("Connected to {}", config.server_url);
            repl::run(&mut conversation, autoplay).await
        }
        Command::Send { text, file, html } => send(&config, &text, file, html).await,
        Command::Upload { path } => {
            let client = WidgetClient::new(&config.server_url, config.request_timeout())?;
            let file_ref = FileUploader::upload(&client, &path)
                .await
                .with_context(|| format!("upload of {} failed", path.display()))?;
            println!("{}", file_ref);
            Ok(())
        }
        Command::Render { raw_copy } => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read stdin")?;
            let mut options = config.render;
            if raw_copy {
                options.copy_all = CopyAllSource::RawText;
            }
            println!("{}", render_with(&raw, &options));
            Ok(())
        }
    }
}

fn conversation(config: &Config) -> Result<Conversation> {
    let client = Arc::new(WidgetClient::new(&config.server_url, config.request_timeout())?);
    let capabilities = Capabilities {
        transport: client.clone(),
        uploader: client,
        voice_input: Arc::new(UnsupportedVoiceInput),
        voice_output: Arc::new(CommandVoiceOutput::new(&config.voice)),
        clipboard: Arc::new(SystemClipboard),
    };
    let i18n = match &config.locale {
        Some(locale) => I18n::new(locale),
        None => I18n::from_env(),
    };

    Ok(Conversation::new(
        capabilities,
        i18n,
        config.render,
        config.voice.settings.clone(),
    ))
}

async fn send(config: &Config, text: &str, file: Option<PathBuf>, html: bool) -> Result<()> {
    let mut conversation = conversation(config)?;

    if let Some(path) = file {
        let attached = conversation.attach(&path).await.is_some();
        let notices = conversation.take_notices();
        if !attached {
            let reason = notices.last().map(|n| n.text().to_string()).unwrap_or_default();
            bail!("could not attach {}: {}", path.display(), reason);
        }
    }

    let Some(entry) = conversation.send(text).await else {
        bail!("nothing to send");
    };

    if html {
        println!("{}", entry.markup());
    } else {
        println!("{}", entry.message.raw_text);
        if let Some(url) = &entry.message.audio_url {
            eprintln!("audio: {}", url);
        }
    }
    Ok(())
}
