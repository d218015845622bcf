use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tutichat::attachment::AttachmentEncoder;
use tutichat::events::{ChannelNotifier, ChannelViewPort};
use tutichat::ports::{LogNotifier, NullViewPort};
use tutichat::ui::ChatApp;
use tutichat::{ChatClient, Config, HttpReplyService, Profile, SendOutcome, Sender, logging, ui};

#[derive(Parser)]
#[command(name = "tutichat")]
#[command(version)]
#[command(about = "Chat with a bot behind an HTTP reply endpoint", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.tutichat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reply endpoint, overriding the configuration
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the conversation
    Send {
        /// Message text; doubles as the image caption
        #[arg(default_value = "")]
        text: String,
        /// Image to attach
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    match cli.command {
        None => run_tui(config).await,
        Some(Commands::Send { text, image }) => send_once(config, text, image).await,
        Some(Commands::Config) => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::default_path()?,
            };
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
            Ok(())
        }
    }
}

async fn run_tui(config: Config) -> Result<()> {
    logging::init_file(&config)?;

    let profile = Profile::from_config(&config.profile, &AttachmentEncoder::new()).await;
    let service = Arc::new(HttpReplyService::new(config.endpoint.clone())?);
    let (tx, rx) = mpsc::unbounded_channel();
    let client = ChatClient::new(
        &config,
        profile,
        service,
        Arc::new(ChannelViewPort::new(tx.clone())),
        Arc::new(ChannelNotifier::new(tx.clone())),
    );

    ui::run(ChatApp::new(client, config.ui.clone(), tx), rx).await
}

async fn send_once(config: Config, text: String, image: Option<PathBuf>) -> Result<()> {
    logging::init_stderr(&config)?;

    let profile = Profile::from_config(&config.profile, &AttachmentEncoder::new()).await;
    let service = Arc::new(HttpReplyService::new(config.endpoint.clone())?);
    let client = ChatClient::new(
        &config,
        profile,
        service,
        Arc::new(NullViewPort),
        Arc::new(LogNotifier),
    );

    let outcome = match image {
        Some(path) => {
            client.dispatcher().set_input(text);
            client
                .dispatcher()
                .send_attachment(&path)
                .await
                .with_context(|| format!("Failed to attach {}", path.display()))?
        }
        None => client.dispatcher().send(&text, None).await,
    };

    if outcome == SendOutcome::Rejected {
        bail!("Nothing to send: give a message or an --image");
    }

    let bot_name = client.profile().committed_name();
    for message in client.store().current_state().messages {
        let author = match message.sender() {
            Sender::User => "You",
            Sender::Bot => bot_name.as_str(),
        };
        match message.attachment() {
            Some(image) => println!("{}: {} [{}]", author, message.text(), image.mime_type()),
            None => println!("{}: {}", author, message.text()),
        }
    }

    if outcome == SendOutcome::Unreachable {
        bail!("No reply from {}", config.endpoint);
    }
    Ok(())
}
