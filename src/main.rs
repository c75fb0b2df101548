// src/main.rs

use axum::Router;
use hedera_agent_chat::{
    ai::{Agent, OpenAiClient},
    api::create_api_router,
    app::{ChatApp, NoticeLevel},
    blockchain::{EnrichmentClient, TransactionEnricher},
    chat::{actions::ChatActions, message::Role, remote::RemoteActions, TurnOutcome},
    config::Config,
    wallet::{AppMetadata, RelayConnector, SessionStore, WalletSession},
    AppState,
};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Commands:
  /connect     pair a wallet
  /disconnect  disconnect the wallet
  /tx          show the pending transaction
  /sign        sign & execute the pending transaction
  /cancel      discard the pending transaction
  /help        show this help
  /quit        exit
Anything else is sent to the assistant.";

// --- HTTP Server Logic ---
async fn run_http_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .nest("/api", create_api_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("🚀 HTTP Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Terminal Chat Logic ---
async fn run_terminal(mut app: ChatApp) -> anyhow::Result<()> {
    info!("🚀 Starting terminal chat on stdin/stdout...");

    let mut stdin = io::BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    let mut printed = 0;

    stdout.write_all(format!("Hedera Agent AI\n{}\n", HELP).as_bytes()).await?;
    flush_output(&mut app, &mut stdout, &mut printed, false).await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let mut line = String::new();
        if stdin.read_line(&mut line).await? == 0 {
            info!("EOF received, shutting down");
            break;
        }

        let mut show_panel = false;
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => {
                stdout.write_all(format!("{}\n", HELP).as_bytes()).await?;
            }
            "/connect" => app.connect_wallet().await,
            "/disconnect" => app.disconnect_wallet().await,
            "/tx" => {
                if app.panel().is_none() {
                    stdout.write_all(b"No pending transaction.\n").await?;
                }
                show_panel = true;
            }
            "/sign" => {
                app.sign_transaction().await;
            }
            "/cancel" => app.cancel_transaction(),
            input => {
                if let TurnOutcome::TransactionPrepared(_) = app.send(input).await {
                    show_panel = true;
                }
            }
        }

        flush_output(&mut app, &mut stdout, &mut printed, show_panel).await?;
    }

    info!("Terminal chat shutting down");
    Ok(())
}

/// Print transcript messages added since the last call, pending notices, and
/// optionally the transaction panel.
async fn flush_output(
    app: &mut ChatApp,
    stdout: &mut io::Stdout,
    printed: &mut usize,
    show_panel: bool,
) -> io::Result<()> {
    let mut out = String::new();
    for message in app.transcript().since(*printed) {
        let label = match message.role {
            Role::User => continue,
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::Url => "link",
        };
        out.push_str(&format!("[{}] {}\n", label, message.content));
    }
    *printed = app.transcript().len();

    if show_panel {
        if let Some(panel) = app.panel() {
            out.push_str(&format!("{}\n", panel.render()));
        }
    }

    for notice in app.drain_notices() {
        let marker = match notice.level {
            NoticeLevel::Info => "ℹ",
            NoticeLevel::Success => "✅",
            NoticeLevel::Error => "❌",
        };
        out.push_str(&format!("{} {}\n", marker, notice.text));
    }

    stdout.write_all(out.as_bytes()).await?;
    stdout.flush().await
}

fn build_actions(config: &Config) -> Arc<dyn ChatActions> {
    match &config.chat_action_url {
        Some(url) => {
            info!("Using remote chat actions at {}", url);
            Arc::new(RemoteActions::new(url))
        }
        None => {
            let openai = OpenAiClient::new(config.openai_api_key.clone(), &config.openai_base_url);
            Arc::new(Agent::new(openai, config.agent_settings()))
        }
    }
}

async fn build_app(config: &Config, actions: Arc<dyn ChatActions>) -> anyhow::Result<ChatApp> {
    let enricher = config
        .enrichment_url
        .as_deref()
        .map(|url| Arc::new(EnrichmentClient::new(url)) as Arc<dyn TransactionEnricher>);

    let connector = Arc::new(RelayConnector::new(
        &config.wallet_relay_url,
        &config.wallet_connect_project_id,
        config.hedera_network,
        AppMetadata::for_url(&config.app_url),
    ));
    let store = SessionStore::load_or_create(config.wallet_session_path.clone())?;
    info!("Wallet session storage at: {}", store.path().display());

    let mut wallet = WalletSession::new(connector, store, config.hedera_network);
    if let Err(e) = wallet.init().await {
        // The chat still works; /connect retries initialization.
        error!("❌ Failed to initialize wallet connector: {}", e);
    }

    Ok(ChatApp::new(actions, enricher, wallet))
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hedera_agent_chat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let actions = build_actions(&config);

    // Serve the chat actions over HTTP, or run the interactive terminal chat
    let args: Vec<String> = env::args().collect();
    let result = if args.iter().any(|a| a == "--serve") || env::var("SERVE_MODE").is_ok() {
        run_http_server(AppState::new(actions), config.port).await
    } else {
        match build_app(&config, actions).await {
            Ok(app) => run_terminal(app).await,
            Err(e) => Err(e),
        }
    };

    if let Err(e) = result {
        error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
