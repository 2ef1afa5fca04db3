use chatbox::{
    app::ChatApp,
    config::{Cli, ClientConfig, Command, ServerConfig},
    server::{create_router, InMemoryConnectionManager},
    shared::{AppError, AppState},
    ui::TerminalRenderer,
};
use clap::Parser;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so they don't mix with the chat
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(&cli.command).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Serve(config) => serve(config).await,
        Command::Client(config) => client(config).await,
    }
}

fn default_filter(command: &Command) -> &'static str {
    match command {
        Command::Serve(_) => "chatbox=debug,tower_http=debug",
        Command::Client(_) => "chatbox=warn",
    }
}

async fn serve(config: ServerConfig) -> Result<(), AppError> {
    info!(
        static_dir = %config.static_dir.display(),
        max_connections = config.max_connections,
        "Starting chat relay"
    );

    let connection_manager = Arc::new(InMemoryConnectionManager::new());
    let app_state = AppState::new(connection_manager, config.max_connections);
    let app = create_router(app_state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Server running on http://{}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn client(config: ClientConfig) -> Result<(), AppError> {
    let app = ChatApp::assemble(&config, Box::new(TerminalRenderer::stdout()))?;

    info!("App running...");
    app.run(BufReader::new(tokio::io::stdin())).await
}
