use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Minimal real-time chat: relay server and terminal client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the static page and relay chat frames between clients
    Serve(ServerConfig),
    /// Chat from the terminal
    Client(ClientConfig),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "CHATBOX_ADDR", default_value = "0.0.0.0:3000")]
    pub addr: SocketAddr,

    /// Directory served as static files
    #[arg(long, env = "CHATBOX_STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,

    /// Relay connections accepted at the same time
    #[arg(long, env = "CHATBOX_MAX_CONNECTIONS", default_value_t = 256)]
    pub max_connections: usize,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL of the relay
    #[arg(long, env = "CHATBOX_URL", default_value = "ws://127.0.0.1:3000/ws")]
    pub url: String,

    /// Initial display name
    #[arg(long, env = "CHATBOX_NAME", default_value = "Guest001")]
    pub name: String,
}
