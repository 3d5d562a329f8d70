use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:7342")]
    pub server_addr: String,

    /// Optional port for the HTTP server that serves the static chat client
    /// and the health probe. Disabled when unset.
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Directory served by the HTTP server.
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: String,

    /// Conversation history store type (memory).
    #[arg(long, env = "HISTORY_TYPE", default_value = "memory")]
    pub history_type: String,

    /// Maximum number of conversations kept in memory before the least
    /// recently active one is evicted. 0 keeps every conversation.
    #[arg(long, env = "HISTORY_MAX_CONVERSATIONS", default_value = "0")]
    pub max_conversations: usize,

    /// Optional JSON file merged over the built-in complexity scoring
    /// defaults (weights, phrase patterns, keyword lists, length bands).
    #[arg(long, env = "COMPLEXITY_CONFIG_PATH")]
    pub complexity_config: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Optional path to the TLS certificate file (PEM format) for enabling WSS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling WSS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,
}
