pub mod agent;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod generation;
pub mod history;
pub mod models;
pub mod server;

use agent::CatAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HTTP Port: {:?}", args.http_port);
    info!("Static Dir: {}", args.static_dir);
    info!("History Store Type: {}", args.history_type);
    info!("History Cap: {}", args.max_conversations);
    info!("Complexity Config: {:?}", args.complexity_config);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(CatAgent::new(&args)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
