mod agent;
mod analysis;
mod cli;
mod config;
mod generation;
mod history;
mod models;
mod server;

use agent::CatAgent;
use clap::Parser;
use cli::Args;
use dotenv::dotenv;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

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
