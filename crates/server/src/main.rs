//! docqa server binary: loads configuration, builds the index and serves
//! questions until Ctrl+C or SIGTERM.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    server::start_server(config).await
}
