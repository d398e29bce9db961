//! `nexus serve`: start the HTTP API server.

use nexus_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    // Fails on a missing secret before any listener exists.
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Nexus Engine");
    println!("   Listening: {}", config.gateway.bind_addr());
    println!("   Model:     {}", config.model);

    nexus_gateway::start(config).await?;

    Ok(())
}
