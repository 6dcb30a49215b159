//! `keyrelay gateway` — Start the HTTP admin API.

use keyrelay_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🔑 keyrelay Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Store:     {}", config.database.backend);
    println!("   Page size: {}", config.channels.items_per_page);

    keyrelay_gateway::start(config).await?;

    Ok(())
}
