pub mod channels;
pub mod gateway;
pub mod onboard;
pub mod status;

use keyrelay_channels::ChannelService;
use keyrelay_config::AppConfig;

/// Load the config and open the store it points at.
pub async fn open_service() -> Result<(AppConfig, ChannelService), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let service = keyrelay_gateway::open_service(&config)
        .await
        .map_err(|e| format!("Failed to open channel store: {e}"))?;
    Ok((config, service))
}
