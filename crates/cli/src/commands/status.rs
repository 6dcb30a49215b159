//! `keyrelay status` — Show configuration and store status.

use keyrelay_channels::ChannelService;
use keyrelay_config::AppConfig;
use keyrelay_core::channel::Scope;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (config, service) = super::open_service().await?;

    println!("🔑 keyrelay Status");
    println!("==================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Store:        {}", config.database.backend);
    if config.database.backend == "sqlite" {
        println!("  DB file:      {}", config.database.sqlite_path());
    }
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Page size:    {}", config.channels.items_per_page);

    let (total, disabled) = counts(&service).await?;
    println!("  Channels:     {total} ({disabled} disabled)");

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `keyrelay onboard` first");
    }

    Ok(())
}

async fn counts(service: &ChannelService) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let all = service.list_scope(Scope::All).await?;
    let disabled = all.iter().filter(|c| c.status.is_disabled()).count();
    Ok((all.len(), disabled))
}
