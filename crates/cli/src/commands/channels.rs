//! `keyrelay channels` — Channel management against the configured store.

use keyrelay_channels::{ChannelService, ImportItem, ImportSummary};
use keyrelay_core::channel::{ChannelRecord, Scope};

pub async fn list(page: i64) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, service) = super::open_service().await?;
    let channels = service.list(page).await?;

    println!("📋 Channels (page {})", page.max(0));
    print_table(&channels);
    Ok(())
}

pub async fn search(keyword: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, service) = super::open_service().await?;
    let channels = service.search(keyword).await?;

    println!("🔍 Channels matching \"{keyword}\"");
    print_table(&channels);
    Ok(())
}

pub async fn export(
    output: &str,
    scope: &str,
    include_key: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, service) = super::open_service().await?;
    let scope = Scope::parse(scope);

    let count = export_to(&service, output, scope, include_key).await?;
    println!("📤 Exported {count} channels ({scope}) to {output}");
    if include_key {
        println!("   ⚠️  File contains credential keys");
    }
    Ok(())
}

pub async fn import(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, service) = super::open_service().await?;

    let summary = import_from(&service, file).await?;
    println!(
        "📥 Imported from {file}: {} created, {} updated",
        summary.created, summary.updated
    );
    Ok(())
}

pub async fn delete_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let (_config, service) = super::open_service().await?;

    let removed = service.delete_disabled().await?;
    println!("🗑️  Deleted {removed} disabled channels.");
    Ok(())
}

async fn export_to(
    service: &ChannelService,
    output: &str,
    scope: Scope,
    include_key: bool,
) -> Result<usize, Box<dyn std::error::Error>> {
    let views = service.export(scope, include_key).await?;
    let json = serde_json::to_string_pretty(&views)?;
    std::fs::write(output, json)?;
    Ok(views.len())
}

async fn import_from(
    service: &ChannelService,
    file: &str,
) -> Result<ImportSummary, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let items: Vec<ImportItem> =
        serde_json::from_str(&content).map_err(|e| format!("Invalid import file {file}: {e}"))?;
    Ok(service.import(items).await)
}

fn print_table(channels: &[ChannelRecord]) {
    if channels.is_empty() {
        println!("   No channels found.");
        return;
    }
    for channel in channels {
        println!("{}", format_row(channel));
    }
}

fn format_row(channel: &ChannelRecord) -> String {
    let created = chrono::DateTime::from_timestamp(channel.created_time, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into());
    let state = if channel.is_disabled() { "off" } else { "on" };

    format!(
        "  {:>5}  {:<3}  type={:<3} {:<24} group={:<10} created {}",
        channel.id,
        state,
        channel.channel_type,
        channel.name,
        channel.group,
        created
    )
}
