//! Stored record listing.

use console::style;

use crate::config::Settings;
use crate::storage::RecordStore;

/// List the records saved in the data directory.
pub async fn cmd_records(settings: &Settings) -> anyhow::Result<()> {
    let store = RecordStore::new(settings.records_dir());
    let ids = store.list()?;

    println!("\n{}", style(store.root().display()).bold());
    println!("{}", "-".repeat(50));
    if ids.is_empty() {
        println!("  {}", style("No saved records").dim());
        println!();
        return Ok(());
    }

    for site_id in &ids {
        match store.load(site_id) {
            Ok(record) => {
                let mut flags = Vec::new();
                if store.screenshot_path(&record).is_some() {
                    flags.push("screenshot");
                }
                if record.has_ocr_text() {
                    flags.push("ocr");
                }
                if !record.search_cache.is_empty() {
                    flags.push("cached results");
                }
                println!(
                    "  {}  {} {}",
                    style(site_id).dim(),
                    record.landing_url,
                    style(flags.join(", ")).cyan()
                );
            }
            Err(e) => {
                tracing::warn!("Skipping record {}: {}", site_id, e);
                println!("  {}  {}", style(site_id).dim(), style("unreadable").red());
            }
        }
    }
    println!("\n{} record(s)", ids.len());
    Ok(())
}
