//! Site classification commands.

use std::path::Path;
use std::time::Duration;

use console::style;

use crate::cli::helpers::build_classifier;
use crate::config::Settings;
use crate::fetch::SiteFetcher;
use crate::models::{ClassificationResult, Rank, SiteRecord};
use crate::storage::{load_record, save_record, screenshot_beside, RecordStore};

/// Classify a stored site record, given as a file path or a site id.
///
/// Records that cannot be read are unresolved. Newly computed OCR text is
/// written back to the record file.
pub async fn cmd_classify_record(
    settings: &Settings,
    reference: &Path,
    cached: bool,
    json: bool,
) -> anyhow::Result<()> {
    let classifier = build_classifier(settings, cached)?;
    let record_path = RecordStore::new(settings.records_dir()).resolve(reference);
    let path = record_path.as_path();
    let Some(mut record) = load_site(path) else {
        let result = classifier.classify(None, None).await;
        let placeholder = SiteRecord::new(reference.display().to_string(), "");
        return print_result(&placeholder, &result, json);
    };
    let screenshot = screenshot_beside(path, &record);
    let had_ocr = record.has_ocr_text();

    let result = classifier
        .classify(Some(&mut record), screenshot.as_deref())
        .await;

    if !had_ocr && record.has_ocr_text() {
        save_record(path, &record)?;
        tracing::info!("Cached OCR text in {}", path.display());
    }

    print_result(&record, &result, json)
}

/// Fetch a live site and classify it. Fetch failures are unresolved.
pub async fn cmd_classify_url(
    settings: &Settings,
    url: &str,
    save: bool,
    json: bool,
) -> anyhow::Result<()> {
    let classifier = build_classifier(settings, false)?;
    let fetcher = SiteFetcher::new(
        Duration::from_secs(settings.request_timeout),
        settings.user_agent.as_deref(),
        settings.max_html_bytes,
    )?;

    let mut record = match fetcher.fetch(url).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            let record = SiteRecord::new(url, "");
            return print_result(&record, &ClassificationResult::unresolved(), json);
        }
    };

    let result = classifier.classify(Some(&mut record), None).await;

    if save {
        let store = RecordStore::new(settings.records_dir());
        let path = store.save(&mut record)?;
        if !json {
            println!("{} {}", style("Saved").dim(), path.display());
        }
    }

    print_result(&record, &result, json)
}

/// Read a record, logging why it could not be read.
fn load_site(path: &Path) -> Option<SiteRecord> {
    match load_record(path) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!("Cannot use site record {}: {}", path.display(), e);
            None
        }
    }
}

fn print_result(
    record: &SiteRecord,
    result: &ClassificationResult,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let output = serde_json::json!({
            "site_id": record.site_id,
            "url": display_url(record),
            "rank": result.rank.as_str(),
            "code": result.rank.code(),
            "description": result.rank.description(),
            "targets": result.targets,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let rank = match result.rank {
        Rank::Phish => style(result.rank.description()).red().bold(),
        Rank::Suspicious => style(result.rank.description()).yellow().bold(),
        Rank::NotPhish => style(result.rank.description()).green(),
        Rank::Unresolved => style(result.rank.description()).dim(),
    };
    println!("{} {}", style(display_url(record)).cyan(), rank);
    println!("{}", result);
    Ok(())
}

fn display_url(record: &SiteRecord) -> &str {
    if record.landing_url.is_empty() {
        &record.start_url
    } else {
        &record.landing_url
    }
}
