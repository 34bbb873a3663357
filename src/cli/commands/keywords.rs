//! Keyword inspection command.

use std::path::Path;

use console::style;

use crate::cli::helpers::build_classifier;
use crate::config::Settings;
use crate::keywords::KeywordSet;
use crate::storage::{load_record, RecordStore};

/// Print the keyword sets a record yields, without searching.
pub async fn cmd_keywords(settings: &Settings, reference: &Path) -> anyhow::Result<()> {
    let classifier = build_classifier(settings, true)?;
    let path = RecordStore::new(settings.records_dir()).resolve(reference);
    let record = load_record(&path)?;
    let report = classifier.keyword_report(&record);
    let evidence = classifier.extract_evidence(&record);

    println!("\n{}", style(&record.landing_url).bold());
    println!("{}", "-".repeat(50));
    println!(
        "  {:<15} {}",
        "Password field",
        if evidence.has_password_field {
            style("yes").yellow()
        } else {
            style("no").dim()
        }
    );
    let guesses: Vec<&str> = report.mld_guesses.iter().map(String::as_str).collect();
    println!("  {:<15} {}", "Domain guesses", guesses.join(" "));

    print_set("Keywords", &report.keywords);
    print_set("Augmented", &report.augmented);
    match &report.ocr {
        Some(set) => print_set("OCR", set),
        None => println!("  {:<15} {}", "OCR", style("no cached OCR text").dim()),
    }
    println!();
    Ok(())
}

fn print_set(label: &str, set: &KeywordSet) {
    if set.is_empty() {
        println!("  {:<15} {}", label, style("(empty)").dim());
    } else {
        println!("  {:<15} {}", label, style(set.query_string()).cyan());
    }
}
