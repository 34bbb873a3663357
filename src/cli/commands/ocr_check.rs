//! OCR backend availability check.

use console::style;

use crate::cli::helpers::ocr_backend;
use crate::config::Settings;
use crate::ocr::OcrBackend;

pub async fn cmd_ocr_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("OCR Tool Status").bold());
    println!("{}", "-".repeat(50));

    let tesseract = ocr_backend(settings);
    let status = if tesseract.is_available() {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<15} {}", "Tesseract", status);
    if !tesseract.is_available() {
        println!(
            "                  {}",
            style(tesseract.availability_hint()).dim()
        );
    }
    println!(
        "  {:<15} {}",
        "Language",
        tesseract.language().unwrap_or("detected per page")
    );

    if !settings.ocr_enabled {
        println!(
            "\n{}",
            style("OCR is disabled in configuration; password pages will not escalate.").yellow()
        );
    }
    println!();
    Ok(())
}
