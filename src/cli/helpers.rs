//! Shared helper functions for CLI commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::classifier::{
    AnalysisSource, Classifier, LiveAnalysis, PrecomputedAnalysis, ReferenceData,
};
use crate::config::Settings;
use crate::ocr::{ScreenshotOcr, TesseractBackend};
use crate::search::{
    create_search_engine, DomainReducer, DomainSetBuilder, EngineOptions, RetryPolicy,
    SearchEngine,
};

/// Load suffix, stopword and noise tables per settings.
pub fn reference_data(settings: &Settings) -> anyhow::Result<ReferenceData> {
    ReferenceData::load(
        settings.public_suffix_list.as_deref(),
        settings.stopwords_dir.as_deref(),
        &settings.extra_noise_domains,
    )
    .context("Failed to load reference data")
}

pub fn search_engine(settings: &Settings) -> anyhow::Result<Arc<dyn SearchEngine>> {
    let options = EngineOptions {
        timeout: Duration::from_secs(settings.request_timeout),
        user_agent: settings.user_agent.clone(),
        base_url: settings.search_base_url.clone(),
    };
    Ok(create_search_engine(&settings.search_engine, &options)?)
}

/// Live search, or replay of the record's cached results when `cached`.
pub fn analysis_source(
    settings: &Settings,
    reference: &ReferenceData,
    cached: bool,
) -> anyhow::Result<Arc<dyn AnalysisSource>> {
    let engine = search_engine(settings)?;
    if cached {
        let reducer = DomainReducer::new(reference.psl.clone(), engine.self_domains());
        return Ok(Arc::new(PrecomputedAnalysis::new(reducer)));
    }

    let retry = RetryPolicy {
        retries: settings.search_retries,
        backoff: Duration::from_millis(settings.retry_backoff_ms),
        delay: Duration::from_millis(settings.search_delay_ms),
    };
    let builder = DomainSetBuilder::new(engine, reference.psl.clone()).with_retry(retry);
    Ok(Arc::new(LiveAnalysis::new(Arc::new(builder))))
}

/// Tesseract with the configured language, or following each page's language.
pub fn ocr_backend(settings: &Settings) -> TesseractBackend {
    match settings.ocr_language.as_deref() {
        Some(language) => TesseractBackend::with_language(language),
        None => TesseractBackend::new(),
    }
}

/// Classifier configured from settings, with OCR when enabled.
pub fn build_classifier(settings: &Settings, cached: bool) -> anyhow::Result<Classifier> {
    let reference = reference_data(settings)?;
    let analysis = analysis_source(settings, &reference, cached)?;

    let mut classifier = Classifier::new(reference.clone(), analysis)
        .with_max_keywords(settings.max_keywords)
        .with_max_html_bytes(settings.max_html_bytes);
    if settings.ocr_enabled {
        let backend = Arc::new(ocr_backend(settings));
        classifier =
            classifier.with_recognizer(Arc::new(ScreenshotOcr::new(backend, reference.stopwords)));
    }
    Ok(classifier)
}
