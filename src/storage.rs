//! On-disk site records.
//!
//! Each record is a JSON file named after its site id, with the screenshot
//! stored beside it as `<site_id>.png`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::models::SiteRecord;

/// Errors reading or writing records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Site record not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid site record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Directory of site records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, site_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", site_id))
    }

    /// Path of a record given either as a file path or as a site id.
    ///
    /// Existing files win; a bare name that is not a file is looked up in
    /// the store.
    pub fn resolve(&self, reference: &Path) -> PathBuf {
        if reference.is_file() {
            return reference.to_path_buf();
        }
        let is_bare_id = reference.components().count() == 1 && reference.extension().is_none();
        match reference.to_str() {
            Some(site_id) if is_bare_id => self.record_path(site_id),
            _ => reference.to_path_buf(),
        }
    }

    /// Load a record by site id.
    pub fn load(&self, site_id: &str) -> Result<SiteRecord, RecordError> {
        load_record(&self.record_path(site_id))
    }

    /// Save a record under its site id, assigning one if missing.
    pub fn save(&self, record: &mut SiteRecord) -> Result<PathBuf, RecordError> {
        let path = self.record_path(record.ensure_site_id());
        std::fs::create_dir_all(&self.root)?;
        save_record(&path, record)?;
        Ok(path)
    }

    /// The record's screenshot, if one was captured.
    pub fn screenshot_path(&self, record: &SiteRecord) -> Option<PathBuf> {
        screenshot_beside(&self.record_path(&record.site_id), record)
    }

    /// Site ids of every record in the store, sorted.
    pub fn list(&self) -> Result<Vec<String>, RecordError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Read a record from any path.
pub fn load_record(path: &Path) -> Result<SiteRecord, RecordError> {
    if !path.exists() {
        return Err(RecordError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let record = serde_json::from_str(&contents)?;
    debug!("Loaded site record {}", path.display());
    Ok(record)
}

/// Write a record to `path`, replacing it atomically.
pub fn save_record(path: &Path, record: &SiteRecord) -> Result<(), RecordError> {
    let json = serde_json::to_string_pretty(record)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    debug!("Saved site record {}", path.display());
    Ok(())
}

/// Screenshot stored next to a record file: `<site_id>.png` in the same
/// directory, or the record path with a `.png` extension.
pub fn screenshot_beside(record_path: &Path, record: &SiteRecord) -> Option<PathBuf> {
    let dir = record_path.parent().unwrap_or_else(|| Path::new("."));
    let by_id = (!record.site_id.is_empty()).then(|| dir.join(format!("{}.png", record.site_id)));
    by_id
        .into_iter()
        .chain(std::iter::once(record_path.with_extension("png")))
        .find(|candidate| candidate.is_file())
}
