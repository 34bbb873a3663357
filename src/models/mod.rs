//! Data models for phishscope.

mod classification;
mod site;

pub use classification::{ClassificationResult, Rank};
pub use site::{SearchCache, SiteRecord};
