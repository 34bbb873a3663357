//! phishscope - phishing site classification.
//!
//! Classifies a captured website as phish, suspicious or not phish and names
//! the brands it impersonates, by comparing the site's own registrable domain
//! with the domains a web search associates with its most characteristic
//! terms.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod domain;
pub mod extraction;
pub mod fetch;
pub mod keywords;
pub mod models;
pub mod ocr;
pub mod prominence;
pub mod search;
pub mod storage;

pub use classifier::{Classifier, ReferenceData};
pub use models::{ClassificationResult, Rank, SiteRecord};
