//! Evidence extraction: tokenizer, HTML helpers and per-site evidence.

mod evidence;
pub mod html;
mod tokenize;

pub use evidence::{Evidence, EvidenceExtractor, DEFAULT_MAX_HTML_BYTES};
pub use tokenize::{prune_url, tokenize, MIN_TOKEN_LEN};
