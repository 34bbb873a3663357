//! Keyword selection: stopword filtering, language identification and
//! ranking of evidence tokens into bounded search queries.

mod select;
mod stopwords;

pub use select::{KeywordMode, KeywordSelector, KeywordSet, DEFAULT_MAX_KEYWORDS};
pub use stopwords::{detect_language, StopwordTable, FALLBACK_LANGUAGE, LOGIN_WORDS};
