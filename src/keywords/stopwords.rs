//! Per-language stopword lists and language identification.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::debug;
use whatlang::Lang;

/// Language used when identification is unreliable or unsupported.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Words common to login pages and URLs; never useful as search keywords.
pub const LOGIN_WORDS: &[&str] = &[
    "com", "php", "log", "login", "sign", "signin", "www", "http", "https", "html", "htm",
];

const EMBEDDED_LISTS: &[(&str, &str)] = &[
    ("en", include_str!("../../data/stopwords/en.txt")),
    ("fi", include_str!("../../data/stopwords/fi.txt")),
    ("fr", include_str!("../../data/stopwords/fr.txt")),
    ("de", include_str!("../../data/stopwords/de.txt")),
    ("es", include_str!("../../data/stopwords/es.txt")),
    ("it", include_str!("../../data/stopwords/it.txt")),
    ("pt", include_str!("../../data/stopwords/pt.txt")),
    ("sv", include_str!("../../data/stopwords/sv.txt")),
    ("nl", include_str!("../../data/stopwords/nl.txt")),
];

/// The web-vocabulary list, applied regardless of language.
const WEB_LIST_CODE: &str = "www";
const EMBEDDED_WEB_LIST: &str = include_str!("../../data/stopwords/www.txt");

/// Stopword lists keyed by two-letter language code, plus the web list.
#[derive(Debug, Clone, Default)]
pub struct StopwordTable {
    lists: HashMap<String, HashSet<String>>,
    web: HashSet<String>,
}

impl StopwordTable {
    /// Lists compiled into the binary.
    pub fn builtin() -> Self {
        let lists = EMBEDDED_LISTS
            .iter()
            .map(|(code, text)| (code.to_string(), parse_list(text)))
            .collect();
        Self {
            lists,
            web: parse_list(EMBEDDED_WEB_LIST),
        }
    }

    /// Builtin lists overridden by `<code>.txt` files found in `dir`.
    ///
    /// `www.txt` replaces the web list.
    pub fn load_dir(dir: &Path) -> std::io::Result<Self> {
        let mut table = Self::builtin();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(code) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let words = parse_list(&std::fs::read_to_string(&path)?);
            debug!(language = code, words = words.len(), "Loaded stopword list");
            if code == WEB_LIST_CODE {
                table.web = words;
            } else {
                table.lists.insert(code.to_lowercase(), words);
            }
        }
        Ok(table)
    }

    /// Language codes with a list loaded.
    pub fn languages(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.lists.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// Whether `token` should be dropped for text in `language`.
    ///
    /// Unknown languages use the English list. Login words and the web list
    /// always apply.
    pub fn is_stopword(&self, language: &str, token: &str) -> bool {
        if LOGIN_WORDS.contains(&token) || self.web.contains(token) {
            return true;
        }
        self.lists
            .get(language)
            .or_else(|| self.lists.get(FALLBACK_LANGUAGE))
            .is_some_and(|list| list.contains(token))
    }
}

fn parse_list(text: &str) -> HashSet<String> {
    text.lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Identify the language of `text` as a two-letter code.
///
/// Unreliable detections and languages without a stopword list fall back to
/// English.
pub fn detect_language(text: &str) -> &'static str {
    let Some(info) = whatlang::detect(text) else {
        return FALLBACK_LANGUAGE;
    };
    if !info.is_reliable() {
        return FALLBACK_LANGUAGE;
    }
    match info.lang() {
        Lang::Eng => "en",
        Lang::Fin => "fi",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Spa => "es",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Swe => "sv",
        Lang::Nld => "nl",
        _ => FALLBACK_LANGUAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lists() {
        let table = StopwordTable::builtin();
        assert!(table.languages().contains(&"en"));
        assert!(table.languages().contains(&"fi"));
        assert!(table.is_stopword("en", "your"));
        assert!(!table.is_stopword("en", "paypal"));
    }

    #[test]
    fn test_login_and_web_words_always_apply() {
        let table = StopwordTable::builtin();
        assert!(table.is_stopword("fi", "signin"));
        assert!(table.is_stopword("fr", "password"));
        assert!(table.is_stopword("de", "https"));
    }

    #[test]
    fn test_unknown_language_uses_english() {
        let table = StopwordTable::builtin();
        assert!(table.is_stopword("xx", "the"));
    }

    #[test]
    fn test_load_dir_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.txt"), "# custom\nbrand\n").unwrap();
        std::fs::write(dir.path().join("www.txt"), "portal\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let table = StopwordTable::load_dir(dir.path()).unwrap();
        assert!(table.is_stopword("en", "brand"));
        assert!(!table.is_stopword("en", "the"));
        assert!(table.is_stopword("fi", "portal"));
        assert!(!table.is_stopword("en", "password"));
        // login words are not configurable
        assert!(table.is_stopword("en", "login"));
    }

    #[test]
    fn test_detect_language() {
        let english = "Please sign in to your account to review the recent activity \
            and confirm that all of your personal information is still correct.";
        assert_eq!(detect_language(english), "en");

        let french = "Bonjour, veuillez saisir votre mot de passe pour accéder à votre \
            compte bancaire en ligne. Nous vous remercions de votre confiance.";
        assert_eq!(detect_language(french), "fr");

        assert_eq!(detect_language(""), FALLBACK_LANGUAGE);
    }
}
