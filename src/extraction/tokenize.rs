//! Shared tokenizer for all textual evidence.
//!
//! Pipeline: lowercase, strip digits, merge hyphen-joined compounds
//! ("e-mail" becomes "email"), split on every run of non-letters (underscores
//! included), drop tokens shorter than [`MIN_TOKEN_LEN`] characters.

use std::path::Path;

use url::Url;

/// Minimum token length in characters.
pub const MIN_TOKEN_LEN: usize = 3;

/// Tokenize text, keeping repeats and source order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.to_lowercase().chars() {
        if c.is_numeric() || c == '-' {
            continue;
        }
        if c.is_alphabetic() {
            current.push(c);
        } else {
            flush(&mut current, &mut tokens);
        }
    }
    flush(&mut current, &mut tokens);

    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if current.chars().count() >= MIN_TOKEN_LEN {
        tokens.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Strip the protocol and file extension from a URL.
///
/// `https://example.com/secure/login.php?x=1` becomes `example.com/secure/login`.
/// Unparseable input is returned unchanged.
pub fn prune_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            let path = parsed.path();
            let stem = Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| &path[..path.len() - ext.len() - 1])
                .unwrap_or(path);
            format!("{}{}", host, stem)
        }
        Err(_) => url.to_string(),
    }
}
