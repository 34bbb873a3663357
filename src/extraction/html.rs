//! HTML helpers: entity neutralization, visible text, copyright notices,
//! password inputs and embedded links.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as page content.
const HIDDEN_ELEMENTS: &[&str] = &["script", "noscript", "style", "select"];

static NAMESPACE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*a\d+:").expect("namespace regex should compile"));
static NAMESPACE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</\s*a\d+:").expect("namespace regex should compile"));
static HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*['"](.*?)['"]"#).expect("href regex should compile")
});
static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)src\s*=\s*['"](.*?)['"]"#).expect("src regex should compile")
});
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s'"<>()\\]+"#).expect("URL regex should compile")
});

static INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("input selector should parse"));
static IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img selector should parse"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("anchor selector should parse"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector should parse"));

/// Undo escaping quirks that break naive parsing of captured sources.
///
/// Replaces `&amp;` and `&quot;` and drops vendor namespace prefixes such as
/// `<a0:input>` (a no-break namespace some renderers emit).
pub fn neutralize(html: &str) -> String {
    let html = html.replace("&amp;", "&").replace("&quot;", "\"");
    let html = NAMESPACE_CLOSE.replace_all(&html, "</");
    NAMESPACE_OPEN.replace_all(&html, "<").into_owned()
}

/// Whether the source contains an `<input type="password">`.
pub fn has_password_input(html: &str) -> bool {
    let document = Html::parse_document(&neutralize(html));
    document.select(&INPUT).any(|input| {
        input
            .value()
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("password"))
    })
}

/// Text content of the `<title>` element, if any.
pub fn document_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&TITLE)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Visible text of a source, one entry per text node.
///
/// Hidden subtrees (scripts, styles, selects) are skipped, as is the
/// `<title>` when `skip_title` is set. Tooltip-like attributes (`img`
/// alt/title, `a` title, `input` title) are appended. Embedded URLs are
/// removed from every line.
pub fn visible_text_lines(html: &str, skip_title: bool) -> Vec<String> {
    let document = Html::parse_document(&neutralize(html));
    let mut lines = text_nodes(&document, skip_title, |_| true);

    for img in document.select(&IMG) {
        lines.extend(attrs(img, &["alt", "title"]));
    }
    for anchor in document.select(&ANCHOR) {
        lines.extend(attrs(anchor, &["title"]));
    }
    for input in document.select(&INPUT) {
        lines.extend(attrs(input, &["title"]));
    }

    lines
        .into_iter()
        .map(|line| collapse_whitespace(&remove_urls(&line)))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Text nodes carrying a copyright notice ("©" or "copyright").
pub fn copyright_notices(html: &str) -> Vec<String> {
    let document = Html::parse_document(&neutralize(html));
    text_nodes(&document, false, |text| {
        text.contains('©') || text.to_lowercase().contains("copyright")
    })
}

/// All links embedded in a source: quoted `href`/`src` attribute values and
/// bare `http(s)://` URLs appearing anywhere in the markup.
///
/// Sorted and deduplicated; relative links are kept as written.
pub fn embedded_urls(html: &str) -> Vec<String> {
    let html = neutralize(html);
    let mut urls = BTreeSet::new();

    for rx in [&*HREF_ATTR, &*SRC_ATTR] {
        for cap in rx.captures_iter(&html) {
            if let Some(m) = cap.get(1) {
                urls.insert(m.as_str().trim().to_string());
            }
        }
    }

    let unescaped = html.replace("%20", " ");
    for m in BARE_URL.find_iter(&unescaped) {
        urls.insert(m.as_str().trim_end_matches(['.', ',', ';']).to_string());
    }

    urls.remove("");
    urls.into_iter().collect()
}

/// Replace every embedded `http(s)://` URL with a space.
pub fn remove_urls(text: &str) -> String {
    BARE_URL.replace_all(text, " ").into_owned()
}

/// Collapse whitespace runs into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_nodes(document: &Html, skip_title: bool, keep: impl Fn(&str) -> bool) -> Vec<String> {
    let mut out = Vec::new();
    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let content: &str = text;
        if content.trim().is_empty() || !keep(content) {
            continue;
        }
        let hidden = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().is_some_and(|el| {
                HIDDEN_ELEMENTS.contains(&el.name()) || (skip_title && el.name() == "title")
            })
        });
        if !hidden {
            out.push(collapse_whitespace(content));
        }
    }
    out
}

fn attrs(element: ElementRef<'_>, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(|value| value.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutralize_entities_and_namespaces() {
        let html = r#"<a0:input type=&quot;password&quot;></a0:input> &amp; more"#;
        assert_eq!(neutralize(html), r#"<input type="password"></input> & more"#);
    }

    #[test]
    fn test_password_detection() {
        assert!(has_password_input(
            r#"<form><input name="u"><input TYPE="Password" name="p"></form>"#
        ));
        assert!(!has_password_input(r#"<form><input type="text"></form>"#));
        assert!(!has_password_input(r#"<p>type your password here</p>"#));
    }

    #[test]
    fn test_password_detection_through_escaping_quirks() {
        let html = r#"<html><body><a0:input type=&quot;password&quot; /></body></html>"#;
        assert!(has_password_input(html));
    }

    #[test]
    fn test_visible_text_skips_hidden_elements() {
        let html = r#"<html><head><title>Bank Login</title>
            <script>var brand = "hidden";</script><style>.x{}</style></head>
            <body><h1>Welcome to Example Bank</h1>
            <select><option>Finland</option></select>
            <noscript>enable javascript</noscript>
            <img src="logo.png" alt="Example logo">
            <a href="/help" title="Need help?">Help</a>
            <p>Visit https://example.com/info today</p></body></html>"#;

        let lines = visible_text_lines(html, true);
        assert!(lines.contains(&"Welcome to Example Bank".to_string()));
        assert!(lines.contains(&"Example logo".to_string()));
        assert!(lines.contains(&"Need help?".to_string()));
        assert!(lines.contains(&"Visit today".to_string()));
        assert!(!lines.iter().any(|l| l.contains("hidden")));
        assert!(!lines.iter().any(|l| l.contains("Finland")));
        assert!(!lines.iter().any(|l| l.contains("javascript")));
        assert!(!lines.iter().any(|l| l.contains("Bank Login")));

        let with_title = visible_text_lines(html, false);
        assert!(with_title.contains(&"Bank Login".to_string()));
    }

    #[test]
    fn test_copyright_notices() {
        let html = r#"<body><p>Hello</p><footer>© 1999-2015 eBay Inc.</footer>
            <div>COPYRIGHT PayPal</div><script>/* copyright lib */</script></body>"#;
        let notices = copyright_notices(html);
        assert_eq!(notices.len(), 2);
        assert!(notices[0].contains("eBay"));
        assert!(notices[1].contains("PayPal"));
    }

    #[test]
    fn test_embedded_urls() {
        let html = r#"<a href="https://www.paypal.com/help">x</a>
            <img src='//cdn.example.net/logo.png'>
            <a HREF = "/relative">y</a>
            <script>var u = "http://tracker.evil.ru/p.js";</script>
            <p>see http://plain.example.org/page.</p>
            <a href="">empty</a>"#;
        let urls = embedded_urls(html);
        assert!(urls.contains(&"https://www.paypal.com/help".to_string()));
        assert!(urls.contains(&"//cdn.example.net/logo.png".to_string()));
        assert!(urls.contains(&"/relative".to_string()));
        assert!(urls.contains(&"http://tracker.evil.ru/p.js".to_string()));
        assert!(urls.contains(&"http://plain.example.org/page".to_string()));
        assert!(!urls.contains(&String::new()));
    }

    #[test]
    fn test_document_title() {
        assert_eq!(
            document_title("<html><head><title>\n  PayPal:   Log in </title></head></html>"),
            Some("PayPal: Log in".to_string())
        );
        assert_eq!(document_title("<p>no title</p>"), None);
    }
}
