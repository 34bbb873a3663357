//! End-to-end classification with in-memory search and OCR doubles.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use phishscope::classifier::{Classifier, LiveAnalysis, PrecomputedAnalysis, ReferenceData};
use phishscope::models::{Rank, SiteRecord};
use phishscope::ocr::{OcrError, TextRecognizer};
use phishscope::search::{
    DomainReducer, DomainSetBuilder, RetryPolicy, SearchEngine, SearchError,
};

/// Answers queries containing a known term; everything else finds nothing.
struct TermEngine {
    answers: Vec<(&'static str, Vec<String>)>,
    queries: Mutex<Vec<String>>,
}

impl TermEngine {
    fn new(answers: &[(&'static str, &[&str])]) -> Arc<Self> {
        Arc::new(Self {
            answers: answers
                .iter()
                .map(|(term, urls)| (*term, urls.iter().map(|u| u.to_string()).collect()))
                .collect(),
            queries: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchEngine for TermEngine {
    fn name(&self) -> &str {
        "terms"
    }

    fn self_domains(&self) -> &[&str] {
        &[]
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self
            .answers
            .iter()
            .filter(|(term, _)| query.split(' ').any(|word| word == *term))
            .flat_map(|(_, urls)| urls.clone())
            .collect())
    }
}

/// Recognizer returning fixed text, counting invocations and recording the
/// requested languages.
struct CountingRecognizer {
    text: &'static str,
    calls: AtomicUsize,
    languages: Mutex<Vec<String>>,
}

impl CountingRecognizer {
    fn new(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            text,
            calls: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextRecognizer for CountingRecognizer {
    async fn extract_text(&self, _screenshot: &Path, language: &str) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().unwrap().push(language.to_string());
        Ok(self.text.to_string())
    }
}

struct FailingRecognizer {
    calls: AtomicUsize,
}

#[async_trait]
impl TextRecognizer for FailingRecognizer {
    async fn extract_text(&self, _screenshot: &Path, _language: &str) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(OcrError::BackendNotAvailable("tesseract missing".to_string()))
    }
}

fn live_classifier(engine: Arc<TermEngine>) -> Classifier {
    let reference = ReferenceData::builtin();
    let builder = DomainSetBuilder::new(engine, reference.psl.clone()).with_retry(RetryPolicy::none());
    Classifier::new(reference, Arc::new(LiveAnalysis::new(Arc::new(builder))))
}

fn paypal_engine() -> Arc<TermEngine> {
    TermEngine::new(&[(
        "paypal",
        &[
            "https://www.paypal.com/us/home",
            "https://en.wikipedia.org/wiki/PayPal",
        ],
    )])
}

fn login_page(landing: &str, title: &str, with_password: bool) -> SiteRecord {
    let form = if with_password {
        r#"<form><input type="email" name="login_email"><input type="password" name="login_password"></form>"#
    } else {
        r#"<form><input type="email" name="login_email"></form>"#
    };
    SiteRecord::new(landing, landing)
        .with_title(title)
        .with_html(format!(
            "<html><body><h1>{}</h1>{}<p>Welcome back to PayPal</p></body></html>",
            title, form
        ))
}

fn targets(items: &[&str]) -> std::collections::BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const SCREENSHOT: &str = "screenshot.png";

#[tokio::test]
async fn scenario_a_genuine_site_is_not_phish() {
    let recognizer = CountingRecognizer::new("paypal");
    let classifier = live_classifier(paypal_engine()).with_recognizer(recognizer.clone());
    let mut site = login_page("http://paypal.com/login", "PayPal: Log in to your account", true);

    let result = classifier
        .classify(Some(&mut site), Some(Path::new(SCREENSHOT)))
        .await;

    assert_eq!(result.rank, Rank::NotPhish);
    assert!(result.targets.is_empty());
    // own domain found on the first pass: no OCR
    assert_eq!(recognizer.calls(), 0);
    assert!(site.ocr_text.is_none());
}

#[tokio::test]
async fn scenario_b_lookalike_with_password_is_phish() {
    let engine = paypal_engine();
    let classifier = live_classifier(engine.clone());
    let mut site = login_page(
        "http://paypa1-secure.net/login",
        "PayPal: Log in to your account",
        true,
    );

    let result = classifier.classify(Some(&mut site), None).await;

    assert_eq!(result.rank, Rank::Phish);
    assert_eq!(result.targets, targets(&["paypal.com"]));
    assert!(engine.queries().iter().any(|q| q.contains("paypal")));
}

#[tokio::test]
async fn scenario_c_lookalike_without_password_is_suspicious() {
    let classifier = live_classifier(paypal_engine());
    let mut site = login_page(
        "http://paypa1-secure.net/login",
        "PayPal: Log in to your account",
        false,
    );

    let result = classifier.classify(Some(&mut site), None).await;

    assert_eq!(result.rank, Rank::Suspicious);
    assert_eq!(result.targets, targets(&["paypal.com"]));
}

#[tokio::test]
async fn scenario_d_missing_record_is_unresolved() {
    let classifier = live_classifier(paypal_engine());

    let result = classifier.classify(None, None).await;
    assert_eq!(result.rank, Rank::Unresolved);
    assert!(result.targets.is_empty());
    assert_eq!(result.to_string(), "(-1, unresolved, [])");

    let mut empty = SiteRecord::default();
    let result = classifier.classify(Some(&mut empty), None).await;
    assert_eq!(result.rank, Rank::Unresolved);
}

fn password_page(url: &str, title: &str, text: &str) -> SiteRecord {
    SiteRecord::new(url, url).with_title(title).with_html(format!(
        r#"<html><body><h1>{}</h1><p>{}</p>
        <form><input type="text" name="user"><input type="password" name="pass"></form>
        </body></html>"#,
        title, text
    ))
}

#[tokio::test]
async fn genuine_brand_outside_the_search_stoplist_is_not_phish() {
    let engine = TermEngine::new(&[(
        "yahoo",
        &["https://login.yahoo.com/", "https://en.wikipedia.org/wiki/Yahoo"],
    )]);
    let recognizer = CountingRecognizer::new("yahoo");
    let classifier = live_classifier(engine).with_recognizer(recognizer.clone());
    let mut site = password_page(
        "https://login.yahoo.com/",
        "Sign in to Yahoo",
        "Sign in to Yahoo Mail",
    );

    let result = classifier
        .classify(Some(&mut site), Some(Path::new(SCREENSHOT)))
        .await;

    assert_eq!(result.rank, Rank::NotPhish);
    assert!(result.targets.is_empty());
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn lookalike_of_page_noise_brand_is_phish() {
    let engine = TermEngine::new(&[(
        "adobe",
        &["https://www.adobe.com/", "https://helpx.adobe.com/sign-in.html"],
    )]);
    let mut site = password_page(
        "http://adobe-docs-share.net/view",
        "Adobe Document Cloud",
        "Sign in with your Adobe ID to view the shared document",
    );

    let result = live_classifier(engine).classify(Some(&mut site), None).await;

    assert_eq!(result.rank, Rank::Phish);
    assert_eq!(result.targets, targets(&["adobe.com"]));
}

fn image_only_login() -> SiteRecord {
    SiteRecord::new("http://acct-verify.net/signin", "http://acct-verify.net/signin")
        .with_title("Sign in")
        .with_html(
            r#"<html><body><img src="banner.png">
            <form><input type="text" name="user"><input type="password" name="pass"></form>
            </body></html>"#,
        )
}

fn ebay_engine() -> Arc<TermEngine> {
    TermEngine::new(&[(
        "ebay",
        &["https://www.ebay.com/", "https://signin.ebay.com/ws/eBayISAPI.dll"],
    )])
}

#[tokio::test]
async fn scenario_e_ocr_pass_finds_target() {
    let engine = ebay_engine();
    let recognizer = CountingRecognizer::new("ebay ebay welcome");
    let classifier = live_classifier(engine.clone()).with_recognizer(recognizer.clone());
    let mut site = image_only_login();

    let result = classifier
        .classify(Some(&mut site), Some(Path::new(SCREENSHOT)))
        .await;

    assert_eq!(result.rank, Rank::Phish);
    assert_eq!(result.targets, targets(&["ebay.com"]));
    assert_eq!(recognizer.calls(), 1);
    assert_eq!(site.ocr_text.as_deref(), Some("ebay ebay welcome"));
    assert!(engine.queries().iter().any(|q| q.contains("ebay")));
}

#[tokio::test]
async fn ocr_reads_screenshot_in_page_language() {
    let recognizer = CountingRecognizer::new("ebay ebay bienvenue");
    let classifier = live_classifier(ebay_engine()).with_recognizer(recognizer.clone());
    let mut site = password_page(
        "http://acct-verify.net/connexion",
        "Connexion",
        "Veuillez vous connecter à votre compte pour continuer. Nous avons détecté une \
         activité inhabituelle sur votre compte et nous devons vérifier votre identité \
         avant de poursuivre vos achats.",
    );

    let result = classifier
        .classify(Some(&mut site), Some(Path::new(SCREENSHOT)))
        .await;

    assert_eq!(recognizer.languages(), vec!["fr".to_string()]);
    assert_eq!(result.rank, Rank::Phish);
    assert_eq!(result.targets, targets(&["ebay.com"]));
}

#[tokio::test]
async fn ocr_runs_at_most_once_per_record() {
    let recognizer = CountingRecognizer::new("ebay ebay welcome");
    let classifier = live_classifier(ebay_engine()).with_recognizer(recognizer.clone());
    let mut site = image_only_login();
    let screenshot = Some(Path::new(SCREENSHOT));

    let first = classifier.classify(Some(&mut site), screenshot).await;
    let second = classifier.classify(Some(&mut site), screenshot).await;

    assert_eq!(first, second);
    assert_eq!(recognizer.calls(), 1);
}

#[tokio::test]
async fn cached_ocr_text_is_reused() {
    let recognizer = CountingRecognizer::new("unused");
    let classifier = live_classifier(ebay_engine()).with_recognizer(recognizer.clone());
    let mut site = image_only_login();
    site.ocr_text = Some("ebay ebay welcome".to_string());

    let result = classifier
        .classify(Some(&mut site), Some(Path::new(SCREENSHOT)))
        .await;

    assert_eq!(result.rank, Rank::Phish);
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn failed_ocr_is_not_cached_and_degrades_to_suspicious() {
    let recognizer = Arc::new(FailingRecognizer {
        calls: AtomicUsize::new(0),
    });
    let classifier = live_classifier(ebay_engine()).with_recognizer(recognizer.clone());
    let mut site = image_only_login();

    let result = classifier
        .classify(Some(&mut site), Some(Path::new(SCREENSHOT)))
        .await;

    assert_eq!(result.rank, Rank::Suspicious);
    assert!(result.targets.is_empty());
    assert!(site.ocr_text.is_none());

    classifier
        .classify(Some(&mut site), Some(Path::new(SCREENSHOT)))
        .await;
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn pages_without_password_never_escalate() {
    let recognizer = CountingRecognizer::new("ebay");
    let classifier = live_classifier(ebay_engine()).with_recognizer(recognizer.clone());
    let mut site = SiteRecord::new("http://acct-verify.net/", "http://acct-verify.net/")
        .with_title("Holiday photos")
        .with_html("<p>Pictures from our trip</p>");

    let result = classifier
        .classify(Some(&mut site), Some(Path::new(SCREENSHOT)))
        .await;

    assert_eq!(result.rank, Rank::NotPhish);
    assert_eq!(recognizer.calls(), 0);
}

#[tokio::test]
async fn precomputed_results_share_the_decision_procedure() {
    let reference = ReferenceData::builtin();
    let reducer = DomainReducer::new(reference.psl.clone(), &["google"]);
    let classifier = Classifier::new(reference, Arc::new(PrecomputedAnalysis::new(reducer)));

    let mut site = login_page(
        "http://paypa1-secure.net/login",
        "PayPal: Log in to your account",
        true,
    );
    site.search_cache.keywords = Some(vec![
        "https://www.google.com/search?q=paypal".to_string(),
        "https://www.paypal.com/signin".to_string(),
    ]);

    let result = classifier.classify(Some(&mut site), None).await;
    assert_eq!(result.rank, Rank::Phish);
    assert_eq!(result.targets, targets(&["paypal.com"]));

    let mut genuine = login_page("http://paypal.com/login", "PayPal", true);
    genuine.search_cache.augmented = Some(vec!["https://www.paypal.com/".to_string()]);
    let result = classifier.classify(Some(&mut genuine), None).await;
    assert_eq!(result.rank, Rank::NotPhish);
}
