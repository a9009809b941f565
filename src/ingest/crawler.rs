//! Breadth-first documentation crawler.
//!
//! Pages are fetched in batches of at most `concurrency` requests; the
//! frontier and visited set live on the controller task, so link
//! discovery and dedup never race. Only same-prefix http(s) links are
//! followed, fragments are stripped before dedup, and fetch failures
//! skip the page without failing the crawl.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use futures_util::future::join_all;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::Settings;
use crate::errors::ApiError;
use crate::rag::Document;

const USER_AGENT: &str = concat!("docsqa-crawler/", env!("CARGO_PKG_VERSION"));

/// Tags whose text never reaches the extracted content.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "head", "noscript", "template", "svg",
];

/// Tags that force a line break around their text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "li", "ul", "ol", "table", "tr", "br", "h1", "h2", "h3",
    "h4", "h5", "h6", "pre", "blockquote",
];

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed_url: String,
    pub allow_prefix: String,
    pub max_pages: usize,
    pub max_depth: usize,
    pub concurrency: usize,
    pub timeout: Duration,
}

impl CrawlConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            seed_url: settings.crawl_seed_url.clone(),
            allow_prefix: settings.crawl_allow_prefix.clone(),
            max_pages: settings.crawl_max_pages,
            max_depth: settings.crawl_max_depth,
            concurrency: settings.crawl_concurrency,
            timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }
}

pub struct Crawler {
    client: Client,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self { client, config })
    }

    /// Crawls breadth-first from the seed and returns one document per
    /// fetched page with visible text, in fetch order. The `max_pages`
    /// budget counts every successfully fetched page, text or not, so
    /// the number of requests stays bounded even on text-less hub
    /// pages. An unreachable seed yields an empty corpus, not an
    /// error; callers decide whether an empty result aborts the run.
    pub async fn crawl(&self) -> Result<Vec<Document>, ApiError> {
        let seed = normalize_url(&self.config.seed_url)
            .ok_or_else(|| ApiError::BadRequest(format!(
                "invalid seed URL: {}",
                self.config.seed_url
            )))?;
        if !seed.as_str().starts_with(&self.config.allow_prefix) {
            return Err(ApiError::BadRequest(format!(
                "seed URL {} is outside the allow prefix {}",
                seed, self.config.allow_prefix
            )));
        }

        let mut frontier: VecDeque<(Url, usize)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut documents: Vec<Document> = Vec::new();
        let mut fetched = 0usize;

        visited.insert(seed.as_str().to_string());
        frontier.push_back((seed, 0));

        while !frontier.is_empty() && fetched < self.config.max_pages {
            let remaining = self.config.max_pages - fetched;
            let batch_size = self.config.concurrency.min(remaining);

            let mut batch: Vec<(Url, usize)> = Vec::with_capacity(batch_size);
            while batch.len() < batch_size {
                match frontier.pop_front() {
                    Some(entry) => batch.push(entry),
                    None => break,
                }
            }

            let fetches = batch
                .iter()
                .map(|(url, _)| self.fetch_page(url.clone()));
            let bodies = join_all(fetches).await;

            for ((url, depth), body) in batch.into_iter().zip(bodies) {
                let Some(html) = body else { continue };
                fetched += 1;

                if depth < self.config.max_depth {
                    for link in extract_links(&html, &url) {
                        if !link.as_str().starts_with(&self.config.allow_prefix) {
                            continue;
                        }
                        if visited.insert(link.as_str().to_string()) {
                            frontier.push_back((link, depth + 1));
                        }
                    }
                }

                let text = visible_text(&html);
                if text.is_empty() {
                    tracing::debug!(url = %url, "page has no visible text, skipping");
                    continue;
                }

                documents.push(Document {
                    content: text,
                    source: url.as_str().to_string(),
                });
            }
        }

        tracing::info!(
            fetched,
            pages = documents.len(),
            seed = %self.config.seed_url,
            "crawl finished"
        );

        Ok(documents)
    }

    /// Fetches one page, returning its HTML only for 200 responses
    /// with an HTML content type. Everything else is logged and
    /// dropped.
    async fn fetch_page(&self, url: Url) -> Option<String> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(url = %url, error = %err, "fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(url = %url, status = %response.status(), "non-success response");
            return None;
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/html"))
            .unwrap_or(false);
        if !is_html {
            tracing::debug!(url = %url, "non-HTML content type");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(err) => {
                tracing::debug!(url = %url, error = %err, "body read failed");
                None
            }
        }
    }
}

/// Parses and canonicalizes a URL string: fragments are dropped so
/// `page#a` and `page#b` dedup to the same entry.
fn normalize_url(raw: &str) -> Option<Url> {
    let mut url = Url::parse(raw).ok()?;
    url.set_fragment(None);
    Some(url)
}

/// Extracts absolute http(s) links from a page, resolved against its
/// base URL. Kept synchronous: parsed HTML must not be held across an
/// await point.
fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("static selector");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .collect()
}

/// Extracts readable text from a page, dropping chrome and scripts
/// and separating block elements with line breaks.
fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);
    collapse_blank_lines(&text)
}

fn collect_text(element: ElementRef, out: &mut String) {
    let tag = element.value().name();
    if SKIP_TAGS.contains(&tag) {
        return;
    }

    let is_block = BLOCK_TAGS.contains(&tag);
    if is_block {
        out.push('\n');
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Some(text_node) = child.value().as_text() {
            out.push_str(text_node);
        }
    }

    if is_block {
        out.push('\n');
    }
}

/// Trims each line and collapses runs of blank lines into one.
fn collapse_blank_lines(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut last_blank = true;
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !last_blank {
                lines.push("");
            }
            last_blank = true;
        } else {
            lines.push(trimmed);
            last_blank = false;
        }
    }
    while lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/start").unwrap()
    }

    struct TestSite {
        pages: HashMap<String, &'static str>,
        hits: Mutex<HashMap<String, usize>>,
    }

    impl TestSite {
        fn total_hits(&self) -> usize {
            self.hits.lock().unwrap().values().sum()
        }

        fn hits_for(&self, path: &str) -> usize {
            self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
        }
    }

    /// Serves a fixed set of HTML pages on an ephemeral local port,
    /// counting requests per path.
    async fn spawn_site(pages: &[(&'static str, &'static str)]) -> (String, Arc<TestSite>) {
        use axum::response::{Html, IntoResponse};

        let site = Arc::new(TestSite {
            pages: pages.iter().map(|(path, body)| (path.to_string(), *body)).collect(),
            hits: Mutex::new(HashMap::new()),
        });

        let handler_site = site.clone();
        let app = axum::Router::new().fallback(move |uri: axum::http::Uri| {
            let site = handler_site.clone();
            async move {
                let path = uri.path().to_string();
                *site.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
                match site.pages.get(&path) {
                    Some(body) => Html(body.to_string()).into_response(),
                    None => axum::http::StatusCode::NOT_FOUND.into_response(),
                }
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (base, site)
    }

    fn local_config(base: &str, max_pages: usize, concurrency: usize) -> CrawlConfig {
        CrawlConfig {
            seed_url: format!("{}/", base),
            allow_prefix: format!("{}/", base),
            max_pages,
            max_depth: 5,
            concurrency,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn extracts_and_resolves_links() {
        let html = r#"
            <html><body>
                <a href="page-one">One</a>
                <a href="/docs/page-two">Two</a>
                <a href="https://example.com/docs/page-three#section">Three</a>
                <a href="mailto:team@example.com">Mail</a>
            </body></html>
        "#;
        let links = extract_links(html, &base());
        let as_strings: Vec<&str> = links.iter().map(|u| u.as_str()).collect();
        assert_eq!(
            as_strings,
            vec![
                "https://example.com/docs/page-one",
                "https://example.com/docs/page-two",
                "https://example.com/docs/page-three",
            ]
        );
    }

    #[test]
    fn query_strings_stay_distinct_after_fragment_strip() {
        let html = r#"
            <a href="/docs/page?tab=a#x">A</a>
            <a href="/docs/page?tab=b#y">B</a>
        "#;
        let links = extract_links(html, &base());
        assert_eq!(links.len(), 2);
        assert_ne!(links[0], links[1]);
    }

    #[test]
    fn visible_text_skips_chrome_and_scripts() {
        let html = r#"
            <html><head><title>t</title><script>var x = 1;</script></head>
            <body>
                <nav>Site navigation</nav>
                <p>First paragraph.</p>
                <div>Second   block.</div>
                <footer>Copyright</footer>
            </body></html>
        "#;
        let text = visible_text(html);
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second   block."));
        assert!(!text.contains("var x"));
        assert!(!text.contains("Site navigation"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn blank_lines_are_collapsed() {
        let html = "<body><p>one</p><p></p><p></p><p>two</p></body>";
        let text = visible_text(html);
        assert_eq!(text, "one\n\ntwo");
    }

    #[test]
    fn normalization_drops_fragment_only() {
        let url = normalize_url("https://example.com/docs/page?tab=a#section").unwrap();
        assert_eq!(url.as_str(), "https://example.com/docs/page?tab=a");
    }

    #[tokio::test]
    async fn each_url_is_fetched_exactly_once() {
        let (base, site) = spawn_site(&[
            ("/", r#"<p>index</p><a href="/a">a</a><a href="/b">b</a>"#),
            ("/a", r#"<p>alpha</p><a href="/b">b</a><a href="/shared">s</a>"#),
            ("/b", r#"<p>beta</p><a href="/a">a</a><a href="/shared">s</a>"#),
            ("/shared", "<p>shared page</p>"),
        ])
        .await;

        let crawler = Crawler::new(local_config(&base, 10, 2)).unwrap();
        let documents = crawler.crawl().await.unwrap();

        assert_eq!(documents.len(), 4);
        // /a and /b link to each other and both link to /shared;
        // every page is still requested once.
        for path in ["/", "/a", "/b", "/shared"] {
            assert_eq!(site.hits_for(path), 1, "{} fetched more than once", path);
        }
    }

    #[tokio::test]
    async fn budget_counts_fetched_pages_without_text() {
        // A hub page with links but no visible text still consumes
        // budget, so the crawl stops after one request.
        let (base, site) = spawn_site(&[
            ("/", r#"<a href="/a"></a><a href="/b"></a>"#),
            ("/a", "<p>alpha text</p>"),
            ("/b", "<p>beta text</p>"),
        ])
        .await;

        let crawler = Crawler::new(local_config(&base, 1, 1)).unwrap();
        let documents = crawler.crawl().await.unwrap();

        assert!(documents.is_empty());
        assert_eq!(site.total_hits(), 1);
    }

    #[tokio::test]
    async fn stops_at_max_pages() {
        let (base, site) = spawn_site(&[
            ("/", r#"<p>one</p><a href="/two">next</a>"#),
            ("/two", r#"<p>two</p><a href="/three">next</a>"#),
            ("/three", r#"<p>three</p><a href="/four">next</a>"#),
            ("/four", "<p>four</p>"),
        ])
        .await;

        let crawler = Crawler::new(local_config(&base, 2, 1)).unwrap();
        let documents = crawler.crawl().await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(site.total_hits(), 2);
    }

    #[tokio::test]
    async fn seed_outside_allow_prefix_is_rejected() {
        let crawler = Crawler::new(CrawlConfig {
            seed_url: "https://example.com/blog/post".to_string(),
            allow_prefix: "https://example.com/docs/".to_string(),
            max_pages: 5,
            max_depth: 2,
            concurrency: 1,
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let result = crawler.crawl().await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn unreachable_seed_yields_empty_corpus() {
        let crawler = Crawler::new(CrawlConfig {
            // Port 9 (discard) refuses connections immediately.
            seed_url: "http://127.0.0.1:9/".to_string(),
            allow_prefix: "http://127.0.0.1:9/".to_string(),
            max_pages: 5,
            max_depth: 2,
            concurrency: 2,
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let documents = crawler.crawl().await.unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn invalid_seed_is_rejected() {
        let crawler = Crawler::new(CrawlConfig {
            seed_url: "not a url".to_string(),
            allow_prefix: String::new(),
            max_pages: 1,
            max_depth: 1,
            concurrency: 1,
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let result = crawler.crawl().await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
