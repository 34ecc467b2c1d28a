//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small catalog and run whole sessions against the
//! JSON state files.

use shelfmark::config::{
    Config, CrawlerConfig, IdentityConfig, OutputConfig, SelectorConfig, SiteConfig,
};
use shelfmark::crawler::run_session;
use shelfmark::output::load_records;
use shelfmark::storage::{JsonStateStore, StateStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at `base_url` with state files under `dir`
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let file = |name: &str| dir.join(name).to_string_lossy().into_owned();

    Config {
        crawler: CrawlerConfig {
            subject_limit: 2,
            book_limit: 10,
            worker_pool_size: 2,
            max_pagination_steps: 5,
            politeness_delay: 0,
            field_timeout: 100,
            jitter: vec![0],
            metadata_concurrency: 2,
            ..CrawlerConfig::default()
        },
        identity: IdentityConfig {
            user_agent: "Mozilla/5.0 (TestBot)".to_string(),
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
            purpose: "Integration testing".to_string(),
            extra_headers: Default::default(),
        },
        site: SiteConfig {
            base_url: base_url.to_string(),
            subjects_path: "/subjects/".to_string(),
        },
        output: OutputConfig {
            blocked_subjects_path: file("blocked_subjects.json"),
            open_subjects_path: file("open_subjects.json"),
            book_links_path: file("book_links.json"),
            records_path: file("records.json"),
        },
        selectors: SelectorConfig {
            next_button: "a.next-page".to_string(),
            ..SelectorConfig::default()
        },
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn book_page(title: &str, author: &str) -> ResponseTemplate {
    html_page(&format!(
        r#"<div class="work-title-and-author desktop">
             <span><h1 class="work-title">{}</h1></span>
             <h2 class="edition-byline"><a href="/authors/OL1A">{}</a></h2>
           </div>
           <div class="edition-omniline">
             <div class="edition-omniline-item">
               <div>Publish Date</div><span itemprop="datePublished">1998</span>
             </div>
             <div class="edition-omniline-item">
               <div>Publisher</div><a href="/publishers/Acme">Acme Press</a>
             </div>
           </div>"#,
        title, author
    ))
}

async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mounts a catalog with two open subjects, one paginated, and three books
async fn mount_catalog(server: &MockServer) {
    mount_get(
        server,
        "/subjects/",
        html_page(
            r#"<a href="/subjects/fiction">Fiction</a>
               <a href="/search?q=subject%3A%22Poetry%22">Poetry</a>
               <a href="/subjects/history">History</a>
               <a href="/account/login">Log in</a>"#,
        ),
    )
    .await;

    mount_get(
        server,
        "/subjects/fiction",
        html_page(
            r#"<a href="/books/OL1M">Book One</a>
               <a href="/books/OL2M">Book Two</a>
               <a class="next-page" href="/browse/fiction/2">Next</a>"#,
        ),
    )
    .await;

    mount_get(
        server,
        "/browse/fiction/2",
        html_page(
            r#"<a href="/books/OL2M">Book Two</a>
               <a href="/books/OL3M">Book Three</a>
               <a class="next-page" aria-disabled="true" href="/browse/fiction/3">Next</a>"#,
        ),
    )
    .await;

    mount_get(
        server,
        "/subjects/poetry",
        html_page(r#"<a href="/books/OL1M">Book One</a>"#),
    )
    .await;

    mount_get(server, "/books/OL1M", book_page("Book One", "Ann Author")).await;
    mount_get(server, "/books/OL2M", book_page("Book Two", "Bo Writer")).await;
    mount_get(server, "/books/OL3M", book_page("Book Three", "Cy Scribe")).await;
}

fn open_store(config: &Config) -> Arc<JsonStateStore> {
    Arc::new(JsonStateStore::from_config(&config.output))
}

#[tokio::test]
async fn test_full_session_seeds_paginates_and_extracts() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"),
    )
    .await;
    mount_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let records_path = config.output.records_path.clone();
    let store = open_store(&config);

    let records = run_session(config, store.clone()).await.unwrap();

    // The first two subject anchors fill the frontier; the search link is rewritten
    let open = store.load_open().unwrap();
    let links: Vec<_> = open.subjects.iter().map(|s| s.link.as_str()).collect();
    assert_eq!(open.total_subjects, 2);
    assert!(links[0].ends_with("/subjects/fiction"));
    assert!(links[1].ends_with("/subjects/poetry"));
    assert!(open.date_updated.is_some());

    // Both pages of fiction were scanned, duplicates collapsed
    let books = store.load_books().unwrap();
    assert_eq!(books.total_book_links, 3);
    assert_eq!(books.total_book_not_scraped, 0);
    assert!(books.books.iter().all(|b| b.is_scraped));

    assert_eq!(records.len(), 3);
    let one = records
        .iter()
        .find(|r| r.link.ends_with("/books/OL1M"))
        .unwrap();
    assert_eq!(one.title, "Book One");
    assert_eq!(one.authors, vec!["Ann Author".to_string()]);
    assert_eq!(one.published_date, "1998");
    assert_eq!(one.publisher, "Acme Press");
    assert_eq!(one.subtitle, "No Data");
    assert_eq!(one.rating_value, None);

    let file = load_records(Path::new(&records_path)).unwrap();
    assert_eq!(file.total_records, 3);
}

#[tokio::test]
async fn test_second_session_resumes_without_rework() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let records_path = config.output.records_path.clone();

    let first = run_session(config.clone(), open_store(&config)).await.unwrap();
    assert_eq!(first.len(), 3);

    // Everything is already scraped and the subject frontier is full
    let second = run_session(config.clone(), open_store(&config)).await.unwrap();
    assert!(second.is_empty());

    let store = open_store(&config);
    assert_eq!(store.load_open().unwrap().subjects.len(), 2);
    assert_eq!(store.load_books().unwrap().books.len(), 3);
    assert_eq!(load_records(Path::new(&records_path)).unwrap().total_records, 3);
}

#[tokio::test]
async fn test_blocked_subjects_are_never_admitted() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let fiction = format!("{}/subjects/fiction", server.uri());
    std::fs::write(
        &config.output.blocked_subjects_path,
        format!(
            r#"{{"subjects": [{{"subject_name": "Fiction", "subject_link": "{}"}}]}}"#,
            fiction
        ),
    )
    .unwrap();

    let store = open_store(&config);
    run_session(config.clone(), store.clone()).await.unwrap();

    let open = store.load_open().unwrap();
    assert!(!open.subjects.iter().any(|s| s.link == fiction));
    assert_eq!(open.subjects.len(), 2);

    // The block-list file itself is left untouched
    assert_eq!(store.load_blocked().unwrap().subjects.len(), 1);
}

#[tokio::test]
async fn test_robots_disallow_skips_book_pages() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /books/"),
    )
    .await;
    mount_catalog(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let records_path = config.output.records_path.clone();
    let store = open_store(&config);

    let records = run_session(config, store.clone()).await.unwrap();

    // Links are still discovered, but no detail page is visited
    assert!(records.is_empty());
    let books = store.load_books().unwrap();
    assert_eq!(books.books.len(), 3);
    assert!(books.books.iter().all(|b| !b.is_scraped));
    assert!(!Path::new(&records_path).exists());

    let detail_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path().starts_with("/books/"))
        .count();
    assert_eq!(detail_requests, 0);
}

#[tokio::test]
async fn test_unreachable_listing_leaves_frontiers_empty() {
    let server = MockServer::start().await;
    mount_get(&server, "/subjects/", ResponseTemplate::new(503)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let store = open_store(&config);

    let records = run_session(config, store.clone()).await.unwrap();

    assert!(records.is_empty());
    assert!(store.load_open().unwrap().subjects.is_empty());
    assert!(store.load_books().unwrap().books.is_empty());
}

#[tokio::test]
async fn test_next_link_into_disallowed_path_is_not_followed() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /search"),
    )
    .await;
    mount_get(
        &server,
        "/subjects/",
        html_page(r#"<a href="/subjects/fiction">Fiction</a>"#),
    )
    .await;
    mount_get(
        &server,
        "/subjects/fiction",
        html_page(
            r#"<a href="/books/OL1M">Book One</a>
               <a class="next-page" href="/search?subject=fiction&page=2">Next</a>"#,
        ),
    )
    .await;
    mount_get(
        &server,
        "/search",
        html_page(r#"<a href="/books/OL2M">Book Two</a>"#),
    )
    .await;
    mount_get(&server, "/books/OL1M", book_page("Book One", "Ann Author")).await;
    mount_get(&server, "/books/OL2M", book_page("Book Two", "Bo Writer")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let store = open_store(&config);

    let records = run_session(config, store.clone()).await.unwrap();

    // Only the first page's link was harvested
    assert_eq!(records.len(), 1);
    let books = store.load_books().unwrap();
    assert_eq!(books.books.len(), 1);
    assert!(books.books[0].link.ends_with("/books/OL1M"));

    let search_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == "/search")
        .count();
    assert_eq!(search_requests, 0);
}
