//! Discovery tests: batch and streaming crawls over the fake site

use crate::common::{root_url, test_config, FakeBrowser, PageSpec};
use combo_harvest::browser::BrowserError;
use combo_harvest::crawler::Crawler;
use combo_harvest::extract::RootProcessor;
use combo_harvest::output::RootsWriter;
use combo_harvest::HarvestError;
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;

const SITE: &str = "https://academy.test";

fn seed() -> Vec<String> {
    vec![format!("{}/", SITE)]
}

/// Records every root it is handed; fails the ones listed in `fail`
#[derive(Default)]
struct RecordingProcessor {
    seen: Vec<String>,
    fail: HashSet<String>,
}

impl RootProcessor for RecordingProcessor {
    async fn process_root(&mut self, url: &str) -> Result<usize, HarvestError> {
        self.seen.push(url.to_string());
        if self.fail.contains(url) {
            return Err(HarvestError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("scripted failure for {}", url),
            )));
        }
        Ok(1)
    }
}

/// A site where every listing page links to the next two and back home
fn endless_site(pages: u32) -> FakeBrowser {
    let mut browser = FakeBrowser::new();
    for i in 0..pages {
        let url = if i == 0 {
            format!("{}/", SITE)
        } else {
            format!("{}/list/{}", SITE, i)
        };
        let targets = vec![
            format!("{}/list/{}", SITE, 2 * i + 1),
            format!("{}/list/{}", SITE, 2 * i + 2),
            format!("{}/", SITE),
        ];
        browser = browser.page(url, PageSpec::links(&targets));
    }
    browser
}

#[tokio::test]
async fn test_batch_respects_page_budget() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.crawl.max_pages = 5;
    let browser = endless_site(100);

    let outcome = Crawler::new(&browser, &config, &seed()).discover_batch().await;

    assert_eq!(outcome.counters.pages_visited, 5);
    assert_eq!(browser.opened().len(), 5);
}

#[tokio::test]
async fn test_each_url_is_navigated_at_most_once() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let browser = endless_site(20);

    Crawler::new(&browser, &config, &seed()).discover_batch().await;

    let opened = browser.opened();
    let unique: HashSet<_> = opened.iter().collect();
    assert_eq!(opened.len(), unique.len());
}

#[tokio::test]
async fn test_resources_and_deep_pages_are_never_visited() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let root = root_url(SITE, 1);
    let browser = FakeBrowser::new()
        .page(
            format!("{}/", SITE),
            PageSpec::links(&[
                format!("{}/files/handout.pdf", SITE),
                format!("{}/download?file=notes.PDF", SITE),
                format!("{}/a/b/c/d/e/f", SITE),
                format!("{}/a/b/c/d/e", SITE),
                root.clone(),
            ]),
        )
        .page(format!("{}/a/b/c/d/e", SITE), PageSpec::html(""))
        .page(root.clone(), PageSpec::html(""));

    let outcome = Crawler::new(&browser, &config, &seed()).discover_batch().await;

    let opened = browser.opened();
    assert!(opened.iter().all(|u| !u.to_lowercase().contains(".pdf")));
    assert!(!opened.contains(&format!("{}/a/b/c/d/e/f", SITE)));
    assert!(opened.contains(&format!("{}/a/b/c/d/e", SITE)));
    assert_eq!(outcome.roots, vec![root]);
}

#[tokio::test]
async fn test_off_site_roots_are_ignored() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let browser = FakeBrowser::new().page(
        format!("{}/", SITE),
        PageSpec::links(&[root_url("https://mirror.test", 1), root_url(SITE, 2)]),
    );

    let outcome = Crawler::new(&browser, &config, &seed()).discover_batch().await;

    assert_eq!(outcome.roots, vec![root_url(SITE, 2)]);
    assert!(browser.opened().iter().all(|u| u.starts_with(SITE)));
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let browser = FakeBrowser::new()
        .page(
            format!("{}/", SITE),
            PageSpec::links(&[format!("{}/broken", SITE), format!("{}/catalog", SITE)]),
        )
        .page(
            format!("{}/catalog", SITE),
            PageSpec::links(&[root_url(SITE, 7)]),
        );

    let outcome = Crawler::new(&browser, &config, &seed()).discover_batch().await;

    assert_eq!(outcome.counters.pages_failed, 2); // /broken and the unregistered root
    assert_eq!(outcome.roots, vec![root_url(SITE, 7)]);
}

#[tokio::test(start_paused = true)]
async fn test_transient_seed_failure_is_retried() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let seed_url = format!("{}/", SITE);
    let suspended =
        || BrowserError::Navigation("net::ERR_NETWORK_IO_SUSPENDED".to_string());
    let browser = FakeBrowser::new()
        .page(seed_url.clone(), PageSpec::links(&[root_url(SITE, 3)]))
        .fail(&seed_url, vec![suspended(), suspended()]);

    let start = tokio::time::Instant::now();
    let outcome = Crawler::new(&browser, &config, &seed()).discover_batch().await;

    assert_eq!(browser.open_count(&seed_url), 3);
    assert_eq!(outcome.roots, vec![root_url(SITE, 3)]);
    assert!(start.elapsed() >= Duration::from_millis(4500));
}

#[tokio::test]
async fn test_streaming_never_exceeds_root_cap() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.crawl.max_roots = 2;
    let roots: Vec<String> = (1..=5).map(|n| root_url(SITE, n)).collect();
    let browser = FakeBrowser::new().page(format!("{}/", SITE), PageSpec::links(&roots));

    let roots_path = dir.path().join("roots.txt");
    let mut writer = RootsWriter::create(&roots_path).unwrap();
    let mut processor = RecordingProcessor::default();

    let outcome = Crawler::new(&browser, &config, &seed())
        .discover_streaming(&mut processor, Some(&mut writer))
        .await;

    assert_eq!(outcome.roots.len(), 2);
    assert_eq!(processor.seen, roots[..2].to_vec());

    let written = std::fs::read_to_string(&roots_path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines, vec![roots[0].as_str(), roots[1].as_str()]);
}

#[tokio::test]
async fn test_streaming_writes_each_root_once() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let root = root_url(SITE, 9);
    let browser = FakeBrowser::new()
        .page(
            format!("{}/", SITE),
            PageSpec::links(&[format!("{}/a", SITE), format!("{}/b", SITE)]),
        )
        .page(format!("{}/a", SITE), PageSpec::links(&[root.clone()]))
        .page(format!("{}/b", SITE), PageSpec::links(&[root.clone()]))
        .page(root.clone(), PageSpec::links(&[root.clone()]));

    let roots_path = dir.path().join("roots.txt");
    let mut writer = RootsWriter::create(&roots_path).unwrap();
    let mut processor = RecordingProcessor::default();

    Crawler::new(&browser, &config, &seed())
        .discover_streaming(&mut processor, Some(&mut writer))
        .await;

    assert_eq!(processor.seen, vec![root.clone()]);
    assert_eq!(
        std::fs::read_to_string(&roots_path).unwrap(),
        format!("{}\n", root)
    );
}

#[tokio::test]
async fn test_streaming_continues_after_root_failure() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let bad = root_url(SITE, 1);
    let good = root_url(SITE, 2);
    let browser = FakeBrowser::new().page(
        format!("{}/", SITE),
        PageSpec::links(&[bad.clone(), good.clone()]),
    );

    let mut processor = RecordingProcessor {
        fail: [bad.clone()].into_iter().collect(),
        ..Default::default()
    };

    let outcome = Crawler::new(&browser, &config, &seed())
        .discover_streaming(&mut processor, None)
        .await;

    assert_eq!(processor.seen, vec![bad, good]);
    assert_eq!(outcome.counters.roots_failed, 1);
    assert_eq!(outcome.counters.roots_found, 2);
}
