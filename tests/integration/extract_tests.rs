//! Resource extraction tests: click downloads and direct fetches

use crate::common::{root_url, test_config, FakeBrowser, FakeClick, PageSpec};
use combo_harvest::browser::Browser;
use combo_harvest::crawler::build_http_client;
use combo_harvest::extract::{CandidateStatus, DownloadVia, ResourceExtractor};
use combo_harvest::session::SessionSnapshot;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE: &str = "https://academy.test";

fn extractor(out_dir: &std::path::Path) -> ResourceExtractor {
    let config = test_config(out_dir);
    let client = build_http_client(&SessionSnapshot::default(), None).unwrap();
    ResourceExtractor::new(config.extraction, client, out_dir)
}

async fn mount_pdf(server: &MockServer, route: &str, disposition: Option<&str>, body: &[u8]) {
    let mut response = ResponseTemplate::new(200)
        .insert_header("content-type", "application/pdf")
        .set_body_bytes(body.to_vec());
    if let Some(value) = disposition {
        response = response.insert_header("content-disposition", value);
    }
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_both_strategies_are_summed() {
    let server = MockServer::start().await;
    mount_pdf(
        &server,
        "/files/abc.pdf",
        Some(r#"attachment; filename="Report 2024.pdf""#),
        b"%PDF-report",
    )
    .await;
    mount_pdf(&server, "/files/syllabus.pdf", None, b"%PDF-syllabus").await;

    let root = root_url(SITE, 1);
    let spec = PageSpec::links(&[format!("{}/files/abc.pdf", server.uri())])
        .with_click(FakeClick::Download {
            name: "Lecture 1: Intro.pdf".to_string(),
            bytes: b"%PDF-lecture".to_vec(),
        })
        .with_click(FakeClick::Nothing)
        .with_click(FakeClick::Hidden)
        .with_expand(
            "Show more",
            format!(r#"<a href="{}/files/syllabus.pdf">Syllabus</a>"#, server.uri()),
        );
    let browser = FakeBrowser::new().page(root.clone(), spec);

    let dir = TempDir::new().unwrap();
    let extractor = extractor(dir.path());
    let page = browser.open(&root, Duration::from_secs(20)).await.unwrap();
    let report = extractor.extract(&page).await;

    assert_eq!(report.downloaded(), 3);
    assert_eq!(report.count_via(DownloadVia::Click), 1);
    assert_eq!(report.count_via(DownloadVia::Direct), 2);
    assert_eq!(
        report.candidates,
        vec![
            (0, CandidateStatus::Saved("Lecture 1_ Intro.pdf".to_string())),
            (1, CandidateStatus::NoDownload),
            (2, CandidateStatus::NotVisible),
        ]
    );

    assert_eq!(
        std::fs::read(dir.path().join("Report 2024.pdf")).unwrap(),
        b"%PDF-report"
    );
    assert_eq!(
        std::fs::read(dir.path().join("syllabus.pdf")).unwrap(),
        b"%PDF-syllabus"
    );
    assert_eq!(
        std::fs::read(dir.path().join("Lecture 1_ Intro.pdf")).unwrap(),
        b"%PDF-lecture"
    );
}

#[tokio::test]
async fn test_html_masquerading_as_pdf_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/expired.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>Session expired</html>"),
        )
        .mount(&server)
        .await;

    let root = root_url(SITE, 2);
    let browser = FakeBrowser::new().page(
        root.clone(),
        PageSpec::links(&[format!("{}/files/expired.pdf", server.uri())]),
    );

    let dir = TempDir::new().unwrap();
    let page = browser.open(&root, Duration::from_secs(20)).await.unwrap();
    let report = extractor(dir.path()).extract(&page).await;

    assert_eq!(report.downloaded(), 0);
    assert_eq!(report.direct_failures, 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_failing_link_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/a.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_pdf(&server, "/files/b.pdf", None, b"%PDF-b").await;

    let root = root_url(SITE, 3);
    let browser = FakeBrowser::new().page(
        root.clone(),
        PageSpec::links(&[
            format!("{}/files/a.pdf", server.uri()),
            format!("{}/files/b.pdf", server.uri()),
        ]),
    );

    let dir = TempDir::new().unwrap();
    let page = browser.open(&root, Duration::from_secs(20)).await.unwrap();
    let report = extractor(dir.path()).extract(&page).await;

    assert_eq!(report.downloaded(), 1);
    assert_eq!(report.direct_failures, 1);
    assert!(dir.path().join("b.pdf").exists());
}

#[tokio::test]
async fn test_empty_page_yields_zero() {
    let root = root_url(SITE, 4);
    let browser = FakeBrowser::new().page(root.clone(), PageSpec::html("<p>Nothing here</p>"));

    let dir = TempDir::new().unwrap();
    let page = browser.open(&root, Duration::from_secs(20)).await.unwrap();
    let report = extractor(dir.path()).extract(&page).await;

    assert_eq!(report.downloaded(), 0);
    assert!(report.candidates.is_empty());
}

#[tokio::test]
async fn test_same_name_is_overwritten() {
    let root = root_url(SITE, 5);
    let browser = FakeBrowser::new().page(
        root.clone(),
        PageSpec::html("")
            .with_click(FakeClick::Download {
                name: "handout.pdf".to_string(),
                bytes: b"first".to_vec(),
            })
            .with_click(FakeClick::Download {
                name: "handout.pdf".to_string(),
                bytes: b"second".to_vec(),
            }),
    );

    let dir = TempDir::new().unwrap();
    let page = browser.open(&root, Duration::from_secs(20)).await.unwrap();
    let report = extractor(dir.path()).extract(&page).await;

    assert_eq!(report.downloaded(), 2);
    assert_eq!(std::fs::read(dir.path().join("handout.pdf")).unwrap(), b"second");
}

#[tokio::test]
async fn test_direct_fetch_records_the_redirected_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/latest.pdf"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/files/v3.pdf", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_pdf(&server, "/files/v3.pdf", None, b"%PDF-v3").await;

    let root = root_url(SITE, 6);
    let browser = FakeBrowser::new().page(
        root.clone(),
        PageSpec::links(&[format!("{}/files/latest.pdf", server.uri())]),
    );

    let dir = TempDir::new().unwrap();
    let page = browser.open(&root, Duration::from_secs(20)).await.unwrap();
    let report = extractor(dir.path()).extract(&page).await;

    assert_eq!(report.downloaded(), 1);
    assert_eq!(report.records[0].source_url, format!("{}/files/v3.pdf", server.uri()));
    assert_eq!(report.records[0].filename, "latest.pdf");
}
