use mockito::{Matcher, Mock, ServerGuard};
use std::path::PathBuf;

use super::*;
use crate::config::{DecodePolicy, RunSettings};
use crate::error::{Result, TravisDumpError};
use crate::output::{BuildSink, CsvExporter, DrainProgress};

/// Records build ids per written batch.
#[derive(Default)]
struct RecordingSink {
    batches: Vec<Vec<u64>>,
}

impl RecordingSink {
    fn ids(&self) -> Vec<u64> {
        self.batches.iter().flatten().copied().collect()
    }
}

impl BuildSink for RecordingSink {
    fn write_builds(&mut self, builds: &[Build]) -> Result<()> {
        self.batches.push(builds.iter().map(|b| b.id).collect());
        Ok(())
    }
}

fn settings(base_url: &str, limit: usize, decode_policy: DecodePolicy) -> RunSettings {
    RunSettings {
        token: None,
        base_url: base_url.to_string(),
        repository: "891".to_string(),
        limit,
        offset: 0,
        decode_policy,
        output_path: PathBuf::from("unused.csv"),
    }
}

/// A page of builds whose ids count down from `first_id`.
fn page_body(first_id: u64, len: u64, count: u64, offset: u64, next: Option<u64>) -> String {
    let builds: Vec<_> = (0..len)
        .map(|i| {
            serde_json::json!({
                "id": first_id - i,
                "number": (first_id - i).to_string(),
                "state": "passed",
                "event_type": "push",
                "started_at": "2020-01-01T00:00:00Z",
                "finished_at": "2020-01-01T00:10:00Z",
                "duration": 600,
                "repository": { "id": 891, "name": "demo", "slug": "owner/demo" },
                "branch": { "name": "main" },
                "created_by": { "id": 1, "login": "someone" },
            })
        })
        .collect();
    let next = next.map(|next| serde_json::json!({ "offset": next, "limit": len }));
    serde_json::json!({
        "@type": "builds",
        "@pagination": {
            "limit": len,
            "offset": offset,
            "count": count,
            "is_first": offset == 0,
            "is_last": next.is_none(),
            "next": next,
        },
        "builds": builds,
    })
    .to_string()
}

async fn mock_page(server: &mut ServerGuard, offset: u64, body: String) -> Mock {
    server
        .mock("GET", "/repo/891/builds")
        .match_query(Matcher::UrlEncoded("offset".into(), offset.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

#[tokio::test]
async fn test_single_page_drain() {
    let mut server = mockito::Server::new_async().await;
    let page = mock_page(&mut server, 0, page_body(2, 2, 2, 0, None)).await;

    let provider =
        TravisProvider::new(&settings(&server.url(), 100, DecodePolicy::Lenient)).unwrap();
    let mut exporter = CsvExporter::from_writer(Vec::new()).unwrap();

    let summary = provider
        .drain(0, &mut exporter, &DrainProgress::hidden())
        .await
        .unwrap();

    page.assert_async().await;
    assert_eq!(
        summary,
        DrainSummary {
            pages: 1,
            builds: 2,
            expected: 2
        }
    );

    let csv = String::from_utf8(exporter.finish().unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ID,Number,State,"));
    assert_eq!(
        lines[1],
        "2,2,passed,push,demo,main,,2020-01-01T00:00:00Z,2020-01-01T00:10:00Z,600,1,someone"
    );
    assert!(lines[2].starts_with("1,1,"));
}

#[tokio::test]
async fn test_two_page_drain_preserves_order() {
    let mut server = mockito::Server::new_async().await;
    let first = mock_page(&mut server, 0, page_body(150, 100, 150, 0, Some(100))).await;
    let second = mock_page(&mut server, 100, page_body(50, 50, 150, 100, None)).await;

    let provider =
        TravisProvider::new(&settings(&server.url(), 100, DecodePolicy::Lenient)).unwrap();
    let mut sink = RecordingSink::default();

    let summary = provider
        .drain(0, &mut sink, &DrainProgress::hidden())
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.builds, 150);
    assert_eq!(summary.expected, 150);
    assert_eq!(sink.batches.len(), 2);
    assert_eq!(sink.batches[0].len(), 100);
    assert_eq!(sink.batches[1].len(), 50);
    assert_eq!(sink.ids(), (1..=150).rev().collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_fetch_count_matches_page_count() {
    let mut server = mockito::Server::new_async().await;
    let pages = vec![
        mock_page(&mut server, 0, page_body(5, 2, 5, 0, Some(2))).await,
        mock_page(&mut server, 2, page_body(3, 2, 5, 2, Some(4))).await,
        mock_page(&mut server, 4, page_body(1, 1, 5, 4, None)).await,
    ];

    let provider = TravisProvider::new(&settings(&server.url(), 2, DecodePolicy::Lenient)).unwrap();
    let mut sink = RecordingSink::default();

    let summary = provider
        .drain(0, &mut sink, &DrainProgress::hidden())
        .await
        .unwrap();

    for page in &pages {
        page.assert_async().await;
    }
    assert_eq!(summary.pages, 3);
    assert_eq!(sink.ids(), vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn test_drain_from_starting_offset() {
    let mut server = mockito::Server::new_async().await;
    let page = mock_page(&mut server, 7200, page_body(30, 30, 7230, 7200, None)).await;

    let provider =
        TravisProvider::new(&settings(&server.url(), 100, DecodePolicy::Lenient)).unwrap();
    let mut sink = RecordingSink::default();
    let progress = DrainProgress::hidden();

    let summary = provider.drain(7200, &mut sink, &progress).await.unwrap();

    page.assert_async().await;
    assert_eq!(summary.expected, 30);
    assert_eq!(summary.builds, 30);
    assert_eq!(progress.position(), 30);
    assert_eq!(progress.length(), Some(30));
}

#[tokio::test]
async fn test_empty_collection_writes_header_only() {
    let mut server = mockito::Server::new_async().await;
    let page = mock_page(&mut server, 0, page_body(0, 0, 0, 0, None)).await;

    let provider =
        TravisProvider::new(&settings(&server.url(), 100, DecodePolicy::Lenient)).unwrap();
    let mut exporter = CsvExporter::from_writer(Vec::new()).unwrap();

    let summary = provider
        .drain(0, &mut exporter, &DrainProgress::hidden())
        .await
        .unwrap();

    page.assert_async().await;
    assert_eq!(summary.builds, 0);
    let csv = String::from_utf8(exporter.finish().unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 1);
}

#[tokio::test]
async fn test_null_fields_do_not_end_drain() {
    let mut server = mockito::Server::new_async().await;
    let first_body = serde_json::json!({
        "@pagination": { "limit": 1, "offset": 0, "count": 2, "next": { "offset": 1, "limit": 1 } },
        "builds": [
            { "id": 2, "number": "2", "state": "canceled", "event_type": null, "branch": null, "stages": null }
        ],
    })
    .to_string();
    let first = mock_page(&mut server, 0, first_body).await;
    let second = mock_page(&mut server, 1, page_body(1, 1, 2, 1, None)).await;

    let provider = TravisProvider::new(&settings(&server.url(), 1, DecodePolicy::Lenient)).unwrap();
    let mut exporter = CsvExporter::from_writer(Vec::new()).unwrap();

    let summary = provider
        .drain(0, &mut exporter, &DrainProgress::hidden())
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.builds, 2);

    let csv = String::from_utf8(exporter.finish().unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2,2,canceled,,,,"));
    assert!(lines[2].starts_with("1,1,passed,push,"));
}

#[tokio::test]
async fn test_lenient_decode_failure_ends_drain() {
    let mut server = mockito::Server::new_async().await;
    let first = mock_page(&mut server, 0, page_body(150, 100, 150, 0, Some(100))).await;
    let second = mock_page(&mut server, 100, "{\"builds\": \"oops\"".to_string()).await;

    let provider =
        TravisProvider::new(&settings(&server.url(), 100, DecodePolicy::Lenient)).unwrap();
    let mut sink = RecordingSink::default();

    let summary = provider
        .drain(0, &mut sink, &DrainProgress::hidden())
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.builds, 100);
    assert_eq!(summary.expected, 150);
    assert_eq!(sink.ids().len(), 100);
}

#[tokio::test]
async fn test_strict_decode_failure_aborts_drain() {
    let mut server = mockito::Server::new_async().await;
    let _first = mock_page(&mut server, 0, page_body(150, 100, 150, 0, Some(100))).await;
    let _second = mock_page(&mut server, 100, "not json".to_string()).await;

    let provider =
        TravisProvider::new(&settings(&server.url(), 100, DecodePolicy::Strict)).unwrap();
    let mut sink = RecordingSink::default();

    let result = provider
        .drain(0, &mut sink, &DrainProgress::hidden())
        .await;

    assert!(matches!(
        result,
        Err(TravisDumpError::Decode { offset: 100, .. })
    ));
    assert_eq!(sink.batches.len(), 1);
    assert_eq!(sink.ids().len(), 100);
}

#[tokio::test]
async fn test_network_failure_aborts_drain() {
    let provider =
        TravisProvider::new(&settings("http://127.0.0.1:1", 100, DecodePolicy::Lenient)).unwrap();
    let mut sink = RecordingSink::default();

    let result = provider
        .drain(0, &mut sink, &DrainProgress::hidden())
        .await;

    assert!(matches!(result, Err(TravisDumpError::Network(_))));
    assert!(sink.batches.is_empty());
}

#[test]
fn test_provider_rejects_invalid_base_url() {
    let result = TravisProvider::new(&settings("::not-a-url::", 100, DecodePolicy::Lenient));
    assert!(matches!(result, Err(TravisDumpError::Config(_))));
}
