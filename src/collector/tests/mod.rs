use super::test_helpers::*;
use super::*;
use crate::error::Error;
use crate::registry::{MAX_ID_ATTEMPTS, TaskRegistry};
use crate::types::{JobState, TaskId, TaskStatus};
use tokio::sync::Semaphore;


fn archive_bytes(status: TaskStatus) -> Vec<u8> {
    match status {
        TaskStatus::Archive(bytes) => bytes,
        other => panic!("expected archive, got {other:?}"),
    }
}

#[tokio::test]
async fn two_file_scenario_with_rename_and_delivery() {
    let (collector, _fetcher) = create_test_collector(
        test_config(5, 2, &["txt"]),
        ScriptedFetcher::new().with_body("http://x/a.txt", b"dummy content"),
    );

    let id = collector.create_task().await.unwrap();

    let first = collector.add_reference(id, "http://x/a.txt").await.unwrap();
    assert_eq!(first.name, "a.txt");
    assert_eq!(first.remaining, 1);

    assert_eq!(
        collector.report_status(id).await.unwrap(),
        TaskStatus::Collecting {
            remaining: 1,
            message: "remaining capacity = 1".into(),
        }
    );

    let second = collector.add_reference(id, "http://x/a.txt").await.unwrap();
    assert_eq!(second.name, "a-2.txt");

    let bytes = archive_bytes(collector.report_status(id).await.unwrap());
    assert_eq!(
        read_archive(&bytes),
        vec![
            ("a-2.txt".to_string(), b"dummy content".to_vec()),
            ("a.txt".to_string(), b"dummy content".to_vec()),
        ]
    );

    let err = collector.report_status(id).await.unwrap_err();
    assert!(matches!(err, Error::TaskNotFound(found) if found == id));
    assert_eq!(collector.task_count().await, 0);
}

#[tokio::test]
async fn failed_fetch_at_finalization_yields_empty_archive() {
    let url = "http://x/gone.pdf";
    let (collector, _) = create_test_collector(
        test_config(1, 1, &["pdf"]),
        ScriptedFetcher::new().failing_fetch(url),
    );
    let id = collector.create_task().await.unwrap();
    collector.add_reference(id, url).await.unwrap();

    let bytes = archive_bytes(collector.report_status(id).await.unwrap());

    assert!(read_archive(&bytes).is_empty());
    assert!(!collector.registry.contains(id).await);
}

#[tokio::test]
async fn archive_holds_exactly_the_successful_entries_byte_for_byte() {
    let binary: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let (collector, _) = create_test_collector(
        test_config(1, 3, &["pdf", "jpeg"]),
        ScriptedFetcher::new()
            .with_body("http://a/scan.jpeg", &binary)
            .with_body("http://b/report.pdf", b"%PDF-1.7")
            .failing_fetch("http://c/missing.pdf"),
    );
    let id = collector.create_task().await.unwrap();
    for url in ["http://a/scan.jpeg", "http://b/report.pdf", "http://c/missing.pdf"] {
        collector.add_reference(id, url).await.unwrap();
    }

    let bytes = archive_bytes(collector.report_status(id).await.unwrap());

    assert_eq!(
        read_archive(&bytes),
        vec![
            ("report.pdf".to_string(), b"%PDF-1.7".to_vec()),
            ("scan.jpeg".to_string(), binary),
        ]
    );
}

#[tokio::test]
async fn unknown_task_is_not_found_everywhere() {
    let (collector, fetcher) =
        create_test_collector(test_config(1, 1, &["txt"]), ScriptedFetcher::new());
    let id = TaskId(12345);

    assert!(matches!(
        collector.add_reference(id, "http://x/a.txt").await,
        Err(Error::TaskNotFound(_))
    ));
    assert!(matches!(
        collector.report_status(id).await,
        Err(Error::TaskNotFound(_))
    ));
    assert!(matches!(
        collector.add_references(id, ["http://x/a.txt"]).await,
        Err(Error::TaskNotFound(_))
    ));
    assert_eq!(fetcher.probe_calls(), 0);
}

#[tokio::test]
async fn full_task_rejects_without_probing() {
    let (collector, fetcher) =
        create_test_collector(test_config(1, 1, &["txt"]), ScriptedFetcher::new());
    let id = collector.create_task().await.unwrap();
    collector.add_reference(id, "http://x/a.txt").await.unwrap();

    let err = collector
        .add_reference(id, "http://x/b.txt")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ArchiveFull { capacity: 1 }), "got {err:?}");
    assert_eq!(fetcher.probe_calls(), 1);
}

#[tokio::test]
async fn invalid_references_are_rejected_without_probing() {
    let (collector, fetcher) =
        create_test_collector(test_config(1, 3, &["pdf"]), ScriptedFetcher::new());
    let id = collector.create_task().await.unwrap();

    let err = collector.add_reference(id, "http://x/a.exe").await.unwrap_err();
    assert!(matches!(err, Error::ExtensionNotAllowed { .. }), "got {err:?}");

    let err = collector.add_reference(id, "http://x/readme").await.unwrap_err();
    assert!(matches!(err, Error::MalformedName { .. }), "got {err:?}");

    let err = collector.add_reference(id, "not a url").await.unwrap_err();
    assert!(matches!(err, Error::InvalidUrl { .. }), "got {err:?}");

    assert_eq!(fetcher.probe_calls(), 0);
}

#[tokio::test]
async fn unreachable_reference_is_a_fetch_error_and_not_stored() {
    let url = "http://x/404.pdf";
    let (collector, _) = create_test_collector(
        test_config(1, 2, &["pdf"]),
        ScriptedFetcher::new().failing_probe(url),
    );
    let id = collector.create_task().await.unwrap();

    let err = collector.add_reference(id, url).await.unwrap_err();
    assert!(matches!(err, Error::Fetch(_)), "got {err:?}");

    match collector.report_status(id).await.unwrap() {
        TaskStatus::Collecting { remaining, .. } => assert_eq!(remaining, 2),
        other => panic!("expected collecting, got {other:?}"),
    }
}

#[tokio::test]
async fn content_is_probed_on_ingest_and_fetched_again_on_finalize() {
    let (collector, fetcher) =
        create_test_collector(test_config(1, 2, &["txt"]), ScriptedFetcher::new());
    let id = collector.create_task().await.unwrap();
    collector.add_reference(id, "http://x/a.txt").await.unwrap();
    collector.add_reference(id, "http://x/b.txt").await.unwrap();

    assert_eq!(fetcher.probe_calls(), 2);
    assert_eq!(fetcher.fetch_calls(), 0);

    collector.report_status(id).await.unwrap();
    assert_eq!(fetcher.fetch_calls(), 2);
}

#[tokio::test]
async fn status_polls_while_collecting_do_not_fetch() {
    let (collector, fetcher) =
        create_test_collector(test_config(1, 3, &["txt"]), ScriptedFetcher::new());
    let id = collector.create_task().await.unwrap();
    collector.add_reference(id, "http://x/a.txt").await.unwrap();

    for _ in 0..3 {
        assert!(!collector.report_status(id).await.unwrap().is_archive());
    }
    assert_eq!(fetcher.fetch_calls(), 0);
    assert!(collector.registry.contains(id).await);
}

#[tokio::test]
async fn task_capacity_is_enforced_and_freed_by_delivery() {
    let (collector, _) =
        create_test_collector(test_config(2, 1, &["txt"]), ScriptedFetcher::new());

    let first = collector.create_task().await.unwrap();
    collector.create_task().await.unwrap();
    assert!(matches!(
        collector.create_task().await,
        Err(Error::TooManyTasks { max_tasks: 2 })
    ));

    collector.add_reference(first, "http://x/a.txt").await.unwrap();
    collector.report_status(first).await.unwrap();

    collector.create_task().await.unwrap();
}

#[tokio::test]
async fn drop_task_is_idempotent() {
    let (collector, _) =
        create_test_collector(test_config(1, 1, &["txt"]), ScriptedFetcher::new());
    let id = collector.create_task().await.unwrap();

    collector.drop_task(id).await;
    collector.drop_task(id).await;

    assert_eq!(collector.task_count().await, 0);
    assert!(matches!(
        collector.report_status(id).await,
        Err(Error::TaskNotFound(_))
    ));
}

#[tokio::test]
async fn assembly_failure_keeps_task_full_for_retry() {
    fn broken_writer(_: &[(String, Vec<u8>)]) -> crate::error::Result<Vec<u8>> {
        Err(Error::Assembly {
            reason: "disk on fire".into(),
        })
    }

    let (mut collector, fetcher) =
        create_test_collector(test_config(1, 1, &["txt"]), ScriptedFetcher::new());
    let id = collector.create_task().await.unwrap();
    collector.add_reference(id, "http://x/a.txt").await.unwrap();

    collector.assemble = broken_writer;
    let err = collector.report_status(id).await.unwrap_err();
    assert!(matches!(err, Error::Assembly { .. }), "got {err:?}");

    let handle = collector.registry.get(id).await.unwrap();
    assert_eq!(handle.lock().await.state(), JobState::Full);

    collector.assemble = crate::archive::write_archive;
    let bytes = archive_bytes(collector.report_status(id).await.unwrap());
    assert_eq!(read_archive(&bytes).len(), 1);
    assert_eq!(fetcher.fetch_calls(), 2);
}

#[tokio::test]
async fn batch_add_reports_each_url() {
    let (collector, _) = create_test_collector(
        test_config(1, 2, &["pdf"]),
        ScriptedFetcher::new().failing_probe("http://x/down.pdf"),
    );
    let id = collector.create_task().await.unwrap();

    let report = collector
        .add_references(
            id,
            [
                "http://x/a.pdf",
                " ",
                "http://x/a.exe",
                "http://x/down.pdf",
                "http://x/a.pdf",
                "http://x/c.pdf",
            ],
        )
        .await
        .unwrap();

    let added: Vec<_> = report.added.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(added, vec!["a.pdf", "a-2.pdf"]);

    let codes: Vec<_> = report
        .rejected
        .iter()
        .map(|r| (r.url.as_str(), r.code.as_str()))
        .collect();
    assert_eq!(
        codes,
        vec![
            ("http://x/a.exe", "extension_not_allowed"),
            ("http://x/down.pdf", "fetch_failed"),
            ("http://x/c.pdf", "archive_full"),
        ]
    );
    assert!(!report.all_added());
}

#[tokio::test]
async fn urls_are_trimmed_before_storing() {
    let (collector, _) =
        create_test_collector(test_config(1, 2, &["txt"]), ScriptedFetcher::new());
    let id = collector.create_task().await.unwrap();

    let added = collector.add_reference(id, "  http://x/a.txt\n").await.unwrap();
    assert_eq!(added.url, "http://x/a.txt");
}

#[tokio::test]
async fn shutdown_refuses_new_tasks_but_keeps_live_ones() {
    let (collector, _) =
        create_test_collector(test_config(2, 1, &["txt"]), ScriptedFetcher::new());
    let id = collector.create_task().await.unwrap();

    collector.shutdown();
    collector.shutdown_requested().await;

    assert!(!collector.is_accepting());
    assert!(matches!(
        collector.create_task().await,
        Err(Error::ShuttingDown)
    ));
    collector.add_reference(id, "http://x/a.txt").await.unwrap();
    assert!(collector.report_status(id).await.unwrap().is_archive());
}

#[tokio::test]
async fn exhausted_identity_space_fails_task_creation() {
    let config = test_config(5, 1, &["txt"]).validate().unwrap();
    let registry = TaskRegistry::with_id_source(&config.tasks, || 7);
    let collector = ZipCollector::from_parts(config, registry, Arc::new(ScriptedFetcher::new()));

    assert_eq!(collector.create_task().await.unwrap(), TaskId(7));
    let err = collector.create_task().await.unwrap_err();
    assert!(matches!(err, Error::IdentityExhausted { attempts } if attempts == MAX_ID_ATTEMPTS));
}

#[tokio::test]
async fn invalid_config_is_rejected_at_construction() {
    let result = ZipCollector::with_fetcher(
        test_config(0, 1, &["txt"]),
        Arc::new(ScriptedFetcher::new()),
    );
    assert!(matches!(result, Err(Error::Config { .. })));
}

#[tokio::test]
async fn gated_fetcher_blocks_until_released() {
    let gate = Arc::new(Semaphore::new(0));
    let fetcher = ScriptedFetcher::new().gated(gate.clone());

    let pending = tokio::spawn(async move { fetcher.fetch("http://x/a.txt").await });
    tokio::task::yield_now().await;
    assert!(!pending.is_finished());

    gate.add_permits(1);
    assert!(pending.await.unwrap().is_ok());
}
