//! Archive and event helpers for integration tests

use std::io::Read;
use std::time::Duration;
use tokio::sync::broadcast;
use zip_collector::Event;

/// Read every entry of a ZIP archive as `(name, bytes)`, sorted by name
pub fn read_archive(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("archive should be readable");
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).expect("entry should be readable");
        assert_eq!(
            file.compression(),
            zip::CompressionMethod::Stored,
            "entries are stored uncompressed"
        );
        let mut content = Vec::new();
        file.read_to_end(&mut content).expect("entry body should be readable");
        entries.push((file.name().to_string(), content));
    }
    entries.sort();
    entries
}

/// Names of the entries in a ZIP archive, sorted
pub fn archive_names(bytes: &[u8]) -> Vec<String> {
    read_archive(bytes).into_iter().map(|(name, _)| name).collect()
}

/// Wait for the first event matching `predicate`
pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    predicate: F,
) -> Option<Event>
where
    F: Fn(&Event) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}
