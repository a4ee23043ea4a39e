use std::fs;

use harvester_engine::{
    ensure_output_dir, resource_filename, write_manifest, AtomicFileWriter, DownloadSummary,
    HarvestReport, PersistenceSink, MANIFEST_FILENAME,
};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("books");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("books");
    fs::write(&file_path, "x").unwrap();
    assert!(ensure_output_dir(&file_path).is_err());
}

#[test]
fn sink_saves_bytes_and_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let sink = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = sink.save(&resource_filename("100"), b"first").unwrap();
    assert_eq!(first.file_name().unwrap(), "100.txt");
    assert_eq!(fs::read(&first).unwrap(), b"first");

    let second = sink.save(&resource_filename("100"), b"second").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"second");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let sink = AtomicFileWriter::new(file_path.clone());
    assert!(sink.save("100.txt", b"data").is_err());
    assert!(!file_path.with_file_name("100.txt").exists());
}

#[test]
fn manifest_lists_saved_and_failed_resources() {
    let temp = TempDir::new().unwrap();
    let report = HarvestReport {
        index_pages: 2,
        shards: 2,
        links_discovered: 3,
        resources: 2,
        quota_limit: 1,
        quota_count: 1,
        downloads: DownloadSummary {
            saved: vec!["100".to_string()],
            exhausted: vec!["200".to_string()],
            attempts: 4,
            ..DownloadSummary::default()
        },
    };

    let path = write_manifest(temp.path(), &report, "2024-01-01T00:00:00Z").unwrap();
    assert_eq!(path.file_name().unwrap(), MANIFEST_FILENAME);

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(manifest["generated_utc"], "2024-01-01T00:00:00Z");
    assert_eq!(manifest["resources"], 2);
    assert_eq!(manifest["quota"]["limit"], 1);
    assert_eq!(manifest["downloads"]["saved"][0], "100");
    assert_eq!(manifest["downloads"]["exhausted"][0], "200");
    assert_eq!(manifest["downloads"]["attempts"], 4);
}
