//! Zip archive ingestion into a project.
//!
//! The caller has already authorized the target project. Ingestion fails as a
//! whole only for an oversized body or bytes that are not a zip container;
//! every other problem is confined to the entry that caused it and recorded
//! in the returned report.
//!
//! Decompression runs on the blocking pool and is bounded per entry and per
//! archive, so a small archive cannot expand without limit.

use crate::error::{ApiError, ApiResult};
use axum::body::Bytes;
use critic_core::config::ServerConfig;
use critic_metadata::MetadataStore;
use critic_metadata::repos::FileRepo;
use serde::Serialize;
use std::io::{Cursor, Read};
use time::OffsetDateTime;
use zip::ZipArchive;

const ENTRY_TOO_LARGE: &str = "entry too large";
const EXTRACTION_LIMIT_REACHED: &str = "archive extraction limit reached";

/// Outcome of one archive upload.
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    /// Normalized paths written to the project, in archive order.
    pub ingested: Vec<String>,
    /// Entries left out, with the reason.
    pub skipped: Vec<SkippedEntry>,
}

/// An archive entry that was not stored.
#[derive(Debug, Serialize)]
pub struct SkippedEntry {
    /// Entry name as it appears in the archive.
    pub name: String,
    pub reason: String,
}

/// Size bounds for one ingestion.
#[derive(Clone, Copy, Debug)]
pub struct IngestLimits {
    /// Compressed archive size.
    pub archive_bytes: usize,
    /// Decompressed size of a single entry.
    pub entry_bytes: usize,
    /// Decompressed size of every stored entry combined.
    pub extracted_bytes: usize,
}

impl IngestLimits {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            archive_bytes: config.max_archive_bytes,
            entry_bytes: config.max_entry_bytes,
            extracted_bytes: config.max_extracted_bytes,
        }
    }
}

/// Normalize an archive entry name into a stored file path.
///
/// Backslashes become forward slashes and any leading `./` is removed.
pub fn normalize_entry_path(name: &str) -> String {
    let unified = name.replace('\\', "/");
    let mut path = unified.as_str();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.to_string()
}

/// Store every file entry of a zip archive in `project_id`.
///
/// Entries are processed sequentially. Directories are ignored; unreadable
/// entries, oversized entries, non-text content, empty paths and failed
/// writes are skipped individually. Once the archive's combined extraction
/// limit is reached, every remaining file entry is skipped.
pub async fn ingest_archive(
    metadata: &dyn MetadataStore,
    project_id: i64,
    bytes: Bytes,
    limits: IngestLimits,
) -> ApiResult<IngestReport> {
    if bytes.len() > limits.archive_bytes {
        crate::metrics::ARCHIVES_REJECTED
            .with_label_values(&["too_large"])
            .inc();
        return Err(ApiError::PayloadTooLarge {
            limit: limits.archive_bytes,
        });
    }

    let entries = tokio::task::spawn_blocking(move || extract_entries(&bytes, limits))
        .await
        .map_err(|e| ApiError::Internal(format!("archive extraction task failed: {e}")))??;

    let mut report = IngestReport::default();

    for entry in entries {
        let (name, content) = match entry {
            EntryRead::File { name, content } => (name, content),
            EntryRead::Failed { name, reason } => {
                tracing::debug!(
                    project_id,
                    entry = %name,
                    reason = %reason,
                    "skipping archive entry"
                );
                report.skipped.push(SkippedEntry { name, reason });
                continue;
            }
        };

        let path = normalize_entry_path(&name);
        if path.is_empty() {
            report.skipped.push(SkippedEntry {
                name,
                reason: "empty path".to_string(),
            });
            continue;
        }

        match metadata
            .upsert_file(project_id, &path, &content, OffsetDateTime::now_utc())
            .await
        {
            Ok(_) => {
                crate::metrics::FILES_UPSERTED.inc();
                report.ingested.push(path);
            }
            Err(e) => {
                tracing::warn!(
                    project_id,
                    path = %path,
                    error = %e,
                    "failed to store archive entry"
                );
                report.skipped.push(SkippedEntry {
                    name,
                    reason: format!("failed to store file: {e}"),
                });
            }
        }
    }

    crate::metrics::ARCHIVE_ENTRIES
        .with_label_values(&["ingested"])
        .inc_by(report.ingested.len() as u64);
    crate::metrics::ARCHIVE_ENTRIES
        .with_label_values(&["skipped"])
        .inc_by(report.skipped.len() as u64);

    tracing::info!(
        project_id,
        ingested = report.ingested.len(),
        skipped = report.skipped.len(),
        "archive ingested"
    );

    Ok(report)
}

enum EntryRead {
    File { name: String, content: String },
    Failed { name: String, reason: String },
}

/// Decode the container and read every file entry within `limits`.
///
/// Blocking; runs off the async runtime.
fn extract_entries(bytes: &[u8], limits: IngestLimits) -> ApiResult<Vec<EntryRead>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        crate::metrics::ARCHIVES_REJECTED
            .with_label_values(&["invalid"])
            .inc();
        ApiError::BadRequest(format!("invalid archive: {e}"))
    })?;

    let mut remaining = limits.extracted_bytes;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        if let Some(entry) = read_entry(&mut archive, index, limits.entry_bytes, &mut remaining) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Read one entry, charging its content against `remaining`. Directories
/// yield `None`.
fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    index: usize,
    entry_limit: usize,
    remaining: &mut usize,
) -> Option<EntryRead> {
    let entry = match archive.by_index(index) {
        Ok(entry) => entry,
        Err(e) => {
            return Some(EntryRead::Failed {
                name: format!("#{index}"),
                reason: format!("unreadable entry: {e}"),
            });
        }
    };

    let name = entry.name().to_string();
    if entry.is_dir() {
        return None;
    }

    let failed = |name: String, reason: &str| {
        Some(EntryRead::Failed {
            name,
            reason: reason.to_string(),
        })
    };

    if *remaining == 0 {
        return failed(name, EXTRACTION_LIMIT_REACHED);
    }
    if entry.size() > entry_limit as u64 {
        return failed(name, ENTRY_TOO_LARGE);
    }

    // The declared size is untrusted; read at most one byte past the cap.
    let cap = entry_limit.min(*remaining);
    let mut raw = Vec::new();
    if let Err(e) = entry.take(cap as u64 + 1).read_to_end(&mut raw) {
        return Some(EntryRead::Failed {
            name,
            reason: format!("unreadable entry: {e}"),
        });
    }

    if raw.len() > entry_limit {
        return failed(name, ENTRY_TOO_LARGE);
    }
    if raw.len() > *remaining {
        *remaining = 0;
        return failed(name, EXTRACTION_LIMIT_REACHED);
    }
    *remaining -= raw.len();

    match String::from_utf8(raw) {
        Ok(content) => Some(EntryRead::File { name, content }),
        Err(_) => failed(name, "content is not valid UTF-8"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use critic_metadata::SqliteStore;
    use critic_core::MAX_ARCHIVE_SIZE;
    use critic_metadata::repos::ProjectRepo;
    use std::io::Write;
    use zip::CompressionMethod;
    use zip::write::{FileOptions, ZipWriter};

    fn build_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        build_archive_with(CompressionMethod::Stored, entries)
    }

    fn build_archive_with(method: CompressionMethod, entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(method);
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    /// Flip one byte of a stored entry's data so its checksum no longer matches.
    fn corrupt(archive: &mut [u8], marker: &[u8]) {
        let at = archive
            .windows(marker.len())
            .position(|w| w == marker)
            .unwrap();
        archive[at] ^= 0xFF;
    }

    fn limits() -> IngestLimits {
        IngestLimits::from_config(&ServerConfig::default())
    }

    async fn store() -> (tempfile::TempDir, SqliteStore, i64) {
        let temp = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(temp.path().join("critic.db"), 5)
            .await
            .unwrap();
        let project = store
            .create_project("demo", 1, OffsetDateTime::now_utc())
            .await
            .unwrap();
        (temp, store, project.id)
    }

    #[test]
    fn test_normalize_entry_path() {
        assert_eq!(normalize_entry_path("src\\main.c"), "src/main.c");
        assert_eq!(normalize_entry_path("./a/b.py"), "a/b.py");
        assert_eq!(normalize_entry_path("././x.js"), "x.js");
        assert_eq!(normalize_entry_path("dir/./y.js"), "dir/./y.js");
        assert_eq!(normalize_entry_path("./"), "");
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_skipped_others_ingested() {
        let (_temp, store, project_id) = store().await;
        let mut archive = build_archive(&[
            ("src/", b""),
            ("src/a.py", b"print('a')\n"),
            ("./b.js", b"let b = 1;\n"),
            ("src\\c.json", b"{}"),
            ("broken.txt", b"CORRUPTED-PAYLOAD"),
        ]);
        corrupt(&mut archive, b"CORRUPTED-PAYLOAD");

        let report = ingest_archive(&store, project_id, Bytes::from(archive), limits())
            .await
            .unwrap();

        assert_eq!(report.ingested, vec!["src/a.py", "b.js", "src/c.json"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "broken.txt");
        assert_eq!(store.count_files_by_project(project_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_binary_entry_is_skipped() {
        let (_temp, store, project_id) = store().await;
        let archive = build_archive(&[("logo.png", &[0x89, 0x50, 0xFF, 0xFE]), ("a.py", b"x")]);

        let report = ingest_archive(&store, project_id, Bytes::from(archive), limits())
            .await
            .unwrap();

        assert_eq!(report.ingested, vec!["a.py"]);
        assert_eq!(report.skipped[0].reason, "content is not valid UTF-8");
    }

    #[tokio::test]
    async fn test_reupload_replaces_content() {
        let (_temp, store, project_id) = store().await;
        let first = build_archive(&[("a.py", b"old")]);
        let second = build_archive(&[("./a.py", b"new")]);

        ingest_archive(&store, project_id, Bytes::from(first), limits())
            .await
            .unwrap();
        ingest_archive(&store, project_id, Bytes::from(second), limits())
            .await
            .unwrap();

        let files = store.list_files_by_project(project_id).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, "new");
    }

    #[tokio::test]
    async fn test_empty_archive_succeeds() {
        let (_temp, store, project_id) = store().await;
        let archive = build_archive(&[]);
        let report = ingest_archive(&store, project_id, Bytes::from(archive), limits())
            .await
            .unwrap();
        assert!(report.ingested.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_oversize_rejected_before_decoding() {
        let (_temp, store, project_id) = store().await;
        let bytes = vec![0u8; MAX_ARCHIVE_SIZE + 1];
        let err = ingest_archive(&store, project_id, Bytes::from(bytes), limits())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_non_zip_bytes_are_bad_request() {
        let (_temp, store, project_id) = store().await;
        let bytes = Bytes::from_static(b"definitely not a zip");
        let err = ingest_archive(&store, project_id, bytes, limits())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_entry_expanding_past_cap_is_skipped() {
        let (_temp, store, project_id) = store().await;
        let bomb = vec![b'a'; 4 * 1024 * 1024];
        let archive = build_archive_with(
            CompressionMethod::Deflated,
            &[("bomb.txt", bomb.as_slice()), ("small.py", b"x = 1\n")],
        );
        assert!(archive.len() < 64 * 1024);

        let limits = IngestLimits {
            entry_bytes: 1024 * 1024,
            ..limits()
        };
        let report = ingest_archive(&store, project_id, Bytes::from(archive), limits)
            .await
            .unwrap();

        assert_eq!(report.ingested, vec!["small.py"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "bomb.txt");
        assert_eq!(report.skipped[0].reason, "entry too large");
        assert_eq!(store.count_files_by_project(project_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_combined_extraction_limit_skips_remaining_entries() {
        let (_temp, store, project_id) = store().await;
        let chunk = vec![b'b'; 40];
        let archive = build_archive_with(
            CompressionMethod::Deflated,
            &[("a.txt", chunk.as_slice()), ("b.txt", chunk.as_slice()), ("c.txt", b"c")],
        );

        let limits = IngestLimits {
            entry_bytes: 50,
            extracted_bytes: 60,
            ..limits()
        };
        let report = ingest_archive(&store, project_id, Bytes::from(archive), limits)
            .await
            .unwrap();

        assert_eq!(report.ingested, vec!["a.txt"]);
        let reasons: Vec<_> = report.skipped.iter().map(|s| s.reason.as_str()).collect();
        assert_eq!(
            reasons,
            vec![
                "archive extraction limit reached",
                "archive extraction limit reached"
            ]
        );
        assert_eq!(store.count_files_by_project(project_id).await.unwrap(), 1);
    }
}
