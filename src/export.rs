use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::export::{MANIFEST_VERSION, SPLIT_FILE_EXTENSION};
use crate::data::BenchmarkRecord;
use crate::errors::GeneratorError;
use crate::types::SplitName;

/// Destination for finished record splits, one call per configuration key.
pub trait RecordSink {
    /// Persist or publish `records` under `split`. A split name is exported
    /// at most once per run; a repeat is an error, not an overwrite.
    fn export(&mut self, split: &str, records: &[BenchmarkRecord]) -> Result<(), GeneratorError>;
}

/// Sidecar metadata written next to each exported split file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitManifest {
    pub version: u32,
    pub split: SplitName,
    pub num_records: usize,
    pub private: bool,
    pub created_at: DateTime<Utc>,
}

/// Writes each split as a JSONL file plus a manifest sidecar under one
/// directory. Refuses to overwrite an existing split file.
#[derive(Clone, Debug)]
pub struct JsonlExporter {
    root: PathBuf,
    private: bool,
}

impl JsonlExporter {
    /// Exporter rooted at `root`; the directory is created on first export.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            private: false,
        }
    }

    /// Mark exported splits as private in their manifests.
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    /// Path the split file will be written to.
    pub fn split_path(&self, split: &str) -> PathBuf {
        self.root.join(format!("{split}.{SPLIT_FILE_EXTENSION}"))
    }

    fn manifest_path(&self, split: &str) -> PathBuf {
        self.root.join(format!("{split}.manifest.json"))
    }

    fn write_atomic(&self, path: &Path, payload: &[u8]) -> Result<(), GeneratorError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl RecordSink for JsonlExporter {
    fn export(&mut self, split: &str, records: &[BenchmarkRecord]) -> Result<(), GeneratorError> {
        let path = self.split_path(split);
        if path.exists() {
            return Err(GeneratorError::Export {
                split: split.to_string(),
                reason: format!("{} already exists", path.display()),
            });
        }
        fs::create_dir_all(&self.root)?;

        let mut body = String::new();
        for record in records {
            let line = serde_json::to_string(record).map_err(io::Error::other)?;
            body.push_str(&line);
            body.push('\n');
        }
        self.write_atomic(&path, body.as_bytes())?;

        let manifest = SplitManifest {
            version: MANIFEST_VERSION,
            split: split.to_string(),
            num_records: records.len(),
            private: self.private,
            created_at: Utc::now(),
        };
        let raw = serde_json::to_vec_pretty(&manifest).map_err(io::Error::other)?;
        self.write_atomic(&self.manifest_path(split), &raw)?;

        info!(
            "[haystacks:export] wrote {} records to {}",
            records.len(),
            path.display()
        );
        Ok(())
    }
}

/// In-process sink that keeps splits in export order, mostly for tests and
/// library embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryExporter {
    splits: IndexMap<SplitName, Vec<BenchmarkRecord>>,
}

impl MemoryExporter {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records exported under `name`, if any.
    pub fn split(&self, name: &str) -> Option<&[BenchmarkRecord]> {
        self.splits.get(name).map(Vec::as_slice)
    }

    /// Split names in export order.
    pub fn split_names(&self) -> Vec<&str> {
        self.splits.keys().map(String::as_str).collect()
    }

    /// Number of exported splits.
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    /// Whether nothing has been exported yet.
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }
}

impl RecordSink for MemoryExporter {
    fn export(&mut self, split: &str, records: &[BenchmarkRecord]) -> Result<(), GeneratorError> {
        if self.splits.contains_key(split) {
            return Err(GeneratorError::Export {
                split: split.to_string(),
                reason: "split already exported".to_string(),
            });
        }
        self.splits.insert(split.to_string(), records.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tag: usize) -> BenchmarkRecord {
        BenchmarkRecord {
            context: format!("context-{tag}"),
            demonstrations: Vec::new(),
            question: format!("q-{tag}"),
            answer: format!("a-{tag}"),
            first_depth: 50.0,
            depth: 50.0,
            num_pairs: 2,
        }
    }

    #[test]
    fn memory_keeps_splits_in_export_order() {
        let mut sink = MemoryExporter::new();
        sink.export("ctx_8192_num_q_1", &[record(0)]).unwrap();
        sink.export("ctx_4096_num_q_1", &[record(1), record(2)]).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.split_names(),
            vec!["ctx_8192_num_q_1", "ctx_4096_num_q_1"]
        );
        assert_eq!(sink.split("ctx_4096_num_q_1").unwrap().len(), 2);
        assert!(sink.split("ctx_64_num_q_1").is_none());
    }

    #[test]
    fn memory_rejects_a_repeated_split() {
        let mut sink = MemoryExporter::new();
        sink.export("ctx_4096_num_q_1", &[record(0)]).unwrap();
        let err = sink.export("ctx_4096_num_q_1", &[record(1)]).unwrap_err();
        match err {
            GeneratorError::Export { split, .. } => assert_eq!(split, "ctx_4096_num_q_1"),
            other => panic!("unexpected error: {other}"),
        }
        // The first export is untouched.
        assert_eq!(sink.split("ctx_4096_num_q_1").unwrap()[0], record(0));
    }

    #[test]
    fn jsonl_writes_one_line_per_record_plus_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonlExporter::new(dir.path());
        sink.export("ctx_4096_num_q_2", &[record(0), record(1)]).unwrap();

        let body = std::fs::read_to_string(sink.split_path("ctx_4096_num_q_2")).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: BenchmarkRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, record(0));

        let manifest: SplitManifest = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("ctx_4096_num_q_2.manifest.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest.version, MANIFEST_VERSION);
        assert_eq!(manifest.split, "ctx_4096_num_q_2");
        assert_eq!(manifest.num_records, 2);
        assert!(!manifest.private);
    }

    #[test]
    fn jsonl_refuses_an_existing_split_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonlExporter::new(dir.path());
        sink.export("ctx_4096_num_q_1", &[record(0)]).unwrap();
        let err = sink.export("ctx_4096_num_q_1", &[record(1)]).unwrap_err();
        assert!(matches!(err, GeneratorError::Export { .. }));

        // Untouched runs with a different split name still land.
        sink.export("ctx_8192_num_q_1", &[record(2)]).unwrap();
    }

    #[test]
    fn private_flag_lands_in_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonlExporter::new(dir.path()).with_private(true);
        sink.export("ctx_64_num_q_1", &[record(0)]).unwrap();
        let manifest: SplitManifest = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("ctx_64_num_q_1.manifest.json")).unwrap(),
        )
        .unwrap();
        assert!(manifest.private);
    }
}
