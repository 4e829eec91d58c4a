//! JSON organisation document
//!
//! The document is the only durable copy of the organisation charts. It is
//! read wholesale at startup and rewritten wholesale after every change.
//! Writes go to a temporary file in the same directory which is then
//! renamed over the target, so a crash mid-write leaves the previous
//! document intact.
//!
//! Before each save the on-disk bytes are hashed and compared with the
//! bytes this handle last read or wrote. A mismatch means another writer
//! changed the file and the save fails with `PersistenceError::Conflict`.

use super::{LoadFailure, PersistenceError, PersistenceResult};
use crate::org::{ChartSink, OrgStore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

type Fingerprint = [u8; 32];

/// What this handle last observed on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Baseline {
    /// Never loaded or saved; no conflict check possible
    Unknown,
    Absent,
    Present(Fingerprint),
}

/// Handle on the organisation document file
#[derive(Debug)]
pub struct OrgDocument {
    path: PathBuf,
    baseline: Baseline,
    check_conflicts: bool,
}

impl OrgDocument {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            baseline: Baseline::Unknown,
            check_conflicts: true,
        }
    }

    /// Enable or disable the concurrent-writer check
    pub fn with_conflict_check(mut self, enabled: bool) -> Self {
        self.check_conflicts = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. A missing file is an empty store.
    pub fn load(&mut self) -> PersistenceResult<OrgStore> {
        let read = read_if_exists(&self.path).map_err(|e| self.load_error(e.into()))?;
        let Some(bytes) = read else {
            info!("No organisation document at {:?}, starting empty", self.path);
            self.baseline = Baseline::Absent;
            return Ok(OrgStore::new());
        };

        let store: OrgStore =
            serde_json::from_slice(&bytes).map_err(|e| self.load_error(e.into()))?;

        self.baseline = Baseline::Present(fingerprint(&bytes));
        info!(
            "Loaded {} organisation charts from {:?}",
            store.len(),
            self.path
        );
        Ok(store)
    }

    /// Rewrite the whole document from `store`
    pub fn save(&mut self, store: &OrgStore) -> PersistenceResult<()> {
        if self.check_conflicts {
            self.check_unchanged()?;
        }

        let bytes = to_document_bytes(store)?;
        atomic_write(&self.path, &bytes)?;
        self.baseline = Baseline::Present(fingerprint(&bytes));

        debug!("Saved {} organisation charts to {:?}", store.len(), self.path);
        Ok(())
    }

    fn load_error(&self, source: LoadFailure) -> PersistenceError {
        PersistenceError::Load {
            path: self.path.clone(),
            source,
        }
    }

    fn check_unchanged(&self) -> PersistenceResult<()> {
        let current = match read_if_exists(&self.path)? {
            Some(bytes) => Baseline::Present(fingerprint(&bytes)),
            None => Baseline::Absent,
        };

        match self.baseline {
            Baseline::Unknown => Ok(()),
            expected if expected == current => Ok(()),
            _ => {
                warn!("Organisation document {:?} changed on disk", self.path);
                Err(PersistenceError::Conflict {
                    path: self.path.clone(),
                })
            }
        }
    }
}

impl ChartSink for OrgDocument {
    fn persist(&mut self, store: &OrgStore) -> PersistenceResult<()> {
        self.save(store)
    }
}

/// Load a store from `path` without keeping a document handle
pub fn load_store(path: impl AsRef<Path>) -> PersistenceResult<OrgStore> {
    OrgDocument::new(path).load()
}

/// Save a store to `path` unconditionally
pub fn save_store(path: impl AsRef<Path>, store: &OrgStore) -> PersistenceResult<()> {
    OrgDocument::new(path).with_conflict_check(false).save(store)
}

/// Pretty-printed JSON with four-space indentation
fn to_document_bytes(store: &OrgStore) -> PersistenceResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    store.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

fn fingerprint(bytes: &[u8]) -> Fingerprint {
    Sha256::digest(bytes).into()
}

fn read_if_exists(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {:?}", path),
        )
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    // Unique name per save; the file is removed on drop unless persisted
    let mut prefix = std::ffi::OsString::from(".");
    prefix.push(file_name);
    prefix.push(".");
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::RoleInfo;
    use tempfile::TempDir;

    fn sample_store() -> OrgStore {
        let mut store = OrgStore::new();
        let chart = store.chart_or_default("Smile Dental");
        chart.upsert("Owner", RoleInfo::new("Ana", vec!["Manager".into()]));
        chart.upsert("Manager", RoleInfo::new("Bo", vec![]));
        store.chart_or_default("Empty Practice");
        store
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut doc = OrgDocument::new(temp_dir.path().join("org.json"));
        let store = doc.load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");
        fs::write(&path, "{ not json").unwrap();

        let err = OrgDocument::new(&path).load().unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Load { source: LoadFailure::Parse(_), .. }
        ));

        fs::write(&path, r#"{"P": {"Owner": {"reports": []}}}"#).unwrap();
        let err = OrgDocument::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistenceError::Load { .. }));
    }

    #[test]
    fn test_unreadable_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");
        fs::create_dir(&path).unwrap();

        let err = OrgDocument::new(&path).load().unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Load { source: LoadFailure::Read(_), ref path }
                if path.ends_with("org.json")
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");
        let store = sample_store();

        save_store(&path, &store).unwrap();
        let loaded = load_store(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(
            loaded.practices().collect::<Vec<_>>(),
            vec!["Smile Dental", "Empty Practice"]
        );
    }

    #[test]
    fn test_document_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");
        save_store(&path, &sample_store()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"Smile Dental\": {\n        \"Owner\": {"));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["Smile Dental"]["Owner"]["name"], "Ana");
        assert_eq!(value["Smile Dental"]["Owner"]["reports"][0], "Manager");
        assert_eq!(value["Empty Practice"], serde_json::json!({}));
    }

    #[test]
    fn test_existing_document_roundtrips_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");
        let original = r#"{
    "P": {
        "Owner": {
            "name": "Ana",
            "reports": [
                "Manager"
            ]
        }
    }
}
"#;
        fs::write(&path, original).unwrap();

        let mut doc = OrgDocument::new(&path);
        let store = doc.load().unwrap();
        doc.save(&store).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");
        save_store(&path, &sample_store()).unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("org.json")]);
    }

    #[test]
    fn test_racing_writers_never_publish_partial_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut store = OrgStore::new();
                    for j in 0..50 {
                        store
                            .chart_or_default(&format!("Practice {}", i))
                            .upsert(format!("Role {}", j), RoleInfo::new("Ana", vec![]));
                    }
                    for _ in 0..10 {
                        save_store(&path, &store).unwrap();
                    }
                    store
                })
            })
            .collect();
        let written: Vec<OrgStore> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let loaded = load_store(&path).unwrap();
        assert!(written.contains(&loaded));

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("org.json")]);
    }

    #[test]
    fn test_conflict_detected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");
        save_store(&path, &sample_store()).unwrap();

        let mut first = OrgDocument::new(&path);
        let mut store = first.load().unwrap();
        let mut second = OrgDocument::new(&path);
        let other = second.load().unwrap();

        second.save(&OrgStore::new()).unwrap();

        store.chart_or_default("New");
        let err = first.save(&store).unwrap_err();
        assert!(matches!(err, PersistenceError::Conflict { .. }));

        // The other writer's content is untouched
        assert!(load_store(&path).unwrap().is_empty());
        assert_ne!(other, OrgStore::new());
    }

    #[test]
    fn test_conflict_when_file_appears() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");

        let mut doc = OrgDocument::new(&path);
        doc.load().unwrap();
        save_store(&path, &sample_store()).unwrap();

        let err = doc.save(&OrgStore::new()).unwrap_err();
        assert!(matches!(err, PersistenceError::Conflict { .. }));
    }

    #[test]
    fn test_conflict_check_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");

        let mut doc = OrgDocument::new(&path).with_conflict_check(false);
        doc.load().unwrap();
        save_store(&path, &sample_store()).unwrap();

        doc.save(&OrgStore::new()).unwrap();
        assert!(load_store(&path).unwrap().is_empty());
    }

    #[test]
    fn test_consecutive_saves_from_same_handle() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("org.json");

        let mut doc = OrgDocument::new(&path);
        let mut store = doc.load().unwrap();
        doc.save(&store).unwrap();
        store.chart_or_default("A");
        doc.save(&store).unwrap();
        assert_eq!(load_store(&path).unwrap(), store);
    }
}
