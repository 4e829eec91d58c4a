//! Persistence layer for organisation charts
//!
//! - `document`: the JSON organisation document with atomic replace-on-save
//!   and detection of concurrent writers
//! - `OrgManager`: owns the loaded store and its document, applying every
//!   chart mutation and persisting it before returning

pub mod document;

pub use document::{load_store, save_store, OrgDocument};

use crate::config::DirectoryConfig;
use crate::org::{self, DeleteMode, OrgChart, OrgResult, OrgStore};
use std::path::{Path, PathBuf};
use tracing::info;

/// Loaded organisation charts together with their backing document
#[derive(Debug)]
pub struct OrgManager {
    document: OrgDocument,
    store: OrgStore,
}

impl OrgManager {
    /// Load the document at `path`, with conflict checking enabled
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        Self::with_document(OrgDocument::new(path))
    }

    pub fn from_config(config: &DirectoryConfig) -> PersistenceResult<Self> {
        Self::with_document(
            OrgDocument::new(&config.org_document_path)
                .with_conflict_check(config.check_conflicts),
        )
    }

    fn with_document(mut document: OrgDocument) -> PersistenceResult<Self> {
        let store = document.load()?;
        info!("Organisation manager ready ({} practices)", store.len());
        Ok(Self { document, store })
    }

    pub fn store(&self) -> &OrgStore {
        &self.store
    }

    pub fn document(&self) -> &OrgDocument {
        &self.document
    }

    pub fn get_chart(&self, practice: &str) -> Option<&OrgChart> {
        self.store.get_chart(practice)
    }

    pub fn add_role(
        &mut self,
        practice: &str,
        role: &str,
        holder_name: &str,
        reports: Vec<String>,
    ) -> OrgResult<()> {
        org::add_role(&mut self.store, &mut self.document, practice, role, holder_name, reports)
    }

    pub fn edit_role(
        &mut self,
        practice: &str,
        role: &str,
        new_holder_name: &str,
        new_reports: Vec<String>,
    ) -> OrgResult<()> {
        org::edit_role(
            &mut self.store,
            &mut self.document,
            practice,
            role,
            new_holder_name,
            new_reports,
        )
    }

    pub fn delete_role(&mut self, practice: &str, role: &str, mode: DeleteMode) -> OrgResult<()> {
        org::delete_role(&mut self.store, &mut self.document, practice, role, mode)
    }

    /// Discard the in-memory store and read the document again
    pub fn reload(&mut self) -> PersistenceResult<()> {
        self.store = self.document.load()?;
        Ok(())
    }
}

/// Why a document could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum LoadFailure {
    #[error("unreadable: {0}")]
    Read(#[from] std::io::Error),

    #[error("corrupt: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Persistence errors
///
/// Anything that stops the document from being read at load time, whether
/// an I/O failure or invalid content, is reported as `Load`. `Io` covers
/// failures while saving.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Failed to load organisation document {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        source: LoadFailure,
    },

    #[error("Organisation document {} was modified by another writer", .path.display())]
    Conflict { path: PathBuf },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::OrgError;
    use tempfile::TempDir;

    #[test]
    fn test_manager_persists_every_mutation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");

        let mut manager = OrgManager::open(&path).unwrap();
        manager
            .add_role("P", "Owner", "Ana", vec!["Manager".into()])
            .unwrap();
        assert_eq!(load_store(&path).unwrap(), *manager.store());

        manager.add_role("P", "Manager", "Bo", vec![]).unwrap();
        manager.edit_role("P", "Manager", "Cy", vec![]).unwrap();
        assert_eq!(load_store(&path).unwrap().get_role("P", "Manager").unwrap().name, "Cy");

        manager.delete_role("P", "Manager", DeleteMode::Preserve).unwrap();
        let reloaded = load_store(&path).unwrap();
        assert!(reloaded.get_role("P", "Manager").is_err());
        assert_eq!(reloaded.get_role("P", "Owner").unwrap().reports, vec!["Manager"]);
    }

    #[test]
    fn test_manager_conflict_leaves_store_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("org.json");

        let mut first = OrgManager::open(&path).unwrap();
        let mut second = OrgManager::open(&path).unwrap();
        second.add_role("P", "Owner", "Ana", vec![]).unwrap();

        let err = first.add_role("P", "Owner", "Bo", vec![]).unwrap_err();
        assert!(matches!(err, OrgError::Persistence(PersistenceError::Conflict { .. })));
        assert!(first.get_chart("P").is_none());

        first.reload().unwrap();
        first.add_role("P", "Owner", "Bo", vec![]).unwrap();
        assert_eq!(load_store(&path).unwrap().get_role("P", "Owner").unwrap().name, "Bo");
    }

    #[test]
    fn test_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = DirectoryConfig {
            org_document_path: temp_dir.path().join("org.json"),
            check_conflicts: false,
            ..DirectoryConfig::default()
        };

        let manager = OrgManager::from_config(&config).unwrap();
        assert!(manager.store().is_empty());
        assert_eq!(manager.document().path(), config.org_document_path.as_path());
    }
}
