//! Saved proposal persistence
//!
//! Proposals live in a directory of JSON records, one file per
//! proposal, plus an index file tracking which proposal the editor
//! currently has open. All IO goes through tokio.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// A persisted proposal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProposal {
    pub id: String,
    pub name: String,
    /// Document markup, exactly as serialized by the codec.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreIndex {
    current_id: Option<String>,
}

/// Directory-backed store of saved proposals
pub struct ProposalStore {
    root: PathBuf,
}

impl ProposalStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    async fn read_index(&self) -> Result<StoreIndex> {
        match tokio::fs::read(self.index_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(StoreIndex::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_index(&self, index: &StoreIndex) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(index)?;
        tokio::fs::write(self.index_path(), bytes).await?;
        Ok(())
    }

    async fn write_record(&self, proposal: &SavedProposal) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(proposal)?;
        tokio::fs::write(self.record_path(&proposal.id), bytes).await?;
        Ok(())
    }

    /// Id of the proposal the editor currently has open
    pub async fn current_id(&self) -> Result<Option<String>> {
        Ok(self.read_index().await?.current_id)
    }

    /// Detach from the current proposal so the next save creates a new one
    pub async fn start_new(&self) -> Result<()> {
        self.write_index(&StoreIndex { current_id: None }).await
    }

    /// Save the current document markup
    ///
    /// Updates the current proposal in place, or creates a new record
    /// when none is open. Blank documents are not persisted and yield
    /// `Ok(None)`.
    pub async fn save_current(&self, name: &str, content: &str) -> Result<Option<SavedProposal>> {
        if is_blank_markup(content) {
            tracing::debug!("skipping save of blank document");
            return Ok(None);
        }
        let mut index = self.read_index().await?;
        let now = Utc::now();

        if let Some(id) = &index.current_id {
            match self.load(id).await {
                Ok(mut existing) => {
                    existing.name = name.to_string();
                    existing.content = content.to_string();
                    existing.updated_at = now;
                    self.write_record(&existing).await?;
                    tracing::info!(id = %existing.id, "updated proposal");
                    return Ok(Some(existing));
                }
                Err(StoreError::ProposalNotFound(_)) => {
                    // Stale index entry; fall through and create a record.
                }
                Err(err) => return Err(err),
            }
        }

        let proposal = SavedProposal {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.write_record(&proposal).await?;
        index.current_id = Some(proposal.id.clone());
        self.write_index(&index).await?;
        tracing::info!(id = %proposal.id, name, "created proposal");
        Ok(Some(proposal))
    }

    /// Read a proposal record by id without touching the index
    pub async fn load(&self, id: &str) -> Result<SavedProposal> {
        match tokio::fs::read(self.record_path(id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StoreError::ProposalNotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Load a proposal and record it as the open one
    pub async fn open_proposal(&self, id: &str) -> Result<SavedProposal> {
        let proposal = self.load(id).await?;
        self.write_index(&StoreIndex {
            current_id: Some(proposal.id.clone()),
        })
        .await?;
        Ok(proposal)
    }

    /// Delete a proposal record
    pub async fn delete(&self, id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.record_path(id)).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::ProposalNotFound(id.to_string()));
            }
            Err(err) => return Err(err.into()),
        }
        let mut index = self.read_index().await?;
        if index.current_id.as_deref() == Some(id) {
            index.current_id = None;
            self.write_index(&index).await?;
        }
        tracing::info!(id, "deleted proposal");
        Ok(())
    }

    /// All saved proposals, most recently updated first
    pub async fn list(&self) -> Result<Vec<SavedProposal>> {
        let mut proposals = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if path.file_name().and_then(|n| n.to_str()) == Some("index.json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<SavedProposal>(&bytes) {
                Ok(proposal) => proposals.push(proposal),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unreadable record");
                }
            }
        }
        proposals.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(proposals)
    }
}

/// Whether markup represents a document with no content worth saving
fn is_blank_markup(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty() || trimmed == "<p></p>"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::open(dir.path()).await.unwrap();

        let saved = store
            .save_current("Acme SEO", "<p>scope</p>")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.created_at, saved.updated_at);

        let loaded = store.load(&saved.id).await.unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn test_blank_document_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::open(dir.path()).await.unwrap();

        assert!(store.save_current("x", "").await.unwrap().is_none());
        assert!(store.save_current("x", "<p></p>").await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_current_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::open(dir.path()).await.unwrap();

        let first = store
            .save_current("Draft", "<p>v1</p>")
            .await
            .unwrap()
            .unwrap();
        let second = store
            .save_current("Draft", "<p>v2</p>")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.content, "<p>v2</p>");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_start_new_creates_separate_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::open(dir.path()).await.unwrap();

        let first = store
            .save_current("One", "<p>a</p>")
            .await
            .unwrap()
            .unwrap();
        store.start_new().await.unwrap();
        let second = store
            .save_current("Two", "<p>b</p>")
            .await
            .unwrap()
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.list().await.unwrap().len(), 2);
        assert_eq!(store.current_id().await.unwrap(), Some(second.id));
    }

    #[tokio::test]
    async fn test_load_leaves_index_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::open(dir.path()).await.unwrap();

        let first = store
            .save_current("One", "<p>a</p>")
            .await
            .unwrap()
            .unwrap();
        store.start_new().await.unwrap();
        let second = store
            .save_current("Two", "<p>b</p>")
            .await
            .unwrap()
            .unwrap();

        store.load(&first.id).await.unwrap();
        assert_eq!(store.current_id().await.unwrap(), Some(second.id.clone()));

        store.open_proposal(&first.id).await.unwrap();
        assert_eq!(store.current_id().await.unwrap(), Some(first.id));
    }

    #[tokio::test]
    async fn test_delete_clears_current() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::open(dir.path()).await.unwrap();

        let saved = store
            .save_current("Doomed", "<p>x</p>")
            .await
            .unwrap()
            .unwrap();
        store.delete(&saved.id).await.unwrap();

        assert_eq!(store.current_id().await.unwrap(), None);
        assert!(matches!(
            store.load(&saved.id).await,
            Err(StoreError::ProposalNotFound(_))
        ));
        assert!(matches!(
            store.delete(&saved.id).await,
            Err(StoreError::ProposalNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_by_updated_at_desc() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::open(dir.path()).await.unwrap();

        let older = store
            .save_current("Older", "<p>a</p>")
            .await
            .unwrap()
            .unwrap();
        store.start_new().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = store
            .save_current("Newer", "<p>b</p>")
            .await
            .unwrap()
            .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[tokio::test]
    async fn test_record_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProposalStore::open(dir.path()).await.unwrap();
        let saved = store
            .save_current("Shape", "<p>x</p>")
            .await
            .unwrap()
            .unwrap();

        let raw = tokio::fs::read_to_string(store.record_path(&saved.id))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert_eq!(value["name"], "Shape");
    }
}
