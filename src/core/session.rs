// src/core/session.rs
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::SessionConfig;
use crate::error::{DocweaverError, Result};

/// One documentation conversation: a user working on one repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    pub user_id: String,
    pub repo_name: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            repo_name: repo_name.into(),
        }
    }

    /// Stable, filesystem-safe identifier for this key
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.user_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.repo_name.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        hash[..32].to_string()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.repo_name)
    }
}

/// The latest document produced for a session; replaced whole on every write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    pub key: SessionKey,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

impl SessionDocument {
    pub fn new(key: SessionKey, text: String) -> Self {
        Self {
            key,
            text,
            updated_at: Utc::now(),
        }
    }
}

/// Last-write-wins storage of session documents. Read-modify-write cycles
/// across calls are not atomic; callers for one key are expected to be serial.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionDocument>>;

    fn put(&self, document: SessionDocument) -> Result<()>;

    fn remove(&self, key: &SessionKey) -> Result<bool>;
}

/// Build the store selected by config
pub fn create_session_store(config: &SessionConfig) -> Result<Box<dyn SessionStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Box::new(InMemorySessionStore::new())),
        "file" => Ok(Box::new(FileSessionStore::new(&config.state_dir)?)),
        other => Err(DocweaverError::Config(format!("Unsupported session backend: {}", other))),
    }
}

/// Process-lifetime store
#[derive(Default)]
pub struct InMemorySessionStore {
    documents: RwLock<HashMap<SessionKey, SessionDocument>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionDocument>> {
        let documents = self.documents.read()
            .map_err(|_| DocweaverError::Session("session map lock poisoned".to_string()))?;
        Ok(documents.get(key).cloned())
    }

    fn put(&self, document: SessionDocument) -> Result<()> {
        let mut documents = self.documents.write()
            .map_err(|_| DocweaverError::Session("session map lock poisoned".to_string()))?;
        documents.insert(document.key.clone(), document);
        Ok(())
    }

    fn remove(&self, key: &SessionKey) -> Result<bool> {
        let mut documents = self.documents.write()
            .map_err(|_| DocweaverError::Session("session map lock poisoned".to_string()))?;
        Ok(documents.remove(key).is_some())
    }
}

/// One JSON file per session under a state directory, durable across runs
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.is_file() {
            return Err(DocweaverError::Session(format!(
                "Session state path is a file: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    fn document_path(&self, key: &SessionKey) -> PathBuf {
        self.root.join(format!("{}.json", key.digest()))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionDocument>> {
        let path = self.document_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let document: SessionDocument = serde_json::from_str(&content)
            .map_err(|e| DocweaverError::Session(format!("Corrupt session file {}: {}", path.display(), e)))?;

        // Digest collisions are not expected, but never hand back another session's document
        if document.key != *key {
            return Ok(None);
        }
        Ok(Some(document))
    }

    fn put(&self, document: SessionDocument) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.document_path(&document.key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&document)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &SessionKey) -> Result<bool> {
        let path = self.document_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
