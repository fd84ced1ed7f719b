//! Local key-value storage for the auth session
//!
//! Only the serialized session is kept here, under [`SESSION_KEY`]. Storage
//! failures never reach the caller: reads come back empty and writes are
//! dropped, both with a warning.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::auth::Session;
use crate::error::{Error, Result};

/// Key the session is stored under
pub const SESSION_KEY: &str = "moneta.session";

/// String key-value storage
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str);
    async fn delete(&self, key: &str);
}

/// Token storage in a JSON file readable only by the owner
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::Config(format!("Invalid token path: {}", self.path.display())))?;
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(serde_json::to_string_pretty(map)?.as_bytes())?;
        restrict_permissions(file.path())?;
        file.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        debug!(path = %self.path.display(), keys = map.len(), "Wrote token store");
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut map = self.read_map().unwrap_or_default();
        apply(&mut map);
        self.write_map(&map)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Option<String> {
        match self.read_map() {
            Ok(mut map) => map.remove(key),
            Err(e) => {
                warn!(key, error = %e, "Failed to read token store");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        }) {
            warn!(key, error = %e, "Failed to write token store");
        }
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self.update(|map| {
            map.remove(key);
        }) {
            warn!(key, error = %e, "Failed to delete from token store");
        }
    }
}

/// Process-local token storage
#[derive(Default)]
pub struct MemoryTokenStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    async fn delete(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
    }
}

/// Persisted session, if one is stored and still parses
pub async fn load_session(store: &dyn TokenStore) -> Option<Session> {
    let raw = store.get(SESSION_KEY).await?;
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(error = %e, "Discarding unreadable stored session");
            None
        }
    }
}

pub async fn save_session(store: &dyn TokenStore, session: &Session) {
    match serde_json::to_string(session) {
        Ok(raw) => store.set(SESSION_KEY, &raw).await,
        Err(e) => warn!(error = %e, "Failed to serialize session"),
    }
}

pub async fn clear_session(store: &dyn TokenStore) {
    store.delete(SESSION_KEY).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;
    use tempfile::TempDir;

    fn session() -> Session {
        Session {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            expires_at: Some(1_700_000_000),
            user: AuthUser {
                id: "user-1".into(),
                email: Some("sam@example.com".into()),
            },
        }
    }

    #[tokio::test]
    async fn test_file_store_set_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.get("k").await, None);
        store.set("k", "v").await;
        store.set("other", "x").await;
        assert_eq!(store.get("k").await.as_deref(), Some("v"));

        store.delete("k").await;
        assert_eq!(store.get("k").await, None);
        assert_eq!(store.get("other").await.as_deref(), Some("x"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.set("k", "v").await;

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        let store = FileTokenStore::new(&path);

        assert_eq!(store.get(SESSION_KEY).await, None);
        // Writing replaces the unreadable file
        store.set("k", "v").await;
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(load_session(&store).await.is_none());

        save_session(&store, &session()).await;
        assert_eq!(load_session(&store).await, Some(session()));

        clear_session(&store).await;
        assert!(load_session(&store).await.is_none());
    }

    #[tokio::test]
    async fn test_unreadable_session_is_ignored() {
        let store = MemoryTokenStore::new();
        store.set(SESSION_KEY, "{\"access_token\": 5}").await;
        assert!(load_session(&store).await.is_none());
    }
}
