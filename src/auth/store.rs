use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::TokenPair;
use crate::config::default_data_dir;
use crate::error::GymError;

const TOKEN_FILE_NAME: &str = "tokens.toml";
const TOKEN_FILE_VERSION: u32 = 1;

/// Durable storage for the signed-in user's token pair.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save(&self, pair: &TokenPair) -> Result<(), GymError>;
    async fn load(&self) -> Result<Option<TokenPair>, GymError>;
    async fn clear(&self) -> Result<(), GymError>;
}

/// File-backed token store using a TOML file.
///
/// # Example
/// ```no_run
/// use ignite_gym::auth::{FileTokenStore, TokenPair, TokenStore};
///
/// # async fn example() -> ignite_gym::error::Result<()> {
/// let store = FileTokenStore::new("/tmp/ignite-gym");
/// store.save(&TokenPair::new("access", "refresh")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: base_dir.into().join(TOKEN_FILE_NAME),
        }
    }

    pub fn new_default() -> Self {
        Self::new(default_data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, pair: &TokenPair) -> Result<(), GymError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = TokenFile {
            version: TOKEN_FILE_VERSION,
            tokens: pair.clone(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        tokio::fs::write(&self.path, serialized).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenPair>, GymError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let file: TokenFile = toml::from_str(&raw)?;
        if file.version != TOKEN_FILE_VERSION {
            return Err(GymError::Configuration(format!(
                "Unsupported token file version {} at {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(Some(file.tokens))
    }

    async fn clear(&self) -> Result<(), GymError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    version: u32,
    tokens: TokenPair,
    saved_at: DateTime<Utc>,
}

/// In-process token store; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    pair: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            pair: Mutex::new(Some(pair)),
        }
    }

    /// Current contents without going through the async trait.
    pub fn snapshot(&self) -> Option<TokenPair> {
        self.pair
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace(&self, value: Option<TokenPair>) {
        *self
            .pair
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, pair: &TokenPair) -> Result<(), GymError> {
        self.replace(Some(pair.clone()));
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenPair>, GymError> {
        Ok(self.snapshot())
    }

    async fn clear(&self) -> Result<(), GymError> {
        self.replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileTokenStore) {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn token_pair_survives_a_new_store_instance() {
        let (dir, store) = temp_store();
        store.save(&TokenPair::new("access", "refresh")).await.unwrap();

        let reopened = FileTokenStore::new(dir.path());
        let loaded = reopened.load().await.unwrap().unwrap();
        assert_eq!(loaded, TokenPair::new("access", "refresh"));
    }

    #[tokio::test]
    async fn load_missing_file_returns_none() {
        let (_dir, store) = temp_store();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_tokens_and_tolerates_missing_file() {
        let (_dir, store) = temp_store();
        store.save(&TokenPair::new("a", "r")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_file_version_is_rejected() {
        let (_dir, store) = temp_store();
        std::fs::write(
            store.path(),
            "version = 9\nsaved_at = \"2024-01-01T00:00:00Z\"\n\n[tokens]\naccess_token = \"a\"\nrefresh_token = \"r\"\n",
        )
        .unwrap();
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, GymError::Configuration(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store();
        store.save(&TokenPair::new("a", "r")).await.unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn memory_store_replaces_and_clears() {
        let store = MemoryTokenStore::with_pair(TokenPair::new("t1", "r1"));
        store.save(&TokenPair::new("t2", "r2")).await.unwrap();
        assert_eq!(store.snapshot(), Some(TokenPair::new("t2", "r2")));
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
