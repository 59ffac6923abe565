use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::default_data_dir;
use crate::error::GymError;
use crate::types::User;

const USER_FILE_NAME: &str = "user.json";

/// Durable storage for the signed-in user's profile.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn save(&self, user: &User) -> Result<(), GymError>;
    async fn load(&self) -> Result<Option<User>, GymError>;
    async fn clear(&self) -> Result<(), GymError>;
}

/// File-backed user store (`user.json` in the data directory).
#[derive(Debug, Clone)]
pub struct FileUserStore {
    path: PathBuf,
}

impl FileUserStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: base_dir.into().join(USER_FILE_NAME),
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
impl UserStore for FileUserStore {
    async fn save(&self, user: &User) -> Result<(), GymError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_vec_pretty(user)?;
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Option<User>, GymError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    async fn clear(&self) -> Result<(), GymError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    user: Mutex<Option<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<User> {
        self.user
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace(&self, value: Option<User>) {
        *self
            .user
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn save(&self, user: &User) -> Result<(), GymError> {
        self.replace(Some(user.clone()));
        Ok(())
    }

    async fn load(&self) -> Result<Option<User>, GymError> {
        Ok(self.snapshot())
    }

    async fn clear(&self) -> Result<(), GymError> {
        self.replace(None);
        Ok(())
    }
}
