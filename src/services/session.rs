use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Process-wide login state.
///
/// Created on login, cleared on logout, read by every outgoing request.
/// When backed by a file the token survives between invocations.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Restore the session persisted at `path`, if any.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Session>(&bytes) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read session file {}: {}", path.display(), e);
                None
            }
        };

        Self {
            inner: Arc::new(RwLock::new(session)),
            path: Some(path),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_some()
    }

    pub async fn set_token(&self, token: String) -> AppResult<()> {
        if token.trim().is_empty() {
            return Err(AppError::Session("server returned an empty token".to_string()));
        }

        let session = Session {
            token,
            created_at: Utc::now(),
        };

        if let Some(path) = &self.path {
            persist(path, &session).await?;
        }

        *self.inner.write().await = Some(session);
        tracing::debug!("Session stored");
        Ok(())
    }

    pub async fn clear(&self) -> AppResult<()> {
        *self.inner.write().await = None;

        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(AppError::Io(e)),
            }
        }

        tracing::debug!("Session cleared");
        Ok(())
    }
}

async fn persist(path: &Path, session: &Session) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let body = serde_json::to_vec_pretty(session)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}
