// Persistent session storage for the client

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::error::ClientError;
use crate::users::UserResponse;

/// Tokens and the last known profile, as kept between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserResponse>,
}

impl StoredSession {
    pub fn is_usable(&self) -> bool {
        !self.access_token.trim().is_empty()
    }
}

/// Where the session manager keeps its tokens
///
/// `load` fails with [`ClientError::CorruptSession`] when stored data cannot
/// be read back; the manager clears the store in that case.
pub trait SessionStore: Send {
    fn load(&self) -> Result<Option<StoredSession>, ClientError>;
    fn save(&mut self, session: &StoredSession) -> Result<(), ClientError>;
    fn clear(&mut self) -> Result<(), ClientError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    session: Option<StoredSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Some(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        Ok(self.session.clone())
    }

    fn save(&mut self, session: &StoredSession) -> Result<(), ClientError> {
        self.session = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        self.session = None;
        Ok(())
    }
}

/// JSON file store, by default `{data_dir}/user-auth-api/session.json`
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self, ClientError> {
        let mut dir = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut h| {
                    h.push(".local");
                    h.push("share");
                    h
                })
            })
            .ok_or_else(|| {
                ClientError::Storage(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no data directory available",
                ))
            })?;
        dir.push("user-auth-api");
        dir.push("session.json");
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&mut self, session: &StoredSession) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
