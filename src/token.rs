// Token persistence.
//
// The personal access token lives in a small JSON record on disk. Storage
// sits behind the `TokenStore` trait so the menu and tests can swap in an
// in-memory store.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("Failed to read token file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write token file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to delete token file {path}: {source}")]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Token file {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result of removing the token record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDeletion {
    Deleted,
    NotFound,
}

/// Persisted shape: `{"token": "..."}`.
#[derive(Serialize, Deserialize, Debug)]
struct TokenRecord {
    token: String,
}

pub trait TokenStore {
    /// Returns the stored token, or `None` when no record exists.
    fn read(&self) -> Result<Option<String>, TokenStoreError>;

    /// Overwrite the record with `token`.
    fn save(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Remove the record. A missing record is reported, not an error.
    fn delete(&self) -> Result<TokenDeletion, TokenStoreError>;
}

/// Return the stored token, or ask `prompt` for one and persist it.
pub fn load_token<S, P>(store: &S, prompt: P) -> Result<String>
where
    S: TokenStore + ?Sized,
    P: FnOnce() -> Result<String>,
{
    if let Some(token) = store.read()? {
        return Ok(token);
    }
    let token = prompt()?;
    store.save(&token)?;
    tracing::debug!("stored new token");
    Ok(token)
}

/// JSON token record on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Result<Option<String>, TokenStoreError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TokenStoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let record: TokenRecord =
            serde_json::from_str(&data).map_err(|source| TokenStoreError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(record.token))
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let record = TokenRecord {
            token: token.to_string(),
        };
        let json = serde_json::to_string(&record).map_err(|source| TokenStoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|source| TokenStoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn delete(&self) -> Result<TokenDeletion, TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(TokenDeletion::Deleted),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(TokenDeletion::NotFound),
            Err(source) => Err(TokenStoreError::Delete {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Token store kept in memory; nothing touches the filesystem.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RefCell<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        MemoryTokenStore {
            token: RefCell::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.token.borrow().clone())
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.token.borrow_mut() = Some(token.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<TokenDeletion, TokenStoreError> {
        match self.token.borrow_mut().take() {
            Some(_) => Ok(TokenDeletion::Deleted),
            None => Ok(TokenDeletion::NotFound),
        }
    }
}
