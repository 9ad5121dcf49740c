//! Durable storage for issued tokens
//!
//! Uses JSON file storage in ~/.config/latchkey/tokens.json. Tokens are
//! never deleted after use; they are retained for audit.

use crate::token::{AccessToken, TokenId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Token not found: {0}")]
    NotFound(String),
    #[error("Token id already present: {0}")]
    DuplicateId(String),
    #[error("Configuration directory not found")]
    NoConfigDir,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Stored data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredData {
    /// Issued tokens indexed by id
    tokens: HashMap<String, AccessToken>,
}

/// Token store with file persistence
pub struct TokenStore {
    /// Path to the storage file
    path: PathBuf,
    /// In-memory copy of the stored tokens
    data: Arc<RwLock<StoredData>>,
}

impl TokenStore {
    /// Create a new token store at the default path
    ///
    /// Loads existing data from disk if present.
    pub async fn new() -> StoreResult<Self> {
        let path = Self::default_path()?;
        Self::with_path(path).await
    }

    /// Create a store at a specific path
    pub async fn with_path(path: PathBuf) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Load existing data or create empty
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&contents) {
                Ok(data) => {
                    info!("Loaded token store from {:?}", path);
                    data
                }
                Err(e) => {
                    warn!("Failed to parse token store, starting fresh: {}", e);
                    StoredData::default()
                }
            }
        } else {
            debug!("No existing token store, creating new");
            StoredData::default()
        };

        Ok(Self {
            path,
            data: Arc::new(RwLock::new(data)),
        })
    }

    /// Get the default storage path (~/.config/latchkey/tokens.json)
    fn default_path() -> StoreResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(config_dir.join("latchkey").join("tokens.json"))
    }

    /// Save current state to disk
    async fn save(&self) -> StoreResult<()> {
        let data = self.data.read().await;
        let json = serde_json::to_string_pretty(&*data)?;
        std::fs::write(&self.path, json)?;
        debug!("Saved token store to {:?}", self.path);
        Ok(())
    }

    /// Persist a newly issued token
    pub async fn insert(&self, token: AccessToken) -> StoreResult<()> {
        let id = token.id.to_string();
        {
            let mut data = self.data.write().await;
            if data.tokens.contains_key(&id) {
                return Err(StoreError::DuplicateId(id));
            }
            data.tokens.insert(id.clone(), token);
        }
        self.save().await?;
        info!("Stored token {}", id);
        Ok(())
    }

    /// Get a token by ID
    pub async fn get(&self, id: &TokenId) -> Option<AccessToken> {
        let data = self.data.read().await;
        data.tokens.get(&id.to_string()).cloned()
    }

    /// Newest token owned by `session` that is valid at `now`
    pub async fn find_active(&self, session: &str, now: DateTime<Utc>) -> Option<AccessToken> {
        let data = self.data.read().await;
        data.tokens
            .values()
            .filter(|t| t.session == session && t.is_valid_at(now))
            .max_by_key(|t| t.created_at)
            .cloned()
    }

    /// Newest token owned by `session`, valid or not
    pub async fn latest_for_session(&self, session: &str) -> Option<AccessToken> {
        let data = self.data.read().await;
        data.tokens
            .values()
            .filter(|t| t.session == session)
            .max_by_key(|t| t.created_at)
            .cloned()
    }

    /// Flip the used flag on a token
    ///
    /// Returns `false` when the token had already been consumed. The check
    /// and the write happen under one write lock, so two concurrent calls
    /// for the same id cannot both observe an unused token.
    pub async fn mark_used(&self, id: &TokenId) -> StoreResult<bool> {
        let marked = {
            let mut data = self.data.write().await;
            let token = data
                .tokens
                .get_mut(&id.to_string())
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if token.used {
                false
            } else {
                token.used = true;
                true
            }
        };
        if marked {
            self.save().await?;
            info!("Token {} consumed", id);
        }
        Ok(marked)
    }

    /// Number of tokens ever issued
    pub async fn token_count(&self) -> usize {
        let data = self.data.read().await;
        data.tokens.len()
    }

    /// Remove all tokens
    pub async fn clear(&self) -> StoreResult<()> {
        {
            let mut data = self.data.write().await;
            data.tokens.clear();
        }
        self.save().await?;
        info!("Cleared token store");
        Ok(())
    }
}
