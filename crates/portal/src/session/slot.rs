//! Single-token persistent slot.

use std::sync::Arc;

use logiport_core::{SessionToken, TokenError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::storage::{StorageError, TokenStore};

/// One durable token slot: at most one live token, mirrored to a store key.
///
/// Writes persist first and publish second, so a failed write leaves the
/// previous token in place. Storing a new token always replaces the old one.
/// Store writes run on the blocking pool; the in-memory token stays locked
/// until the write finishes.
pub struct TokenSlot {
    key: &'static str,
    store: Arc<dyn TokenStore>,
    token: RwLock<Option<SessionToken>>,
}

impl TokenSlot {
    /// Open the slot at `key`, restoring any persisted token.
    ///
    /// A stored blank value is treated as absent and removed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be read.
    pub fn restore(key: &'static str, store: Arc<dyn TokenStore>) -> Result<Self, SessionError> {
        let token = match store.get(key)? {
            Some(raw) => match SessionToken::parse(&raw) {
                Ok(token) => Some(token),
                Err(TokenError::Blank) => {
                    warn!(key, "Discarding blank persisted token");
                    store.remove(key)?;
                    None
                }
            },
            None => None,
        };

        debug!(key, restored = token.is_some(), "Token slot opened");
        Ok(Self {
            key,
            store,
            token: RwLock::new(token),
        })
    }

    /// Store a token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Token` if the token is blank after trimming;
    /// nothing is changed in that case.
    pub async fn set(&self, raw: &str) -> Result<SessionToken, SessionError> {
        let token = SessionToken::parse(raw).map_err(|err| {
            warn!(key = self.key, "Rejected blank token");
            err
        })?;

        let mut slot = self.token.write().await;
        self.persist(Some(token.as_str().to_owned())).await?;
        *slot = Some(token.clone());
        debug!(key = self.key, token = %token.fingerprint(), "Token stored");
        Ok(token)
    }

    /// Remove the token. Clearing an empty slot is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be written.
    pub async fn clear(&self) -> Result<(), SessionError> {
        let mut slot = self.token.write().await;
        self.persist(None).await?;
        if slot.take().is_some() {
            debug!(key = self.key, "Token cleared");
        }
        Ok(())
    }

    /// Remove the token only if it is still `expected`.
    ///
    /// Returns whether the slot was cleared.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be written.
    pub async fn clear_if_current(&self, expected: &SessionToken) -> Result<bool, SessionError> {
        let mut slot = self.token.write().await;
        if slot.as_ref() != Some(expected) {
            return Ok(false);
        }
        self.persist(None).await?;
        *slot = None;
        debug!(key = self.key, "Token cleared");
        Ok(true)
    }

    /// The current token, if any.
    pub async fn current(&self) -> Option<SessionToken> {
        self.token.read().await.clone()
    }

    /// The current token, or `NotAuthenticated`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAuthenticated` if the slot is empty.
    pub async fn require(&self) -> Result<SessionToken, SessionError> {
        self.current().await.ok_or(SessionError::NotAuthenticated)
    }

    /// Whether `token` is the live token.
    pub async fn is_current(&self, token: &SessionToken) -> bool {
        self.token.read().await.as_ref() == Some(token)
    }

    /// Whether a token is held.
    pub async fn is_present(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Write `value` to the store (`None` removes the key).
    async fn persist(&self, value: Option<String>) -> Result<(), StorageError> {
        let store = Arc::clone(&self.store);
        let key = self.key;
        tokio::task::spawn_blocking(move || match value {
            Some(value) => store.set(key, &value),
            None => store.remove(key),
        })
        .await
        .map_err(|err| StorageError::Task(err.to_string()))?
    }

    /// The store key backing this slot.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }
}

impl std::fmt::Debug for TokenSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSlot")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{CLIENT_TOKEN_KEY, FileStore, MemoryStore};

    fn slot_with(store: &Arc<MemoryStore>) -> TokenSlot {
        TokenSlot::restore(CLIENT_TOKEN_KEY, store.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_set_trims_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let slot = slot_with(&store);

        slot.set("  abc123  ").await.unwrap();

        assert_eq!(
            store.get(CLIENT_TOKEN_KEY).unwrap().as_deref(),
            Some("abc123")
        );
        assert_eq!(slot.current().await.unwrap().as_str(), "abc123");
    }

    #[tokio::test]
    async fn test_blank_set_leaves_previous_token() {
        let store = Arc::new(MemoryStore::new());
        let slot = slot_with(&store);
        slot.set("first").await.unwrap();

        let err = slot.set("   ").await.unwrap_err();

        assert!(matches!(err, SessionError::Token(TokenError::Blank)));
        assert_eq!(store.get(CLIENT_TOKEN_KEY).unwrap().as_deref(), Some("first"));
        assert!(slot.is_present().await);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let slot = slot_with(&store);
        slot.set("tok").await.unwrap();

        slot.clear().await.unwrap();
        slot.clear().await.unwrap();

        assert!(!slot.is_present().await);
        assert_eq!(store.get(CLIENT_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_discards_blank() {
        let store = Arc::new(MemoryStore::new());
        store.set(CLIENT_TOKEN_KEY, "  ").unwrap();

        let slot = slot_with(&store);

        assert!(!slot.is_present().await);
        assert_eq!(store.get(CLIENT_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_file_backed_slot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let slot =
            TokenSlot::restore(CLIENT_TOKEN_KEY, Arc::new(FileStore::new(&path))).unwrap();

        slot.set(" file-tok ").await.unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get(CLIENT_TOKEN_KEY).unwrap().as_deref(),
            Some("file-tok")
        );

        let restored = TokenSlot::restore(CLIENT_TOKEN_KEY, Arc::new(FileStore::new(&path))).unwrap();
        assert_eq!(restored.current().await.unwrap().as_str(), "file-tok");

        slot.clear().await.unwrap();
        assert_eq!(reopened.get(CLIENT_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_if_current() {
        let store = Arc::new(MemoryStore::new());
        let slot = slot_with(&store);
        let old = slot.set("old").await.unwrap();
        slot.set("new").await.unwrap();

        assert!(!slot.clear_if_current(&old).await.unwrap());
        assert!(slot.is_present().await);

        let new = SessionToken::parse("new").unwrap();
        assert!(slot.clear_if_current(&new).await.unwrap());
        assert!(!slot.is_present().await);
    }
}
