//! Admin and client sessions.
//!
//! # Architecture
//!
//! A [`SessionContext`] is constructed once at startup from a
//! [`TokenStore`] and a [`QueryCache`]. It owns:
//!
//! - one [`RemoteHandle`], shared by both sessions
//! - an [`AdminSession`] over the admin token slot
//! - a [`ClientSession`] over the client token slot
//!
//! The two sessions never touch each other's slot; both may be signed in at
//! once. Attaching a backend handle triggers a one-shot revalidation of the
//! admin token.

mod admin;
mod client;
mod slot;

pub use admin::{AdminSession, RevalidationOutcome};
pub use client::{ClientGate, ClientSession};
pub use slot::TokenSlot;

use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;

use logiport_core::SessionToken;
use tracing::{debug, info, warn};

use crate::cache::{CachedQuery, QueryCache, QueryKey};
use crate::error::SessionError;
use crate::remote::{PortalApi, RemoteError, RemoteHandle};
use crate::storage::{ADMIN_TOKEN_KEY, CLIENT_TOKEN_KEY, TokenStore};

/// Session state shared by the whole portal.
#[derive(Debug)]
pub struct SessionContext {
    remote: RemoteHandle,
    cache: QueryCache,
    admin: AdminSession,
    client: ClientSession,
}

impl SessionContext {
    /// Restore both sessions from `store`.
    ///
    /// No backend handle is attached yet; call [`Self::attach_api`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be read.
    pub fn init(store: Arc<dyn TokenStore>, cache: QueryCache) -> Result<Self, SessionError> {
        let remote = RemoteHandle::new();
        let admin = AdminSession::new(SessionCore {
            slot: TokenSlot::restore(ADMIN_TOKEN_KEY, store.clone())?,
            remote: remote.clone(),
            cache: cache.clone(),
        });
        let client = ClientSession::new(SessionCore {
            slot: TokenSlot::restore(CLIENT_TOKEN_KEY, store)?,
            remote: remote.clone(),
            cache: cache.clone(),
        });

        info!("Session context initialized");
        Ok(Self {
            remote,
            cache,
            admin,
            client,
        })
    }

    /// Report `ip` with client logins and OTP verification.
    #[must_use]
    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client.set_client_ip(ip);
        self
    }

    /// Install a backend handle and revalidate the admin token against it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if clearing a rejected token fails.
    pub async fn attach_api(
        &self,
        api: Arc<dyn PortalApi>,
    ) -> Result<RevalidationOutcome, SessionError> {
        let generation = self.remote.replace(Some(api)).await;
        debug!(generation, "Backend handle attached");
        self.admin.revalidate().await
    }

    /// Drop the backend handle. Operations needing it fail until a new one
    /// is attached.
    pub async fn detach_api(&self) {
        let generation = self.remote.replace(None).await;
        debug!(generation, "Backend handle detached");
    }

    /// Log out of both sessions.
    ///
    /// # Errors
    ///
    /// Returns the first storage error; both sessions are still torn down.
    pub async fn logout_all(&self) -> Result<(), SessionError> {
        let admin = self.admin.logout().await;
        let client = self.client.logout().await;
        admin.and(client)
    }

    #[must_use]
    pub const fn admin(&self) -> &AdminSession {
        &self.admin
    }

    #[must_use]
    pub const fn client(&self) -> &ClientSession {
        &self.client
    }

    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    #[must_use]
    pub const fn remote(&self) -> &RemoteHandle {
        &self.remote
    }
}

/// A token slot plus the collaborators every session needs.
#[derive(Debug)]
pub(crate) struct SessionCore {
    slot: TokenSlot,
    remote: RemoteHandle,
    cache: QueryCache,
}

impl SessionCore {
    /// The current backend handle.
    async fn api(&self) -> Result<Arc<dyn PortalApi>, SessionError> {
        self.remote
            .current()
            .await
            .ok_or_else(|| SessionError::ServiceUnavailable("no backend handle".to_string()))
    }

    /// Serve a query from cache, fetching through `token` on a miss.
    ///
    /// The fetched result is cached only if `token` is still current.
    async fn cached<T, F, Fut>(
        &self,
        key: fn(SessionToken) -> QueryKey,
        token: &SessionToken,
        fetch: F,
    ) -> Result<T, SessionError>
    where
        T: CachedQuery,
        F: FnOnce(Arc<dyn PortalApi>, SessionToken) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let key = key(token.clone());
        if let Some(hit) = self.cache.get(&key).await.and_then(T::from_value) {
            return Ok(hit);
        }

        let api = self.api().await?;
        let fetched = fetch(api, token.clone()).await?;

        if self.slot.is_current(token).await {
            self.cache.insert(key, fetched.clone().into_value()).await;
        } else {
            debug!(scope = ?key.scope(), "Dropping result fetched with a superseded token");
        }
        Ok(fetched)
    }

    /// Clear `token` after the backend stopped accepting it.
    async fn expire(&self, token: &SessionToken) {
        match self.slot.clear_if_current(token).await {
            Ok(true) => {
                info!(key = self.slot.key(), "Session expired");
                self.cache.on_logout().await;
            }
            Ok(false) => {}
            Err(err) => warn!(error = %err, "Failed to clear expired session"),
        }
    }

    /// Pass `result` through, clearing the session first if it says the
    /// backend no longer accepts `token`.
    async fn settle<T>(
        &self,
        token: &SessionToken,
        result: Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        if let Err(err) = &result
            && err.invalidates_session()
        {
            self.expire(token).await;
        }
        result
    }

    /// Clear the slot and purge the cache, whatever the storage outcome.
    async fn teardown(&self) -> Result<(), SessionError> {
        let cleared = self.slot.clear().await;
        self.cache.on_logout().await;
        cleared
    }
}
