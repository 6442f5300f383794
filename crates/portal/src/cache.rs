//! Token-keyed query cache.
//!
//! Every cached query embeds the token it was fetched with in its key, so a
//! new session never reuses results fetched under an old one. On top of
//! that, session transitions and admin mutations drop whole groups of
//! entries:
//!
//! | Event | Dropped |
//! |-------|---------|
//! | login / signup / OTP verification | account status, login history |
//! | password change | account status |
//! | logout (either session) | everything |
//! | admin client save | client list |
//! | admin shipment save | shipment lists, revenue |
//! | admin invoice save | invoice lists, revenue |

use logiport_core::{
    ClientAccountStatus, ClientSummary, Invoice, LoginRecord, RevenueSummary, SessionToken,
    Shipment,
};
use moka::future::Cache;
use tracing::debug;

use crate::config::CacheConfig;

/// Identity of a cached query.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum QueryKey {
    AccountStatus(SessionToken),
    LoginHistory(SessionToken),
    ClientShipments(SessionToken),
    ClientInvoices(SessionToken),
    Clients(SessionToken),
    Shipments(SessionToken),
    Invoices(SessionToken),
    Revenue(SessionToken),
}

/// Query family, ignoring the token.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum QueryScope {
    AccountStatus,
    LoginHistory,
    ClientShipments,
    ClientInvoices,
    Clients,
    Shipments,
    Invoices,
    Revenue,
}

impl QueryKey {
    /// The query family of this key.
    #[must_use]
    pub const fn scope(&self) -> QueryScope {
        match self {
            Self::AccountStatus(_) => QueryScope::AccountStatus,
            Self::LoginHistory(_) => QueryScope::LoginHistory,
            Self::ClientShipments(_) => QueryScope::ClientShipments,
            Self::ClientInvoices(_) => QueryScope::ClientInvoices,
            Self::Clients(_) => QueryScope::Clients,
            Self::Shipments(_) => QueryScope::Shipments,
            Self::Invoices(_) => QueryScope::Invoices,
            Self::Revenue(_) => QueryScope::Revenue,
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum QueryValue {
    AccountStatus(ClientAccountStatus),
    LoginHistory(Vec<LoginRecord>),
    Shipments(Vec<Shipment>),
    Invoices(Vec<Invoice>),
    Clients(Vec<ClientSummary>),
    Revenue(RevenueSummary),
}

/// A query result type that can live in the cache.
pub trait CachedQuery: Clone + Sized {
    fn into_value(self) -> QueryValue;
    fn from_value(value: QueryValue) -> Option<Self>;
}

macro_rules! cached_query {
    ($ty:ty, $variant:ident) => {
        impl CachedQuery for $ty {
            fn into_value(self) -> QueryValue {
                QueryValue::$variant(self)
            }

            fn from_value(value: QueryValue) -> Option<Self> {
                match value {
                    QueryValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

cached_query!(ClientAccountStatus, AccountStatus);
cached_query!(Vec<LoginRecord>, LoginHistory);
cached_query!(Vec<Shipment>, Shipments);
cached_query!(Vec<Invoice>, Invoices);
cached_query!(Vec<ClientSummary>, Clients);
cached_query!(RevenueSummary, Revenue);

/// Admin mutations that make cached admin views stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminMutation {
    Client,
    Shipment,
    Invoice,
}

impl AdminMutation {
    /// Query families affected by this mutation.
    #[must_use]
    pub const fn affected_scopes(self) -> &'static [QueryScope] {
        match self {
            Self::Client => &[QueryScope::Clients],
            Self::Shipment => &[
                QueryScope::Shipments,
                QueryScope::ClientShipments,
                QueryScope::Revenue,
            ],
            Self::Invoice => &[
                QueryScope::Invoices,
                QueryScope::ClientInvoices,
                QueryScope::Revenue,
            ],
        }
    }
}

/// Shared cache of server-derived query results.
///
/// Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<QueryKey, QueryValue>,
}

impl QueryCache {
    /// Create a cache with the given capacity and TTL.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.time_to_live)
            .build();
        Self { inner }
    }

    /// Look up a cached result.
    pub async fn get(&self, key: &QueryKey) -> Option<QueryValue> {
        let value = self.inner.get(key).await;
        if value.is_some() {
            debug!(scope = ?key.scope(), "Query cache hit");
        }
        value
    }

    /// Store a result.
    pub async fn insert(&self, key: QueryKey, value: QueryValue) {
        self.inner.insert(key, value).await;
    }

    /// Drop every entry in the given families, for all tokens.
    pub async fn invalidate_scopes(&self, scopes: &[QueryScope]) {
        let stale: Vec<_> = self
            .inner
            .iter()
            .filter(|(key, _)| scopes.contains(&key.scope()))
            .map(|(key, _)| key)
            .collect();

        for key in &stale {
            self.inner.invalidate(&**key).await;
        }
        debug!(?scopes, dropped = stale.len(), "Query scopes invalidated");
    }

    /// A session was established: the next render must see the new identity.
    pub async fn on_login(&self) {
        self.invalidate_scopes(&[QueryScope::AccountStatus, QueryScope::LoginHistory])
            .await;
    }

    /// The account behind a client token changed (e.g. its password).
    pub async fn on_account_changed(&self) {
        self.invalidate_scopes(&[QueryScope::AccountStatus]).await;
    }

    /// An admin create-or-update succeeded.
    pub async fn on_admin_mutation(&self, mutation: AdminMutation) {
        self.invalidate_scopes(mutation.affected_scopes()).await;
    }

    /// A session ended: purge everything, not just token-scoped entries, so
    /// no view mixes pre- and post-logout data.
    pub async fn on_logout(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
        debug!("Query cache purged");
    }

    /// Number of cached entries, after applying pending maintenance.
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
