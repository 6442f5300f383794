//! Logiport portal session library.
//!
//! Owns the two browser-scoped credentials of the customer portal and keeps
//! cached server data consistent with them:
//!
//! - [`session::AdminSession`] - shared-password admin login, logout and
//!   background revalidation
//! - [`session::ClientSession`] - per-account client login (password, OTP,
//!   signup), first-login password rotation and logout
//! - [`cache::QueryCache`] - token-keyed query cache and the invalidation
//!   rules tied to session transitions
//! - [`classify`] - maps every failure to a user-facing message
//!
//! [`session::SessionContext`] wires these together around a single
//! [`storage::TokenStore`] and [`remote::RemoteHandle`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod remote;
pub mod session;
pub mod storage;

pub use classify::{ClassifiedError, ErrorCategory};
pub use error::{SessionError, ValidationError};
pub use session::SessionContext;
