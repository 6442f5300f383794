//! Logiport Core - Shared types library.
//!
//! This crate provides the types shared by the Logiport portal components:
//! - `portal` - Session managers, query cache coordination and the remote API boundary
//! - `cli` - Operator command-line tool
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Login identifiers, session tokens, account status and the
//!   read models fetched through a session

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
