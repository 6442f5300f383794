//! Core types for Logiport.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod email;
pub mod identifier;
pub mod mobile;
pub mod records;
pub mod status;
pub mod token;

pub use account::{AccountStatusResponse, ClientAccountStatus, ClientId, SignupProfile};
pub use email::{Email, EmailError};
pub use identifier::{IdentifierCheck, IdentifierError, LoginIdentifier, validate};
pub use mobile::{MobileError, MobileNumber};
pub use records::*;
pub use status::*;
pub use token::{SessionToken, TokenError};
