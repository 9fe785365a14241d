//! Session and identity boundary.
//!
//! Credential checks go through the [`Authenticator`] trait; successful
//! logins get a signed, time-limited token from [`TokenSigner`], carried in
//! the session cookie.

pub mod credentials;
pub mod token;

pub use credentials::{Authenticator, CredentialFile, StaticCredentials};
pub use token::TokenSigner;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";
