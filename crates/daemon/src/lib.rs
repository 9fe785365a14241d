//! # Homeport Daemon Library
//!
//! This crate provides the daemon (server) functionality for Homeport,
//! exposing a single user's home directory tree over an authenticated HTTP
//! interface.
//!
//! ## Overview
//!
//! The daemon wires three pieces together:
//!
//! - **Vault**: the confined home tree (path boundary, filesystem
//!   operations, file categories) from the `vault` crate
//! - **Session Boundary**: credential verification and signed, time-limited
//!   session tokens
//! - **HTTP Surface**: axum routes mapping every vault outcome to a status
//!   code and a stable machine-readable error code
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                     HTTP Surface                      │
//! │   /api/auth/*            /api/files/*      static /   │
//! ├───────────────────────────────────────────────────────┤
//! │   Session Boundary          │         Vault           │
//! │   (credentials + tokens)    │  (confinement + ops)    │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: configuration loading, env overrides, and defaults
//! - [`auth`]: credential verification and session tokens
//! - [`http`]: router, handlers, and error mapping

pub mod auth;
pub mod config;
pub mod http;

// Re-export the core crate for convenience
pub use vault;

// Re-export config types for convenience
pub use config::Config;

// Re-export auth types for convenience
pub use auth::{Authenticator, CredentialFile, StaticCredentials, TokenSigner, SESSION_COOKIE};

// Re-export HTTP types for convenience
pub use http::{router, AppState, SharedState};
