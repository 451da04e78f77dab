//! Shared errors, configuration and access tokens for docgate.
//!
//! This crate provides the pieces used by both the API layer and the server
//! binary:
//! - Application-wide error type with HTTP status and error codes
//! - Configuration management
//! - Access-token signing and validation

pub mod access_token;
pub mod config;
pub mod error;

pub use access_token::{AccessTokenClaims, AccessTokenConfig, AccessTokenError, AccessTokenService};
pub use config::{AppConfig, ServerConfig};
pub use error::{AppError, AppResult};
