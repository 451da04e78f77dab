//! Request middleware.

pub mod access_token;

pub use access_token::{AccessToken, access_token_middleware};
