//! Core storage logic for docgate.
//!
//! This crate contains the document storage abstraction with ZERO web
//! dependencies. HTTP concerns live in `docgate-api`.
//!
//! # Modules
//!
//! - `storage` - Provider contract, identifier codec and the filesystem and
//!   object-store backends

pub mod storage;
