//! # alas-common
//!
//! Shared types, the token codec, JSON-schema validation, configuration
//! helpers, and error plumbing used by both `kiwi` (the ingestor) and
//! `orcrist` (the session authority). This is the foundation layer — no
//! bus or database clients live here, just the primitives both services
//! agree on.

pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod token;
