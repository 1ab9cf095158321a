//! Core types and the resilient table accessor for the salon data layer.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! remote store, the on-device store and the actor provider are traits;
//! `salon-remote` and `salon-store-sqlite` supply the real implementations.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod accessor;
pub mod actor;
pub mod config;
pub mod error;
pub mod local;
pub mod record;
pub mod remote;
pub mod schema_error;

pub use accessor::{Accessor, Phase, TableHandle, TableStatus, valid_table_name};
pub use config::AccessorConfig;
pub use error::{Error, Result};
pub use record::{Record, RecordId};
