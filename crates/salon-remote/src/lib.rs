//! HTTP client for the hosted database.
//!
//! Speaks the PostgREST dialect (`/rest/v1/{table}`) for table access and the
//! auth endpoint (`/auth/v1/user`) for the current session, and implements
//! [`salon_core::remote::RemoteStore`] and
//! [`salon_core::actor::ActorProvider`] on top of them.

mod classify;
mod client;

pub mod error;

pub use classify::{class_for, from_response};
pub use client::{RemoteClient, RemoteConfig};
pub use error::{Error, Result};
