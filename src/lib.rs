//! Client for a remote cuckoo filter service.
//!
//! The service hosts named cuckoo filters and exposes a small set of remote
//! procedures over JSON/HTTP: create, insert (one or many), lookup (one or
//! many), delete element, delete filter, reset, count and list.
//!
//! HowTo:
//!    * Build a [`ClientConfig`] (address + timeout), or read it from the
//!      environment with [`ClientConfig::from_env`].
//!    * [`Client::connect`] dials the service and blocks until it answers its
//!      health check, or the timeout elapses.
//!    * Every operation is one round trip bounded by the same timeout. A zero
//!      status is success; a non-zero status is a logical failure
//!      (`Ok(false)` for yes/no operations, [`ClientError::Status`] for those
//!      returning data). Transport problems are always errors.
//!    * [`Client::close`] releases the connection and may be called repeatedly.
//!
//! With the `server` feature the crate also ships a reference implementation
//! of the service (filter registry + cuckoo filter engine + axum router), used
//! by the `cfc-server` binary and as the peer in tests.

#[cfg(feature = "server")]
pub mod api;
mod client;
pub mod config;
#[cfg(feature = "server")]
pub mod cuckoo;
pub mod dialer;
mod error;
#[cfg(feature = "server")]
pub mod registry;
#[cfg(feature = "server")]
pub mod types;
pub mod wire;

pub use client::{Client, LookupOutcome};
pub use config::{ClientConfig, ClientConfigBuilder, ClientConfigBuilderError};
pub use dialer::{Connection, Dialer, HttpDialer};
pub use error::{ClientError, Result};
#[cfg(feature = "server")]
pub use registry::{FilterRegistry, RegistryError};
#[cfg(feature = "server")]
pub use types::{
    AppState, ServerConfig, ServerConfigBuilder, ServerConfigBuilderError,
};
pub use wire::{Code, Status};
