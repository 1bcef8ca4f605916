//! Common types and the shared mock registry for Isolator components.
//!
//! A test process and the service it drives share one [`MockRegistry`].
//! Each test owns a [`SessionToken`]; mocks are registered under
//! `(token, capability)` so concurrently running tests never see each
//! other's mocks.

#![warn(clippy::pedantic)]

/// Module for common configuration
pub mod config;

/// Module for common error types
pub mod error;

/// Module for the mocking-collaborator seam (handles, factories, mock sets)
pub mod mock;

/// Module for the concurrent `(token, capability) -> mock` registry
pub mod registry;

/// Module for tracing bootstrap
pub mod telemetry;

/// Module for session tokens and capability identifiers
pub mod types;

pub use config::Config;
pub use error::{RegistryError, TokenError};
pub use mock::{MockFactory, MockHandle, MockSet, Resettable};
pub use registry::MockRegistry;
pub use types::{CapabilityId, SessionToken};
