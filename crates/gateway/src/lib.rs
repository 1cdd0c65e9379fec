//! HTTP gateway to the payment backend.
//!
//! [`BackendClient`] implements every backend-facing collaborator trait of
//! the checkout crate over JSON `POST` requests with a bearer token.

pub mod client;
pub mod config;
pub mod error;
pub mod wire;

pub use client::BackendClient;
pub use config::{BackendConfig, BackendPaths};
pub use error::GatewayError;
