//! Domain layer for Tabula.
//!
//! Holds the records exchanged with the analysis backend, the request-layer
//! trait, and the pure state machines that the application layer drives.

pub mod analysis;
pub mod api;
pub mod auth;
pub mod cache;
pub mod chat;
pub mod compare;
pub mod config;
pub mod error;
pub mod project;
pub mod store;
pub mod wizard;

// Re-export common types
pub use api::AnalysisApi;
pub use error::{Result, TabulaError};
