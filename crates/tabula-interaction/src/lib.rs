//! HTTP access to the Tabula analysis backend.

pub mod client;
pub mod response;

pub use client::HttpApiClient;
