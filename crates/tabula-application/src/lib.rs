//! Application layer for Tabula.
//!
//! Composes the request layer with the client-side cache and drives the core
//! state machines from async flow hooks.

pub mod cancel;
pub mod data_service;
pub mod flows;
pub mod query_cache;

pub use data_service::DataService;
pub use flows::{AuthFlow, ChatFlow, FileAnalysisFlow, ProjectFlow, QuickAnalysisFlow};
pub use query_cache::{CacheEntry, FetchPolicy, QueryCache, QueryStatus};
