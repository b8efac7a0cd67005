//! File system adapters: paths, config and the on-disk token store.

pub mod config_service;
pub mod paths;
pub mod storage;
pub mod token_store;

pub use crate::config_service::ConfigService;
pub use crate::paths::TabulaPaths;
pub use crate::token_store::{FileTokenStore, MemoryTokenStore};
