//! Cache key model and the mutation → invalidation table.
//!
//! The cache itself lives in the application layer; this module only defines
//! what keys look like and which of them a mutation makes stale.

mod invalidation;
mod key;

pub use invalidation::{invalidations, Mutation};
pub use key::QueryKey;
