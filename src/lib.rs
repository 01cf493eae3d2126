//! ladder-view Library
//!
//! Paged, cache-backed view of a competitive ladder: a sparse row cache that
//! fetches pages on demand, recycled row bindings for a virtualized list,
//! and the ladder view that ties actions and push updates to invalidation.

pub mod constants;
pub mod domain;
pub mod error;
pub mod helpers;
pub mod services;
pub mod state;
pub mod utils;
