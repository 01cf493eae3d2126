//! Utils - Config persistence and text formatting

pub mod config_store;
pub mod format;
