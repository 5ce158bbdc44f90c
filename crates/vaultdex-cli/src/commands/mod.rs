//! CLI command handlers

pub mod highlight;
pub mod index;
pub mod pending;
pub mod search;
pub mod status;
