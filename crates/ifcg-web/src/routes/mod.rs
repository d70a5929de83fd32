//! Route handlers.

pub mod query;
pub mod status;
