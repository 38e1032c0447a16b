//! Application Layer
//!
//! Port definitions sitting between the domain types and the
//! infrastructure adapters.

pub mod ports;
