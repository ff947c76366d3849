//! # waymark
//!
//! Library half of the Waymark binary: the HTTP surface and configuration,
//! exposed so integration tests can drive them without a real socket.

pub mod api;
pub mod config;
