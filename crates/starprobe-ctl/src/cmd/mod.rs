//! CLI command modules.

pub mod http;
pub mod network;
pub mod speed;
