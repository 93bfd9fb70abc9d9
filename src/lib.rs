//! livepeek - live document preview server
//!
//! Reads document updates on stdin and serves the latest version, plus the
//! images next to it, over HTTP.

pub mod config;
pub mod document;
pub mod http;
pub mod preview;
pub mod render;
pub mod server;
