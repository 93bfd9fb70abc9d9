//! Preview endpoints
//!
//! Resolves request targets against the current document and answers the
//! root page, raw fetch and static image requests.

pub mod handler;
pub mod resolve;

pub use handler::{Asset, PreviewHandler, RootPage};
pub use resolve::{RequestKind, Resolved, resolve};
