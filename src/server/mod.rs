//! TCP listener and accept loop.

pub mod listener;

pub use listener::{accept_with_backoff, announcement, bind, run};
