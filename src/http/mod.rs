//! HTTP protocol implementation.
//!
//! A small HTTP/1.1 server layer with keep-alive support, just enough for
//! the preview endpoints.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection request-response state machine
//! - **`parser`**: Parses incoming HTTP requests from byte buffers
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes responses and streams file bodies in chunks
//! - **`mime`**: Content types for the image allow-list
//! - **`date`**: HTTP-date formatting
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← PreviewHandler builds the response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send head, then body (files in chunks)
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```
//!
//! A request that cannot be parsed skips Processing: it goes straight to
//! Writing with a 400 (431 for oversized headers, 413 for a body over
//! `MAX_BODY_BYTES`, 501 for an unknown method) and the connection closes.

pub mod connection;
pub mod date;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
