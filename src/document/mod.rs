//! Document state and the update stream that feeds it.

pub mod ingest;
pub mod state;

pub use ingest::{IngestError, UpdateRecord, ingest};
pub use state::{DocumentSnapshot, DocumentState, SharedDocument};
