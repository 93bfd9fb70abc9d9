//! Update ingestion
//!
//! Reads line-delimited JSON records and applies each one to the shared
//! document. Two record shapes are accepted:
//!
//! ```text
//! {"content": "# Title", "directory": "/home/me/notes"}
//! ["# Title", "/home/me/notes"]
//! ```

use crate::document::state::SharedDocument;
use serde::Deserialize;
use std::io::BufRead;
use thiserror::Error;

/// A single document update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UpdateRecord {
    // Tried first: derived structs also accept arrays
    Positional(String, String),
    Named { content: String, directory: String },
}

impl UpdateRecord {
    pub fn into_parts(self) -> (String, String) {
        match self {
            UpdateRecord::Positional(content, directory) => (content, directory),
            UpdateRecord::Named { content, directory } => (content, directory),
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read update stream")]
    Io(#[from] std::io::Error),

    #[error("malformed update on line {line}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_update(line: &str) -> Result<Option<UpdateRecord>, serde_json::Error> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Apply every record from `reader` to `document` until end of input.
///
/// Returns the number of updates applied. Must run outside the async
/// runtime; the process runs it on a dedicated thread that owns stdin.
pub fn ingest<R: BufRead>(reader: R, document: &SharedDocument) -> Result<u64, IngestError> {
    let mut applied = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let record = parse_update(&line).map_err(|source| IngestError::Malformed {
            line: index + 1,
            source,
        })?;

        let Some(record) = record else {
            tracing::debug!(line = index + 1, "Skipping blank update line");
            continue;
        };

        let (content, directory) = record.into_parts();
        tracing::debug!(
            bytes = content.len(),
            directory = %directory,
            "Applying document update"
        );
        document.blocking_update(content, directory);
        applied += 1;
    }

    Ok(applied)
}
