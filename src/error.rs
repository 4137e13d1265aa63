//! Error taxonomy for the stream directory and playback engine.
//!
//! Application plumbing (terminal, files, processes) stays on `anyhow`; these
//! types cover the failures callers need to tell apart.

use crate::catalog::StreamKind;

/// The catalog cannot be used at all. Fatal at load.
#[derive(Debug, thiserror::Error)]
pub enum MalformedCatalogError {
  #[error("duplicate stream id {0}")]
  DuplicateId(i64),

  #[error("stream {id} ({kind}) is missing required field `{field}`")]
  MissingField { id: i64, kind: StreamKind, field: &'static str },

  #[error("default stream id {0} is not in the catalog")]
  UnknownDefault(i64),

  #[error("catalog could not be parsed: {0}")]
  Parse(String),
}

/// No entry exists to fall back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("catalog is empty, there is no default stream")]
pub struct EmptyCatalogError;

/// Per-entry playback failure. The affected surface goes inert, everything
/// else keeps working.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
  #[error("stream {id} has an invalid {kind} reference {media_ref:?}: {reason}")]
  InvalidMediaReference { id: i64, kind: StreamKind, media_ref: String, reason: String },

  #[error("media player failed for stream {id}: {source:#}")]
  Player {
    id: i64,
    #[source]
    source: anyhow::Error,
  },
}
