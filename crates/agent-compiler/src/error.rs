//! Error kinds surfaced by the compiler pipeline.
//!
//! Everything except `UnknownProvider` and `Io` is isolated to one record or artifact:
//! the driver logs it, counts it, and moves on to the next unit of work.

use std::path::PathBuf;

use crate::model::RecordKind;
use crate::render::RenderError;
use crate::schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render {provider} output for '{name}': {source}")]
    Render {
        provider: String,
        name: String,
        #[source]
        source: RenderError,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{kind} '{name}' not found (expected {})", .path.display())]
    RecordNotFound {
        kind: RecordKind,
        name: String,
        path: PathBuf,
    },
    #[error("cannot list {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown provider '{id}' (known: {known})")]
    UnknownProvider { id: String, known: String },
}
