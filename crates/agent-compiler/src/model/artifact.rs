use std::path::PathBuf;

use super::RecordKind;

/// One rendered output file for a (record, provider) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderArtifact {
    pub provider: String,
    pub kind: RecordKind,
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}
