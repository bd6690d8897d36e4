//! Per-run state threaded explicitly through the pipeline: counters, failure
//! messages and manifest accumulation. Owned by the driver.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::CompileError;
use crate::model::RecordKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub records: usize,
    pub artifacts_written: usize,
    pub validation_failures: usize,
    pub skipped: usize,
    pub write_failures: usize,
    pub missing: usize,
    /// Stale artifacts deleted for providers a record no longer enables.
    pub removed: usize,
}

/// Manifest changes for one (provider, kind) pair: names written in write
/// order, and names whose provider was disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub provider: String,
    pub kind: RecordKind,
    pub dir: PathBuf,
    pub names: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CompileContext {
    pub counters: RunCounters,
    failures: Vec<String>,
    manifests: Vec<ManifestEntry>,
}

impl CompileContext {
    /// Count a written artifact and append it to its manifest.
    pub fn record_written(&mut self, provider: &str, kind: RecordKind, dir: &Path, name: &str) {
        self.counters.artifacts_written += 1;
        let names = &mut self.entry_mut(provider, kind, dir).names;
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    /// Drop `name` from its manifest; `deleted` is whether a file was removed.
    pub fn record_removed(
        &mut self,
        provider: &str,
        kind: RecordKind,
        dir: &Path,
        name: &str,
        deleted: bool,
    ) {
        if deleted {
            self.counters.removed += 1;
        }
        let removed = &mut self.entry_mut(provider, kind, dir).removed;
        if !removed.iter().any(|n| n == name) {
            removed.push(name.to_string());
        }
    }

    fn entry_mut(&mut self, provider: &str, kind: RecordKind, dir: &Path) -> &mut ManifestEntry {
        let idx = match self
            .manifests
            .iter()
            .position(|m| m.provider == provider && m.kind == kind)
        {
            Some(idx) => idx,
            None => {
                self.manifests.push(ManifestEntry {
                    provider: provider.to_string(),
                    kind,
                    dir: dir.to_path_buf(),
                    names: Vec::new(),
                    removed: Vec::new(),
                });
                self.manifests.len() - 1
            }
        };
        &mut self.manifests[idx]
    }

    /// Log and count an isolated failure; the run continues.
    pub fn record_failure(&mut self, err: CompileError) {
        match &err {
            CompileError::Schema(_) | CompileError::Read { .. } => {
                self.counters.validation_failures += 1
            }
            CompileError::Render { .. } | CompileError::Write { .. } => {
                self.counters.write_failures += 1
            }
            CompileError::RecordNotFound { .. } => self.counters.missing += 1,
            CompileError::UnknownProvider { .. } | CompileError::Io { .. } => {}
        }
        tracing::error!("{}", err);
        self.failures.push(err.to_string());
    }

    pub fn manifests(&self) -> &[ManifestEntry] {
        &self.manifests
    }

    pub fn into_report(self) -> RunReport {
        RunReport {
            counters: self.counters,
            failures: self.failures,
        }
    }
}

/// Outcome of one driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub counters: RunCounters,
    pub failures: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        write!(
            f,
            "{} record(s), {} artifact(s) written, {} skipped, {} stale removed, {} validation failure(s), {} write failure(s), {} missing",
            c.records,
            c.artifacts_written,
            c.skipped,
            c.removed,
            c.validation_failures,
            c.write_failures,
            c.missing
        )?;
        if !self.failures.is_empty() {
            write!(f, "\nfailures:")?;
            for failure in &self.failures {
                write!(f, "\n  - {failure}")?;
            }
        }
        Ok(())
    }
}
