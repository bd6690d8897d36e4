//! Output placement: path convention, directory creation and manifests.
//!
//! Agents land at `<output>/<dir>/agents/<name>.<ext>`, skills at
//! `<output>/<dir>/skills/<name>/SKILL.md`. Existing files are overwritten.
//! Artifacts for providers a record no longer enables are deleted.

use std::fs;
use std::path::{Path, PathBuf};

use crate::context::CompileContext;
use crate::error::CompileError;
use crate::model::{ProviderArtifact, RecordKind};
use crate::provider::ProviderSpec;

pub const MANIFEST_FILE: &str = "manifest.txt";
pub const SKILL_FILE: &str = "SKILL.md";

/// How a flush combines this run's names with a manifest already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestMode {
    /// The run covered every record of the kind: the manifest becomes exactly
    /// the names written, in write order.
    Replace,
    /// The run covered named records only: existing names keep their order,
    /// disabled names are dropped and new names are appended.
    Merge,
}

#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<output>/<dir>/<agents|skills>`; also where the manifest lives.
    pub fn kind_dir(&self, spec: &ProviderSpec, kind: RecordKind) -> PathBuf {
        self.root.join(&spec.dir).join(kind.dir_name())
    }

    /// Destination for a (provider, kind, name) triple.
    pub fn artifact_path(&self, spec: &ProviderSpec, kind: RecordKind, name: &str) -> PathBuf {
        let dir = self.kind_dir(spec, kind);
        match kind {
            RecordKind::Agent => dir.join(format!("{name}.{}", spec.agent_ext)),
            RecordKind::Skill => dir.join(name).join(SKILL_FILE),
        }
    }

    pub fn write(
        &self,
        spec: &ProviderSpec,
        artifact: &ProviderArtifact,
        ctx: &mut CompileContext,
    ) -> Result<(), CompileError> {
        if let Some(parent) = artifact.path.parent() {
            fs::create_dir_all(parent).map_err(|source| CompileError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&artifact.path, &artifact.content).map_err(|source| CompileError::Write {
            path: artifact.path.clone(),
            source,
        })?;
        ctx.record_written(
            &artifact.provider,
            artifact.kind,
            &self.kind_dir(spec, artifact.kind),
            &artifact.name,
        );
        Ok(())
    }

    /// Delete the artifact for a disabled (provider, record) pair and drop it
    /// from the manifest. Skills lose their whole `skills/<name>/` directory.
    pub fn remove_stale(
        &self,
        spec: &ProviderSpec,
        kind: RecordKind,
        name: &str,
        ctx: &mut CompileContext,
    ) -> Result<(), CompileError> {
        let path = self.artifact_path(spec, kind, name);
        let target = match kind {
            RecordKind::Agent => path.clone(),
            RecordKind::Skill => path.parent().map(Path::to_path_buf).unwrap_or(path),
        };
        let deleted = if target.is_dir() {
            fs::remove_dir_all(&target).map(|()| true)
        } else if target.exists() {
            fs::remove_file(&target).map(|()| true)
        } else {
            Ok(false)
        }
        .map_err(|source| CompileError::Write {
            path: target.clone(),
            source,
        })?;
        ctx.record_removed(&spec.id, kind, &self.kind_dir(spec, kind), name, deleted);
        Ok(())
    }

    /// Write every manifest touched this run, one name per line. A manifest
    /// left with no names is deleted. Returns how many were written; failures
    /// are recorded on `ctx`.
    pub fn flush_manifests(&self, ctx: &mut CompileContext, mode: ManifestMode) -> usize {
        let mut pending: Vec<(PathBuf, Result<Vec<String>, CompileError>)> = Vec::new();
        for m in ctx.manifests() {
            let path = m.dir.join(MANIFEST_FILE);
            let names = match mode {
                ManifestMode::Replace => Ok(m.names.clone()),
                ManifestMode::Merge => read_manifest(&path).map(|existing| {
                    let mut merged: Vec<String> = existing
                        .into_iter()
                        .filter(|n| !m.removed.contains(n))
                        .collect();
                    for name in &m.names {
                        if !merged.contains(name) {
                            merged.push(name.clone());
                        }
                    }
                    merged
                }),
            };
            pending.push((path, names));
        }

        let mut written = 0;
        for (path, names) in pending {
            let result = names.and_then(|names| {
                if names.is_empty() {
                    remove_manifest(&path).map(|()| false)
                } else {
                    let mut text = names.join("\n");
                    text.push('\n');
                    write_file(&path, &text).map(|()| true)
                }
            });
            match result {
                Ok(true) => {
                    tracing::debug!("manifest written: {}", path.display());
                    written += 1;
                }
                Ok(false) => {}
                Err(e) => ctx.record_failure(e),
            }
        }
        written
    }
}

/// Names listed in an existing manifest; none when it does not exist.
fn read_manifest(path: &Path) -> Result<Vec<String>, CompileError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).map_err(|source| CompileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn remove_manifest(path: &Path) -> Result<(), CompileError> {
    if !path.exists() {
        return Ok(());
    }
    tracing::debug!("manifest emptied, removing {}", path.display());
    fs::remove_file(path).map_err(|source| CompileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), CompileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CompileError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| CompileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::default::default_registry;

    #[test]
    fn path_convention() {
        let reg = default_registry();
        let w = OutputWriter::new("output");
        assert_eq!(
            w.artifact_path(reg.get("claude").unwrap(), RecordKind::Agent, "security-auditor"),
            Path::new("output/.claude/agents/security-auditor.md")
        );
        assert_eq!(
            w.artifact_path(reg.get("copilot").unwrap(), RecordKind::Agent, "planner"),
            Path::new("output/.copilot/agents/planner.agent.md")
        );
        assert_eq!(
            w.artifact_path(reg.get("gemini").unwrap(), RecordKind::Skill, "docx-creation"),
            Path::new("output/.gemini/skills/docx-creation/SKILL.md")
        );
    }

    #[test]
    fn write_overwrites_and_flushes_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let reg = default_registry();
        let spec = reg.get("claude").unwrap();
        let w = OutputWriter::new(tmp.path());
        let mut ctx = CompileContext::default();

        for (name, content) in [("b", "old"), ("a", "A"), ("b", "new")] {
            let artifact = ProviderArtifact {
                provider: spec.id.clone(),
                kind: RecordKind::Agent,
                name: name.into(),
                path: w.artifact_path(spec, RecordKind::Agent, name),
                content: content.into(),
            };
            w.write(spec, &artifact, &mut ctx).expect("write ok");
        }

        let agents = tmp.path().join(".claude/agents");
        assert_eq!(fs::read_to_string(agents.join("b.md")).unwrap(), "new");
        assert_eq!(w.flush_manifests(&mut ctx, ManifestMode::Replace), 1);
        assert_eq!(fs::read_to_string(agents.join(MANIFEST_FILE)).unwrap(), "b\na\n");
    }

    #[test]
    fn write_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        // A file where the provider directory should be.
        fs::write(tmp.path().join(".claude"), "blocker").unwrap();
        let reg = default_registry();
        let spec = reg.get("claude").unwrap();
        let w = OutputWriter::new(tmp.path());
        let artifact = ProviderArtifact {
            provider: spec.id.clone(),
            kind: RecordKind::Agent,
            name: "x".into(),
            path: w.artifact_path(spec, RecordKind::Agent, "x"),
            content: "c".into(),
        };
        let mut ctx = CompileContext::default();
        let err = w.write(spec, &artifact, &mut ctx).unwrap_err();
        assert!(matches!(err, CompileError::Write { .. }));
        assert_eq!(ctx.counters.artifacts_written, 0);
    }

    fn agent_artifact(w: &OutputWriter, spec: &ProviderSpec, name: &str) -> ProviderArtifact {
        ProviderArtifact {
            provider: spec.id.clone(),
            kind: RecordKind::Agent,
            name: name.into(),
            path: w.artifact_path(spec, RecordKind::Agent, name),
            content: "c".into(),
        }
    }

    #[test]
    fn merge_keeps_existing_order_and_drops_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let reg = default_registry();
        let spec = reg.get("opencode").unwrap();
        let w = OutputWriter::new(tmp.path());
        let manifest = w.kind_dir(spec, RecordKind::Agent).join(MANIFEST_FILE);
        fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        fs::write(&manifest, "charlie\nalpha\nbravo\n").unwrap();

        let mut ctx = CompileContext::default();
        w.write(spec, &agent_artifact(&w, spec, "delta"), &mut ctx).unwrap();
        w.write(spec, &agent_artifact(&w, spec, "alpha"), &mut ctx).unwrap();
        w.remove_stale(spec, RecordKind::Agent, "bravo", &mut ctx).unwrap();
        assert_eq!(w.flush_manifests(&mut ctx, ManifestMode::Merge), 1);
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "charlie\nalpha\ndelta\n");
    }

    #[test]
    fn remove_stale_deletes_agent_file_and_skill_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let reg = default_registry();
        let w = OutputWriter::new(tmp.path());
        let mut ctx = CompileContext::default();

        let claude = reg.get("claude").unwrap();
        w.write(claude, &agent_artifact(&w, claude, "a"), &mut ctx).unwrap();
        let gemini = reg.get("gemini").unwrap();
        let skill_path = w.artifact_path(gemini, RecordKind::Skill, "docx");
        fs::create_dir_all(skill_path.parent().unwrap()).unwrap();
        fs::write(&skill_path, "old").unwrap();
        fs::write(skill_path.with_file_name("extra.txt"), "asset").unwrap();

        w.remove_stale(claude, RecordKind::Agent, "a", &mut ctx).unwrap();
        w.remove_stale(gemini, RecordKind::Skill, "docx", &mut ctx).unwrap();
        w.remove_stale(gemini, RecordKind::Skill, "never-there", &mut ctx).unwrap();
        assert!(!w.artifact_path(claude, RecordKind::Agent, "a").exists());
        assert!(!skill_path.parent().unwrap().exists());
        assert_eq!(ctx.counters.removed, 2);

        // Replace mode: claude keeps no names, so nothing is left to list.
        let manifest = w.kind_dir(claude, RecordKind::Agent).join(MANIFEST_FILE);
        fs::write(&manifest, "a\n").unwrap();
        ctx = CompileContext::default();
        w.remove_stale(claude, RecordKind::Agent, "a", &mut ctx).unwrap();
        assert_eq!(w.flush_manifests(&mut ctx, ManifestMode::Replace), 0);
        assert!(!manifest.exists());
    }
}
