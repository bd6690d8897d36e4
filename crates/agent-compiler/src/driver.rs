//! Compile runs: selection, validation, per-provider map/render/write and
//! the aggregate report.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::{CompileContext, RunReport};
use crate::error::CompileError;
use crate::model::{ProviderArtifact, RecordKind, UniversalRecord};
use crate::provider::{MapOutcome, ProviderRegistry, ProviderSpec, SkipReason, map_record};
use crate::render::render;
use crate::schema::{SchemaError, parse_and_validate};
use crate::writer::{ManifestMode, OutputWriter};

/// Which records a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every record of the enabled kinds.
    Kinds { agents: bool, skills: bool },
    /// Only the named records.
    Named {
        agents: Vec<String>,
        skills: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub agents_dir: PathBuf,
    pub skills_dir: PathBuf,
    pub output_dir: PathBuf,
    pub selection: Selection,
    /// Requested provider ids; empty means all.
    pub providers: Vec<String>,
    pub validate_only: bool,
}

impl DriverSettings {
    fn input_dir(&self, kind: RecordKind) -> &Path {
        match kind {
            RecordKind::Agent => &self.agents_dir,
            RecordKind::Skill => &self.skills_dir,
        }
    }
}

/// Run one compile. `Err` only for failures that abort before any record is
/// touched; per-record failures are in the report.
pub fn run(settings: &DriverSettings, registry: &ProviderRegistry) -> Result<RunReport, CompileError> {
    let providers = registry.select(&settings.providers)?;
    tracing::info!(
        "compiling for providers: {}",
        providers
            .iter()
            .map(|p| p.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut ctx = CompileContext::default();
    let sources = collect_sources(settings, &mut ctx)?;
    let writer = OutputWriter::new(&settings.output_dir);
    let compiler = Compiler {
        providers: &providers,
        registry,
        writer: &writer,
        validate_only: settings.validate_only,
    };
    for (kind, paths) in sources {
        compiler.compile_kind(kind, &paths, &mut ctx);
    }

    if !settings.validate_only {
        let mode = match settings.selection {
            Selection::Kinds { .. } => ManifestMode::Replace,
            Selection::Named { .. } => ManifestMode::Merge,
        };
        let n = writer.flush_manifests(&mut ctx, mode);
        tracing::debug!("{} manifest(s) written", n);
    }
    Ok(ctx.into_report())
}

/// Resolve the source files per kind, in processing order.
fn collect_sources(
    settings: &DriverSettings,
    ctx: &mut CompileContext,
) -> Result<Vec<(RecordKind, Vec<PathBuf>)>, CompileError> {
    let mut out = Vec::new();
    match &settings.selection {
        Selection::Kinds { agents, skills } => {
            for (kind, enabled) in [(RecordKind::Agent, *agents), (RecordKind::Skill, *skills)] {
                if enabled {
                    out.push((kind, discover(settings.input_dir(kind))?));
                }
            }
        }
        Selection::Named { agents, skills } => {
            for (kind, names) in [(RecordKind::Agent, agents), (RecordKind::Skill, skills)] {
                if names.is_empty() {
                    continue;
                }
                let dir = settings.input_dir(kind);
                let mut paths = Vec::new();
                for name in names {
                    let path = dir.join(format!("{name}.json"));
                    if path.is_file() {
                        paths.push(path);
                    } else {
                        ctx.record_failure(CompileError::RecordNotFound {
                            kind,
                            name: name.clone(),
                            path,
                        });
                    }
                }
                out.push((kind, paths));
            }
        }
    }
    Ok(out)
}

/// `*.json` files directly under `dir`, sorted by file name. A missing
/// directory yields nothing.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, CompileError> {
    if !dir.exists() {
        tracing::warn!("input directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }
    let io_err = |source| CompileError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn load_record(path: &Path, kind: RecordKind) -> Result<UniversalRecord, CompileError> {
    let content = fs::read_to_string(path).map_err(|source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_and_validate(&content, kind, path)?)
}

struct Compiler<'a> {
    providers: &'a [&'a ProviderSpec],
    registry: &'a ProviderRegistry,
    writer: &'a OutputWriter,
    validate_only: bool,
}

impl Compiler<'_> {
    fn compile_kind(&self, kind: RecordKind, paths: &[PathBuf], ctx: &mut CompileContext) {
        let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
        for path in paths {
            ctx.counters.records += 1;
            let record = match load_record(path, kind) {
                Ok(r) => r,
                Err(e) => {
                    ctx.record_failure(e);
                    continue;
                }
            };
            if let Some(first) = seen.get(&record.name) {
                ctx.record_failure(
                    SchemaError::single(
                        kind,
                        path,
                        "name",
                        "unique name",
                        format!("'{}' already defined in {}", record.name, first.display()),
                    )
                    .into(),
                );
                continue;
            }
            seen.insert(record.name.clone(), path.clone());
            self.warn_unknown_providers(&record, path);

            if self.validate_only {
                tracing::debug!("{} '{}' is valid", kind, record.name);
                continue;
            }
            for spec in self.providers {
                self.compile_for(&record, spec, ctx);
            }
        }
    }

    fn warn_unknown_providers(&self, record: &UniversalRecord, path: &Path) {
        for id in record.providers.keys() {
            if !self.registry.contains(id) {
                tracing::warn!("{}: unknown provider '{}' ignored", path.display(), id);
            }
        }
    }

    fn compile_for(&self, record: &UniversalRecord, spec: &ProviderSpec, ctx: &mut CompileContext) {
        let shaped = match map_record(record, spec) {
            MapOutcome::Shaped(shaped) => shaped,
            MapOutcome::Skip(reason) => {
                ctx.counters.skipped += 1;
                tracing::debug!(
                    "skip {} '{}' for {}: {:?}",
                    record.kind,
                    record.name,
                    spec.id,
                    reason
                );
                if reason == SkipReason::Disabled
                    && let Err(e) = self.writer.remove_stale(spec, record.kind, &record.name, ctx)
                {
                    ctx.record_failure(e);
                }
                return;
            }
        };
        let content = match render(&shaped.fields, &record.prompt_body, &spec.marker) {
            Ok(content) => content,
            Err(source) => {
                ctx.record_failure(CompileError::Render {
                    provider: spec.id.clone(),
                    name: record.name.clone(),
                    source,
                });
                return;
            }
        };
        let artifact = ProviderArtifact {
            provider: spec.id.clone(),
            kind: record.kind,
            name: record.name.clone(),
            path: self.writer.artifact_path(spec, record.kind, &record.name),
            content,
        };
        match self.writer.write(spec, &artifact, ctx) {
            Ok(()) => tracing::info!("wrote {}", artifact.path.display()),
            Err(e) => ctx.record_failure(e),
        }
    }
}
