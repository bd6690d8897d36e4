use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "agent-compiler.toml";
pub const PROVIDERS_FILE: &str = "providers.toml";

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub logging: Option<LoggingCfg>,
    pub paths: Option<PathsCfg>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingCfg {
    pub to_file: Option<bool>,
    pub dir: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PathsCfg {
    pub agents_dir: Option<String>,  // relative to the root unless absolute
    pub skills_dir: Option<String>,
    pub output_dir: Option<String>,
    pub providers_file: Option<String>,
}

/// Read `path` if it exists. `Ok(None)` means there is no config file.
pub fn load_user_config(path: &Path) -> anyhow::Result<Option<UserConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(path)?;
    let cfg: UserConfig = toml::from_str(&s)?;
    Ok(Some(cfg))
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Input and output locations after applying CLI > env > config > default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub agents_dir: PathBuf,
    pub skills_dir: PathBuf,
    pub output_dir: PathBuf,
    pub providers_file: PathBuf,
    /// False when falling back to `<root>/providers.toml`, which may be absent.
    pub providers_file_explicit: bool,
}

/// One path setting from each layer, highest precedence first. CLI paths are
/// taken as given; env and config paths are relative to the root. Empty env
/// values count as unset.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLayers<'a> {
    pub cli: Option<&'a Path>,
    pub env: &'a str,
    pub cfg: Option<&'a str>,
}

impl PathLayers<'_> {
    fn pick(&self, root: &Path) -> Option<PathBuf> {
        if let Some(p) = self.cli {
            return Some(p.to_path_buf());
        }
        if !self.env.is_empty() {
            return Some(root.join(expand_home(self.env)));
        }
        self.cfg.map(|c| root.join(expand_home(c)))
    }
}

pub fn resolve_paths(
    root: &Path,
    cfg: Option<&PathsCfg>,
    output: PathLayers<'_>,
    providers: PathLayers<'_>,
) -> ResolvedPaths {
    let from_cfg = |value: Option<&String>, default: &str| {
        value
            .map(|v| root.join(expand_home(v)))
            .unwrap_or_else(|| root.join(default))
    };
    let providers_file = providers.pick(root);
    ResolvedPaths {
        agents_dir: from_cfg(cfg.and_then(|c| c.agents_dir.as_ref()), "agents"),
        skills_dir: from_cfg(cfg.and_then(|c| c.skills_dir.as_ref()), "skills"),
        output_dir: output.pick(root).unwrap_or_else(|| root.join("output")),
        providers_file_explicit: providers_file.is_some(),
        providers_file: providers_file.unwrap_or_else(|| root.join(PROVIDERS_FILE)),
    }
}
