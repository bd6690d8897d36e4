mod cli;
mod config;
mod context;
mod driver;
mod error;
mod model;
mod provider;
mod render;
mod schema;
mod writer;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory, Parser};
use env_flags::env_flags;
use once_cell::sync::OnceCell;
use tracing_subscriber::Registry;

use crate::cli::Cli;
use crate::config::{LoggingCfg, PathLayers, ResolvedPaths, UserConfig};
use crate::context::RunReport;
use crate::driver::DriverSettings;
use crate::provider::ProviderRegistry;

type BoxedLayer = Box<dyn tracing_subscriber::Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
enum LogStyle {
    Json,
    Pretty,
    Compact,
    Full,
}

fn fmt_layer<W>(writer: W, ansi: bool, style: LogStyle) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    use tracing_subscriber::Layer;

    let base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(ansi)
        .with_writer(writer);
    match style {
        LogStyle::Json => base.json().boxed(),
        LogStyle::Pretty => base.pretty().boxed(),
        LogStyle::Compact => base.compact().boxed(),
        LogStyle::Full => base.boxed(),
    }
}

fn init_tracing(logging: Option<&LoggingCfg>, root: &Path) {
    env_flags! {
        /// Tracing filter, e.g. "info", "debug", or targets format.
        RUST_LOG: &str = "info";
        /// Preferred filter env (alias). If set, overrides RUST_LOG.
        TRACING_FILTER: &str = "";
        /// Pretty formatting for logs (ignored if TRACING_JSON=true).
        TRACING_PRETTY: bool = false;
        /// Compact single-line formatting for logs (ignored if TRACING_JSON=true)
        TRACING_COMPACT: bool = true;
        /// JSON formatting for logs
        TRACING_JSON: bool = false;
        /// If true, also log to a daily file under LOG_DIR
        LOG_TO_FILE: bool = false;
        /// Log directory. Defaults to <root>/.agent-compiler/logs
        LOG_DIR: &str = "";
    }

    use tracing_subscriber::{EnvFilter, prelude::*};

    static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

    let env_set = |k: &str| std::env::var_os(k).is_some();

    // TRACING_FILTER first, then RUST_LOG, then the config file.
    let mut rust_log = if !(*TRACING_FILTER).is_empty() {
        (*TRACING_FILTER).to_string()
    } else {
        (*RUST_LOG).to_string()
    };
    let mut tracing_json = *TRACING_JSON;
    let mut tracing_compact = *TRACING_COMPACT;
    let mut tracing_pretty = *TRACING_PRETTY;
    let mut log_to_file = *LOG_TO_FILE;
    let mut log_dir: Option<PathBuf> = if !(*LOG_DIR).is_empty() {
        Some(config::expand_home(*LOG_DIR))
    } else {
        None
    };

    if let Some(cfg) = logging {
        if !(env_set("TRACING_FILTER") || env_set("RUST_LOG"))
            && let Some(level) = cfg.level.as_ref()
        {
            rust_log = level.clone();
        }
        if !env_set("TRACING_JSON")
            && let Some(v) = cfg.json
        {
            tracing_json = v;
        }
        if !env_set("TRACING_COMPACT")
            && let Some(v) = cfg.compact
        {
            tracing_compact = v;
        }
        if !env_set("TRACING_PRETTY")
            && let Some(v) = cfg.pretty
        {
            tracing_pretty = v;
        }
        if !env_set("LOG_TO_FILE")
            && let Some(v) = cfg.to_file
        {
            log_to_file = v;
        }
        if !env_set("LOG_DIR")
            && let Some(dir) = cfg.dir.as_ref()
        {
            log_dir = Some(root.join(config::expand_home(dir)));
        }
    }

    let style = if tracing_json {
        LogStyle::Json
    } else if tracing_pretty {
        LogStyle::Pretty
    } else if tracing_compact {
        LogStyle::Compact
    } else {
        LogStyle::Full
    };
    let filter = EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(std::io::stderr, true, style)];
    let mut file_err = None;
    if log_to_file {
        let dir = log_dir.unwrap_or_else(|| root.join(".agent-compiler").join("logs"));
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&dir, "agent-compiler.log");
                let (nb, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                layers.push(fmt_layer(nb, false, style));
            }
            Err(e) => file_err = Some((dir, e)),
        }
    }

    if let Err(e) = tracing_subscriber::registry().with(layers).with(filter).try_init() {
        tracing::debug!("tracing already set: {:?}", e);
    }
    if let Some((dir, e)) = file_err {
        tracing::warn!("failed to create log dir {}: {}", dir.display(), e);
    }
}

/// Explicit `--config` must exist; the default `<root>/agent-compiler.toml`
/// is optional.
fn load_config(cli: &Cli) -> anyhow::Result<Option<UserConfig>> {
    let path = match &cli.config {
        Some(path) => {
            anyhow::ensure!(path.is_file(), "config file {} not found", path.display());
            path.clone()
        }
        None => cli.root.join(config::CONFIG_FILE),
    };
    config::load_user_config(&path).with_context(|| format!("invalid config {}", path.display()))
}

fn load_registry(paths: &ResolvedPaths) -> anyhow::Result<ProviderRegistry> {
    if paths.providers_file_explicit || paths.providers_file.is_file() {
        tracing::info!("provider table: {}", paths.providers_file.display());
        return provider::load_from_file(&paths.providers_file);
    }
    Ok(provider::load_default())
}

fn compile(cli: &Cli, cfg: Option<&UserConfig>) -> anyhow::Result<RunReport> {
    env_flags! {
        /// Output directory, relative to --root unless absolute.
        AGENT_COMPILER_OUTPUT: &str = "";
        /// Provider table overrides file, relative to --root unless absolute.
        AGENT_COMPILER_PROVIDERS: &str = "";
    }

    let paths_cfg = cfg.and_then(|c| c.paths.as_ref());
    let paths = config::resolve_paths(
        &cli.root,
        paths_cfg,
        PathLayers {
            cli: cli.output.as_deref(),
            env: *AGENT_COMPILER_OUTPUT,
            cfg: paths_cfg.and_then(|p| p.output_dir.as_deref()),
        },
        PathLayers {
            cli: cli.providers_file.as_deref(),
            env: *AGENT_COMPILER_PROVIDERS,
            cfg: paths_cfg.and_then(|p| p.providers_file.as_deref()),
        },
    );
    tracing::debug!(
        "agents={} skills={} output={}",
        paths.agents_dir.display(),
        paths.skills_dir.display(),
        paths.output_dir.display()
    );

    let registry = load_registry(&paths)?;
    tracing::info!("{} provider(s) registered", registry.len());

    let settings = DriverSettings {
        agents_dir: paths.agents_dir,
        skills_dir: paths.skills_dir,
        output_dir: paths.output_dir,
        selection: cli.selection(),
        providers: cli.providers.clone(),
        validate_only: cli.validate,
    };
    Ok(driver::run(&settings, &registry)?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if !cli.has_action() {
        let _ = Cli::command().print_help();
        return ExitCode::from(2);
    }

    let (user_cfg, cfg_err) = match load_config(&cli) {
        Ok(cfg) => (cfg, None),
        Err(e) => (None, Some(e)),
    };
    init_tracing(user_cfg.as_ref().and_then(|c| c.logging.as_ref()), &cli.root);
    if let Some(e) = cfg_err {
        tracing::error!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match compile(&cli, user_cfg.as_ref()) {
        Ok(report) => {
            println!("{report}");
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
