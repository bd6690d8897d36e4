use std::path::PathBuf;

use clap::Parser;

use crate::driver::Selection;

#[derive(Debug, Parser)]
#[command(
    name = "agent-compiler",
    version,
    about = "Compile universal agent and skill definitions into provider-specific files"
)]
pub struct Cli {
    /// Compile every agent and skill
    #[arg(long)]
    pub all: bool,

    /// Compile one agent by name (repeatable)
    #[arg(long = "agent", value_name = "NAME")]
    pub agents: Vec<String>,

    /// Compile one skill by name (repeatable)
    #[arg(long = "skill", value_name = "NAME")]
    pub skills: Vec<String>,

    /// Restrict output to a provider (repeatable; default: all providers)
    #[arg(long = "provider", value_name = "ID")]
    pub providers: Vec<String>,

    /// Only compile agents
    #[arg(long, conflicts_with = "skills_only")]
    pub agents_only: bool,

    /// Only compile skills
    #[arg(long)]
    pub skills_only: bool,

    /// Validate records without writing anything
    #[arg(long)]
    pub validate: bool,

    /// Project root holding agents/ and skills/
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Config file (default: <root>/agent-compiler.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory (default: <root>/output)
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Provider table overrides (default: <root>/providers.toml if present)
    #[arg(long = "providers-file", value_name = "FILE")]
    pub providers_file: Option<PathBuf>,
}

impl Cli {
    /// At least one flag that selects work was given.
    pub fn has_action(&self) -> bool {
        self.all
            || self.validate
            || self.agents_only
            || self.skills_only
            || !self.agents.is_empty()
            || !self.skills.is_empty()
    }

    /// Named records win over kind filters.
    pub fn selection(&self) -> Selection {
        if !self.agents.is_empty() || !self.skills.is_empty() {
            return Selection::Named {
                agents: self.agents.clone(),
                skills: self.skills.clone(),
            };
        }
        let (agents, skills) = match (self.agents_only, self.skills_only) {
            (true, _) => (true, false),
            (_, true) => (false, true),
            _ => (true, true),
        };
        Selection::Kinds { agents, skills }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("agent-compiler").chain(args.iter().copied()))
            .expect("valid args")
    }

    #[test]
    fn no_flags_means_no_action() {
        assert!(!parse(&[]).has_action());
        assert!(!parse(&["--provider", "claude", "--root", "x"]).has_action());
    }

    #[test]
    fn repeatable_agent_and_provider() {
        let cli = parse(&["--agent", "a", "--agent", "b", "--provider", "claude"]);
        assert!(cli.has_action());
        assert_eq!(cli.providers, vec!["claude"]);
        assert_eq!(
            cli.selection(),
            Selection::Named {
                agents: vec!["a".into(), "b".into()],
                skills: vec![],
            }
        );
    }

    #[test]
    fn kind_filters() {
        assert_eq!(
            parse(&["--all"]).selection(),
            Selection::Kinds {
                agents: true,
                skills: true
            }
        );
        assert_eq!(
            parse(&["--all", "--skills-only"]).selection(),
            Selection::Kinds {
                agents: false,
                skills: true
            }
        );
        assert_eq!(
            parse(&["--validate", "--agents-only"]).selection(),
            Selection::Kinds {
                agents: true,
                skills: false
            }
        );
    }

    #[test]
    fn only_flags_conflict() {
        let res = Cli::try_parse_from(["agent-compiler", "--agents-only", "--skills-only"]);
        assert!(res.is_err());
    }

    #[test]
    fn root_defaults_to_cwd() {
        assert_eq!(parse(&["--all"]).root, PathBuf::from("."));
    }
}
