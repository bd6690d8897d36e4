use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Whether a record describes an agent persona or a skill bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    Agent,
    Skill,
}

impl RecordKind {
    /// Directory name used for both inputs (`agents/`) and outputs (`.claude/agents/`).
    pub fn dir_name(self) -> &'static str {
        match self {
            RecordKind::Agent => "agents",
            RecordKind::Skill => "skills",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Agent => f.write_str("agent"),
            RecordKind::Skill => f.write_str("skill"),
        }
    }
}

/// Policy value attached to a permission action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionPolicy {
    Allow,
    Deny,
    Ask,
}

impl PermissionPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(PermissionPolicy::Allow),
            "deny" => Some(PermissionPolicy::Deny),
            "ask" => Some(PermissionPolicy::Ask),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionPolicy::Allow => "allow",
            PermissionPolicy::Deny => "deny",
            PermissionPolicy::Ask => "ask",
        }
    }
}

/// Copilot hand-off button: label shown to the user and the agent it switches to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Handoff {
    pub label: String,
    pub agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send: Option<bool>,
}

/// Validated, provider-neutral description of one agent or skill.
#[derive(Debug, Clone, PartialEq)]
pub struct UniversalRecord {
    pub kind: RecordKind,
    pub name: String,
    pub description: String,
    /// Capability identifiers in source order, duplicates removed.
    pub tools: Vec<String>,
    pub permissions: BTreeMap<String, PermissionPolicy>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub temperature: Option<f64>,
    pub max_iterations: Option<u64>,
    /// Provider id -> enablement. Missing ids are disabled.
    pub providers: BTreeMap<String, bool>,
    /// Instructional body copied verbatim below the front matter.
    pub prompt_body: String,
    pub handoffs: Vec<Handoff>,
    pub mcp_servers: Option<JsonMap<String, JsonValue>>,
    pub target: Option<String>,
    pub version: Option<String>,
    pub tags: Vec<String>,
}

impl UniversalRecord {
    /// A provider produces an artifact only when explicitly enabled.
    pub fn is_enabled_for(&self, provider: &str) -> bool {
        self.providers.get(provider).copied().unwrap_or(false)
    }
}
