//! Schema validation for universal agent/skill JSON records.
//!
//! Validation walks the raw JSON value and records every problem it finds
//! before deciding, so one pass reports all missing or malformed fields. A
//! record is accepted only when no issue was recorded.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::model::{
    Handoff, PermissionPolicy, RecordKind, UniversalRecord, dedupe_in_order, is_safe_name,
};

const AGENT_KEYS: &[&str] = &[
    "$schema",
    "name",
    "description",
    "tools",
    "permissions",
    "model",
    "color",
    "temperature",
    "maxIterations",
    "providers",
    "prompt",
    "promptBody",
    "handoffs",
    "mcpServers",
    "target",
];

const SKILL_KEYS: &[&str] = &[
    "$schema",
    "name",
    "description",
    "tools",
    "providers",
    "instructions",
    "promptBody",
    "version",
    "tags",
];

/// One missing or malformed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted/indexed path, e.g. `tools`, `tools[1]`, `providers.claude`.
    pub field: String,
    pub expected: &'static str,
    pub found: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.field, self.expected, self.found
        )
    }
}

/// All issues found in one record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub kind: RecordKind,
    pub path: PathBuf,
    pub issues: Vec<FieldIssue>,
}

impl SchemaError {
    pub fn single(
        kind: RecordKind,
        path: &Path,
        field: &str,
        expected: &'static str,
        found: String,
    ) -> Self {
        SchemaError {
            kind,
            path: path.to_path_buf(),
            issues: vec![FieldIssue {
                field: field.to_string(),
                expected,
                found,
            }],
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: ", self.kind, self.path.display())?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// JSON type name used in issue messages.
fn type_name(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Parse file content as JSON and validate it as a record of `kind`.
pub fn parse_and_validate(
    content: &str,
    kind: RecordKind,
    path: &Path,
) -> Result<UniversalRecord, SchemaError> {
    let raw: JsonValue = serde_json::from_str(content).map_err(|e| {
        SchemaError::single(
            kind,
            path,
            "<root>",
            "JSON object",
            format!("invalid JSON ({e})"),
        )
    })?;
    validate(&raw, kind, path)
}

/// Validate a parsed JSON value as a record of `kind`.
pub fn validate(
    raw: &JsonValue,
    kind: RecordKind,
    path: &Path,
) -> Result<UniversalRecord, SchemaError> {
    let Some(obj) = raw.as_object() else {
        return Err(SchemaError::single(
            kind,
            path,
            "<root>",
            "object",
            type_name(raw).to_string(),
        ));
    };

    let mut ck = Checker {
        obj,
        issues: Vec::new(),
    };

    let name = ck.required_string("name");
    if let Some(n) = name.as_deref()
        && !is_safe_name(n)
    {
        ck.issue("name", "filesystem-safe identifier", format!("{n:?}"));
    }
    let description = ck.required_string("description");
    let tools = ck.string_list("tools", kind == RecordKind::Agent);
    let providers = ck.providers();

    let record = match kind {
        RecordKind::Agent => {
            let permissions = ck.permissions();
            let model = ck.optional_string("model");
            let color = ck.optional_string("color");
            let temperature = ck.optional_number("temperature");
            let max_iterations = ck.optional_positive_int("maxIterations");
            let prompt_body = ck.body(&["prompt", "promptBody"]);
            let handoffs = ck.handoffs();
            let mcp_servers = ck.mcp_servers();
            let target = ck.optional_string("target");
            UniversalRecord {
                kind,
                name: name.unwrap_or_default(),
                description: description.unwrap_or_default(),
                tools,
                permissions,
                model,
                color,
                temperature,
                max_iterations,
                providers,
                prompt_body,
                handoffs,
                mcp_servers,
                target,
                version: None,
                tags: Vec::new(),
            }
        }
        RecordKind::Skill => {
            let prompt_body = ck.body(&["instructions", "promptBody"]);
            let version = ck.optional_string("version");
            let tags = ck.string_list("tags", false);
            UniversalRecord {
                kind,
                name: name.unwrap_or_default(),
                description: description.unwrap_or_default(),
                tools,
                permissions: BTreeMap::new(),
                model: None,
                color: None,
                temperature: None,
                max_iterations: None,
                providers,
                prompt_body,
                handoffs: Vec::new(),
                mcp_servers: None,
                target: None,
                version,
                tags,
            }
        }
    };

    let known = match kind {
        RecordKind::Agent => AGENT_KEYS,
        RecordKind::Skill => SKILL_KEYS,
    };
    let unknown: Vec<&str> = obj
        .keys()
        .map(String::as_str)
        .filter(|k| !known.contains(k))
        .collect();
    if !unknown.is_empty() {
        tracing::debug!(
            "unrecognized keys in {}: {}",
            path.display(),
            unknown.join(", ")
        );
    }

    if ck.issues.is_empty() {
        Ok(record)
    } else {
        Err(SchemaError {
            kind,
            path: path.to_path_buf(),
            issues: ck.issues,
        })
    }
}

struct Checker<'a> {
    obj: &'a JsonMap<String, JsonValue>,
    issues: Vec<FieldIssue>,
}

impl Checker<'_> {
    fn issue(&mut self, field: impl Into<String>, expected: &'static str, found: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.into(),
            expected,
            found: found.into(),
        });
    }

    fn required_string(&mut self, key: &str) -> Option<String> {
        match self.obj.get(key) {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(other) => {
                self.issue(key, "string", type_name(other));
                None
            }
            None => {
                self.issue(key, "string", "missing");
                None
            }
        }
    }

    fn optional_string(&mut self, key: &str) -> Option<String> {
        match self.obj.get(key) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(other) => {
                self.issue(key, "string", type_name(other));
                None
            }
        }
    }

    fn optional_number(&mut self, key: &str) -> Option<f64> {
        match self.obj.get(key) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Number(n)) => n.as_f64(),
            Some(other) => {
                self.issue(key, "number", type_name(other));
                None
            }
        }
    }

    fn optional_positive_int(&mut self, key: &str) -> Option<u64> {
        match self.obj.get(key) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Number(n)) => match n.as_u64() {
                Some(v) if v > 0 => Some(v),
                _ => {
                    self.issue(key, "positive integer", n.to_string());
                    None
                }
            },
            Some(other) => {
                self.issue(key, "positive integer", type_name(other));
                None
            }
        }
    }

    /// Array of strings; every bad element is reported by index.
    fn string_list(&mut self, key: &str, required: bool) -> Vec<String> {
        let items = match self.obj.get(key) {
            Some(JsonValue::Array(items)) => items,
            None if !required => return Vec::new(),
            Some(JsonValue::Null) if !required => return Vec::new(),
            None => {
                self.issue(key, "array of strings", "missing");
                return Vec::new();
            }
            Some(other) => {
                self.issue(key, "array of strings", type_name(other));
                return Vec::new();
            }
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                JsonValue::String(s) if !s.trim().is_empty() => out.push(s.clone()),
                JsonValue::String(_) => {
                    self.issue(format!("{key}[{i}]"), "non-empty string", "blank string")
                }
                other => self.issue(format!("{key}[{i}]"), "string", type_name(other)),
            }
        }
        dedupe_in_order(out)
    }

    fn providers(&mut self) -> BTreeMap<String, bool> {
        let mut out = BTreeMap::new();
        match self.obj.get("providers") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Object(map)) => {
                for (id, flag) in map {
                    match flag {
                        JsonValue::Bool(b) => {
                            out.insert(id.clone(), *b);
                        }
                        other => self.issue(format!("providers.{id}"), "boolean", type_name(other)),
                    }
                }
            }
            Some(other) => self.issue("providers", "object of booleans", type_name(other)),
        }
        out
    }

    fn permissions(&mut self) -> BTreeMap<String, PermissionPolicy> {
        let mut out = BTreeMap::new();
        match self.obj.get("permissions") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Object(map)) => {
                for (action, policy) in map {
                    let field = format!("permissions.{action}");
                    match policy {
                        JsonValue::String(s) => match PermissionPolicy::parse(s) {
                            Some(p) => {
                                out.insert(action.clone(), p);
                            }
                            None => self.issue(field, "one of allow|deny|ask", format!("{s:?}")),
                        },
                        other => self.issue(field, "one of allow|deny|ask", type_name(other)),
                    }
                }
            }
            Some(other) => self.issue("permissions", "object", type_name(other)),
        }
        out
    }

    /// First present key wins; absent body is empty.
    fn body(&mut self, keys: &[&str]) -> String {
        for key in keys {
            match self.obj.get(*key) {
                None | Some(JsonValue::Null) => continue,
                Some(JsonValue::String(s)) => return s.clone(),
                Some(other) => {
                    self.issue(*key, "string", type_name(other));
                    return String::new();
                }
            }
        }
        String::new()
    }

    fn handoffs(&mut self) -> Vec<Handoff> {
        let items = match self.obj.get("handoffs") {
            None | Some(JsonValue::Null) => return Vec::new(),
            Some(JsonValue::Array(items)) => items,
            Some(other) => {
                self.issue("handoffs", "array of objects", type_name(other));
                return Vec::new();
            }
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let Some(h) = item.as_object() else {
                self.issue(format!("handoffs[{i}]"), "object", type_name(item));
                continue;
            };
            let mut text = |key: &str, required: bool| -> Option<String> {
                match h.get(key) {
                    Some(JsonValue::String(s)) => Some(s.clone()),
                    None if !required => None,
                    None => {
                        self.issue(format!("handoffs[{i}].{key}"), "string", "missing");
                        None
                    }
                    Some(other) => {
                        self.issue(format!("handoffs[{i}].{key}"), "string", type_name(other));
                        None
                    }
                }
            };
            let label = text("label", true);
            let agent = text("agent", true);
            let prompt = text("prompt", false);
            let send = match h.get("send") {
                None => None,
                Some(JsonValue::Bool(b)) => Some(*b),
                Some(other) => {
                    self.issue(format!("handoffs[{i}].send"), "boolean", type_name(other));
                    None
                }
            };
            if let (Some(label), Some(agent)) = (label, agent) {
                out.push(Handoff {
                    label,
                    agent,
                    prompt,
                    send,
                });
            }
        }
        out
    }

    fn mcp_servers(&mut self) -> Option<JsonMap<String, JsonValue>> {
        match self.obj.get("mcpServers") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Object(map)) => {
                let mut ok = true;
                for (key, def) in map {
                    if !def.is_object() {
                        self.issue(format!("mcpServers.{key}"), "object", type_name(def));
                        ok = false;
                    }
                }
                if ok && !map.is_empty() {
                    Some(map.clone())
                } else {
                    None
                }
            }
            Some(other) => {
                self.issue("mcpServers", "object", type_name(other));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path() -> &'static Path {
        Path::new("agents/example.json")
    }

    fn fields(err: &SchemaError) -> Vec<&str> {
        err.issues.iter().map(|i| i.field.as_str()).collect()
    }

    #[test]
    fn accepts_minimal_agent() {
        let raw = json!({
            "name": "security-auditor",
            "description": "Audits code",
            "tools": ["read", "grep", "read"],
            "providers": {"claude": true, "opencode": false},
            "prompt": "You audit.\n\nCarefully."
        });
        let rec = validate(&raw, RecordKind::Agent, path()).expect("valid");
        assert_eq!(rec.name, "security-auditor");
        assert_eq!(rec.tools, vec!["read", "grep"]);
        assert!(rec.is_enabled_for("claude"));
        assert!(!rec.is_enabled_for("opencode"));
        assert!(!rec.is_enabled_for("copilot"));
        assert_eq!(rec.prompt_body, "You audit.\n\nCarefully.");
        assert!(rec.permissions.is_empty());
    }

    #[test]
    fn reports_every_missing_field() {
        let raw = json!({ "name": "x" });
        let err = validate(&raw, RecordKind::Agent, path()).unwrap_err();
        assert_eq!(fields(&err), vec!["description", "tools"]);
        assert!(err.issues.iter().all(|i| i.found == "missing"));
    }

    #[test]
    fn tools_as_string_is_named_with_expected_type() {
        let raw = json!({ "name": "x", "description": "d", "tools": "read" });
        let err = validate(&raw, RecordKind::Agent, path()).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        let issue = &err.issues[0];
        assert_eq!(issue.field, "tools");
        assert_eq!(issue.expected, "array of strings");
        assert_eq!(issue.found, "string");
        let msg = err.to_string();
        assert!(msg.contains("tools: expected array of strings, found string"), "{msg}");
    }

    #[test]
    fn skills_do_not_require_tools() {
        let raw = json!({
            "name": "docx-creation",
            "description": "Create docx files",
            "instructions": "Step 1",
            "version": "1.2.0",
            "tags": ["docs", "office"],
            "providers": {"gemini": true}
        });
        let rec = validate(&raw, RecordKind::Skill, Path::new("skills/docx.json")).expect("valid");
        assert!(rec.tools.is_empty());
        assert_eq!(rec.prompt_body, "Step 1");
        assert_eq!(rec.version.as_deref(), Some("1.2.0"));
        assert_eq!(rec.tags, vec!["docs", "office"]);
    }

    #[test]
    fn nested_issues_carry_paths() {
        let raw = json!({
            "name": "bad name",
            "description": 3,
            "tools": ["read", 7, ""],
            "permissions": {"edit": "maybe", "bash": "ask"},
            "providers": {"claude": "yes"},
            "temperature": "hot",
            "maxIterations": 0,
            "handoffs": [{"label": "Next"}],
            "mcpServers": {"memory": []}
        });
        let err = validate(&raw, RecordKind::Agent, path()).unwrap_err();
        let got = fields(&err);
        for expected in [
            "name",
            "description",
            "tools[1]",
            "tools[2]",
            "providers.claude",
            "permissions.edit",
            "temperature",
            "maxIterations",
            "handoffs[0].agent",
            "mcpServers.memory",
        ] {
            assert!(got.contains(&expected), "missing {expected} in {got:?}");
        }
        assert!(!got.contains(&"permissions.bash"));
    }

    #[test]
    fn invalid_json_is_a_root_issue() {
        let err = parse_and_validate("{ not json", RecordKind::Skill, path()).unwrap_err();
        assert_eq!(fields(&err), vec!["<root>"]);
        assert!(err.issues[0].found.starts_with("invalid JSON"));

        let err = parse_and_validate("[1, 2]", RecordKind::Skill, path()).unwrap_err();
        assert_eq!(err.issues[0].expected, "object");
        assert_eq!(err.issues[0].found, "array");
    }

    #[test]
    fn agent_extras_are_typed() {
        let raw = json!({
            "name": "planner",
            "description": "Plans",
            "tools": [],
            "permissions": {"edit": "deny", "bash": "ask"},
            "model": "sonnet",
            "temperature": 0.2,
            "maxIterations": 12,
            "handoffs": [{"label": "Implement", "agent": "coder", "send": true}],
            "mcpServers": {"memory": {"command": "npx"}},
            "target": "vscode",
            "promptBody": "Plan it."
        });
        let rec = validate(&raw, RecordKind::Agent, path()).expect("valid");
        assert_eq!(rec.permissions.get("edit"), Some(&PermissionPolicy::Deny));
        assert_eq!(rec.temperature, Some(0.2));
        assert_eq!(rec.max_iterations, Some(12));
        assert_eq!(rec.handoffs[0].agent, "coder");
        assert_eq!(rec.handoffs[0].send, Some(true));
        assert!(rec.mcp_servers.is_some());
        assert_eq!(rec.target.as_deref(), Some("vscode"));
        assert_eq!(rec.prompt_body, "Plan it.");
    }

    #[test]
    fn tool_ids_are_kept_verbatim() {
        let raw = json!({
            "name": "x",
            "description": "d",
            "tools": [" custom tool ", "read", "   "]
        });
        let err = validate(&raw, RecordKind::Agent, path()).unwrap_err();
        assert_eq!(fields(&err), vec!["tools[2]"]);
        assert_eq!(err.issues[0].found, "blank string");

        let raw = json!({ "name": "x", "description": "d", "tools": [" custom tool ", "read"] });
        let rec = validate(&raw, RecordKind::Agent, path()).expect("valid");
        assert_eq!(rec.tools, vec![" custom tool ", "read"]);
    }
}
