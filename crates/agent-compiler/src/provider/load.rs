use std::path::Path;

use anyhow::Context as _;

use super::default::default_registry;
use super::{ProviderRegistry, ProviderSpec, RawProvider, RawRegistryFile};

pub fn from_toml_str(s: &str) -> anyhow::Result<ProviderRegistry> {
    let raw: RawRegistryFile = toml::from_str(s)?;
    Ok(build_registry(raw))
}

pub fn load_from_file(path: &Path) -> anyhow::Result<ProviderRegistry> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    from_toml_str(&content).with_context(|| format!("invalid provider table {}", path.display()))
}

pub fn load_default() -> ProviderRegistry {
    default_registry()
}

fn build_registry(raw: RawRegistryFile) -> ProviderRegistry {
    let mut reg = default_registry();
    for entry in raw.providers {
        let base = reg
            .get(&entry.id)
            .cloned()
            .unwrap_or_else(|| ProviderSpec::new(&entry.id));
        reg.upsert(merge_entry(base, entry));
    }
    reg
}

fn merge_entry(mut spec: ProviderSpec, raw: RawProvider) -> ProviderSpec {
    if let Some(dir) = raw.dir {
        spec.dir = dir;
    }
    if let Some(marker) = raw.marker {
        spec.marker = marker;
    }
    if let Some(ext) = raw.agent_ext {
        spec.agent_ext = ext.trim_start_matches('.').to_string();
    }
    if let Some(style) = raw.tool_style {
        spec.tool_style = style;
    }
    if let Some(fields) = raw.agent_fields {
        spec.agent_fields = if fields.is_empty() { None } else { Some(fields) };
    }
    if let Some(fields) = raw.skill_fields {
        spec.skill_fields = if fields.is_empty() { None } else { Some(fields) };
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordKind;
    use crate::provider::{FieldRule, ToolStyle};

    #[test]
    fn parse_appends_and_overrides() {
        let toml = r#"
[[providers]]
id = "cursor"
dir = ".cursor"
agent_ext = ".mdc"
tool_style = "quoted_list"
agent_fields = ["description", "tools"]

[[providers]]
id = "claude"
agent_fields = ["name", "description", "tools", "model", "color"]
skill_fields = []
"#;
        let reg = from_toml_str(toml).expect("parse ok");
        assert_eq!(reg.ids(), vec!["claude", "opencode", "copilot", "gemini", "cursor"]);

        let cursor = reg.get("cursor").unwrap();
        assert_eq!(cursor.dir, ".cursor");
        assert_eq!(cursor.agent_ext, "mdc");
        assert_eq!(cursor.marker, "---");
        assert_eq!(
            cursor.fields_for(RecordKind::Agent),
            Some(&[FieldRule::Description, FieldRule::Tools][..])
        );
        assert!(cursor.fields_for(RecordKind::Skill).is_none());

        let claude = reg.get("claude").unwrap();
        assert_eq!(claude.tool_style, ToolStyle::PascalList);
        assert!(claude.agent_fields.as_ref().unwrap().contains(&FieldRule::Model));
        assert!(claude.fields_for(RecordKind::Skill).is_none());
    }

    #[test]
    fn empty_file_is_default_table() {
        let reg = from_toml_str("").expect("parse ok");
        assert_eq!(reg.len(), load_default().len());
    }

    #[test]
    fn unknown_field_rule_is_an_error() {
        let toml = r#"
[[providers]]
id = "x"
agent_fields = ["colour"]
"#;
        assert!(from_toml_str(toml).is_err());
    }
}
