use serde::Deserialize;

use crate::error::CompileError;
use crate::model::RecordKind;

/// How a provider expects the `tools` list to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStyle {
    /// `tools: [Read, Grep]`
    PascalList,
    /// `tools:` followed by `read: true` entries
    BoolMap,
    /// `tools: ['read', 'grep']`
    QuotedList,
}

/// One front-matter field a provider emits, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    Name,
    Description,
    Tools,
    Model,
    Temperature,
    Color,
    MaxIterations,
    Permissions,
    Handoffs,
    McpServers,
    Target,
    Version,
    Tags,
}

/// Output conventions for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSpec {
    pub id: String,
    /// Directory under the output root, e.g. `.claude`.
    pub dir: String,
    /// Line delimiting the front-matter block.
    pub marker: String,
    /// Agent file extension without the leading dot.
    pub agent_ext: String,
    pub tool_style: ToolStyle,
    /// `None` means the provider has no agent format.
    pub agent_fields: Option<Vec<FieldRule>>,
    /// `None` means the provider has no skill format.
    pub skill_fields: Option<Vec<FieldRule>>,
}

impl ProviderSpec {
    /// A provider with defaults for everything but its id.
    pub fn new(id: &str) -> Self {
        ProviderSpec {
            id: id.to_string(),
            dir: format!(".{id}"),
            marker: "---".to_string(),
            agent_ext: "md".to_string(),
            tool_style: ToolStyle::QuotedList,
            agent_fields: None,
            skill_fields: None,
        }
    }

    pub fn fields_for(&self, kind: RecordKind) -> Option<&[FieldRule]> {
        match kind {
            RecordKind::Agent => self.agent_fields.as_deref(),
            RecordKind::Skill => self.skill_fields.as_deref(),
        }
    }
}

/// Ordered set of known providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderSpec>,
}

impl ProviderRegistry {
    pub fn get(&self, id: &str) -> Option<&ProviderSpec> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id.as_str()).collect()
    }

    /// Replace the entry with the same id in place, or append a new one.
    pub fn upsert(&mut self, spec: ProviderSpec) {
        match self.providers.iter_mut().find(|p| p.id == spec.id) {
            Some(slot) => *slot = spec,
            None => self.providers.push(spec),
        }
    }

    /// Resolve requested ids (all providers when empty), in registry order.
    pub fn select(&self, requested: &[String]) -> Result<Vec<&ProviderSpec>, CompileError> {
        if requested.is_empty() {
            return Ok(self.providers.iter().collect());
        }
        for id in requested {
            if !self.contains(id) {
                return Err(CompileError::UnknownProvider {
                    id: id.clone(),
                    known: self.ids().join(", "),
                });
            }
        }
        Ok(self
            .providers
            .iter()
            .filter(|p| requested.iter().any(|r| *r == p.id))
            .collect())
    }
}

/// Provider overrides file (`[[providers]]` tables).
#[derive(Debug, Clone, Deserialize)]
pub struct RawRegistryFile {
    #[serde(default)]
    pub providers: Vec<RawProvider>,
}

/// One `[[providers]]` entry. Unset fields keep the overridden entry's value
/// (or the defaults of [`ProviderSpec::new`] for a new provider); an empty
/// field list turns that kind off.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProvider {
    pub id: String,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub agent_ext: Option<String>,
    #[serde(default)]
    pub tool_style: Option<ToolStyle>,
    #[serde(default)]
    pub agent_fields: Option<Vec<FieldRule>>,
    #[serde(default)]
    pub skill_fields: Option<Vec<FieldRule>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::default::default_registry;

    #[test]
    fn select_all_when_empty() {
        let reg = default_registry();
        let ids: Vec<&str> = reg.select(&[]).unwrap().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["claude", "opencode", "copilot", "gemini"]);
    }

    #[test]
    fn select_keeps_registry_order() {
        let reg = default_registry();
        let picked = reg
            .select(&["gemini".to_string(), "claude".to_string()])
            .unwrap();
        let ids: Vec<&str> = picked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["claude", "gemini"]);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let reg = default_registry();
        let err = reg.select(&["cursor".to_string()]).unwrap_err();
        assert!(matches!(err, CompileError::UnknownProvider { ref id, .. } if id == "cursor"));
        assert!(err.to_string().contains("claude, opencode, copilot, gemini"));
    }
}
