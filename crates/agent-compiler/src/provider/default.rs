use super::{FieldRule, ProviderRegistry, ProviderSpec, ToolStyle};

/// Built-in provider table.
pub fn default_registry() -> ProviderRegistry {
    use FieldRule::*;

    let skill_fields = vec![Name, Description, Version, Tags];
    let mut reg = ProviderRegistry::default();

    reg.upsert(ProviderSpec {
        tool_style: ToolStyle::PascalList,
        agent_fields: Some(vec![Name, Description, Tools, Color]),
        skill_fields: Some(skill_fields.clone()),
        ..ProviderSpec::new("claude")
    });

    // OpenCode names agents by file name, so `name` is omitted.
    reg.upsert(ProviderSpec {
        tool_style: ToolStyle::BoolMap,
        agent_fields: Some(vec![
            Description,
            Tools,
            Model,
            Temperature,
            MaxIterations,
            Permissions,
        ]),
        skill_fields: Some(skill_fields.clone()),
        ..ProviderSpec::new("opencode")
    });

    reg.upsert(ProviderSpec {
        agent_ext: "agent.md".to_string(),
        tool_style: ToolStyle::QuotedList,
        agent_fields: Some(vec![Name, Description, Tools, Handoffs, McpServers, Target]),
        skill_fields: None,
        ..ProviderSpec::new("copilot")
    });

    // Gemini CLI has no agent format; skills only.
    reg.upsert(ProviderSpec {
        agent_fields: None,
        skill_fields: Some(skill_fields),
        ..ProviderSpec::new("gemini")
    });

    reg
}
