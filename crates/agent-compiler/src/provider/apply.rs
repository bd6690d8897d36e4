use serde_json::Value as JsonValue;

use super::{FieldRule, ProviderSpec, ToolStyle};
use crate::model::{Handoff, UniversalRecord, capitalize, dedupe_in_order};

/// Why a (record, provider) pair produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `providers[id]` is false or absent.
    Disabled,
    /// The provider has no format for this record kind.
    Unsupported,
}

/// Value of one provider-shaped front-matter field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    Float(f64),
    Integer(u64),
    /// Flow sequence with plain items where possible: `[Read, Grep]`.
    FlowList(Vec<String>),
    /// Flow sequence with every item single-quoted: `['read', 'grep']`.
    QuotedList(Vec<String>),
    /// Block mapping of `item: true` entries.
    BoolMap(Vec<String>),
    /// Block mapping of string values.
    StringMap(Vec<(String, String)>),
    Handoffs(Vec<Handoff>),
    /// Arbitrary nested structure emitted as a YAML block.
    Block(JsonValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapedField {
    pub key: &'static str,
    pub value: FieldValue,
}

/// Provider-ordered front-matter fields for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderShaped {
    pub fields: Vec<ShapedField>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome {
    Shaped(ProviderShaped),
    Skip(SkipReason),
}

/// Shape `record` for `spec`. Pure: no I/O and no logging.
pub fn map_record(record: &UniversalRecord, spec: &ProviderSpec) -> MapOutcome {
    if !record.is_enabled_for(&spec.id) {
        return MapOutcome::Skip(SkipReason::Disabled);
    }
    let Some(rules) = spec.fields_for(record.kind) else {
        return MapOutcome::Skip(SkipReason::Unsupported);
    };
    let fields = rules
        .iter()
        .filter_map(|rule| map_field(*rule, record, spec.tool_style))
        .collect();
    MapOutcome::Shaped(ProviderShaped { fields })
}

fn map_field(rule: FieldRule, record: &UniversalRecord, style: ToolStyle) -> Option<ShapedField> {
    let (key, value) = match rule {
        FieldRule::Name => ("name", FieldValue::Scalar(record.name.clone())),
        FieldRule::Description => ("description", FieldValue::Scalar(record.description.clone())),
        FieldRule::Tools => {
            if record.tools.is_empty() {
                return None;
            }
            ("tools", map_tools(&record.tools, style))
        }
        FieldRule::Model => ("model", FieldValue::Scalar(record.model.clone()?)),
        FieldRule::Temperature => ("temperature", FieldValue::Float(record.temperature?)),
        FieldRule::Color => ("color", FieldValue::Scalar(record.color.clone()?)),
        FieldRule::MaxIterations => ("maxIterations", FieldValue::Integer(record.max_iterations?)),
        FieldRule::Permissions => {
            if record.permissions.is_empty() {
                return None;
            }
            let entries = record
                .permissions
                .iter()
                .map(|(action, policy)| (action.clone(), policy.as_str().to_string()))
                .collect();
            ("permissions", FieldValue::StringMap(entries))
        }
        FieldRule::Handoffs => {
            if record.handoffs.is_empty() {
                return None;
            }
            ("handoffs", FieldValue::Handoffs(record.handoffs.clone()))
        }
        FieldRule::McpServers => {
            let servers = record.mcp_servers.clone()?;
            ("mcpServers", FieldValue::Block(JsonValue::Object(servers)))
        }
        FieldRule::Target => ("target", FieldValue::Scalar(record.target.clone()?)),
        FieldRule::Version => ("version", FieldValue::Scalar(record.version.clone()?)),
        FieldRule::Tags => {
            if record.tags.is_empty() {
                return None;
            }
            ("tags", FieldValue::FlowList(record.tags.clone()))
        }
    };
    Some(ShapedField { key, value })
}

/// Unknown tool identifiers pass through; only casing changes per style.
fn map_tools(tools: &[String], style: ToolStyle) -> FieldValue {
    match style {
        ToolStyle::PascalList => {
            FieldValue::FlowList(dedupe_in_order(tools.iter().map(|t| capitalize(t))))
        }
        ToolStyle::BoolMap => {
            FieldValue::BoolMap(dedupe_in_order(tools.iter().map(|t| t.to_lowercase())))
        }
        ToolStyle::QuotedList => {
            FieldValue::QuotedList(dedupe_in_order(tools.iter().map(|t| t.to_lowercase())))
        }
    }
}
