//! Template rendering: provider-shaped fields + body -> final document text.
//!
//! Output is `{marker}\n<front matter>{marker}\n\n<body>`. Scalars go through
//! `serde_yaml` so quoting and escaping follow YAML rules; the body is copied
//! byte for byte. Rendering is deterministic: identical input always yields
//! identical bytes.

pub mod frontmatter;

use serde::Serialize;

use crate::provider::{FieldValue, ShapedField};

pub use frontmatter::FrontMatterError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to serialize field '{field}': {source}")]
    Serialize {
        field: &'static str,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("rendered document does not parse back: {0}")]
    Verify(#[from] FrontMatterError),
    #[error("rendered body differs from the source body")]
    BodyMismatch,
}

/// Render fields and body into one document delimited by `marker`.
pub fn render(fields: &[ShapedField], body: &str, marker: &str) -> Result<String, RenderError> {
    let mut out = String::new();
    out.push_str(marker);
    out.push('\n');
    for field in fields {
        render_field(&mut out, field)?;
    }
    out.push_str(marker);
    out.push('\n');
    out.push('\n');
    out.push_str(body);

    let (_, parsed_body) = frontmatter::parse(&out, marker)?;
    if parsed_body != body {
        return Err(RenderError::BodyMismatch);
    }
    Ok(out)
}

fn render_field(out: &mut String, field: &ShapedField) -> Result<(), RenderError> {
    let key = field.key;
    let ser = |source: serde_yaml::Error| RenderError::Serialize { field: key, source };
    match &field.value {
        FieldValue::Scalar(s) => {
            out.push_str(&format!("{key}: {}\n", yaml_scalar(s).map_err(ser)?));
        }
        FieldValue::Float(f) => {
            out.push_str(&format!("{key}: {}\n", yaml_scalar(f).map_err(ser)?));
        }
        FieldValue::Integer(n) => {
            out.push_str(&format!("{key}: {}\n", yaml_scalar(n).map_err(ser)?));
        }
        FieldValue::FlowList(items) => {
            let rendered = items
                .iter()
                .map(|s| flow_item(s))
                .collect::<Result<Vec<_>, _>>()
                .map_err(ser)?;
            out.push_str(&format!("{key}: [{}]\n", rendered.join(", ")));
        }
        FieldValue::QuotedList(items) => {
            let rendered: Vec<String> = items.iter().map(|s| single_quoted(s)).collect();
            out.push_str(&format!("{key}: [{}]\n", rendered.join(", ")));
        }
        FieldValue::BoolMap(items) => {
            out.push_str(&format!("{key}:\n"));
            for item in items {
                out.push_str(&format!("  {}: true\n", yaml_scalar(item).map_err(ser)?));
            }
        }
        FieldValue::StringMap(entries) => {
            out.push_str(&format!("{key}:\n"));
            for (k, v) in entries {
                out.push_str(&format!(
                    "  {}: {}\n",
                    yaml_scalar(k).map_err(ser)?,
                    yaml_scalar(v).map_err(ser)?
                ));
            }
        }
        FieldValue::Handoffs(list) => {
            let block = serde_yaml::to_string(list).map_err(ser)?;
            write_block(out, key, &block);
        }
        FieldValue::Block(value) => {
            let block = serde_yaml::to_string(value).map_err(ser)?;
            write_block(out, key, &block);
        }
    }
    Ok(())
}

/// `key:` followed by `block` indented two spaces.
fn write_block(out: &mut String, key: &str, block: &str) {
    out.push_str(key);
    out.push_str(":\n");
    for line in block.lines() {
        if !line.is_empty() {
            out.push_str("  ");
            out.push_str(line);
        }
        out.push('\n');
    }
}

/// A value as a standalone YAML scalar, quoted only when YAML requires it.
fn yaml_scalar<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_yaml::Error> {
    let mut text = serde_yaml::to_string(value)?;
    while text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Plain when the string is a safe plain scalar in flow context, else single-quoted.
fn flow_item(s: &str) -> Result<String, serde_yaml::Error> {
    let flow_safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ' '))
        && !s.starts_with(' ')
        && !s.ends_with(' ');
    if flow_safe && yaml_scalar(s)? == s {
        Ok(s.to_string())
    } else {
        Ok(single_quoted(s))
    }
}

fn single_quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
