//! Split a rendered document into its YAML front matter and body.
//!
//! The renderer parses its own output back through here so malformed front
//! matter is caught before anything reaches disk.

use serde_yaml::{Mapping, Value as YamlValue};

#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("empty document")]
    Empty,
    #[error("missing front-matter marker '{0}' on the first line")]
    MissingOpen(String),
    #[error("unterminated front matter (expected closing '{0}')")]
    Unterminated(String),
    #[error("invalid YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter is a YAML {0}, expected a mapping")]
    NotMapping(&'static str),
}

/// Parse `content` as `{marker}\n<yaml>{marker}\n\n<body>`.
///
/// Returns the front-matter mapping and the body exactly as written (the one
/// separator newline after the closing marker is not part of the body).
pub fn parse<'a>(content: &'a str, marker: &str) -> Result<(Mapping, &'a str), FrontMatterError> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next().ok_or(FrontMatterError::Empty)?;
    if strip_eol(first) != marker {
        return Err(FrontMatterError::MissingOpen(marker.to_string()));
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        let line_start = offset;
        offset += line.len();
        if strip_eol(line) != marker {
            continue;
        }
        let yaml = &content[yaml_start..line_start];
        let rest = &content[offset..];
        let body = rest.strip_prefix('\n').unwrap_or(rest);
        let mapping = match serde_yaml::from_str::<YamlValue>(yaml)? {
            YamlValue::Mapping(m) => m,
            YamlValue::Null => Mapping::new(),
            YamlValue::Bool(_) => return Err(FrontMatterError::NotMapping("boolean")),
            YamlValue::Number(_) => return Err(FrontMatterError::NotMapping("number")),
            YamlValue::String(_) => return Err(FrontMatterError::NotMapping("string")),
            YamlValue::Sequence(_) => return Err(FrontMatterError::NotMapping("sequence")),
            YamlValue::Tagged(_) => return Err(FrontMatterError::NotMapping("tagged value")),
        };
        return Ok((mapping, body));
    }
    Err(FrontMatterError::Unterminated(marker.to_string()))
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_mapping_and_body() {
        let doc = "---\nname: Example\ntools: [Read, Grep]\n---\n\nbody\n---\nmore\n";
        let (fm, body) = parse(doc, "---").expect("parse ok");
        assert_eq!(fm.get("name").and_then(|v| v.as_str()), Some("Example"));
        let tools = fm.get("tools").and_then(|v| v.as_sequence()).expect("tools");
        assert_eq!(tools.len(), 2);
        assert_eq!(body, "body\n---\nmore\n");
    }

    #[test]
    fn rejects_missing_and_unterminated_markers() {
        assert!(matches!(parse("", "---"), Err(FrontMatterError::Empty)));
        assert!(matches!(
            parse("name: x\n", "---"),
            Err(FrontMatterError::MissingOpen(_))
        ));
        assert!(matches!(
            parse("---\nname: x\n", "---"),
            Err(FrontMatterError::Unterminated(_))
        ));
    }

    #[test]
    fn non_mapping_front_matter_is_rejected() {
        assert!(matches!(
            parse("---\n- a\n- b\n---\n", "---"),
            Err(FrontMatterError::NotMapping("sequence"))
        ));
    }

    #[test]
    fn empty_front_matter_is_an_empty_mapping() {
        let (fm, body) = parse("---\n---\n\nonly body", "---").expect("parse ok");
        assert!(fm.is_empty());
        assert_eq!(body, "only body");
    }
}
