//! Naming helpers shared by validation and provider mapping.

use std::collections::HashSet;

/// Whether `name` can be used verbatim as a file or directory name.
///
/// Accepts ASCII alphanumerics plus `-`, `_` and `.`, and rejects names that
/// start with `.` so records can never escape or hide inside the output tree.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}

/// Uppercase the first character and lowercase the rest (`webFetch` -> `Webfetch`).
pub fn capitalize(ident: &str) -> String {
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Drop repeated entries, keeping the first occurrence of each.
pub fn dedupe_in_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashSet<String> = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_names() {
        assert!(is_safe_name("security-auditor"));
        assert!(is_safe_name("docx_creation.v2"));
        assert!(!is_safe_name(""));
        assert!(!is_safe_name(".hidden"));
        assert!(!is_safe_name("../escape"));
        assert!(!is_safe_name("with space"));
    }

    #[test]
    fn capitalize_lowercases_tail() {
        assert_eq!(capitalize("read"), "Read");
        assert_eq!(capitalize("READ"), "Read");
        assert_eq!(capitalize("webFetch"), "Webfetch");
        assert_eq!(capitalize("Bash"), "Bash");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let v = dedupe_in_order(["grep", "read", "grep", "glob", "read"].map(String::from));
        assert_eq!(v, vec!["grep", "read", "glob"]);
    }
}
