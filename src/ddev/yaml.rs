//! # YAML Rendering
//!
//! Deterministic text rendering for generated DDEV files.
//!
//! Output walks each mapping in insertion order with 2-space indents and
//! `- ` sequence markers. Strings are double-quoted only when they contain
//! YAML-special characters or would otherwise read as another type.

use std::fmt::Write as _;

/// A YAML value in rendering order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YamlNode {
    Null,
    Bool(bool),
    Int(i64),
    /// String quoted only when required
    Plain(String),
    /// String always double-quoted
    Quoted(String),
    Seq(Vec<YamlNode>),
    Map(Vec<(String, YamlNode)>),
}

impl YamlNode {
    pub fn plain(value: impl Into<String>) -> Self {
        YamlNode::Plain(value.into())
    }

    pub fn quoted(value: impl Into<String>) -> Self {
        YamlNode::Quoted(value.into())
    }

    /// Build a mapping from `(key, value)` pairs
    pub fn map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, YamlNode)>) -> Self {
        YamlNode::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn is_block(&self) -> bool {
        match self {
            YamlNode::Seq(items) => !items.is_empty(),
            YamlNode::Map(pairs) => !pairs.is_empty(),
            _ => false,
        }
    }
}

/// Render a node as a YAML document body, ending with a newline
#[must_use]
pub fn render(node: &YamlNode) -> String {
    let mut out = String::new();
    if node.is_block() {
        for line in block_lines(node) {
            out.push_str(&line);
            out.push('\n');
        }
    } else {
        out.push_str(&inline(node));
        out.push('\n');
    }
    out
}

fn block_lines(node: &YamlNode) -> Vec<String> {
    let mut lines = Vec::new();
    match node {
        YamlNode::Map(pairs) => {
            for (key, value) in pairs {
                let key = format_string(key, false);
                if value.is_block() {
                    lines.push(format!("{key}:"));
                    lines.extend(block_lines(value).into_iter().map(|l| format!("  {l}")));
                } else {
                    lines.push(format!("{key}: {}", inline(value)));
                }
            }
        }
        YamlNode::Seq(items) => {
            for item in items {
                if item.is_block() {
                    let nested = block_lines(item);
                    for (i, line) in nested.into_iter().enumerate() {
                        let prefix = if i == 0 { "- " } else { "  " };
                        lines.push(format!("{prefix}{line}"));
                    }
                } else {
                    lines.push(format!("- {}", inline(item)));
                }
            }
        }
        other => lines.push(inline(other)),
    }
    lines
}

fn inline(node: &YamlNode) -> String {
    match node {
        YamlNode::Null => "null".to_string(),
        YamlNode::Bool(b) => b.to_string(),
        YamlNode::Int(n) => n.to_string(),
        YamlNode::Plain(s) => format_string(s, false),
        YamlNode::Quoted(s) => format_string(s, true),
        YamlNode::Seq(_) => "[]".to_string(),
        YamlNode::Map(_) => "{}".to_string(),
    }
}

fn format_string(value: &str, force_quotes: bool) -> String {
    if force_quotes || needs_quotes(value) {
        quote(value)
    } else {
        value.to_string()
    }
}

const RESERVED: [&str; 11] = [
    "true", "false", "null", "yes", "no", "on", "off", "~", "y", "n", "",
];

/// Whether a plain scalar would be misread or is invalid YAML
#[must_use]
pub fn needs_quotes(value: &str) -> bool {
    if RESERVED.contains(&value.to_ascii_lowercase().as_str()) {
        return true;
    }
    if value.trim() != value {
        return true;
    }
    if value.starts_with(['-', '?', '\'', '"']) {
        return true;
    }
    value.chars().any(|c| {
        matches!(
            c,
            ':' | '#' | '@' | '`' | '|' | '>' | '*' | '&' | '!' | '%' | '{' | '}' | '[' | ']'
                | ',' | '\\' | '"'
        ) || c.is_control()
    })
}

/// Double-quote with YAML escapes
#[must_use]
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    mod render {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_nested_structure() {
            let node = YamlNode::map([
                ("disable_settings_management", YamlNode::Bool(true)),
                ("php_version", YamlNode::plain("8.1")),
                (
                    "database",
                    YamlNode::map([
                        ("type", YamlNode::plain("mariadb")),
                        ("version", YamlNode::quoted("10.4")),
                    ]),
                ),
                (
                    "webimage_extra_packages",
                    YamlNode::Seq(vec![YamlNode::plain("figlet"), YamlNode::plain("php8.1-redis")]),
                ),
                (
                    "hooks",
                    YamlNode::map([(
                        "post-start",
                        YamlNode::Seq(vec![
                            YamlNode::map([("exec", YamlNode::plain("mkdir -p ${CACHE} || true"))]),
                            YamlNode::map([("composer", YamlNode::plain("install"))]),
                        ]),
                    )]),
                ),
            ]);

            let expected = "\
disable_settings_management: true
php_version: 8.1
database:
  type: mariadb
  version: \"10.4\"
webimage_extra_packages:
  - figlet
  - php8.1-redis
hooks:
  post-start:
    - exec: \"mkdir -p ${CACHE} || true\"
    - composer: install
";
            assert_eq!(render(&node), expected);
        }

        #[test]
        fn test_empty_collections_are_inline() {
            let node = YamlNode::map([
                ("list", YamlNode::Seq(vec![])),
                ("object", YamlNode::Map(vec![])),
                ("nothing", YamlNode::Null),
            ]);
            assert_eq!(render(&node), "list: []\nobject: {}\nnothing: null\n");
        }

        #[test]
        fn test_map_items_with_several_keys() {
            let node = YamlNode::Seq(vec![YamlNode::map([
                ("name", YamlNode::plain("redis")),
                ("port", YamlNode::Int(6379)),
            ])]);
            assert_eq!(render(&node), "- name: redis\n  port: 6379\n");
        }
    }

    mod needs_quotes {
        use super::*;

        #[test]
        fn test_plain_values() {
            for value in ["figlet", "8.1", "web", "PLATFORM_VARIABLES=e30=", "install"] {
                assert!(!needs_quotes(value), "{value}");
            }
        }

        #[test]
        fn test_special_values() {
            for value in [
                "", "true", "No", "~", " padded", "a: b", "#comment", "${VAR}", "- item",
                "line\nbreak", "say \"hi\"",
            ] {
                assert!(needs_quotes(value), "{value:?}");
            }
        }
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c\nd"), "\"a\\\"b\\\\c\\nd\"");
    }
}
