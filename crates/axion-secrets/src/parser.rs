//! `.env` text parsing and serialisation
//!
//! Feeds sync import and the local-overrides overlay. Supports comments,
//! an optional `export ` prefix, single and double quoting, and the usual
//! backslash escapes inside double quotes.

/// Parse `.env` text into ordered key/value pairs.
///
/// Lines that do not look like an assignment are skipped. Later
/// assignments of the same key win when collected into a map.
pub fn parse(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();

        let Some(eq) = line.find('=') else {
            continue;
        };
        let key = line[..eq].trim();
        if key.is_empty() || !is_valid_key(key) {
            continue;
        }

        let value = parse_value(line[eq + 1..].trim());
        pairs.push((key.to_string(), value));
    }

    pairs
}

fn is_valid_key(key: &str) -> bool {
    let mut bytes = key.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn parse_value(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return unescape(&raw[1..raw.len() - 1]);
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        // Single quotes are literal.
        return raw[1..raw.len() - 1].to_string();
    }

    // Unquoted: an inline comment starts at the first ` #`.
    match raw.find(" #") {
        Some(pos) => raw[..pos].trim_end().to_string(),
        None => raw.to_string(),
    }
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Serialise pairs back to `.env` text, quoting where needed.
pub fn serialize<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if needs_quoting(value) {
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push_str("\"\n");
        } else {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
    }
    out
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\'))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_assignments() {
        let pairs = parse("A=1\nB=two\n");
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two".to_string())
            ]
        );
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let pairs = parse("# header\n\nA=1\n   # indented comment\nB=2");
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_export_prefix() {
        let pairs = parse("export DATABASE_URL=postgres://localhost\n");
        assert_eq!(pairs[0].0, "DATABASE_URL");
        assert_eq!(pairs[0].1, "postgres://localhost");
    }

    #[test]
    fn test_double_quotes_with_escapes() {
        let pairs = parse(r#"MSG="line1\nline2\t\"quoted\"""#);
        assert_eq!(pairs[0].1, "line1\nline2\t\"quoted\"");
    }

    #[test]
    fn test_single_quotes_are_literal() {
        let pairs = parse(r"RAW='a\nb # not a comment'");
        assert_eq!(pairs[0].1, r"a\nb # not a comment");
    }

    #[test]
    fn test_inline_comment_on_unquoted_value() {
        let pairs = parse("PORT=8080 # default port");
        assert_eq!(pairs[0].1, "8080");
    }

    #[test]
    fn test_hash_inside_quotes_is_kept() {
        let pairs = parse(r##"COLOR="#ff0000""##);
        assert_eq!(pairs[0].1, "#ff0000");
    }

    #[test]
    fn test_value_with_equals_sign() {
        let pairs = parse("QUERY=a=b=c");
        assert_eq!(pairs[0].1, "a=b=c");
    }

    #[test]
    fn test_empty_value() {
        let pairs = parse("EMPTY=\n");
        assert_eq!(pairs[0].1, "");
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let pairs = parse("no_equals_sign\n=novalue\n9BAD=x\nGOOD=1");
        assert_eq!(pairs, vec![("GOOD".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_serialize_quotes_when_needed() {
        let text = serialize([("PLAIN", "value"), ("SPACED", "two words"), ("EMPTY", "")]);
        assert_eq!(text, "PLAIN=value\nSPACED=\"two words\"\nEMPTY=\"\"\n");
    }

    #[test]
    fn test_parse_serialize_roundtrip() {
        let original = vec![
            ("A".to_string(), "simple".to_string()),
            ("B".to_string(), "has spaces".to_string()),
            ("C".to_string(), "line1\nline2".to_string()),
            ("D".to_string(), "#hash".to_string()),
        ];
        let text = serialize(original.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        assert_eq!(parse(&text), original);
    }
}
