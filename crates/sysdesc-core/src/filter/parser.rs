//! Tokenizer for filter definition strings.
//!
//! ```text
//! definitions := definition ("," definition)*
//! definition  := path "=" matcher ("," matcher)*   ; quote with "..." to keep
//!                                                  ; matcher commas together
//! ```
//!
//! A backslash escapes the next character (`\,`, `\@`, `\\`, `\"`).

use crate::errors::{Result, SysDescError};

const ESCAPE: char = '\\';
const QUOTE: char = '"';

fn invalid(fragment: &str, reason: &str) -> SysDescError {
    SysDescError::InvalidFilterDefinition {
        fragment: fragment.to_string(),
        reason: reason.to_string(),
    }
}

/// Split a definition list on top-level commas.
///
/// Quotes are stripped; escapes are kept so the per-definition split can
/// still tell escaped commas apart. Empty segments are skipped.
///
/// # Errors
///
/// `InvalidFilterDefinition` on an unterminated quote or a trailing escape.
pub fn split_definitions(text: &str) -> Result<Vec<String>> {
    let mut definitions = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => {
                let next = chars
                    .next()
                    .ok_or_else(|| invalid(text, "trailing escape character"))?;
                current.push(ESCAPE);
                current.push(next);
            }
            QUOTE => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                push_segment(&mut definitions, &mut current);
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(invalid(text, "unterminated quote"));
    }
    push_segment(&mut definitions, &mut current);
    Ok(definitions)
}

fn push_segment(definitions: &mut Vec<String>, current: &mut String) {
    let segment = current.trim();
    if !segment.is_empty() {
        definitions.push(segment.to_string());
    }
    current.clear();
}

/// Split one definition into its path and unescaped matchers.
///
/// # Errors
///
/// `InvalidFilterDefinition` when the `=` is missing, the path is empty or
/// no matcher follows the `=`.
pub fn parse_definition(definition: &str) -> Result<(String, Vec<String>)> {
    let (path, rest) = definition
        .split_once('=')
        .ok_or_else(|| invalid(definition, "missing '=' between path and matchers"))?;
    let path = path.trim();
    if path.is_empty() {
        return Err(invalid(definition, "empty path"));
    }
    if rest.is_empty() {
        return Err(invalid(definition, "no matcher given"));
    }
    Ok((path.to_string(), split_matchers(rest)))
}

fn split_matchers(text: &str) -> Vec<String> {
    let mut matchers = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => matchers.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    matchers.push(current);
    matchers
}

/// Escape a matcher so that `parse_definition` reads it back unchanged
pub fn escape_matcher(matcher: &str) -> String {
    let mut escaped = String::with_capacity(matcher.len());
    for (i, c) in matcher.chars().enumerate() {
        match c {
            ESCAPE | ',' | QUOTE => {
                escaped.push(ESCAPE);
                escaped.push(c);
            }
            '@' if i == 0 => {
                escaped.push(ESCAPE);
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_protect_commas() {
        let defs = split_definitions(r#""/a/b=x,y",/c=z"#).unwrap();
        assert_eq!(defs, vec!["/a/b=x,y".to_string(), "/c=z".to_string()]);
    }

    #[test]
    fn test_escaped_comma_survives_both_splits() {
        let defs = split_definitions(r"/a=x\,y,/b=z").unwrap();
        assert_eq!(defs, vec![r"/a=x\,y".to_string(), "/b=z".to_string()]);

        let (path, matchers) = parse_definition(&defs[0]).unwrap();
        assert_eq!(path, "/a");
        assert_eq!(matchers, vec!["x,y".to_string()]);
    }

    #[test]
    fn test_escaped_at_is_literal() {
        let (_, matchers) = parse_definition(r"/a=\@home").unwrap();
        assert_eq!(matchers, vec!["@home".to_string()]);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = split_definitions(r#""/a=b"#).unwrap_err();
        assert!(matches!(err, SysDescError::InvalidFilterDefinition { .. }));
    }

    #[test]
    fn test_missing_equals_names_fragment() {
        match parse_definition("/a/b").unwrap_err() {
            SysDescError::InvalidFilterDefinition { fragment, .. } => assert_eq!(fragment, "/a/b"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_escape_matcher_inverts_parse() {
        for matcher in ["plain", "a,b", "@file", r"back\slash", "mid@dle"] {
            let definition = format!("/p={}", escape_matcher(matcher));
            let (_, parsed) = parse_definition(&definition).unwrap();
            assert_eq!(parsed, vec![matcher.to_string()]);
        }
    }
}
