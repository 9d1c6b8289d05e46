//! `@tg` annotation syntax.
//!
//! Only lines starting with `@tg` carry annotations; everything else in a
//! documentation block is prose and ignored here. An annotation line holds
//! whitespace-separated items: `key`, `key=value`, ``key=`quoted value` `` or
//! `key="quoted value"`.

use super::DocTags;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static RE_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:space:]]*(?://+[[:space:]]*)?@tg(?:[[:space:]]+(.*))?$").unwrap());

static RE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());

/// A documentation block that could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct TagSyntaxError {
    /// 1-based line within the block.
    pub line: usize,
    pub message: String,
}

/// Parse one documentation block into a tag fragment.
pub fn parse(text: &str) -> Result<DocTags, TagSyntaxError> {
    let mut tags = DocTags::default();

    for (idx, line) in text.lines().enumerate() {
        let Some(caps) = RE_ANNOTATION.captures(line) else {
            continue;
        };
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        for (key, value) in tokenize(body).map_err(|message| TagSyntaxError {
            line: idx + 1,
            message,
        })? {
            tags.insert(&key, split_value(&key, value));
        }
    }

    Ok(tags)
}

/// List keys take comma-separated entries; singular keys keep the raw value.
fn split_value(key: &str, value: Option<String>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(v) if super::keys::is_list(key) => v
            .split(',')
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        Some(v) => vec![v],
    }
}

/// Split an annotation line body into `(key, value)` items.
fn tokenize(body: &str) -> Result<Vec<(String, Option<String>)>, String> {
    let mut items = Vec::new();
    let mut chars = body.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
            key.push(c);
        }
        if key.is_empty() {
            return Err("missing key before `=`".to_string());
        }
        if !RE_KEY.is_match(&key) {
            return Err(format!("invalid annotation key `{key}`"));
        }

        if chars.next_if_eq(&'=').is_none() {
            items.push((key, None));
            continue;
        }

        let value = match chars.peek().copied() {
            Some(quote @ ('`' | '"')) => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(format!("unterminated {quote} quote in value of `{key}`"));
                }
                if chars.peek().is_some_and(|c| !c.is_whitespace()) {
                    return Err(format!("unexpected text after quoted value of `{key}`"));
                }
                value
            }
            _ => {
                let mut value = String::new();
                loop {
                    while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                        value.push(c);
                    }
                    // A list value ending in `,` continues after the gap.
                    if !(super::keys::is_list(&key) && value.ends_with(',')) {
                        break;
                    }
                    while chars.next_if(|c| c.is_whitespace()).is_some() {}
                    if chars.peek().is_none() {
                        return Err(format!("dangling `,` in value of `{key}`"));
                    }
                }
                value
            }
        };
        items.push((key, Some(value)));
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_prose() {
        let tags = parse("Catalog serves items.\nNothing to see here.").unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn flags_and_values() {
        let tags = parse("@tg http-server log\n@tg http-prefix=api/v1").unwrap();
        assert!(tags.contains("http-server"));
        assert!(tags.values("log").is_empty());
        assert_eq!(tags.get("http-prefix"), Some("api/v1"));
    }

    #[test]
    fn quoted_values_keep_spaces() {
        let tags = parse("@tg summary=`Fetch one item` desc=\"by id\"").unwrap();
        assert_eq!(tags.get("summary"), Some("Fetch one item"));
        assert_eq!(tags.get("desc"), Some("by id"));
    }

    #[test]
    fn comment_markers_are_tolerated() {
        let tags = parse("// @tg jsonRPC-server").unwrap();
        assert!(tags.contains("jsonRPC-server"));
    }

    #[test]
    fn prefix_must_be_whole_word() {
        let tags = parse("@tgx http-server").unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn list_values_split_on_commas() {
        let tags = parse("@tg http-args=id,name, page").unwrap();
        assert_eq!(tags.values("http-args"), ["id", "name", "page"]);
        assert!(!tags.contains("page"));
    }

    #[test]
    fn list_continuation_stops_at_next_item() {
        let tags = parse("@tg http-headers=token|X-Token, etag http-method=GET").unwrap();
        assert_eq!(tags.values("http-headers"), ["token|X-Token", "etag"]);
        assert_eq!(tags.get("http-method"), Some("GET"));
    }

    #[test]
    fn dangling_list_comma_is_an_error() {
        let err = parse("@tg http-args=id,").unwrap_err();
        assert!(err.message.contains("dangling"));
    }

    #[test]
    fn singular_value_ends_at_whitespace() {
        let tags = parse("@tg summary=a, b").unwrap();
        assert_eq!(tags.get("summary"), Some("a,"));
        assert!(tags.contains("b"));
    }

    #[test]
    fn singular_values_keep_commas() {
        let tags = parse("@tg summary=a,b").unwrap();
        assert_eq!(tags.get("summary"), Some("a,b"));
    }

    #[test]
    fn unterminated_quote_reports_line() {
        let err = parse("intro\n@tg summary=`oops").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = parse("@tg =GET").unwrap_err();
        assert!(err.message.contains("missing key"));
    }

    #[test]
    fn invalid_key_is_an_error() {
        let err = parse("@tg http/method=GET").unwrap_err();
        assert!(err.message.contains("invalid annotation key"));
    }

    #[test]
    fn text_glued_to_quote_is_an_error() {
        assert!(parse("@tg summary=`a`b").is_err());
    }
}
