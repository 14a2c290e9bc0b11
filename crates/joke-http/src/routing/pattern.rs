//! Route pattern parsing and compilation
//!
//! A pattern is literal text with `{name}` / `{name:rule}` placeholders and
//! an optional trailing `{*}` wildcard captured as `path`.

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;

use super::rules::{is_known_rule, rule_pattern};

/// Name of the capture holding the wildcard remainder
pub const WILDCARD_PARAM: &str = "path";

/// Errors that can occur during route pattern operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutePatternError {
    #[error("Invalid pattern syntax: {0}")]
    InvalidSyntax(String),
    #[error("Invalid parameter name: '{0}'")]
    InvalidParameterName(String),
    #[error("Wildcard {{*}} must be the last segment")]
    WildcardNotLast,
    #[error("Duplicate parameter name: {0}")]
    DuplicateParameter(String),
    #[error("Pattern failed to compile: {0}")]
    Compile(String),
}

/// A piece of a parsed route pattern
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Literal text, matched exactly (ignoring case)
    Literal(String),
    /// Named placeholder with its rule name
    Placeholder { name: String, rule: String },
    /// Trailing `{*}`
    Wildcard,
}

/// Parsed route pattern
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePattern {
    /// The original path string
    pub original_path: String,
    pub segments: Vec<PathSegment>,
    /// Parameter names in order of appearance
    pub param_names: Vec<String>,
}

impl RoutePattern {
    /// Parse a route pattern from a path string
    pub fn parse(path: &str) -> Result<Self, RoutePatternError> {
        let mut segments = Vec::new();
        let mut param_names = Vec::new();
        let mut seen = HashSet::new();
        let mut rest = path;

        while !rest.is_empty() {
            if segments.last() == Some(&PathSegment::Wildcard) {
                return Err(RoutePatternError::WildcardNotLast);
            }

            let Some(open) = rest.find(['{', '}']) else {
                segments.push(PathSegment::Literal(rest.to_string()));
                break;
            };
            if rest[open..].starts_with('}') {
                return Err(RoutePatternError::InvalidSyntax(format!(
                    "unexpected '}}' in '{}'",
                    path
                )));
            }
            if open > 0 {
                segments.push(PathSegment::Literal(rest[..open].to_string()));
            }

            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                RoutePatternError::InvalidSyntax(format!("unclosed '{{' in '{}'", path))
            })?;
            let token = after[..close].trim();
            rest = &after[close + 1..];

            let (segment, name) = Self::parse_placeholder(token)?;
            if !seen.insert(name.clone()) {
                return Err(RoutePatternError::DuplicateParameter(name));
            }
            param_names.push(name);
            segments.push(segment);
        }

        Ok(Self {
            original_path: path.to_string(),
            segments,
            param_names,
        })
    }

    fn parse_placeholder(token: &str) -> Result<(PathSegment, String), RoutePatternError> {
        if token == "*" {
            return Ok((PathSegment::Wildcard, WILDCARD_PARAM.to_string()));
        }

        let (name, rule) = match token.split_once(':') {
            Some((name, rule)) => (name.trim(), rule.trim()),
            None => (token, "default"),
        };
        if !is_identifier(name) {
            return Err(RoutePatternError::InvalidParameterName(name.to_string()));
        }
        if !is_known_rule(rule) {
            tracing::debug!(rule, parameter = name, "unknown route rule, using default");
        }

        Ok((
            PathSegment::Placeholder {
                name: name.to_string(),
                rule: rule.to_string(),
            },
            name.to_string(),
        ))
    }

    /// Regex source: anchored, case-insensitive, one named group per parameter
    pub fn regex_source(&self) -> String {
        let mut source = String::from("(?i)^");
        for segment in &self.segments {
            match segment {
                PathSegment::Literal(text) => source.push_str(&regex::escape(text)),
                PathSegment::Placeholder { name, rule } => {
                    source.push_str(&format!("(?P<{}>{})", name, rule_pattern(rule)));
                }
                PathSegment::Wildcard => {
                    source.push_str(&format!("(?P<{}>.*)", WILDCARD_PARAM));
                }
            }
        }
        source.push('$');
        source
    }

    /// Compile the pattern
    pub fn compile(&self) -> Result<Regex, RoutePatternError> {
        Regex::new(&self.regex_source()).map_err(|e| RoutePatternError::Compile(e.to_string()))
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.last() == Some(&PathSegment::Wildcard)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_placeholders_and_literals() {
        let pattern = RoutePattern::parse("/api/{section}/{num:id}").unwrap();
        assert_eq!(
            pattern.segments,
            vec![
                PathSegment::Literal("/api/".to_string()),
                PathSegment::Placeholder {
                    name: "section".to_string(),
                    rule: "default".to_string()
                },
                PathSegment::Literal("/".to_string()),
                PathSegment::Placeholder {
                    name: "num".to_string(),
                    rule: "id".to_string()
                },
            ]
        );
        assert_eq!(pattern.param_names, vec!["section", "num"]);
    }

    #[test]
    fn test_placeholder_inside_segment() {
        let regex = RoutePattern::parse("/files/{name}.{ext}").unwrap().compile().unwrap();
        let caps = regex.captures("/files/report.pdf").unwrap();
        assert_eq!(&caps["name"], "report");
        assert_eq!(&caps["ext"], "pdf");
    }

    #[test]
    fn test_literals_are_escaped() {
        let regex = RoutePattern::parse("/v1.0/status").unwrap().compile().unwrap();
        assert!(regex.is_match("/v1.0/status"));
        assert!(!regex.is_match("/v1x0/status"));
    }

    #[test]
    fn test_wildcard() {
        let pattern = RoutePattern::parse("/assets/{*}").unwrap();
        assert!(pattern.has_wildcard());
        let caps = pattern.compile().unwrap().captures("/assets/css/site.css").unwrap();
        assert_eq!(&caps["path"], "css/site.css");

        assert_eq!(
            RoutePattern::parse("/assets/{*}/more"),
            Err(RoutePatternError::WildcardNotLast)
        );
    }

    #[test]
    fn test_case_insensitive_and_anchored() {
        let regex = RoutePattern::parse("/name/{name:slug}").unwrap().compile().unwrap();
        assert!(regex.is_match("/NAME/Alex"));
        assert!(!regex.is_match("/name/Alex/extra"));
        assert!(!regex.is_match("/prefix/name/Alex"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            RoutePattern::parse("/users/{id"),
            Err(RoutePatternError::InvalidSyntax(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/users/id}"),
            Err(RoutePatternError::InvalidSyntax(_))
        ));
        assert_eq!(
            RoutePattern::parse("/users/{1st}"),
            Err(RoutePatternError::InvalidParameterName("1st".to_string()))
        );
        assert_eq!(
            RoutePattern::parse("/{id}/{id:int}"),
            Err(RoutePatternError::DuplicateParameter("id".to_string()))
        );
        assert_eq!(
            RoutePattern::parse("/{path}/{*}"),
            Err(RoutePatternError::DuplicateParameter("path".to_string()))
        );
    }
}
