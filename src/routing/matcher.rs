//! Path template compilation and matching.
//!
//! # Responsibilities
//! - Parse `{name}` and `{name+}` placeholders out of a route template
//! - Compile the template into an anchored regex
//! - Extract named path parameters from a concrete request path
//!
//! # Design Decisions
//! - Templates are compiled once at startup; a malformed template is fatal
//! - `{name}` captures exactly one path segment
//! - `{name+}` captures the rest of the path and must be the last segment
//! - A single trailing slash is optional, whether or not the template has one
//! - Captured values are passed through undecoded

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

/// Errors raised while compiling a route template.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A `{` was never closed.
    #[error("unclosed placeholder in route template `{template}`")]
    Unclosed { template: String },

    /// A `}` appeared without a matching `{`.
    #[error("unexpected `}}` in route template `{template}`")]
    UnexpectedClose { template: String },

    /// A `{` appeared inside another placeholder.
    #[error("nested placeholder in route template `{template}`")]
    Nested { template: String },

    /// `{}` or `{+}`.
    #[error("empty placeholder name in route template `{template}`")]
    EmptyName { template: String },

    /// The same name used twice in one template.
    #[error("duplicate path parameter `{name}` in route template `{template}`")]
    DuplicateName { template: String, name: String },

    /// A greedy `{name+}` placeholder that is not the final segment.
    #[error("greedy placeholder `{name}+` must be the last segment of `{template}`")]
    GreedyNotLast { template: String, name: String },

    /// A method key that is not a valid HTTP method token.
    #[error("invalid method `{method}` on route `{template}`")]
    InvalidMethod { template: String, method: String },

    /// The generated pattern was rejected by the regex engine.
    #[error("failed to compile route template `{template}`: {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Literal(&'a str),
    Param { name: &'a str, greedy: bool },
}

/// Compiled path matcher for a single route template.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
    param_names: Vec<String>,
}

impl PathMatcher {
    /// Compile a template such as `/items/{id}` or `/files/{proxy+}`.
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let tokens = tokenize(template)?;

        let mut pattern = String::with_capacity(template.len() + 8);
        pattern.push('^');
        let mut param_names: Vec<String> = Vec::new();

        let last = tokens.len().saturating_sub(1);
        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::Literal(text) => pattern.push_str(&regex::escape(text)),
                Token::Param { name, greedy } => {
                    if param_names.iter().any(|n| n.as_str() == *name) {
                        return Err(RouteError::DuplicateName {
                            template: template.to_string(),
                            name: name.to_string(),
                        });
                    }
                    if *greedy {
                        let at_segment_end = i == last
                            || matches!(tokens.get(i + 1), Some(Token::Literal("/")));
                        if !at_segment_end || i + 1 < last {
                            return Err(RouteError::GreedyNotLast {
                                template: template.to_string(),
                                name: name.to_string(),
                            });
                        }
                        pattern.push_str("(.+?)");
                    } else {
                        pattern.push_str("([^/]+)");
                    }
                    param_names.push(name.to_string());
                }
            }
        }

        // `items` and `items/` both accept either form of the path.
        if pattern.ends_with('/') {
            pattern.pop();
        }
        pattern.push_str("/?$");

        let regex = Regex::new(&pattern).map_err(|source| RouteError::Regex {
            template: template.to_string(),
            source,
        })?;

        Ok(Self { regex, param_names })
    }

    /// Returns true if `path` matches this template.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and return the extracted parameters, or `None`.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let mut params = HashMap::with_capacity(self.param_names.len());
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(value) = captures.get(i + 1) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }
        Some(params)
    }

    /// Parameter names in template order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }
}

/// Split a template into literal runs and placeholders.
fn tokenize(template: &str) -> Result<Vec<Token<'_>>, RouteError> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        let open = rest.find('{');
        let close = rest.find('}');

        match (open, close) {
            (None, None) => {
                push_literal(&mut tokens, rest);
                break;
            }
            (None, Some(_)) => {
                return Err(RouteError::UnexpectedClose {
                    template: template.to_string(),
                })
            }
            (Some(o), Some(c)) if c < o => {
                return Err(RouteError::UnexpectedClose {
                    template: template.to_string(),
                })
            }
            (Some(_), None) => {
                return Err(RouteError::Unclosed {
                    template: template.to_string(),
                })
            }
            (Some(o), Some(c)) => {
                push_literal(&mut tokens, &rest[..o]);
                let inner = &rest[o + 1..c];
                if inner.contains('{') {
                    return Err(RouteError::Nested {
                        template: template.to_string(),
                    });
                }
                let (name, greedy) = match inner.strip_suffix('+') {
                    Some(name) => (name, true),
                    None => (inner, false),
                };
                if name.is_empty() {
                    return Err(RouteError::EmptyName {
                        template: template.to_string(),
                    });
                }
                tokens.push(Token::Param { name, greedy });
                rest = &rest[c + 1..];
            }
        }
    }

    Ok(tokens)
}

fn push_literal<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str) {
    if text.is_empty() {
        return;
    }
    // Keep a lone trailing slash separate for the greedy position check.
    if text.len() > 1 && text.ends_with('/') {
        tokens.push(Token::Literal(&text[..text.len() - 1]));
        tokens.push(Token::Literal("/"));
    } else {
        tokens.push(Token::Literal(text));
    }
}
