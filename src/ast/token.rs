use std::fmt;

use regex::Regex;

use crate::ast::{IndexSpec, Selector};

/// Name of the broadcast wildcard segment.
pub const WILDCARD: &str = "*";

/// A compiled regular expression that remembers its source text.
///
/// Two patterns are equal when their sources are.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Pattern {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Parsed path expression.
///
/// Immutable once built; the evaluator only reads it.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Constant text (`#text`)
    Literal(String),

    /// Field access with an optional index spec
    ///
    /// # Examples
    /// ```text
    /// name          // PathSegment { key: "name", index: None }
    /// items[0]      // PathSegment { key: "items", index: Some([0]) }
    /// [1..2]        // PathSegment { key: "*", index: Some([1..2]) }
    /// ```
    PathSegment {
        key: String,
        index: Option<IndexSpec>,
    },

    /// Values of every key matching the pattern (`/regex/`)
    RegexKey(Pattern),

    /// First non-null branch (`a|b`)
    Any(Vec<Token>),

    /// Every branch, or null if one is missing (`a&b`)
    All(Vec<Token>),

    /// Every branch positionally (`a,b`)
    Each(Vec<Token>),

    /// Resolve the inner result again from the document root (`<expr>`)
    Lookup(Box<Token>),

    /// Complement selection. Reserved: rejected by the parser and the
    /// evaluator until it has a defined meaning.
    Inverse(Box<Token>),

    /// Steps applied one after another (`a.b.c`)
    Root(Vec<Token>),
}

impl Token {
    /// Plain field access without an index spec.
    pub fn segment(key: &str) -> Self {
        Token::PathSegment {
            key: key.to_string(),
            index: None,
        }
    }

    /// Whether this is the bare `*` segment (with or without index spec).
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Token::PathSegment { key, .. } if key == WILDCARD)
    }

    /// Whether the token walks into the current node, and so distributes
    /// over a list input. Numeric keys index the list itself.
    pub fn navigates(&self) -> bool {
        match self {
            Token::PathSegment { key, .. } => key != WILDCARD && key.parse::<i64>().is_err(),
            Token::RegexKey(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Token {
    /// Renders the token back to surface syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Token], sep: &str) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Token::Literal(text) => {
                f.write_str("#")?;
                for ch in text.chars() {
                    if matches!(ch, ',' | '&' | '|' | '>' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{ch}")?;
                }
                Ok(())
            }
            Token::PathSegment { key, index } => {
                f.write_str(key)?;
                if let Some(spec) = index {
                    f.write_str("[")?;
                    for (i, sel) in spec.selectors().iter().enumerate() {
                        if i > 0 {
                            f.write_str(",")?;
                        }
                        match sel {
                            Selector::Index(n) => write!(f, "{n}")?,
                            Selector::Range { start, end, inclusive: true } => {
                                write!(f, "{start}..{end}")?
                            }
                            Selector::Range { start, end, inclusive: false } => {
                                write!(f, "{start}...{end}")?
                            }
                            Selector::From(n) => write!(f, "{n}+")?,
                        }
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
            Token::RegexKey(pattern) => write!(f, "/{}/", pattern.as_str().replace('/', "\\/")),
            Token::Any(items) => join(f, items, "|"),
            Token::All(items) => join(f, items, "&"),
            Token::Each(items) => join(f, items, ","),
            Token::Lookup(inner) => write!(f, "<{inner}>"),
            Token::Inverse(inner) => write!(f, "!{inner}"),
            Token::Root(items) => join(f, items, "."),
        }
    }
}
