use std::mem;

use thiserror::Error;

use crate::{
    ast::{IndexSpec, Lexeme, Pattern, Token, token::WILDCARD},
    lexer::{LexError, Lexer},
};

/// Syntax errors, reported when a path is compiled.
///
/// Every variant names the offending path text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{source} in path `{path}`")]
    Lex {
        path: String,
        #[source]
        source: LexError,
    },

    #[error("unexpected {found} at position {position} in path `{path}`")]
    Unexpected {
        path: String,
        found: String,
        position: usize,
    },

    #[error("empty path expression")]
    Empty,

    #[error("invalid index selector `{selector}` at position {position} in path `{path}`")]
    InvalidIndex {
        path: String,
        selector: String,
        position: usize,
    },

    #[error("invalid regex `/{pattern}/` in path `{path}`: {message}")]
    Regex {
        path: String,
        pattern: String,
        message: String,
    },

    #[error("inverse selection `!` at position {position} in path `{path}` is not supported")]
    Unsupported { path: String, position: usize },
}

/// Compile a path expression.
///
/// # Examples
///
/// ```
/// use djc::{parse, Token};
///
/// let token = parse("name.first|#N/A").unwrap();
/// assert!(matches!(token, Token::Any(ref branches) if branches.len() == 2));
/// ```
pub fn parse(text: &str) -> Result<Token, ParseError> {
    Parser::new(Lexer::new(text))?.parse()
}

/// Recursive-descent parser over the lexer's output.
///
/// Precedence, loosest first: `,` then `&` then `|` then `.`.
pub struct Parser {
    lexer: Lexer,
    source: String,
    current_token: Lexeme,
    position: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let source = lexer.source();
        let current_token = lexer.next_token().map_err(|source_err| ParseError::Lex {
            path: source.clone(),
            source: source_err,
        })?;
        let position = lexer.token_start();
        Ok(Parser {
            lexer,
            source,
            current_token,
            position,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token().map_err(|e| ParseError::Lex {
            path: self.source.clone(),
            source: e,
        })?;
        self.position = self.lexer.token_start();
        Ok(())
    }

    fn check(&self, token: &Lexeme) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn unexpected(&self) -> ParseError {
        ParseError::Unexpected {
            path: self.source.clone(),
            found: self.current_token.describe(),
            position: self.position,
        }
    }

    fn expect(&mut self, expected: Lexeme) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected());
        }
        self.advance()
    }

    /// Parse the complete expression; trailing input is an error.
    pub fn parse(&mut self) -> Result<Token, ParseError> {
        if self.check(&Lexeme::Eof) {
            return Err(ParseError::Empty);
        }
        let token = self.parse_each()?;
        if !self.check(&Lexeme::Eof) {
            return Err(self.unexpected());
        }
        Ok(token)
    }

    fn parse_each(&mut self) -> Result<Token, ParseError> {
        let mut branches = vec![self.parse_all()?];
        while self.check(&Lexeme::Comma) {
            self.advance()?;
            branches.push(self.parse_all()?);
        }
        Ok(collapse(branches, Token::Each))
    }

    fn parse_all(&mut self) -> Result<Token, ParseError> {
        let mut branches = vec![self.parse_any()?];
        while self.check(&Lexeme::Amp) {
            self.advance()?;
            branches.push(self.parse_any()?);
        }
        Ok(collapse(branches, Token::All))
    }

    fn parse_any(&mut self) -> Result<Token, ParseError> {
        let mut branches = vec![self.parse_sequence()?];
        while self.check(&Lexeme::Pipe) {
            self.advance()?;
            branches.push(self.parse_sequence()?);
        }
        Ok(collapse(branches, Token::Any))
    }

    fn parse_sequence(&mut self) -> Result<Token, ParseError> {
        let mut steps = vec![self.parse_step()?];
        while self.check(&Lexeme::Dot) {
            self.advance()?;
            steps.push(self.parse_step()?);
        }
        Ok(collapse(steps, Token::Root))
    }

    /// Parse a single step: literal, regex, lookup, or a field with an
    /// optional index spec.
    fn parse_step(&mut self) -> Result<Token, ParseError> {
        let position = self.position;
        match mem::replace(&mut self.current_token, Lexeme::Eof) {
            Lexeme::Literal(text) => {
                self.advance()?;
                Ok(Token::Literal(text))
            }
            Lexeme::Regex(source) => {
                let pattern = Pattern::new(&source).map_err(|e| ParseError::Regex {
                    path: self.source.clone(),
                    pattern: source.clone(),
                    message: e.to_string(),
                })?;
                self.advance()?;
                Ok(Token::RegexKey(pattern))
            }
            Lexeme::LAngle => {
                self.advance()?;
                let inner = self.parse_each()?;
                self.expect(Lexeme::RAngle)?;
                Ok(Token::Lookup(Box::new(inner)))
            }
            Lexeme::Name(key) => {
                self.advance()?;
                let index = self.parse_index()?;
                Ok(Token::PathSegment { key, index })
            }
            index @ Lexeme::Index(_) => {
                // Bare `[spec]` selects from the current list
                self.current_token = index;
                let index = self.parse_index()?;
                Ok(Token::PathSegment {
                    key: WILDCARD.to_string(),
                    index,
                })
            }
            Lexeme::Bang => Err(ParseError::Unsupported {
                path: self.source.clone(),
                position,
            }),
            other => {
                self.current_token = other;
                Err(self.unexpected())
            }
        }
    }

    fn parse_index(&mut self) -> Result<Option<IndexSpec>, ParseError> {
        let Lexeme::Index(raw) = &self.current_token else {
            return Ok(None);
        };
        let spec = IndexSpec::parse(raw).map_err(|selector| ParseError::InvalidIndex {
            path: self.source.clone(),
            selector,
            position: self.position,
        })?;
        self.advance()?;
        Ok(Some(spec))
    }
}

/// A combinator with one member is just that member.
fn collapse(mut items: Vec<Token>, wrap: fn(Vec<Token>) -> Token) -> Token {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}
