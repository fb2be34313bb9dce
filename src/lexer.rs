use thiserror::Error;

use crate::ast::Lexeme;

/// Malformed delimiters or stray characters in a path expression.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at position {position}")]
pub struct LexError {
    pub message: String,
    pub position: usize,
}

/// Characters that end a key run.
const DELIMITERS: &[char] = &['[', ']', '{', '}', '|', '&', ',', '.', '<', '>'];

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
    // `#`, `/` and `!` only mean something where a new step begins
    segment_start: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
            segment_start: true,
        }
    }

    /// The expression being lexed.
    pub fn source(&self) -> String {
        self.input.iter().collect()
    }

    /// Character offset where the last returned lexeme began.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, message: impl Into<String>, position: usize) -> LexError {
        LexError {
            message: message.into(),
            position,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_name(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if DELIMITERS.contains(&ch) {
                break;
            }
            result.push(ch);
            self.advance();
        }
        result.trim_end().to_string()
    }

    fn read_literal(&mut self) -> String {
        let mut result = String::new();
        self.advance(); // Consume '#'

        while let Some(ch) = self.current_char() {
            match ch {
                '\\' => {
                    self.advance();
                    if let Some(escaped) = self.current_char() {
                        result.push(escaped);
                        self.advance();
                    }
                }
                ',' | '&' | '|' | '>' => break,
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
        result
    }

    fn read_regex(&mut self) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening '/'

        while let Some(ch) = self.current_char() {
            match ch {
                '/' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' if self.peek_char(1) == Some('/') => {
                    result.push('/');
                    self.advance();
                    self.advance();
                }
                '\\' => {
                    result.push('\\');
                    self.advance();
                    if let Some(next) = self.current_char() {
                        result.push(next);
                        self.advance();
                    }
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("Unterminated regex: missing closing '/'", start))
    }

    fn read_index(&mut self) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume '['

        while let Some(ch) = self.current_char() {
            match ch {
                ']' => {
                    self.advance();
                    return Ok(result);
                }
                '[' => return Err(self.error("Nested '[' in index spec", self.position)),
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("Unterminated index spec: missing closing ']'", start))
    }

    pub fn next_token(&mut self) -> Result<Lexeme, LexError> {
        self.skip_whitespace();
        self.token_start = self.position;
        let at_segment_start = self.segment_start;
        self.segment_start = true;

        let lexeme = match self.current_char() {
            None => Lexeme::Eof,
            Some('.') => {
                self.advance();
                Lexeme::Dot
            }
            Some(',') => {
                self.advance();
                Lexeme::Comma
            }
            Some('&') => {
                self.advance();
                Lexeme::Amp
            }
            Some('|') => {
                self.advance();
                Lexeme::Pipe
            }
            Some('<') => {
                self.advance();
                Lexeme::LAngle
            }
            Some('>') => {
                self.advance();
                self.segment_start = false;
                Lexeme::RAngle
            }
            Some('[') => {
                self.segment_start = false;
                Lexeme::Index(self.read_index()?)
            }
            Some('#') if at_segment_start => {
                self.segment_start = false;
                Lexeme::Literal(self.read_literal())
            }
            Some('/') if at_segment_start => {
                self.segment_start = false;
                Lexeme::Regex(self.read_regex()?)
            }
            Some('!') if at_segment_start => {
                self.advance();
                Lexeme::Bang
            }
            Some(ch @ (']' | '{' | '}')) => {
                return Err(self.error(format!("Unexpected character '{}'", ch), self.position));
            }
            Some(_) => {
                self.segment_start = false;
                Lexeme::Name(self.read_name())
            }
        };

        Ok(lexeme)
    }

    /// Lex the whole input, ending with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Lexeme>, LexError> {
        let mut out = Vec::new();
        loop {
            let lexeme = self.next_token()?;
            let done = lexeme == Lexeme::Eof;
            out.push(lexeme);
            if done {
                return Ok(out);
            }
        }
    }
}

#[test]
fn test_separators() {
    let mut lexer = Lexer::new("a.b,c&d|e");
    assert_eq!(lexer.next_token(), Ok(Lexeme::Name("a".to_string())));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Dot));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Name("b".to_string())));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Comma));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Name("c".to_string())));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Amp));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Name("d".to_string())));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Pipe));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Name("e".to_string())));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Eof));
}

#[test]
fn test_markers_only_at_segment_start() {
    let mut lexer = Lexer::new("a#b.#c");
    assert_eq!(lexer.next_token(), Ok(Lexeme::Name("a#b".to_string())));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Dot));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Literal("c".to_string())));
    assert_eq!(lexer.next_token(), Ok(Lexeme::Eof));
}
