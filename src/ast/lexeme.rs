/// Lexical units of a path expression.
///
/// Key text is taken verbatim (whitespace inside a key is significant, only
/// the ends are trimmed), so most of the grammar lives in the delimiters.
#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    /// Field name or the wildcard
    ///
    /// # Examples
    /// ```text
    /// customers
    /// date joined
    /// *
    /// ```
    Name(String),

    /// Literal text introduced by `#`
    ///
    /// Runs to the next `,`, `&`, `|` or `>`; a backslash escapes the next
    /// character.
    ///
    /// # Examples
    /// ```text
    /// #N/A
    /// #fixed value
    /// ```
    Literal(String),

    /// Key pattern between slashes
    ///
    /// # Examples
    /// ```text
    /// /^addr/
    /// /date (joined|started)/
    /// ```
    Regex(String),

    /// Raw contents of an index spec, validated by the parser
    ///
    /// # Examples
    /// ```text
    /// [0]
    /// [1..3,-1]
    /// ```
    Index(String),

    /// Start of a lookup
    LAngle,

    /// End of a lookup
    RAngle,

    /// Sequence separator
    Dot,

    /// Each separator
    Comma,

    /// All separator
    Amp,

    /// Any separator
    Pipe,

    /// Reserved inverse marker
    Bang,

    /// End of input
    Eof,
}

impl Lexeme {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Lexeme::Name(n) => format!("name `{n}`"),
            Lexeme::Literal(l) => format!("literal `#{l}`"),
            Lexeme::Regex(r) => format!("regex `/{r}/`"),
            Lexeme::Index(i) => format!("index `[{i}]`"),
            Lexeme::LAngle => "`<`".to_string(),
            Lexeme::RAngle => "`>`".to_string(),
            Lexeme::Dot => "`.`".to_string(),
            Lexeme::Comma => "`,`".to_string(),
            Lexeme::Amp => "`&`".to_string(),
            Lexeme::Pipe => "`|`".to_string(),
            Lexeme::Bang => "`!`".to_string(),
            Lexeme::Eof => "end of input".to_string(),
        }
    }
}
