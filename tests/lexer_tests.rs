// tests/lexer_tests.rs

use djc::ast::Lexeme;
use djc::lexer::Lexer;

fn lex(input: &str) -> Vec<Lexeme> {
    Lexer::new(input).tokenize().unwrap()
}

fn name(s: &str) -> Lexeme {
    Lexeme::Name(s.to_string())
}

// ============================================================================
// Separators
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        (".", Lexeme::Dot),
        (",", Lexeme::Comma),
        ("&", Lexeme::Amp),
        ("|", Lexeme::Pipe),
        ("<", Lexeme::LAngle),
        (">", Lexeme::RAngle),
        ("!", Lexeme::Bang),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Lexeme::Eof);
    }
}

#[test]
fn test_empty_input() {
    assert_eq!(lex(""), vec![Lexeme::Eof]);
    assert_eq!(lex("   "), vec![Lexeme::Eof]);
}

// ============================================================================
// Names
// ============================================================================

#[test]
fn test_names_trimmed_at_ends_only() {
    assert_eq!(
        lex("  date joined . name "),
        vec![name("date joined"), Lexeme::Dot, name("name"), Lexeme::Eof]
    );
}

#[test]
fn test_wildcard_is_a_name() {
    assert_eq!(lex("*.x"), vec![name("*"), Lexeme::Dot, name("x"), Lexeme::Eof]);
}

#[test]
fn test_name_keeps_odd_characters() {
    assert_eq!(lex("a-b_c:d"), vec![name("a-b_c:d"), Lexeme::Eof]);
    assert_eq!(lex("x/y"), vec![name("x/y"), Lexeme::Eof]);
}

#[test]
fn test_stray_closing_bracket() {
    let err = Lexer::new("a]").tokenize().unwrap_err();
    assert_eq!(err.position, 1);
}

#[test]
fn test_braces_rejected() {
    assert!(Lexer::new("{a}").tokenize().is_err());
}

// ============================================================================
// Index specs
// ============================================================================

#[test]
fn test_index_raw_contents() {
    assert_eq!(
        lex("items[0, 2..3]"),
        vec![name("items"), Lexeme::Index("0, 2..3".to_string()), Lexeme::Eof]
    );
}

#[test]
fn test_bare_index() {
    assert_eq!(lex("[1]"), vec![Lexeme::Index("1".to_string()), Lexeme::Eof]);
}

#[test]
fn test_unterminated_index() {
    let err = Lexer::new("a[1").tokenize().unwrap_err();
    assert_eq!(err.position, 1);
    assert!(err.message.contains("Unterminated"));
}

#[test]
fn test_nested_index_rejected() {
    assert!(Lexer::new("a[[1]]").tokenize().is_err());
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_literal_runs_to_separator() {
    assert_eq!(
        lex("#N/A|x"),
        vec![Lexeme::Literal("N/A".to_string()), Lexeme::Pipe, name("x"), Lexeme::Eof]
    );
}

#[test]
fn test_literal_keeps_dots_and_spaces() {
    assert_eq!(
        lex("#1.5 kg"),
        vec![Lexeme::Literal("1.5 kg".to_string()), Lexeme::Eof]
    );
}

#[test]
fn test_literal_escapes() {
    assert_eq!(
        lex(r"#a\,b\|c\\d"),
        vec![Lexeme::Literal(r"a,b|c\d".to_string()), Lexeme::Eof]
    );
}

#[test]
fn test_literal_ends_at_lookup_close() {
    assert_eq!(
        lex("<#x>"),
        vec![
            Lexeme::LAngle,
            Lexeme::Literal("x".to_string()),
            Lexeme::RAngle,
            Lexeme::Eof
        ]
    );
}

// ============================================================================
// Regexes
// ============================================================================

#[test]
fn test_regex() {
    assert_eq!(
        lex("/^addr/.city"),
        vec![
            Lexeme::Regex("^addr".to_string()),
            Lexeme::Dot,
            name("city"),
            Lexeme::Eof
        ]
    );
}

#[test]
fn test_regex_escaped_slash() {
    assert_eq!(lex(r"/a\/b/"), vec![Lexeme::Regex("a/b".to_string()), Lexeme::Eof]);
}

#[test]
fn test_regex_keeps_other_escapes() {
    assert_eq!(lex(r"/\d+/"), vec![Lexeme::Regex(r"\d+".to_string()), Lexeme::Eof]);
}

#[test]
fn test_unterminated_regex() {
    let err = Lexer::new("a./abc").tokenize().unwrap_err();
    assert_eq!(err.position, 2);
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_token_start_positions() {
    let mut lexer = Lexer::new("ab . cd");
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), 0);
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), 3);
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), 5);
}
