use crate::types::{Int, Literal};
use regex::{Captures, Regex};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    Symbol,
    String,
    Number,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, lexeme: &'a str, line: usize) -> Self {
        Token {
            kind,
            lexeme,
            literal: None,
            line,
        }
    }

    fn with_literal(kind: TokenKind, lexeme: &'a str, literal: Literal, line: usize) -> Self {
        Token {
            kind,
            lexeme,
            literal: Some(literal),
            line,
        }
    }
}

#[derive(Debug)]
pub enum TokenizerError {
    UnterminatedString { line: usize },
    InvalidCharacter { character: char, line: usize },
    BadNumber { lexeme: String, line: usize },
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::UnterminatedString { line } => {
                write!(f, "[line {}] unterminated string", line)
            }
            TokenizerError::InvalidCharacter { character, line } => {
                write!(f, "[line {}] unexpected character: {:?}", line, character)
            }
            TokenizerError::BadNumber { lexeme, line } => {
                write!(f, "[line {}] number out of range: {}", line, lexeme)
            }
        }
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

fn create_token<'a>(caps: &Captures<'a>, line: usize) -> Result<Option<Token<'a>>, TokenizerError> {
    use TokenKind::*;
    let group = |name| caps.name(name).map(|m| m.as_str());

    if group("space").is_some() || group("comment").is_some() {
        return Ok(None);
    }
    if let Some(lexeme) = group("open") {
        return Ok(Some(Token::new(LeftParen, lexeme, line)));
    }
    if let Some(lexeme) = group("close") {
        return Ok(Some(Token::new(RightParen, lexeme, line)));
    }
    if let Some(lexeme) = group("number") {
        let value = lexeme
            .parse::<Int>()
            .map_err(|_| TokenizerError::BadNumber {
                lexeme: lexeme.to_owned(),
                line,
            })?;
        return Ok(Some(Token::with_literal(
            Number,
            lexeme,
            Literal::Integer(value),
            line,
        )));
    }
    if let Some(lexeme) = group("string") {
        return tokenize_string_literal(lexeme, line).map(Some);
    }
    match group("symbol") {
        Some(lexeme) => Ok(Some(Token::new(Symbol, lexeme, line))),
        None => Ok(None),
    }
}

fn tokenize_string_literal(lexeme: &str, line: usize) -> Result<Token, TokenizerError> {
    // The pattern runs to the end of input when there is no closing quote.
    if lexeme.len() < 2 || !lexeme.ends_with('"') {
        return Err(TokenizerError::UnterminatedString { line });
    }
    let payload = &lexeme[1..lexeme.len() - 1];
    Ok(Token::with_literal(
        TokenKind::String,
        lexeme,
        Literal::String(payload.to_owned()),
        line,
    ))
}

/// Splits `input` into tokens. The returned sequence always ends with a
/// `TokenKind::End` token carrying the last line number.
pub fn tokenize(input: &str) -> Result<Vec<Token>, TokenizerError> {
    lazy_static! {
        static ref TOKEN_RE: Regex = Regex::new(
            r#"(?x)                                  # ignore whitespace in this pattern & allow comments
                ^(?:
                    (?P<space>[\ \t\r\n]+)           # whitespace, skipped
                    |(?P<comment>\$[^\n]*)           # comment, runs to the end of the line
                    |(?P<open>\()
                    |(?P<close>\))
                    |(?P<number>[0-9]+)              # digits only: no sign, no decimal point
                    |(?P<string>"[^"]*"?)            # possibly missing a closing quote
                    |(?P<symbol>[^\x20()"$\p{Cc}][^\x20()"\p{Cc}]*) # no Unicode \s here
                )
            "#
        )
        .unwrap();
    }
    let mut input = input;
    let mut line = 1;
    let mut tokens = Vec::new();
    while let Some(first) = input.chars().next() {
        let caps = TOKEN_RE
            .captures(input)
            .ok_or(TokenizerError::InvalidCharacter {
                character: first,
                line,
            })?;
        let matched = caps.get(0).map_or("", |m| m.as_str());
        if let Some(token) = create_token(&caps, line)? {
            tokens.push(token);
        }
        line += count_newlines(matched);
        input = &input[matched.len()..];
    }
    tokens.push(Token::new(TokenKind::End, "", line));
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn parens_and_end() {
        assert_eq!(kinds("()"), vec![LeftParen, RightParen, End]);
        assert_eq!(kinds(""), vec![End]);
    }

    #[test]
    fn simple_expression() {
        assert_eq!(
            kinds("(add 2 3)"),
            vec![LeftParen, Symbol, Number, Number, RightParen, End]
        );
    }

    #[test]
    fn number_literal() {
        let tokens = tokenize("42").unwrap();
        assert_eq!(tokens[0].kind, Number);
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[0].literal, Some(Literal::Integer(42)));
    }

    #[test]
    fn digits_stop_a_number() {
        let tokens = tokenize("12ab x1").unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Integer(12)));
        assert_eq!(tokens[1].kind, Symbol);
        assert_eq!(tokens[1].lexeme, "ab");
        assert_eq!(tokens[2].lexeme, "x1");
    }

    #[test]
    fn string_literal() {
        let tokens = tokenize(r#""world""#).unwrap();
        assert_eq!(tokens[0].kind, String);
        assert_eq!(tokens[0].lexeme, "\"world\"");
        assert_eq!(tokens[0].literal, Some(Literal::String("world".into())));
    }

    #[test]
    fn string_stops_a_symbol() {
        let tokens = tokenize(r#"abc"def""#).unwrap();
        assert_eq!(tokens[0].lexeme, "abc");
        assert_eq!(tokens[1].literal, Some(Literal::String("def".into())));
    }

    #[test]
    fn operators_are_symbols() {
        let tokens = tokenize("(<= != + empty? -)").unwrap();
        let lexemes: Vec<&str> = tokens[1..6].iter().map(|t| t.lexeme).collect();
        assert_eq!(lexemes, vec!["<=", "!=", "+", "empty?", "-"]);
        assert!(tokens[1..6].iter().all(|t| t.kind == Symbol));
    }

    #[test]
    fn unterminated_string() {
        match tokenize("\n\"hello world") {
            Err(TokenizerError::UnterminatedString { line }) => assert_eq!(line, 2),
            other => panic!("expected unterminated string, got {:?}", other),
        }
    }

    #[test]
    fn invalid_character() {
        match tokenize("(a \u{7} b)") {
            Err(TokenizerError::InvalidCharacter { character, line }) => {
                assert_eq!(character, '\u{7}');
                assert_eq!(line, 1);
            }
            other => panic!("expected invalid character, got {:?}", other),
        }
    }

    #[test]
    fn only_ascii_whitespace_separates() {
        let tokens = tokenize("(define a\u{a0}b 1)").unwrap();
        assert_eq!(tokens[2].kind, Symbol);
        assert_eq!(tokens[2].lexeme, "a\u{a0}b");
        assert_eq!(kinds("\u{2003}x"), vec![Symbol, End]);
    }

    #[test]
    fn number_too_large() {
        assert!(matches!(
            tokenize("99999999999999999999"),
            Err(TokenizerError::BadNumber { .. })
        ));
    }

    #[test]
    fn lines_are_counted() {
        let tokens = tokenize("(a\n \"x\ny\"\r\n  b)").unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 2, 4, 4, 4]);
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = tokenize("(read-int x) $ trailing (words)\ny").unwrap();
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme).collect();
        assert_eq!(lexemes, vec!["(", "read-int", "x", ")", "y", ""]);
        assert_eq!(tokens[4].line, 2);
    }
}
