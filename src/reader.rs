use crate::tokens::{tokenize, Token, TokenKind, TokenizerError};
use crate::types::{Node, Symbol};
use std::fmt;
use std::iter::Peekable;
use std::slice;

type Reader<'a> = Peekable<slice::Iter<'a, Token<'a>>>;

pub type Result<T = Vec<Node>> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    TokenizerError(TokenizerError),
    NoMoreTokens,
    UnclosedList { line: usize },
    UnexpectedToken { lexeme: String, line: usize },
    TooDeep { line: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TokenizerError(e) => write!(f, "{}", e),
            Error::NoMoreTokens => write!(f, "unexpected end of input"),
            Error::UnclosedList { line } => {
                write!(f, "[line {}] unterminated list", line)
            }
            Error::UnexpectedToken { lexeme, line } => {
                write!(f, "[line {}] unexpected token: '{}'", line, lexeme)
            }
            Error::TooDeep { line } => {
                write!(f, "[line {}] lists nested more than {} deep", line, MAX_NESTING)
            }
        }
    }
}

impl From<TokenizerError> for Error {
    fn from(e: TokenizerError) -> Self {
        Error::TokenizerError(e)
    }
}

/// Deepest list nesting the reader accepts.
pub const MAX_NESTING: usize = 512;

/// Reads every top-level form in `input`.
pub fn read_str(input: &str) -> Result {
    let tokens = tokenize(input)?;
    read_tokens(&tokens)
}

pub fn read_tokens<'a>(tokens: &'a [Token<'a>]) -> Result {
    let mut reader = tokens.iter().peekable();
    let mut forms = Vec::new();
    loop {
        match reader.peek() {
            None | Some(Token {
                kind: TokenKind::End,
                ..
            }) => break,
            Some(_) => forms.push(read_form(&mut reader, 0)?),
        }
    }
    Ok(forms)
}

fn read_form(reader: &mut Reader, depth: usize) -> Result<Node> {
    let token = reader.next().ok_or(Error::NoMoreTokens)?;
    match token.kind {
        TokenKind::LeftParen if depth >= MAX_NESTING => Err(Error::TooDeep { line: token.line }),
        TokenKind::LeftParen => read_list(reader, token.line, depth + 1).map(Node::wrap_list),
        TokenKind::Number | TokenKind::String => match &token.literal {
            Some(literal) => Ok(Node::Literal(literal.clone())),
            None => Err(unexpected(token)),
        },
        TokenKind::Symbol => Ok(Node::Symbol(Symbol::from(token.lexeme))),
        TokenKind::RightParen | TokenKind::End => Err(unexpected(token)),
    }
}

fn read_list(reader: &mut Reader, opened_on: usize, depth: usize) -> Result<Vec<Node>> {
    let mut elements = Vec::new();
    loop {
        match reader.peek() {
            Some(Token {
                kind: TokenKind::RightParen,
                ..
            }) => {
                reader.next();
                return Ok(elements);
            }
            None
            | Some(Token {
                kind: TokenKind::End,
                ..
            }) => return Err(Error::UnclosedList { line: opened_on }),
            Some(_) => elements.push(read_form(reader, depth)?),
        }
    }
}

fn unexpected(token: &Token) -> Error {
    Error::UnexpectedToken {
        lexeme: token.lexeme.to_owned(),
        line: token.line,
    }
}
