use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Error,

    // Reserved words
    If,
    Then,
    Else,
    End,
    Repeat,
    Until,
    Read,
    Write,

    // Multi-character tokens
    Id,
    Num,
    Str,

    // Special symbols
    Assign, // :=
    Eq,     // =
    Lt,     // <
    Plus,   // +
    Minus,  // -
    Times,  // *
    Over,   // /
    LParen, // (
    RParen, // )
    Semi,   // ;
}

impl TokenKind {
    pub fn is_reserved(self) -> bool {
        use TokenKind::*;
        matches!(self, If | Then | Else | End | Repeat | Until | Read | Write)
    }
}

/// One spelling of a reserved word, as supplied by the localization table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedWord {
    pub kind: TokenKind,
    pub spelling: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub spelling: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, spelling: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            spelling: spelling.into(),
            line,
        }
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;

        if self.kind.is_reserved() {
            return write!(fmt, "reserved word: {}", self.spelling);
        }
        match self.kind {
            Id => write!(fmt, "ID, name= {}", self.spelling),
            Num => write!(fmt, "NUM, val= {}", self.spelling),
            Str => write!(fmt, "STRING: {}", self.spelling),
            Error => write!(fmt, "ERROR: {}", self.spelling),
            Eof => fmt.write_str("EOF"),
            Assign => fmt.write_str(":="),
            Eq => fmt.write_str("="),
            Lt => fmt.write_str("<"),
            Plus => fmt.write_str("+"),
            Minus => fmt.write_str("-"),
            Times => fmt.write_str("*"),
            Over => fmt.write_str("/"),
            LParen => fmt.write_str("("),
            RParen => fmt.write_str(")"),
            Semi => fmt.write_str(";"),
            _ => fmt.write_str(&self.spelling),
        }
    }
}
