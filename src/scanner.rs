use std::str::Chars;

use crate::token::{ReservedWord, Token, TokenKind};

/// DFA states of the scanner. `Done` is implicit: every arm that finishes a
/// token returns it directly.
enum State {
    Start,
    InAssign,
    InComment,
    InString,
    InNum,
    InId,
}

pub struct Scanner<'a> {
    chars: Chars<'a>,
    pushback: Option<char>,
    line: usize,
    reserved: &'a [ReservedWord],
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, reserved: &'a [ReservedWord]) -> Self {
        Self {
            chars: source.chars(),
            pushback: None,
            line: 1,
            reserved,
        }
    }

    fn next_char(&mut self) -> Option<char> {
        let next = self.pushback.take().or_else(|| self.chars.next());
        if next == Some('\n') {
            self.line += 1;
        }
        next
    }

    // One character of pushback. The line counter is rewound so that
    // re-reading a pushed-back newline does not count it twice.
    fn unread(&mut self, c: char) {
        if c == '\n' {
            self.line -= 1;
        }
        self.pushback = Some(c);
    }

    pub fn next_token(&mut self) -> Token {
        let mut state = State::Start;
        let mut spelling = String::new();
        let mut line = self.line;

        loop {
            let next = self.next_char();
            match state {
                State::Start => match next {
                    None => return Token::new(TokenKind::Eof, "", self.line),
                    Some(c) if c.is_ascii_digit() => {
                        line = self.line;
                        spelling.push(c);
                        state = State::InNum;
                    }
                    Some(c) if c.is_alphabetic() || c == '_' => {
                        line = self.line;
                        spelling.push(c);
                        state = State::InId;
                    }
                    Some(':') => {
                        line = self.line;
                        spelling.push(':');
                        state = State::InAssign;
                    }
                    Some(' ') | Some('\t') | Some('\n') => {}
                    Some('#') => state = State::InComment,
                    Some('"') => {
                        line = self.line;
                        state = State::InString;
                    }
                    Some(c) => {
                        let kind = match c {
                            '=' => TokenKind::Eq,
                            '<' => TokenKind::Lt,
                            '+' => TokenKind::Plus,
                            '-' => TokenKind::Minus,
                            '*' => TokenKind::Times,
                            '/' => TokenKind::Over,
                            '(' => TokenKind::LParen,
                            ')' => TokenKind::RParen,
                            ';' => TokenKind::Semi,
                            _ => TokenKind::Error,
                        };
                        return Token::new(kind, c.to_string(), self.line);
                    }
                },
                State::InComment => match next {
                    // EOF inside a comment produces the EOF token directly.
                    None => return Token::new(TokenKind::Eof, "", self.line),
                    Some('#') => state = State::Start,
                    Some(_) => {}
                },
                State::InAssign => match next {
                    Some('=') => {
                        spelling.push('=');
                        return Token::new(TokenKind::Assign, spelling, line);
                    }
                    other => {
                        if let Some(c) = other {
                            self.unread(c);
                        }
                        return Token::new(TokenKind::Error, spelling, line);
                    }
                },
                State::InNum => match next {
                    Some(c) if c.is_ascii_digit() => spelling.push(c),
                    other => {
                        if let Some(c) = other {
                            self.unread(c);
                        }
                        return Token::new(TokenKind::Num, spelling, line);
                    }
                },
                State::InId => match next {
                    Some(c) if c.is_alphabetic() || c == '_' => spelling.push(c),
                    other => {
                        if let Some(c) = other {
                            self.unread(c);
                        }
                        let kind = reserved_lookup(&spelling, self.reserved);
                        return Token::new(kind, spelling, line);
                    }
                },
                State::InString => match next {
                    Some('"') => return Token::new(TokenKind::Str, spelling, line),
                    Some(c) => spelling.push(c),
                    // Unterminated string; the parser will report it.
                    None => return Token::new(TokenKind::Error, spelling, line),
                },
            }
        }
    }
}

fn reserved_lookup(spelling: &str, reserved: &[ReservedWord]) -> TokenKind {
    reserved
        .iter()
        .find(|word| word.spelling == spelling)
        .map(|word| word.kind)
        .unwrap_or(TokenKind::Id)
}

/// Reduces the whole source to a token sequence ending in exactly one EOF
/// token. Unrecognized input becomes `Error` tokens; those only turn fatal
/// once the parser tries to match them.
pub fn tokenize(source: &str, reserved: &[ReservedWord]) -> Vec<Token> {
    let mut scanner = Scanner::new(source, reserved);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token();
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}
