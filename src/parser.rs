use thiserror::Error;

use crate::ast::{BinaryOperator, Expr, Program, Stmt};
use crate::token::{Token, TokenKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Syntax error at line {line}, unexpected token -> {found}")]
pub struct SyntaxError {
    pub line: usize,
    pub found: String,
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn advance(&mut self) {
        // The token stream always ends in EOF; never step past it.
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn match_kind(&mut self, expected: TokenKind) -> Result<(), SyntaxError> {
        if self.current().kind == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }

    fn syntax_error(&self) -> SyntaxError {
        let token = self.current();
        SyntaxError {
            line: token.line,
            found: token.to_string(),
        }
    }

    fn program(&mut self) -> Result<Program, SyntaxError> {
        let mut statements = Vec::new();
        while self.current().kind != TokenKind::Eof {
            // A stray `end`, `else` or `until` between top-level sequences is
            // skipped; this is what makes the closing `end` of an if
            // statement optional.
            if matches!(
                self.current().kind,
                TokenKind::End | TokenKind::Else | TokenKind::Until
            ) {
                self.advance();
            }
            if self.current().kind == TokenKind::Eof {
                break;
            }
            statements.extend(self.stmt_sequence()?);
        }
        Ok(Program { statements })
    }

    fn stmt_sequence(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut statements = vec![self.statement()?];
        while !matches!(
            self.current().kind,
            TokenKind::Eof | TokenKind::End | TokenKind::Else | TokenKind::Until
        ) {
            self.match_kind(TokenKind::Semi)?;
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Stmt, SyntaxError> {
        match self.current().kind {
            TokenKind::If => self.if_stmt(),
            TokenKind::Repeat => self.repeat_stmt(),
            TokenKind::Id => self.assign_stmt(),
            TokenKind::Read => self.read_stmt(),
            TokenKind::Write => self.write_stmt(),
            _ => Err(self.syntax_error()),
        }
    }

    fn if_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        self.match_kind(TokenKind::If)?;
        let test = self.exp()?;
        self.match_kind(TokenKind::Then)?;
        let then_branch = self.stmt_sequence()?;
        let else_branch = if self.current().kind == TokenKind::Else {
            self.advance();
            self.stmt_sequence()?
        } else {
            Vec::new()
        };
        Ok(Stmt::If {
            test,
            then_branch,
            else_branch,
            line,
        })
    }

    fn repeat_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        self.match_kind(TokenKind::Repeat)?;
        let body = self.stmt_sequence()?;
        self.match_kind(TokenKind::Until)?;
        let test = self.exp()?;
        Ok(Stmt::Repeat { body, test, line })
    }

    fn assign_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        let name = self.expect_identifier()?;
        self.match_kind(TokenKind::Assign)?;
        let value = self.exp()?;
        Ok(Stmt::Assign { name, value, line })
    }

    fn read_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        self.match_kind(TokenKind::Read)?;
        let name = self.expect_identifier()?;
        Ok(Stmt::Read { name, line })
    }

    fn write_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let line = self.current().line;
        self.match_kind(TokenKind::Write)?;
        let value = self.exp()?;
        Ok(Stmt::Write { value, line })
    }

    fn exp(&mut self) -> Result<Expr, SyntaxError> {
        let node = self.simple_exp()?;
        let op = match self.current().kind {
            TokenKind::Lt => BinaryOperator::Lt,
            TokenKind::Eq => BinaryOperator::Eq,
            _ => return Ok(node),
        };
        let line = self.current().line;
        self.advance();
        let right = self.simple_exp()?;
        Ok(Expr::BinaryOp {
            op,
            left: Box::new(node),
            right: Box::new(right),
            line,
        })
    }

    fn simple_exp(&mut self) -> Result<Expr, SyntaxError> {
        let mut node = self.term()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOperator::Plus,
                TokenKind::Minus => BinaryOperator::Minus,
                _ => return Ok(node),
            };
            let line = self.current().line;
            self.advance();
            let right = self.term()?;
            node = Expr::BinaryOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
                line,
            };
        }
    }

    fn term(&mut self) -> Result<Expr, SyntaxError> {
        let mut node = self.factor()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Times => BinaryOperator::Times,
                TokenKind::Over => BinaryOperator::Over,
                _ => return Ok(node),
            };
            let line = self.current().line;
            self.advance();
            let right = self.factor()?;
            node = Expr::BinaryOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
                line,
            };
        }
    }

    fn factor(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Num => {
                // Overflowing literals are reported as syntax errors.
                let value = token.spelling.parse().map_err(|_| self.syntax_error())?;
                self.advance();
                Ok(Expr::Const {
                    value,
                    line: token.line,
                })
            }
            TokenKind::Id => {
                self.advance();
                Ok(Expr::Ident {
                    name: token.spelling,
                    line: token.line,
                })
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::Str {
                    text: token.spelling,
                    line: token.line,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let node = self.exp()?;
                self.match_kind(TokenKind::RParen)?;
                Ok(node)
            }
            _ => Err(self.syntax_error()),
        }
    }

    fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        if self.current().kind == TokenKind::Id {
            let name = self.current().spelling.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.syntax_error())
        }
    }
}

pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, SyntaxError> {
    if tokens.is_empty() {
        return Ok(Program::default());
    }
    Parser { tokens, index: 0 }.program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::scanner;
    use indoc::indoc;

    fn parse(source: &str) -> Result<Program, SyntaxError> {
        let reserved = config::default_reserved();
        parse_tokens(scanner::tokenize(source, &reserved))
    }

    #[test]
    fn parses_assignment_and_write() {
        let program = parse("x := 1 + 2;\nwrite x").expect("parse failed");

        let expected = Program {
            statements: vec![
                Stmt::Assign {
                    name: "x".to_string(),
                    value: Expr::BinaryOp {
                        op: BinaryOperator::Plus,
                        left: Box::new(Expr::Const { value: 1, line: 1 }),
                        right: Box::new(Expr::Const { value: 2, line: 1 }),
                        line: 1,
                    },
                    line: 1,
                },
                Stmt::Write {
                    value: Expr::Ident {
                        name: "x".to_string(),
                        line: 2,
                    },
                    line: 2,
                },
            ],
        };
        assert_eq!(program, expected);
    }

    #[test]
    fn parses_if_with_optional_end() {
        let with_end = parse("if 1 < 2 then write 1 else write 2 end").expect("parse failed");
        let without_end = parse("if 1 < 2 then write 1 else write 2").expect("parse failed");
        assert_eq!(with_end, without_end);

        match &with_end.statements[0] {
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.len(), 1);
            }
            other => panic!("expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_repeat_until() {
        let source = indoc! {"
            x := 0;
            repeat
                x := x + 1;
                write x
            until x = 3
        "};
        let program = parse(source).expect("parse failed");
        assert_eq!(program.statements.len(), 2);
        match &program.statements[1] {
            Stmt::Repeat { body, test, .. } => {
                assert_eq!(body.len(), 2);
                assert!(matches!(
                    test,
                    Expr::BinaryOp {
                        op: BinaryOperator::Eq,
                        ..
                    }
                ));
            }
            other => panic!("expected repeat statement, got {other:?}"),
        }
    }

    #[test]
    fn respects_operator_precedence() {
        let program = parse("x := 1 + 2 * 3").expect("parse failed");
        let Stmt::Assign { value, .. } = &program.statements[0] else {
            panic!("expected assignment");
        };
        let Expr::BinaryOp { op, right, .. } = value else {
            panic!("expected binary op");
        };
        assert_eq!(*op, BinaryOperator::Plus);
        assert!(matches!(
            right.as_ref(),
            Expr::BinaryOp {
                op: BinaryOperator::Times,
                ..
            }
        ));
    }

    #[test]
    fn reports_unexpected_token() {
        let err = parse("x := ;").expect_err("expected syntax error");
        assert_eq!(err.line, 1);
        assert_eq!(
            err.to_string(),
            "Syntax error at line 1, unexpected token -> ;"
        );
    }

    #[test]
    fn reports_missing_semicolon() {
        let err = parse("x := 1\ny := 2").expect_err("expected syntax error");
        assert_eq!(err.line, 2);
        assert!(err.to_string().contains("ID, name= y"));
    }

    #[test]
    fn error_token_from_scanner_turns_fatal() {
        let err = parse("x : 1").expect_err("expected syntax error");
        assert!(err.to_string().contains("ERROR: :"));
    }

    #[test]
    fn reports_eof_inside_statement() {
        let err = parse("read").expect_err("expected syntax error");
        assert!(err.to_string().contains("EOF"));
    }

    #[test]
    fn empty_source_parses_to_empty_program() {
        let program = parse("# nothing here #").expect("parse failed");
        assert!(program.statements.is_empty());
    }
}
