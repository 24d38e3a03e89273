use std::collections::HashMap;

use thiserror::Error;

use crate::ast::{BinaryOperator, ExpType, Expr, Program, Stmt};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Type error at line {line}: Op applied to non-integer")]
    OpNonInteger { line: usize },
    #[error("Type error at line {line}: if test is not Boolean")]
    IfTestNotBoolean { line: usize },
    #[error("Type error at line {line}: assignment of non-integer value")]
    AssignNonInteger { line: usize },
    #[error("Type error at line {line}: write of non-integer or non-string value")]
    WriteInvalid { line: usize },
    #[error("Type error at line {line}: repeat test is not Boolean")]
    RepeatTestNotBoolean { line: usize },
}

/// Symbol table entry: the variable's data-memory slot and every source line
/// that references it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub location: usize,
    pub lines: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    buckets: HashMap<String, Bucket>,
}

impl SymbolTable {
    // Locations are handed out in first-occurrence order, starting at 0.
    fn record(&mut self, name: &str, line: usize) {
        let next_location = self.buckets.len();
        self.buckets
            .entry(name.to_string())
            .or_insert_with(|| Bucket {
                location: next_location,
                lines: Vec::new(),
            })
            .lines
            .push(line);
    }

    pub fn location_of(&self, name: &str) -> Option<usize> {
        self.buckets.get(name).map(|bucket| bucket.location)
    }

    pub fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.buckets.get(name)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Pre-order traversal collecting every variable occurrence. Assign and read
/// record their target name before walking into child expressions.
pub fn build_symtab(program: &Program) -> SymbolTable {
    let mut table = SymbolTable::default();
    insert_stmts(&mut table, &program.statements);
    table
}

fn insert_stmts(table: &mut SymbolTable, statements: &[Stmt]) {
    for statement in statements {
        match statement {
            Stmt::If {
                test,
                then_branch,
                else_branch,
                ..
            } => {
                insert_expr(table, test);
                insert_stmts(table, then_branch);
                insert_stmts(table, else_branch);
            }
            Stmt::Repeat { body, test, .. } => {
                insert_stmts(table, body);
                insert_expr(table, test);
            }
            Stmt::Assign { name, value, line } => {
                table.record(name, *line);
                insert_expr(table, value);
            }
            Stmt::Read { name, line } => table.record(name, *line),
            Stmt::Write { value, .. } => insert_expr(table, value),
        }
    }
}

fn insert_expr(table: &mut SymbolTable, expr: &Expr) {
    match expr {
        Expr::Ident { name, line } => table.record(name, *line),
        Expr::BinaryOp { left, right, .. } => {
            insert_expr(table, left);
            insert_expr(table, right);
        }
        Expr::Const { .. } | Expr::Str { .. } => {}
    }
}

/// Post-order type check; children are checked before the node's own rule,
/// so the first violation in traversal order wins.
pub fn type_check(program: &Program) -> Result<(), TypeError> {
    check_stmts(&program.statements)
}

fn check_stmts(statements: &[Stmt]) -> Result<(), TypeError> {
    for statement in statements {
        check_stmt(statement)?;
    }
    Ok(())
}

fn check_stmt(statement: &Stmt) -> Result<ExpType, TypeError> {
    match statement {
        Stmt::If {
            test,
            then_branch,
            else_branch,
            line,
        } => {
            let test_type = check_expr(test)?;
            check_stmts(then_branch)?;
            check_stmts(else_branch)?;
            if test_type == ExpType::Integer {
                return Err(TypeError::IfTestNotBoolean { line: *line });
            }
            Ok(ExpType::Void)
        }
        Stmt::Repeat { body, test, line } => {
            check_stmts(body)?;
            let test_type = check_expr(test)?;
            if test_type == ExpType::Integer {
                return Err(TypeError::RepeatTestNotBoolean { line: *line });
            }
            Ok(ExpType::Void)
        }
        Stmt::Assign { value, line, .. } => {
            if check_expr(value)? != ExpType::Integer {
                return Err(TypeError::AssignNonInteger { line: *line });
            }
            Ok(ExpType::Void)
        }
        Stmt::Read { .. } => Ok(ExpType::Void),
        Stmt::Write { value, line } => {
            let value_type = check_expr(value)?;
            if value_type != ExpType::Integer && value_type != ExpType::Str {
                return Err(TypeError::WriteInvalid { line: *line });
            }
            Ok(ExpType::Void)
        }
    }
}

fn check_expr(expr: &Expr) -> Result<ExpType, TypeError> {
    match expr {
        Expr::Const { .. } | Expr::Ident { .. } => Ok(ExpType::Integer),
        Expr::Str { .. } => Ok(ExpType::Str),
        Expr::BinaryOp {
            op,
            left,
            right,
            line,
        } => {
            let left_type = check_expr(left)?;
            let right_type = check_expr(right)?;
            if left_type != ExpType::Integer || right_type != ExpType::Integer {
                return Err(TypeError::OpNonInteger { line: *line });
            }
            Ok(match op {
                BinaryOperator::Lt | BinaryOperator::Eq => ExpType::Boolean,
                _ => ExpType::Integer,
            })
        }
    }
}
