#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Times,
    Over,
    Lt,
    Eq,
}

/// Type assigned to a node by the type checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpType {
    Void,
    Integer,
    Boolean,
    Str,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Const {
        value: i64,
        line: usize,
    },
    Ident {
        name: String,
        line: usize,
    },
    Str {
        text: String,
        line: usize,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
        line: usize,
    },
}

/// A statement sequence is an ordered `Vec<Stmt>` owned by its container.
#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    If {
        test: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
        line: usize,
    },
    Repeat {
        body: Vec<Stmt>,
        test: Expr,
        line: usize,
    },
    Assign {
        name: String,
        value: Expr,
        line: usize,
    },
    Read {
        name: String,
        line: usize,
    },
    Write {
        value: Expr,
        line: usize,
    },
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
