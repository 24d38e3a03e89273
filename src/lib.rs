pub mod analyze;
pub mod ast;
pub mod codegen;
pub mod config;
pub mod machine;
pub mod parser;
pub mod scanner;
pub mod token;
