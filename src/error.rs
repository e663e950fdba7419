use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RpalError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Lexical error: unexpected character '{ch}' on line {line}")]
    Lex { ch: char, line: usize },
    #[error("Syntax error: expected {expected}, found {found}")]
    Parse { expected: String, found: String },
    #[error("Standardization error: malformed '{kind}' construct")]
    Standardize { kind: String },
    #[error("Undeclared identifier: {0}")]
    UndefinedVariable(String),
    #[error("Type error: expected {expected}, found {found}")]
    Type { expected: String, found: String },
    #[error("Internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RpalError>;
