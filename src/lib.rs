pub mod ast;
pub mod builtins;
pub mod control;
pub mod cse;
pub mod env;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod standardize;
pub mod value;

use error::Result;
use value::Value;

/// Runs the full pipeline over RPAL source text and returns the program's
/// final value together with whether `Print`/`print` fired during
/// evaluation. The single entry point integration tests and the CLI both
/// drive.
pub fn interpret(source: &str) -> Result<(Value, bool)> {
    let tokens = lexer::tokenize(source)?;
    let ast = parser::parse(tokens)?;
    let standardized = standardize::standardize(ast)?;
    let table = control::build(&standardized)?;
    cse::Machine::new(&table).run()
}
