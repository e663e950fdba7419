use rpal::error::RpalError;
use rpal::{control, cse, error, lexer, parser, standardize};
use std::env;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("rpal: {err}");
            ExitCode::FAILURE
        }
    }
}

enum Mode {
    Evaluate,
    DumpAst,
    DumpStandardized,
}

fn run(args: &[String]) -> error::Result<()> {
    let (mode, path) = parse_args(args)?;

    log::debug!("reading source file {path}");
    let source = fs::read_to_string(path).map_err(|e| RpalError::Io(format!("{path}: {e}")))?;

    let tokens = lexer::tokenize(&source)?;
    log::debug!("lexed {} tokens", tokens.len());

    let ast = parser::parse(tokens)?;
    if matches!(mode, Mode::DumpAst) {
        let mut out = String::new();
        ast.print_tree(&mut out, 0);
        print!("{out}");
        return Ok(());
    }

    let standardized = standardize::standardize(ast)?;
    log::debug!("standardized tree built");
    if matches!(mode, Mode::DumpStandardized) {
        let mut out = String::new();
        standardized.print_tree(&mut out, 0);
        print!("{out}");
        return Ok(());
    }

    let table = control::build(&standardized)?;
    log::debug!("control table built with {} structures", table.len());

    let (result, printed) = cse::Machine::new(&table).run()?;
    if !printed {
        println!("{result}");
    }
    Ok(())
}

fn parse_args(args: &[String]) -> error::Result<(Mode, &str)> {
    match args.len() {
        2 => Ok((Mode::Evaluate, &args[1])),
        3 if args[1] == "-ast" => Ok((Mode::DumpAst, &args[2])),
        3 if args[1] == "-st" => Ok((Mode::DumpStandardized, &args[2])),
        _ => Err(RpalError::Io(format!(
            "usage: {} [-ast | -st] <source_file>",
            args.first().map(String::as_str).unwrap_or("rpal")
        ))),
    }
}
