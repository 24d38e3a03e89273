use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use tinylang::{analyze, codegen, config, machine, parser, scanner};

const USAGE: &str = "Usage: tinylang [options] <source.tny> [keywords.conf]

Options:
  -l, --listing <path>   also write the generated bytecode listing to <path>
  -h, --help             print this help
  -v, --version          print the version";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Run {
        source_path: PathBuf,
        config_path: Option<PathBuf>,
        listing_path: Option<PathBuf>,
    },
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Command> {
    let mut listing_path: Option<PathBuf> = None;
    let mut source_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--version" => return Ok(Command::Version),
            "-l" | "--listing" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("Missing path after {arg}"))?;
                listing_path = Some(PathBuf::from(path));
            }
            _ if arg.starts_with('-') => bail!("Unknown option '{arg}'\n{USAGE}"),
            _ if source_path.is_none() => source_path = Some(PathBuf::from(arg)),
            _ if config_path.is_none() => config_path = Some(PathBuf::from(arg)),
            _ => bail!("Unexpected argument '{arg}'\n{USAGE}"),
        }
    }

    let Some(source_path) = source_path else {
        bail!("Missing source file\n{USAGE}");
    };
    Ok(Command::Run {
        source_path,
        config_path,
        listing_path,
    })
}

fn main() -> Result<()> {
    let (source_path, config_path, listing_path) = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("{USAGE}");
            return Ok(());
        }
        Command::Version => {
            println!("tinylang {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Run {
            source_path,
            config_path,
            listing_path,
        } => (source_path, config_path, listing_path),
    };

    let reserved = match config_path {
        Some(path) => config::load_reserved(&path)?,
        None => config::default_reserved(),
    };

    let source = fs::read_to_string(&source_path)
        .with_context(|| format!("Reading {}", source_path.display()))?;

    let tokens = scanner::tokenize(&source, &reserved);
    let program = parser::parse_tokens(tokens)?;
    analyze::type_check(&program)?;
    let symtab = analyze::build_symtab(&program);
    let listing = codegen::generate(&program, &symtab);

    if let Some(path) = listing_path {
        fs::write(&path, listing.join("\n") + "\n")
            .with_context(|| format!("Writing {}", path.display()))?;
    }

    let mut machine = machine::Machine::load(&listing)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    machine.run(stdin.lock(), stdout.lock())?;
    Ok(())
}
