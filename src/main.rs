use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser as ClapParser, ValueEnum};

use dorothy::diagnostic::ansi::AnsiRenderer;
use dorothy::diagnostic::Diagnostic;
use dorothy::{codegen, lexer, parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Instruction listing, one mnemonic triple per line.
    Asm,
    /// Formatted source.
    Fmt,
    /// AST as JSON.
    Ast,
}

/// Compile dorothy source to VM instructions.
#[derive(ClapParser)]
#[command(name = "dorothy", version)]
struct Cli {
    /// Path to a .dor file, or inline source text.
    input: String,

    /// What to print on success.
    #[arg(long, value_enum, default_value_t = Emit::Asm)]
    emit: Emit,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = if Path::new(&cli.input).is_file() {
        match std::fs::read_to_string(&cli.input) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error reading {}: {}", cli.input, e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        cli.input.clone()
    };

    match run(&source, cli.emit) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(diag) => {
            let renderer = AnsiRenderer {
                use_color: std::io::stderr().is_terminal(),
            };
            eprint!("{}", renderer.render(&diag.with_source(source)));
            ExitCode::FAILURE
        }
    }
}

fn run(source: &str, emit: Emit) -> Result<String, Diagnostic> {
    let tokens = lexer::lex(source).map_err(|e| Diagnostic::from(&e))?;
    let program = parser::parse(tokens).map_err(|e| Diagnostic::from(&e))?;

    match emit {
        Emit::Fmt => Ok(codegen::fmt::format(&program)),
        Emit::Ast => serde_json::to_string_pretty(&program)
            .map_err(|e| Diagnostic::error(format!("serialization error: {e}"))),
        Emit::Asm => {
            let code = codegen::compile(&program).map_err(|e| Diagnostic::from(&e))?;
            let listing: Vec<String> = code
                .iter()
                .enumerate()
                .map(|(i, inst)| format!("{i:4}  {inst}"))
                .collect();
            Ok(listing.join("\n"))
        }
    }
}
