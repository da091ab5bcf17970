// Cinonim: compiler from a small C-like language to WebAssembly text

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use cinonim::codegen;
use cinonim::parser::{self, lexer};

#[derive(Parser)]
#[command(name = "cinonim", version)]
#[command(about = "Compiles Cinonim source to WebAssembly text", long_about = None)]
struct Cli {
    /// Source file to compile
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Write the WAT text here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the token list and stop
    #[arg(long)]
    emit_tokens: bool,

    /// Print the AST and stop
    #[arg(long)]
    emit_ast: bool,
}

fn main() {
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: Cannot read '{}': {}", cli.file.display(), e);
            std::process::exit(1);
        }
    };

    let tokens = match lexer::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(e) => fail(&cli, &e),
    };
    if cli.emit_tokens {
        for token in &tokens {
            println!("{}:{}\t{}", token.line, token.column, token);
        }
        return;
    }

    eprintln!("Parsing {}...", cli.file.display());
    let ast = match parser::parse(&tokens) {
        Ok(ast) => ast,
        Err(e) => fail(&cli, &e),
    };
    if cli.emit_ast {
        println!("{}", ast);
        return;
    }

    eprintln!("Generating WebAssembly text...");
    let wat = match codegen::generate(&ast) {
        Ok(wat) => wat,
        Err(e) => fail(&cli, &e),
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, format!("{}\n", wat)) {
                eprintln!("Error: Cannot write '{}': {}", path.display(), e);
                std::process::exit(1);
            }
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", wat),
    }
}

fn fail(cli: &Cli, error: &cinonim::error::CompileError) -> ! {
    eprintln!("{}: {}", cli.file.display(), error);
    std::process::exit(1);
}
