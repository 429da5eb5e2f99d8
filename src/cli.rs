//! Command-line driver for the quill compiler and interpreter.
//!
//! Compiles the given source file (and its transitive imports, in
//! dependency order), then interprets the root unit and prints whatever
//! the program emitted. `--tokens` and `--ast` dump the intermediate
//! stages; `--watch` polls the file and re-runs on change.

use clap::Parser as ClapParser;
use quill_base::Interner;
use quill_compile::diagnostic::{report_compile_error, report_runtime_error};
use quill_compile::{CompileOptions, Compiler, Interpreter};
use quill_syntax::dump;
use quill_syntax::lexer::Lexer;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

#[derive(ClapParser)]
#[command(name = "quill")]
#[command(about = "The quill compiler and interpreter", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Source file to compile and run.
    pub source: PathBuf,

    /// Dump the token stream after lexing.
    #[arg(long, short = 't')]
    pub tokens: bool,

    /// Dump the parsed AST.
    #[arg(long, short = 'a')]
    pub ast: bool,

    /// Watch the source file and re-run on changes.
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Standard library directory searched for imports.
    #[arg(long)]
    pub stdlib: Option<PathBuf>,
}

pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if !cli.watch {
        return run_once(&cli).map_err(|_| "compilation failed".into());
    }

    // Poll the file's mtime; re-run whenever it moves.
    let mut last_seen = modified_time(&cli.source);
    let _ = run_once(&cli);
    println!(
        "\nWatching {} for changes... (CTRL+C to exit)",
        cli.source.display()
    );
    loop {
        std::thread::sleep(Duration::from_millis(200));
        let current = modified_time(&cli.source);
        if current != last_seen {
            last_seen = current;
            print!("\x1b[2J\x1b[H"); // clear screen
            println!("{} changed, reprocessing...\n", cli.source.display());
            let _ = run_once(&cli);
            println!(
                "\nWatching {} for changes... (CTRL+C to exit)",
                cli.source.display()
            );
        }
    }
}

fn modified_time(path: &std::path::Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Compile, optionally dump, interpret, print. `Err(())` means a
/// diagnostic was already rendered.
fn run_once(cli: &Cli) -> Result<(), ()> {
    let options = CompileOptions {
        stdlib_dir: cli.stdlib.clone(),
        keep_raw_ast: false,
    };
    let mut compiler = Compiler::new(options);

    if cli.tokens {
        match std::fs::read_to_string(&cli.source) {
            Ok(source) => {
                // Stream straight off the lexer so comment tokens show
                // up too; tokenize() would discard them.
                let mut interner = Interner::new();
                let mut lexer = Lexer::new(&source);
                let mut tokens = Vec::new();
                loop {
                    match lexer.next_token(&mut interner) {
                        Ok(Some(token)) => tokens.push(token),
                        Ok(None) => break,
                        Err(error) => {
                            eprintln!("{}", error.display_with_source(&source));
                            return Err(());
                        }
                    }
                }
                print!("{}", dump::format_tokens(&tokens, &interner, &source));
            }
            Err(_) => {
                eprintln!("could not open '{}'", cli.source.display());
                return Err(());
            }
        }
    }

    let outputs = match compiler.compile_project(&cli.source) {
        Ok(outputs) => outputs,
        Err(error) => {
            eprintln!("{}", report_compile_error(&error));
            return Err(());
        }
    };
    let root = outputs.last().expect("project has at least the root unit");

    if cli.ast {
        let _ = dump::print_ast(&root.ast, &compiler.interner, &compiler.registry);
    }

    let mut interpreter = Interpreter::new(&root.ast, &compiler.interner, &compiler.registry);
    match interpreter.run() {
        Ok(value) => {
            for line in &interpreter.output {
                println!("{}", line);
            }
            let rendered = interpreter.display_value(&value);
            if rendered != "void" {
                println!("= {}", rendered);
            }
            Ok(())
        }
        Err(error) => {
            for line in &interpreter.output {
                println!("{}", line);
            }
            eprintln!("{}", report_runtime_error(&root.path, &root.source, &error));
            Err(())
        }
    }
}
