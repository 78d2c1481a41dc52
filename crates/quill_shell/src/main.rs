//! `quill`: shell for the Quill expression language.
//!
//! Evaluates a single expression given on the command line, or runs a line
//! REPL whose scope persists across lines.  `--tokens` and `--ast` print the
//! scanner output and the canonical printed form instead of (or before)
//! evaluating.

mod json;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use quill_core::parser::scanner::Scanner;
use quill_core::{ParserOptions, Scope, parse_with_options};
use tracing::{Level, debug};

/// Evaluate Quill expressions.
#[derive(Parser, Debug)]
#[command(name = "quill", version, about, long_about = None)]
struct Args {
    /// Expression to evaluate.  Starts a REPL when omitted.
    expr: Option<String>,

    /// Initial scope as a JSON object, e.g. '{"a": 1}'.
    #[arg(long, value_name = "JSON")]
    scope: Option<String>,

    /// Parse in strict mode.
    #[arg(long)]
    strict: bool,

    /// Print the token stream.
    #[arg(long)]
    tokens: bool,

    /// Print the canonical form of the parsed expression.
    #[arg(long)]
    ast: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(io::stderr)
        .init();

    let scope = match &args.scope {
        Some(text) => json::scope_from_str(text).context("invalid --scope")?,
        None => Scope::new(),
    };
    let options = ParserOptions {
        strict: args.strict,
    };

    match &args.expr {
        Some(expr) => {
            let output = run(expr, &scope, &options, &args)?;
            print!("{output}");
            Ok(())
        }
        None => repl(&scope, &options, &args),
    }
}

/// Processes one line of input and returns what should be printed.
fn run(source: &str, scope: &Scope, options: &ParserOptions, args: &Args) -> Result<String> {
    let mut out = String::new();
    if args.tokens {
        for token in Scanner::tokenize_all(source)? {
            out.push_str(&format!(
                "{:>4}:{:<4} {:?} {}\n",
                token.span.start.line, token.span.start.column, token.kind, token.raw
            ));
        }
    }
    let expr = parse_with_options(source, options)?;
    if args.ast {
        out.push_str(&format!("{:?} {expr}\n", expr.kind()));
    }
    if !args.tokens && !args.ast {
        let value = expr.evaluate(scope, false)?;
        out.push_str(&json::render(&value));
        out.push('\n');
    }
    Ok(out)
}

fn repl(scope: &Scope, options: &ParserOptions, args: &Args) -> Result<()> {
    debug!("starting repl");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            return Ok(());
        }
        let line = line.trim();
        match line {
            "" => continue,
            ".exit" => return Ok(()),
            _ => {}
        }
        match run(line, scope, options, args) {
            Ok(output) => write!(stdout, "{output}")?,
            Err(err) => eprintln!("{err}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
