use std::{
    fs,
    io::{self, BufRead, Write},
    process::exit,
};

use boxedlang::{Config, Dialect, InputProvider, ScriptedInput};
use clap::Parser;
use tracing::Level;

/// Runs a BoxedLang program and prints what it says.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Treat `contents` as the path of a program file instead of program text.
    #[arg(short, long)]
    file: bool,

    /// Surface syntax of the program.
    #[arg(short, long, value_enum, default_value_t = Dialect::Expression)]
    dialect: Dialect,

    /// Instruction budget for the run; 0 disables it.
    #[arg(long, default_value_t = boxedlang::config::DEFAULT_STEP_LIMIT)]
    max_steps: usize,

    /// Scripted answer for `ask`, in order. Without any, `ask` reads stdin.
    #[arg(short, long = "answer")]
    answers: Vec<String>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    contents: String,
}

/// Prompts on stderr and reads one line from stdin.
#[derive(Debug, Clone, Copy)]
struct StdinInput;

impl InputProvider for StdinInput {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        eprint!("{prompt} ");
        io::stderr().flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let source = if args.file {
        fs::read_to_string(&args.contents).unwrap_or_else(|err| {
            eprintln!("Failed to read the program file '{}': {err}", &args.contents);
            exit(1);
        })
    } else {
        args.contents
    };

    let config = Config::new()
        .with_dialect(args.dialect)
        .with_step_limit((args.max_steps > 0).then_some(args.max_steps));
    let config = if args.answers.is_empty() {
        config.with_input_provider(StdinInput)
    } else {
        config.with_input_provider(ScriptedInput::new(args.answers))
    };

    match boxedlang::run(&source, &config) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        Err(diagnostic) => {
            eprintln!("{diagnostic}");
            exit(1);
        }
    }
}
