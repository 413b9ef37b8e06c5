//! BoxedLang: a small line-oriented scripting language with named boxes,
//! labels and jumps.
//!
//! A program is tokenized into instructions, its `mark` labels are resolved,
//! and the instructions run in a program-counter loop. A run yields the lines
//! printed by `say` or a [`Diagnostic`] pointing at the failing line.
//!
//! ```
//! use boxedlang::{run, Config};
//!
//! let output = run("box x = 3\nmath y = x * 2 + 1\nsay $y", &Config::new()).unwrap();
//! assert_eq!(output, vec!["7"]);
//! ```

pub mod ast;
pub mod common;
pub mod config;
pub mod error;
pub mod eval;
pub mod interpreter;
pub mod labels;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod token;
pub mod value;

pub use config::{Config, Dialect, InputProvider, ScriptedInput};
pub use error::{Diagnostic, ErrorKind};
pub use interpreter::Interpreter;
pub use labels::LabelTable;
pub use program::{tokenize, Instruction};
pub use value::Value;

/// Runs an already tokenized program.
pub fn run_program(program: &[Instruction], config: &Config) -> Result<Vec<String>, Diagnostic> {
    let mut interpreter = Interpreter::new(program, config);
    interpreter.run()?;
    Ok(interpreter.into_output())
}

/// Tokenizes `source` in the configured dialect and runs it.
pub fn run(source: &str, config: &Config) -> Result<Vec<String>, Diagnostic> {
    let program = tokenize(source, config.dialect);
    run_program(&program, config)
}
