use crate::config::Dialect;

/// One executable line of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Lower-cased command word.
    pub command: String,
    pub args: Vec<String>,
    /// 1-based physical line in the program text.
    pub source_line: usize,
    pub raw_text: String,
}

impl Instruction {
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

fn is_skipped(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//")
}

/// Splits `name = rest` at the first `=`.
fn split_assignment(payload: &str) -> Vec<String> {
    match payload.split_once('=') {
        Some((name, value)) => vec![name.trim().to_string(), value.trim().to_string()],
        None => vec![payload.to_string()],
    }
}

/// Splits `condition jump label` at the last `jump` word.
fn split_conditional_jump(payload: &str) -> Vec<String> {
    let words = payload.split_whitespace().collect::<Vec<_>>();
    match words.iter().rposition(|word| word.eq_ignore_ascii_case("jump")) {
        Some(idx) => vec![words[..idx].join(" "), words[idx + 1..].join(" ")],
        None => vec![payload.to_string()],
    }
}

fn split_expression_args(command: &str, payload: &str) -> Vec<String> {
    if payload.is_empty() {
        return vec![];
    }

    match command {
        "box" | "math" => split_assignment(payload),
        "if" => split_conditional_jump(payload),
        _ => vec![payload.to_string()],
    }
}

fn split_pipe_args(payload: &str) -> Vec<String> {
    if payload.is_empty() {
        return vec![];
    }

    payload.split('|').map(|arg| arg.trim().to_string()).collect()
}

fn tokenize_line(line: &str, source_line: usize, dialect: Dialect) -> Option<Instruction> {
    let trimmed = line.trim();
    if is_skipped(trimmed) {
        return None;
    }

    let (command, payload) = match trimmed.split_once(char::is_whitespace) {
        Some((command, payload)) => (command, payload.trim()),
        None => (trimmed, ""),
    };
    let command = command.to_lowercase();

    let args = match dialect {
        Dialect::Expression => split_expression_args(&command, payload),
        Dialect::Pipe => split_pipe_args(payload),
    };

    Some(Instruction {
        command,
        args,
        source_line,
        raw_text: line.to_string(),
    })
}

/// Turns program text into the instruction sequence. Blank lines and lines
/// starting with `#` or `//` produce nothing; line numbers still count them.
pub fn tokenize(source: &str, dialect: Dialect) -> Vec<Instruction> {
    // `lines` also strips the `\r` of `\r\n` endings
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| tokenize_line(line, idx + 1, dialect))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_lines_but_counts_them() {
        let program = tokenize("# intro\n\n// note\r\nSAY \"hi\"\r\n", Dialect::Expression);
        assert_eq!(program.len(), 1);
        assert_eq!(program[0].command, "say");
        assert_eq!(program[0].args, vec!["\"hi\""]);
        assert_eq!(program[0].source_line, 4);
        assert_eq!(program[0].raw_text, "SAY \"hi\"");
    }

    #[test]
    fn assignments_split_at_first_equal() {
        let program = tokenize("math flag = x == 3", Dialect::Expression);
        assert_eq!(program[0].args, vec!["flag", "x == 3"]);
    }

    #[test]
    fn assignment_without_equal_keeps_payload() {
        let program = tokenize("box x", Dialect::Expression);
        assert_eq!(program[0].args, vec!["x"]);
    }

    #[test]
    fn conditional_jump_splits_at_last_jump_word() {
        let program = tokenize("if total   >  10 jump celebration", Dialect::Expression);
        assert_eq!(program[0].args, vec!["total > 10", "celebration"]);
    }

    #[test]
    fn pipe_arguments_are_trimmed() {
        let program = tokenize("  math total | 5 |+| 3 ", Dialect::Pipe);
        assert_eq!(program[0].command, "math");
        assert_eq!(program[0].args, vec!["total", "5", "+", "3"]);
    }

    #[test]
    fn bare_command_has_no_arguments() {
        assert!(tokenize("wait", Dialect::Pipe)[0].args.is_empty());
        assert!(tokenize("say", Dialect::Expression)[0].args.is_empty());
    }
}
