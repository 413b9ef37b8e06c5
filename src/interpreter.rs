use crate::{
    config::{Config, Dialect, InputProvider},
    error::{Diagnostic, ErrorKind, ExecResult},
    eval,
    labels::LabelTable,
    program::Instruction,
    value::{Boxes, Value},
};

/// What the engine does with the program counter after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Jump(usize),
    /// Skip the following instruction.
    SkipNext,
}

/// Fetch-decode-execute loop over one program. One interpreter serves exactly
/// one run.
pub struct Interpreter<'a> {
    program: &'a [Instruction],
    labels: LabelTable,
    dialect: Dialect,
    step_limit: Option<usize>,
    config: &'a Config,
    input: Option<Box<dyn InputProvider>>,

    boxes: Boxes,
    pc: usize,
    last_test: bool,
    output: Vec<String>,
    steps: usize,
}

fn required<'i>(
    instruction: &'i Instruction,
    idx: usize,
    argument: &'static str,
) -> ExecResult<&'i str> {
    match instruction.arg(idx).map(str::trim) {
        Some(arg) if !arg.is_empty() => Ok(arg),
        _ => Err(ErrorKind::MissingArgument {
            command: instruction.command.clone(),
            argument,
        }),
    }
}

fn raw_command(instruction: &Instruction) -> String {
    instruction
        .raw_text
        .split_whitespace()
        .next()
        .unwrap_or(instruction.command.as_str())
        .to_string()
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a [Instruction], config: &'a Config) -> Self {
        Interpreter {
            program,
            labels: LabelTable::resolve(program, config.dialect),
            dialect: config.dialect,
            step_limit: config.step_limit,
            config,
            input: config.input_provider.clone(),

            boxes: Boxes::new(),
            pc: 0,
            last_test: false,
            output: Vec::new(),
            steps: 0,
        }
    }

    pub fn boxes(&self) -> &Boxes {
        &self.boxes
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn into_output(self) -> Vec<String> {
        self.output
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Outcome of the most recent `if` or `test`.
    pub fn last_test(&self) -> bool {
        self.last_test
    }

    pub fn is_finished(&self) -> bool {
        self.pc >= self.program.len()
    }

    fn jump(&self, label: &str) -> ExecResult<Flow> {
        let target = self.labels.get(label).ok_or_else(|| ErrorKind::UnknownLabel {
            label: label.to_string(),
        })?;
        tracing::debug!(label, from = self.pc, to = target, "jump");
        Ok(Flow::Jump(target))
    }

    fn exec_expression(&mut self, instruction: &Instruction) -> ExecResult<Flow> {
        match instruction.command.as_str() {
            "box" => {
                let name = required(instruction, 0, "name")?;
                let value = eval::resolve_value(required(instruction, 1, "value")?, &self.boxes)?;
                self.boxes.insert(name.to_string(), value);
            }
            "say" => {
                let value = eval::resolve_value(required(instruction, 0, "value")?, &self.boxes)?;
                self.output.push(value.to_string());
            }
            "math" => {
                let name = required(instruction, 0, "name")?;
                let number =
                    eval::evaluate_number(required(instruction, 1, "expression")?, &self.boxes)?;
                self.boxes.insert(name.to_string(), Value::Number(number));
            }
            "if" => {
                let condition = required(instruction, 0, "condition")?;
                let label = required(instruction, 1, "label")?;
                self.last_test = eval::evaluate_expression(condition, &self.boxes)?.is_truthy();
                if self.last_test {
                    return self.jump(label);
                }
            }
            "mark" => {}
            "jump" => return self.jump(required(instruction, 0, "label")?),
            _ => {
                return Err(ErrorKind::UnknownCommand {
                    command: raw_command(instruction),
                })
            }
        }

        Ok(Flow::Next)
    }

    fn pipe_arg(
        &self,
        instruction: &Instruction,
        idx: usize,
        argument: &'static str,
    ) -> ExecResult<String> {
        match instruction.arg(idx) {
            Some(raw) => eval::normalize_pipe_arg(raw, &self.boxes),
            None => Err(ErrorKind::MissingArgument {
                command: instruction.command.clone(),
                argument,
            }),
        }
    }

    fn pipe_name(
        &self,
        instruction: &Instruction,
        idx: usize,
        argument: &'static str,
    ) -> ExecResult<String> {
        eval::normalize_pipe_arg(required(instruction, idx, argument)?, &self.boxes)
    }

    fn exec_pipe(&mut self, instruction: &Instruction) -> ExecResult<Flow> {
        match instruction.command.as_str() {
            "box" => {
                let name = self.pipe_name(instruction, 0, "name")?;
                let value = self.pipe_arg(instruction, 1, "value")?;
                self.boxes.insert(name, Value::String(value));
            }
            "say" => {
                let text = self.pipe_arg(instruction, 0, "value")?;
                self.output.push(text);
            }
            "ask" => {
                let name = self.pipe_name(instruction, 0, "name")?;
                let prompt = match instruction.arg(1) {
                    Some(raw) => eval::normalize_pipe_arg(raw, &self.boxes)?,
                    None => String::new(),
                };
                let prompt = if prompt.is_empty() { "?".to_string() } else { prompt };
                let answer = self
                    .input
                    .as_mut()
                    .and_then(|provider| provider.ask(&prompt))
                    .unwrap_or_default();
                self.boxes.insert(name, Value::String(answer));
            }
            "del" => {
                let name = self.pipe_name(instruction, 0, "name")?;
                self.boxes.remove(&name);
            }
            "test" => {
                let left = self.pipe_arg(instruction, 0, "left operand")?;
                let right = self.pipe_arg(instruction, 1, "right operand")?;
                self.last_test = left == right;
            }
            "math" => {
                let name = self.pipe_name(instruction, 0, "name")?;
                let left = self.pipe_arg(instruction, 1, "left operand")?;
                let op = self.pipe_arg(instruction, 2, "operator")?;
                let right = self.pipe_arg(instruction, 3, "right operand")?;
                self.boxes
                    .insert(name, Value::String(eval::pipe_math(&left, &op, &right)));
            }
            "if" => {
                let left = self.pipe_arg(instruction, 0, "left operand")?;
                let right = self.pipe_arg(instruction, 1, "right operand")?;
                self.last_test = left == right;
                if !self.last_test {
                    return Ok(Flow::SkipNext);
                }
            }
            "jumpif" => {
                let label = self.pipe_name(instruction, 0, "label")?;
                let left = self.pipe_arg(instruction, 1, "left operand")?;
                let right = self.pipe_arg(instruction, 2, "right operand")?;
                if left == right {
                    return self.jump(&label);
                }
            }
            "jump" => {
                let label = self.pipe_name(instruction, 0, "label")?;
                return self.jump(&label);
            }
            "mark" | "wait" => {}
            _ => {
                return Err(ErrorKind::UnknownCommand {
                    command: raw_command(instruction),
                })
            }
        }

        Ok(Flow::Next)
    }

    fn check_budget(&self) -> ExecResult<()> {
        if self.config.is_cancelled() {
            return Err(ErrorKind::Cancelled);
        }
        if let Some(limit) = self.step_limit {
            if self.steps >= limit {
                return Err(ErrorKind::StepLimitExceeded { limit });
            }
        }

        Ok(())
    }

    /// Executes the instruction at the program counter. Returns `Ok(false)`
    /// once the counter has run past the end of the program.
    pub fn step(&mut self) -> Result<bool, Diagnostic> {
        let program = self.program;
        let instruction = match program.get(self.pc) {
            Some(instruction) => instruction,
            None => return Ok(false),
        };

        tracing::trace!(
            pc = self.pc,
            line = instruction.source_line,
            command = %instruction.command,
            "dispatch"
        );

        let flow = self.check_budget().and_then(|_| match self.dialect {
            Dialect::Expression => self.exec_expression(instruction),
            Dialect::Pipe => self.exec_pipe(instruction),
        });

        let flow = flow.map_err(|kind| {
            Diagnostic::new(kind, instruction.source_line, instruction.raw_text.clone())
        })?;

        self.steps += 1;
        self.pc = match flow {
            Flow::Next => self.pc + 1,
            Flow::Jump(target) => target,
            Flow::SkipNext => self.pc + 2,
        };

        Ok(true)
    }

    /// Runs until the program counter passes the last instruction or an
    /// instruction fails.
    pub fn run(&mut self) -> Result<(), Diagnostic> {
        tracing::info!(
            instructions = self.program.len(),
            labels = self.labels.len(),
            dialect = ?self.dialect,
            "run started"
        );

        while self.step()? {}

        tracing::info!(
            steps = self.steps,
            lines = self.output.len(),
            "run finished"
        );

        Ok(())
    }
}
