use std::{
    collections::VecDeque,
    fmt::{self, Debug},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use dyn_clone::DynClone;

/// Default instruction budget for one run.
pub const DEFAULT_STEP_LIMIT: usize = 100_000;

/// Surface syntax used to tokenize and execute a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Dialect {
    /// Quoted literals, `name = expression` assignments and arithmetic conditions.
    #[default]
    Expression,
    /// Pipe separated arguments, `$name` references and equality tests.
    Pipe,
}

/// Answers `ask` prompts. Called synchronously from the engine.
pub trait InputProvider: DynClone {
    fn ask(&mut self, prompt: &str) -> Option<String>;
}

dyn_clone::clone_trait_object!(InputProvider);

impl<F> InputProvider for F
where
    F: FnMut(&str) -> Option<String> + Clone,
{
    fn ask(&mut self, prompt: &str) -> Option<String> {
        self(prompt)
    }
}

/// Replays a fixed list of answers, then answers nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInput {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl InputProvider for ScriptedInput {
    fn ask(&mut self, _prompt: &str) -> Option<String> {
        self.answers.pop_front()
    }
}

/// Options for one run. Each run clones what it needs, so a `Config` can be
/// reused and shared between runs.
#[derive(Clone)]
pub struct Config {
    pub dialect: Dialect,
    pub input_provider: Option<Box<dyn InputProvider>>,
    /// `None` disables the budget.
    pub step_limit: Option<usize>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("dialect", &self.dialect)
            .field(
                "input_provider",
                &self.input_provider.as_ref().map(|_| "<input provider>"),
            )
            .field("step_limit", &self.step_limit)
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dialect: Dialect::default(),
            input_provider: None,
            step_limit: Some(DEFAULT_STEP_LIMIT),
            cancel: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_input_provider(mut self, provider: impl InputProvider + 'static) -> Self {
        self.input_provider = Some(Box::new(provider));
        self
    }

    pub fn with_step_limit(mut self, limit: Option<usize>) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_answers_restart_for_each_clone() {
        let config = Config::new().with_input_provider(ScriptedInput::new(["a", "b"]));

        for _ in 0..2 {
            let mut provider = config.input_provider.clone().unwrap();
            assert_eq!(provider.ask("?"), Some("a".to_string()));
            assert_eq!(provider.ask("?"), Some("b".to_string()));
            assert_eq!(provider.ask("?"), None);
        }
    }

    #[test]
    fn closures_are_input_providers() {
        let config = Config::new().with_input_provider(|prompt: &str| Some(prompt.to_uppercase()));
        let mut provider = config.input_provider.clone().unwrap();
        assert_eq!(provider.ask("name?"), Some("NAME?".to_string()));
    }

    #[test]
    fn cancel_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let config = Config::new().with_cancel_flag(flag.clone());
        assert!(!config.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(config.clone().is_cancelled());
    }

    #[test]
    fn new_config_has_default_budget() {
        let config = Config::new();
        assert_eq!(config.dialect, Dialect::Expression);
        assert_eq!(config.step_limit, Some(DEFAULT_STEP_LIMIT));
    }
}
