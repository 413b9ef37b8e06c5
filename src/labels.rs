use std::collections::HashMap;

use crate::{config::Dialect, eval, program::Instruction};

/// A `mark` that a later `mark` with the same name replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedLabel {
    pub label: String,
    /// Instruction index the label no longer points at.
    pub index: usize,
    pub source_line: usize,
}

/// Label name → index of its `mark` instruction.
///
/// When a label is defined more than once the last definition wins. The
/// replaced definitions are kept in `shadowed` so hosts can warn about them.
///
/// Pipe-dialect names are static: `mark $x` is not registered, since a
/// `$` in a `jump` target is read from a box at run time and could never
/// name it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    targets: HashMap<String, usize>,
    pub shadowed: Vec<ShadowedLabel>,
}

impl LabelTable {
    pub fn resolve(program: &[Instruction], dialect: Dialect) -> Self {
        let mut table = LabelTable::default();

        for (idx, instruction) in program.iter().enumerate() {
            if instruction.command != "mark" {
                continue;
            }
            let label = match (instruction.arg(0), dialect) {
                (Some(raw), Dialect::Expression) => raw.trim().to_string(),
                (Some(raw), Dialect::Pipe) if raw.starts_with('$') => {
                    tracing::warn!(
                        label = raw,
                        line = instruction.source_line,
                        "label names cannot read boxes, mark ignored"
                    );
                    continue;
                }
                (Some(raw), Dialect::Pipe) => eval::clean_pipe_text(raw),
                (None, _) => continue,
            };

            if let Some(previous) = table.targets.insert(label.clone(), idx) {
                tracing::warn!(
                    label = %label,
                    line = instruction.source_line,
                    previous_line = program[previous].source_line,
                    "label defined more than once, the last definition wins"
                );
                table.shadowed.push(ShadowedLabel {
                    label,
                    index: previous,
                    source_line: program[previous].source_line,
                });
            }
        }

        table
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.targets.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::tokenize;

    #[test]
    fn maps_labels_to_mark_indices() {
        let program = tokenize(
            "say 1\n# skipped\nmark top\nsay 2\nmark end",
            Dialect::Expression,
        );
        let labels = LabelTable::resolve(&program, Dialect::Expression);
        assert_eq!(labels.get("top"), Some(1));
        assert_eq!(labels.get("end"), Some(3));
        assert_eq!(labels.get("missing"), None);
        assert!(labels.shadowed.is_empty());
    }

    #[test]
    fn last_duplicate_wins_and_is_reported() {
        let program = tokenize("mark a\nsay 1\nmark a", Dialect::Expression);
        let labels = LabelTable::resolve(&program, Dialect::Expression);
        assert_eq!(labels.get("a"), Some(2));
        assert_eq!(
            labels.shadowed,
            vec![ShadowedLabel {
                label: "a".into(),
                index: 0,
                source_line: 1,
            }]
        );
    }

    #[test]
    fn pipe_labels_are_unescaped() {
        let program = tokenize("mark the~end:", Dialect::Pipe);
        let labels = LabelTable::resolve(&program, Dialect::Pipe);
        assert_eq!(labels.get("the end"), Some(0));
    }

    #[test]
    fn pipe_mark_through_a_box_is_ignored() {
        let program = tokenize("mark $spot\nmark here", Dialect::Pipe);
        let labels = LabelTable::resolve(&program, Dialect::Pipe);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get("$spot"), None);
        assert_eq!(labels.get("here"), Some(1));
    }

    #[test]
    fn mark_without_name_is_ignored() {
        let program = tokenize("mark", Dialect::Expression);
        assert!(LabelTable::resolve(&program, Dialect::Expression).is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let program = tokenize("mark a\nmark b\nmark a", Dialect::Expression);
        assert_eq!(
            LabelTable::resolve(&program, Dialect::Expression),
            LabelTable::resolve(&program, Dialect::Expression)
        );
    }
}
