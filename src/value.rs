use std::{collections::HashMap, fmt};

/// Contents of a box.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::String(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(number) => f.write_str(&format_number(*number)),
            Value::String(string) => f.write_str(string),
        }
    }
}

/// Integral values print without a fraction and negative zero prints as `0`.
/// Magnitudes from `1e21` up and below `1e-6` use exponent notation
/// (`1e+21`, `1.5e-7`), and infinities print as `Infinity`.
pub fn format_number(number: f64) -> String {
    if number == 0.0 {
        return "0".to_string();
    }
    if number.is_nan() {
        return "NaN".to_string();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = number.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let text = format!("{:e}", number);
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => text,
        }
    } else {
        format!("{}", number)
    }
}

/// The variable store of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Boxes {
    slots: HashMap<String, Value>,
}

impl Boxes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, value: Value) {
        self.slots.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.slots.remove(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
