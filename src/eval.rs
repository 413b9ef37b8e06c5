//! Value and expression evaluation for both dialects.

use crate::{
    ast,
    error::{ErrorKind, ExecResult},
    lexer::Lexer,
    parser,
    token::TokenKind,
    value::{Boxes, Value},
};

/// Intermediate result of an arithmetic/comparison expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprValue {
    Number(f64),
    Bool(bool),
}

impl ExprValue {
    pub fn to_number(self) -> f64 {
        match self {
            ExprValue::Number(number) => number,
            ExprValue::Bool(true) => 1.0,
            ExprValue::Bool(false) => 0.0,
        }
    }

    pub fn is_truthy(self) -> bool {
        match self {
            ExprValue::Number(number) => number != 0.0 && !number.is_nan(),
            ExprValue::Bool(b) => b,
        }
    }
}

fn unquote(raw: &str) -> Option<&str> {
    let mut chars = raw.chars();
    let first = chars.next()?;
    let last = chars.next_back()?;
    if (first == '"' || first == '\'') && first == last {
        Some(&raw[1..raw.len() - 1])
    } else {
        None
    }
}

fn is_decimal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    all_digits(int_part) && frac_part.map_or(true, all_digits)
}

/// Resolves a value literal: a quoted string, a decimal number, `$name`, or
/// the name of an existing box, in that order.
pub fn resolve_value(raw: &str, boxes: &Boxes) -> ExecResult<Value> {
    let raw = raw.trim();

    if let Some(contents) = unquote(raw) {
        return Ok(Value::String(contents.to_string()));
    }

    if is_decimal(raw) {
        if let Ok(number) = raw.parse::<f64>() {
            return Ok(Value::Number(number));
        }
    }

    if let Some(name) = raw.strip_prefix('$') {
        return boxes
            .get(name)
            .cloned()
            .ok_or_else(|| ErrorKind::UnknownVariable { name: name.into() });
    }

    boxes.get(raw).cloned().ok_or_else(|| ErrorKind::UnknownValue {
        token: raw.to_string(),
    })
}

fn lookup_number(name: &str, boxes: &Boxes) -> ExecResult<f64> {
    match boxes.get(name) {
        Some(Value::Number(number)) => Ok(*number),
        Some(Value::String(_)) => Err(ErrorKind::NotANumber { name: name.into() }),
        None => Err(ErrorKind::UnknownVariable { name: name.into() }),
    }
}

struct ExprEvaluator<'a> {
    boxes: &'a Boxes,
}

impl<'a> ExprEvaluator<'a> {
    fn eval(&self, expr: &ast::Expr) -> ExecResult<ExprValue> {
        match &expr.kind {
            ast::ExprKind::Lit(lit) => Ok(ExprValue::Number(lit.value)),
            ast::ExprKind::Var(var_expr) => {
                Ok(ExprValue::Number(lookup_number(&var_expr.name, self.boxes)?))
            }
            ast::ExprKind::Unary(unary_expr) => {
                let value = self.eval(&unary_expr.expr)?;
                Ok(match unary_expr.op.kind {
                    TokenKind::Minus => ExprValue::Number(-value.to_number()),
                    TokenKind::Bang => ExprValue::Bool(!value.is_truthy()),
                    _ => unreachable!("parser only builds prefix operators"),
                })
            }
            ast::ExprKind::Binary(binary_expr) => {
                let left = self.eval(&binary_expr.left)?;

                // logical operators short-circuit
                match binary_expr.op.kind {
                    TokenKind::AndAnd => {
                        return Ok(ExprValue::Bool(
                            left.is_truthy() && self.eval(&binary_expr.right)?.is_truthy(),
                        ))
                    }
                    TokenKind::OrOr => {
                        return Ok(ExprValue::Bool(
                            left.is_truthy() || self.eval(&binary_expr.right)?.is_truthy(),
                        ))
                    }
                    _ => {}
                }

                let right = self.eval(&binary_expr.right)?;
                let (l, r) = (left.to_number(), right.to_number());

                if binary_expr.op.kind.is_comparitive_op() {
                    return Ok(ExprValue::Bool(match binary_expr.op.kind {
                        TokenKind::Lesser => l < r,
                        TokenKind::Greater => l > r,
                        TokenKind::LesserEqual => l <= r,
                        TokenKind::GreaterEqual => l >= r,
                        TokenKind::EqualEqual => l == r,
                        TokenKind::BangEqual => l != r,
                        _ => unreachable!(),
                    }));
                }

                Ok(ExprValue::Number(match binary_expr.op.kind {
                    TokenKind::Plus => l + r,
                    TokenKind::Minus => l - r,
                    TokenKind::Star => l * r,
                    TokenKind::Slash => l / r,
                    TokenKind::Percent => l % r,
                    _ => unreachable!("parser only builds binary operators"),
                }))
            }
        }
    }
}

fn invalid(expression: &str, reason: impl Into<String>) -> ErrorKind {
    ErrorKind::InvalidExpression {
        expression: expression.to_string(),
        reason: reason.into(),
    }
}

/// Evaluates an arithmetic/comparison expression over numeric boxes.
///
/// Variable references are checked before anything else, left to right, so
/// an undeclared or non-numeric variable is reported ahead of syntax errors.
pub fn evaluate_expression(expression: &str, boxes: &Boxes) -> ExecResult<ExprValue> {
    let mut lexer = Lexer::from_str(expression);
    let tokens = lexer.lex();

    for token in tokens.iter().filter(|t| t.kind == TokenKind::Ident) {
        lookup_number(&lexer.lexeme(&token.span), boxes)?;
    }

    if let Some(err) = lexer.errors.first() {
        return Err(invalid(expression, err.message.clone()));
    }

    let expr = parser::parse(&tokens, &lexer.source)
        .map_err(|err| invalid(expression, err.message))?;

    ExprEvaluator { boxes }.eval(&expr)
}

/// Evaluates an expression for storage; booleans become 1 or 0.
pub fn evaluate_number(expression: &str, boxes: &Boxes) -> ExecResult<f64> {
    let number = evaluate_expression(expression, boxes)?.to_number();
    if number.is_finite() {
        Ok(number)
    } else {
        Err(invalid(expression, "result is not a finite number"))
    }
}

/// Makes text safe to embed as a pipe-dialect argument.
pub fn escape(text: &str) -> String {
    text.replace(' ', "~").replace(':', "")
}

pub fn unescape(text: &str) -> String {
    text.replace('~', " ")
}

/// Static part of pipe-dialect argument normalization.
pub fn clean_pipe_text(text: &str) -> String {
    unescape(text).replace(':', "")
}

/// Resolves a pipe-dialect argument: `$name` reads a box, then tildes become
/// spaces and colons are dropped.
pub fn normalize_pipe_arg(raw: &str, boxes: &Boxes) -> ExecResult<String> {
    let text = match raw.strip_prefix('$') {
        Some(name) => boxes
            .get(name)
            .map(Value::to_string)
            .ok_or_else(|| ErrorKind::UnknownVariable { name: name.into() })?,
        None => raw.to_string(),
    };

    Ok(clean_pipe_text(&text))
}

/// Reads the longest leading decimal number of `text`; `NaN` when there is none.
/// A signed or unsigned `Infinity` prefix reads as an infinity.
pub fn parse_leading_float(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if text[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if mantissa_digits > 0 || frac_end > frac_start {
            mantissa_digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Pipe-dialect `math`: one of `+ - * /`, any other operator yields the left
/// operand, and division by zero yields zero.
pub fn pipe_math(left: &str, op: &str, right: &str) -> String {
    let left = parse_leading_float(left);
    let right = parse_leading_float(right);

    let result = match op {
        "+" => left + right,
        "-" => left - right,
        "*" => left * right,
        "/" => {
            if right == 0.0 {
                0.0
            } else {
                left / right
            }
        }
        _ => left,
    };

    if result.is_nan() {
        String::new()
    } else {
        Value::Number(result).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(entries: &[(&str, Value)]) -> Boxes {
        let mut boxes = Boxes::new();
        for (name, value) in entries {
            boxes.insert(name.to_string(), value.clone());
        }
        boxes
    }

    #[test]
    fn value_literals_resolve_in_priority_order() {
        let store = boxes(&[
            ("x", Value::Number(3.0)),
            ("3", Value::String("shadowed".into())),
        ]);
        assert_eq!(resolve_value("'hi there'", &store), Ok(Value::String("hi there".into())));
        assert_eq!(resolve_value("\"x\"", &store), Ok(Value::String("x".into())));
        assert_eq!(resolve_value("3", &store), Ok(Value::Number(3.0)));
        assert_eq!(resolve_value("-2.5", &store), Ok(Value::Number(-2.5)));
        assert_eq!(resolve_value("x", &store), Ok(Value::Number(3.0)));
        assert_eq!(resolve_value("$x", &store), Ok(Value::Number(3.0)));
    }

    #[test]
    fn unresolvable_values_fail() {
        let store = Boxes::new();
        assert_eq!(
            resolve_value("nope", &store),
            Err(ErrorKind::UnknownValue {
                token: "nope".into()
            })
        );
        assert_eq!(
            resolve_value("$missing", &store),
            Err(ErrorKind::UnknownVariable {
                name: "missing".into()
            })
        );
        // mismatched quotes are not a string literal
        assert!(resolve_value("\"oops'", &store).is_err());
    }

    #[test]
    fn arithmetic_follows_precedence() {
        let store = boxes(&[("x", Value::Number(3.0))]);
        assert_eq!(evaluate_number("x * 2 + 1", &store), Ok(7.0));
        assert_eq!(evaluate_number("1 - 2 * 3 - 4", &store), Ok(-9.0));
        assert_eq!(evaluate_number("(x + 1) % 3", &store), Ok(1.0));
        assert_eq!(evaluate_number("-x + 10", &store), Ok(7.0));
    }

    #[test]
    fn comparisons_and_logic_produce_booleans() {
        let store = boxes(&[("total", Value::Number(14.0))]);
        assert_eq!(evaluate_expression("total > 10", &store), Ok(ExprValue::Bool(true)));
        assert_eq!(
            evaluate_expression("total >= 20 || total == 14", &store),
            Ok(ExprValue::Bool(true))
        );
        assert_eq!(
            evaluate_expression("!(total != 14) && 0", &store),
            Ok(ExprValue::Bool(false))
        );
        assert_eq!(evaluate_number("(total > 10) + 1", &store), Ok(2.0));
    }

    #[test]
    fn variables_are_checked_before_syntax() {
        let store = boxes(&[("name", Value::String("bob".into()))]);
        assert_eq!(
            evaluate_expression("ghost # 1", &store),
            Err(ErrorKind::UnknownVariable {
                name: "ghost".into()
            })
        );
        assert_eq!(
            evaluate_expression("name + 1", &store),
            Err(ErrorKind::NotANumber {
                name: "name".into()
            })
        );
    }

    #[test]
    fn foreign_characters_are_rejected() {
        let err = evaluate_expression("1 + 2; 3", &Boxes::new()).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::InvalidExpression {
                expression: "1 + 2; 3".into(),
                reason: "unexpected character ';'".into(),
            }
        );
    }

    #[test]
    fn division_by_zero_is_not_stored() {
        let err = evaluate_number("1 / 0", &Boxes::new()).unwrap_err();
        assert!(matches!(err, ErrorKind::InvalidExpression { .. }));
    }

    #[test]
    fn pipe_args_are_normalized() {
        let store = boxes(&[("who", Value::String("big~cat:s".into()))]);
        assert_eq!(normalize_pipe_arg("hello~world:", &store), Ok("hello world".into()));
        assert_eq!(normalize_pipe_arg("$who", &store), Ok("big cats".into()));
        assert!(normalize_pipe_arg("$nobody", &store).is_err());
    }

    #[test]
    fn escape_round_trips_spaces() {
        assert_eq!(escape("a b: c"), "a~b~c");
        assert_eq!(unescape("a~b~c"), "a b c");
    }

    #[test]
    fn leading_float_matches_number_prefix() {
        assert_eq!(parse_leading_float("3abc"), 3.0);
        assert_eq!(parse_leading_float("  -1.5e2x"), -150.0);
        assert_eq!(parse_leading_float(".5"), 0.5);
        assert_eq!(parse_leading_float("7e"), 7.0);
        assert!(parse_leading_float("abc").is_nan());
        assert!(parse_leading_float("").is_nan());
    }

    #[test]
    fn pipe_math_rules() {
        assert_eq!(pipe_math("5", "+", "3"), "8");
        assert_eq!(pipe_math("5", "/", "0"), "0");
        assert_eq!(pipe_math("7", "/", "2"), "3.5");
        assert_eq!(pipe_math("5", "^", "3"), "5");
        assert_eq!(pipe_math("five", "+", "3"), "");
    }

    #[test]
    fn pipe_math_keeps_infinite_and_huge_results_readable() {
        let overflow = pipe_math("1e308", "*", "10");
        assert_eq!(overflow, "Infinity");
        assert_eq!(pipe_math(&overflow, "+", "1"), "Infinity");
        assert_eq!(pipe_math("-Infinity", "*", "2"), "-Infinity");
        assert_eq!(pipe_math(&overflow, "-", &overflow), "");
        assert_eq!(pipe_math("1e21", "+", "0"), "1e+21");
        assert_eq!(pipe_math("1e+21", "*", "1"), "1e+21");
        assert_eq!(parse_leading_float("+Infinity and beyond"), f64::INFINITY);
        assert!(parse_leading_float("infinity").is_nan());
    }
}
