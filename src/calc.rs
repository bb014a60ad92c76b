//! Arithmetic expression evaluation for "calculate/compute" commands.
//!
//! Accepts the restricted alphabet `[0-9 + - * / ( ) . ]` and evaluates with
//! f64 semantics, so `10 / 0` is infinity rather than an error. Malformed
//! input returns an error which the dispatcher swallows, letting the
//! utterance fall through to later rules.

use crate::error::{AssistantError, Result};

/// Returns `true` when the text only uses the arithmetic alphabet.
pub fn is_arithmetic(text: &str) -> bool {
    !text.trim().is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || " +-*/().".contains(c))
}

/// Evaluate an arithmetic expression.
///
/// # Errors
///
/// Returns an error for empty input, unbalanced parentheses, dangling
/// operators, or trailing garbage.
pub fn eval(expr: &str) -> Result<f64> {
    let tokens: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
    if tokens.is_empty() {
        return Err(AssistantError::Expression("empty expression".to_owned()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return Err(AssistantError::Expression(format!(
            "unexpected input at position {}",
            parser.pos
        )));
    }
    Ok(value)
}

/// Format an evaluation result the way it is spoken and logged.
///
/// Integral values print without a fractional part; division by zero prints
/// as `inf`.
pub fn format_value(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_owned()
    } else if value.is_nan() {
        "undefined".to_owned()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Recursive-descent parser over the filtered character stream.
///
/// Grammar: expression := term (('+'|'-') term)*
///          term       := factor (('*'|'/') factor)*
///          factor     := number | '(' expression ')' | ('+'|'-') factor
struct Parser {
    tokens: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expression(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                '+' => {
                    self.bump();
                    value += self.term()?;
                }
                '-' => {
                    self.bump();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                '*' => {
                    self.bump();
                    value *= self.factor()?;
                }
                '/' => {
                    self.bump();
                    // f64 division: x / 0 is +-inf, 0 / 0 is NaN.
                    value /= self.factor()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64> {
        match self.peek() {
            Some('(') => {
                self.bump();
                let value = self.expression()?;
                if self.bump() != Some(')') {
                    return Err(AssistantError::Expression(
                        "missing closing parenthesis".to_owned(),
                    ));
                }
                Ok(value)
            }
            Some('+') => {
                self.bump();
                self.factor()
            }
            Some('-') => {
                self.bump();
                Ok(-self.factor()?)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(AssistantError::Expression(format!("unexpected '{c}'"))),
            None => Err(AssistantError::Expression(
                "unexpected end of expression".to_owned(),
            )),
        }
    }

    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.bump();
            } else {
                break;
            }
        }
        let raw: String = self.tokens[start..self.pos].iter().collect();
        raw.parse::<f64>()
            .map_err(|_| AssistantError::Expression(format!("invalid number '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn basic_arithmetic() {
        assert_eq!(eval("2 + 2").unwrap(), 4.0);
        assert_eq!(eval("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(eval("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(eval("10 - 4 / 2").unwrap(), 8.0);
    }

    #[test]
    fn unary_and_decimals() {
        assert_eq!(eval("-3 + 5").unwrap(), 2.0);
        assert_eq!(eval("1.5 * 2").unwrap(), 3.0);
        assert_eq!(eval("+4").unwrap(), 4.0);
    }

    #[test]
    fn division_by_zero_is_infinity() {
        let v = eval("10 / 0").unwrap();
        assert!(v.is_infinite());
        assert_eq!(format_value(v), "inf");
    }

    #[test]
    fn malformed_input_errors() {
        assert!(eval("").is_err());
        assert!(eval("2 +").is_err());
        assert!(eval("(2 + 3").is_err());
        assert!(eval("2 + * 3").is_err());
    }

    #[test]
    fn arithmetic_alphabet_check() {
        assert!(is_arithmetic("2 + (3 * 4.5)"));
        assert!(!is_arithmetic("my mortgage"));
        assert!(!is_arithmetic(""));
    }

    #[test]
    fn formats_integers_without_fraction() {
        assert_eq!(format_value(4.0), "4");
        assert_eq!(format_value(2.5), "2.5");
    }
}
