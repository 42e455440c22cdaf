//! `calculator`: a context-free arithmetic evaluator (spec §4.E). No
//! external crate in the teacher or pack pulls in a general expression
//! evaluator for this scale of grammar, so the recursive-descent parser is
//! hand-written rather than adding an unrelated dependency.

use serde_json::Value;

use crate::tool_result::ToolResult;
use crate::tools::schema::{ToolHandler, ToolSchema};

pub fn schema() -> ToolSchema {
    ToolSchema::new(
        "calculator",
        "Evaluates a basic arithmetic expression (+, -, *, /, parentheses, decimals).",
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": { "type": "string", "description": "e.g. \"(2 + 3) * 4\"" },
                "precision": { "type": "integer", "minimum": 0, "maximum": 15, "default": 6, "description": "decimal places to round non-integer results to" }
            },
            "required": ["expression"]
        }),
    )
}

pub fn handler() -> ToolHandler {
    ToolHandler::context_free(|args: Value| async move {
        let Some(expression) = args.get("expression").and_then(Value::as_str) else {
            return ToolResult::from_error("calculator error: missing required field 'expression'");
        };
        let precision = args.get("precision").and_then(Value::as_u64).unwrap_or(6).min(15) as usize;
        match evaluate(expression) {
            Ok(value) => ToolResult::from_success(format_result(value, precision)),
            Err(msg) => ToolResult::from_error(format!("calculator error: {msg}")),
        }
    })
}

fn format_result(value: f64, precision: usize) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        let rounded = format!("{value:.precision$}");
        let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
        trimmed.to_string()
    }
}

/// Evaluates a basic arithmetic expression: `+ - * /`, unary minus,
/// parentheses, and decimal literals.
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let value = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected trailing input near token {}", parser.pos));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut chars = input.chars().peekable();
    let mut tokens = Vec::new();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' => {
                chars.next();
            }
            '+' => {
                tokens.push(Token::Plus);
                chars.next();
            }
            '-' => {
                tokens.push(Token::Minus);
                chars.next();
            }
            '*' => {
                tokens.push(Token::Star);
                chars.next();
            }
            '/' => {
                tokens.push(Token::Slash);
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut number = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        number.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = number.parse().map_err(|_| format!("invalid number literal '{number}'"))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64, String> {
        let mut value = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.parse_unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.parse_unary()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_unary(&mut self) -> Result<f64, String> {
        if let Some(Token::Minus) = self.peek() {
            self.pos += 1;
            return Ok(-self.parse_unary()?);
        }
        if let Some(Token::Plus) = self.peek() {
            self.pos += 1;
            return self.parse_unary();
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Number(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(n)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let value = self.parse_expr()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err("expected closing parenthesis".to_string()),
                }
            }
            other => Err(format!("expected a number or '(', found {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn handles_unary_minus_and_decimals() {
        assert_eq!(evaluate("-2.5 + 5").unwrap(), 2.5);
    }

    #[test]
    fn division_by_zero_errors() {
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        assert!(evaluate("(1 + 2").is_err());
    }
}
