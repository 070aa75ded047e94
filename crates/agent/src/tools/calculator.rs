//! Arithmetic calculator tool

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::{HandlerResult, ParamSpec, ParamType, ToolHandler, ToolSchema};

/// Longest expression accepted, in characters
pub const MAX_EXPRESSION_LEN: usize = 10_000;

/// Deepest nesting of parentheses, unary signs and exponents
pub const MAX_DEPTH: usize = 256;

/// Evaluates arithmetic expressions
pub struct CalculatorTool;

#[async_trait]
impl ToolHandler for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Supports + - * / % ^, parentheses, \
         the constants pi and e, and sqrt, abs, ln, log, exp, sin, cos, tan, \
         floor, ceil and round."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().param(ParamSpec::required(
            "expression",
            ParamType::String,
            "The expression to evaluate, e.g. \"3111696 / 74088\"",
        ))
    }

    async fn call(&self, input: &Map<String, Value>) -> HandlerResult {
        let expression = input
            .get("expression")
            .and_then(Value::as_str)
            .ok_or("expression must be a string")?;
        let result = evaluate(expression)?;
        Ok(number_value(result))
    }
}

/// Calculator failures
#[derive(Error, Debug, PartialEq)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("missing closing parenthesis")]
    MissingParen,

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression longer than {0} characters")]
    TooLong(usize),

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Caret => write!(f, "^"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn lex(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut num = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        num.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Scientific notation: only when an exponent actually follows
                if matches!(chars.peek(), Some('e') | Some('E')) {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    let signed = matches!(lookahead.peek(), Some('+') | Some('-'));
                    if signed {
                        lookahead.next();
                    }
                    if lookahead.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                        num.push('e');
                        chars.next();
                        if signed {
                            if let Some(sign) = chars.next() {
                                num.push(sign);
                            }
                        }
                        while let Some(&c) = chars.peek() {
                            if c.is_ascii_digit() {
                                num.push(c);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                    }
                }
                let value = num
                    .parse::<f64>()
                    .map_err(|_| CalcError::InvalidNumber(num.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident.to_ascii_lowercase()));
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '+' | '-' | '/' | '%' | '^' | '(' | ')' => {
                chars.next();
                tokens.push(match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
            }
            other => return Err(CalcError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

/// Evaluate an arithmetic expression
pub fn evaluate(input: &str) -> Result<f64, CalcError> {
    if input.chars().count() > MAX_EXPRESSION_LEN {
        return Err(CalcError::TooLong(MAX_EXPRESSION_LEN));
    }
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(CalcError::UnexpectedToken(token.to_string()));
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

/// Integral results become JSON integers
fn number_value(value: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        json!(value as i64)
    } else {
        json!(value)
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut left = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    left += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    left -= self.term()?;
                }
                _ => return Ok(left),
            }
        }
    }

    /// term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut left = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    left *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let right = self.unary()?;
                    if right == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    left /= right;
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    let right = self.unary()?;
                    if right == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    left %= right;
                }
                _ => return Ok(left),
            }
        }
    }

    /// Every recursive production passes through here, so this bounds the stack
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = self.signed();
        self.depth -= 1;
        result
    }

    /// unary := ('-' | '+') unary | power
    fn signed(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    /// power := primary ('^' unary)?, right associative
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.next().cloned() {
            None => Err(CalcError::UnexpectedEnd),
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.close_paren()?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let arg = self.expr()?;
                    self.close_paren()?;
                    apply_function(&name, arg)
                } else {
                    constant(&name)
                }
            }
            Some(token) => Err(CalcError::UnexpectedToken(token.to_string())),
        }
    }

    fn close_paren(&mut self) -> Result<(), CalcError> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            _ => Err(CalcError::MissingParen),
        }
    }
}

fn constant(name: &str) -> Result<f64, CalcError> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        _ => Err(CalcError::UnknownIdentifier(name.to_string())),
    }
}

fn apply_function(name: &str, arg: f64) -> Result<f64, CalcError> {
    let value = match name {
        "sqrt" => arg.sqrt(),
        "abs" => arg.abs(),
        "ln" => arg.ln(),
        "log" => arg.log10(),
        "exp" => arg.exp(),
        "sin" => arg.sin(),
        "cos" => arg.cos(),
        "tan" => arg.tan(),
        "floor" => arg.floor(),
        "ceil" => arg.ceil(),
        "round" => arg.round(),
        _ => return Err(CalcError::UnknownIdentifier(name.to_string())),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(expression: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("expression".to_string(), json!(expression));
        map
    }

    #[test]
    fn eval_division_scenario() {
        assert_eq!(evaluate("3111696 / 74088").unwrap(), 42.0);
    }

    #[test]
    fn eval_precedence_and_parens() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((2 + 3) * (4 - 1))").unwrap(), 15.0);
    }

    #[test]
    fn eval_power_is_right_associative() {
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("2 ** 10").unwrap(), 1024.0);
        assert_eq!(evaluate("-2 ^ 2").unwrap(), -4.0);
        assert_eq!(evaluate("2 ^ -1").unwrap(), 0.5);
    }

    #[test]
    fn eval_unary_and_modulo() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("--4").unwrap(), 4.0);
        assert_eq!(evaluate("10 % 3").unwrap(), 1.0);
    }

    #[test]
    fn eval_functions_and_constants() {
        assert_eq!(evaluate("sqrt(144)").unwrap(), 12.0);
        assert_eq!(evaluate("abs(-3) + floor(2.7) + ceil(0.2)").unwrap(), 6.0);
        assert!((evaluate("2 * pi").unwrap() - std::f64::consts::TAU).abs() < 1e-12);
        assert!((evaluate("ln(e)").unwrap() - 1.0).abs() < 1e-12);
        assert!((evaluate("log(1000)").unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn eval_scientific_notation() {
        assert_eq!(evaluate("1.5e3").unwrap(), 1500.0);
        assert_eq!(evaluate("2E-2 * 100").unwrap(), 2.0);
    }

    #[test]
    fn eval_errors() {
        assert_eq!(evaluate(""), Err(CalcError::Empty));
        assert_eq!(evaluate("1 / 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("5 % 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("(1 + 2"), Err(CalcError::MissingParen));
        assert_eq!(evaluate("1 +"), Err(CalcError::UnexpectedEnd));
        assert_eq!(evaluate("3 * * 4"), Err(CalcError::UnexpectedToken("*".to_string())));
        assert_eq!(evaluate("1 2"), Err(CalcError::UnexpectedToken("2".to_string())));
        assert_eq!(evaluate("2 $ 3"), Err(CalcError::UnexpectedChar('$')));
        assert_eq!(
            evaluate("foo(2)"),
            Err(CalcError::UnknownIdentifier("foo".to_string()))
        );
        assert_eq!(evaluate("sqrt(-1)"), Err(CalcError::NotFinite));
    }

    #[test]
    fn eval_rejects_runaway_input() {
        assert!(evaluate(&"(".repeat(100_000)).is_err());
        assert!(evaluate(&"-".repeat(100_000)).is_err());
        assert_eq!(
            evaluate(&"1+".repeat(6_000)),
            Err(CalcError::TooLong(MAX_EXPRESSION_LEN))
        );
    }

    #[test]
    fn eval_nesting_limit() {
        let parens = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        assert_eq!(evaluate(&parens), Err(CalcError::TooDeep(MAX_DEPTH)));

        let signs = format!("{}1", "-".repeat(5_000));
        assert_eq!(evaluate(&signs), Err(CalcError::TooDeep(MAX_DEPTH)));

        let exponents = format!("1{}", "^1".repeat(300));
        assert_eq!(evaluate(&exponents), Err(CalcError::TooDeep(MAX_DEPTH)));

        let nested = format!("{}7{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(evaluate(&nested), Ok(7.0));
        assert_eq!(evaluate(&format!("{}5", "-".repeat(100))), Ok(5.0));
    }

    #[test]
    fn number_value_integral_and_fractional() {
        assert_eq!(number_value(42.0), json!(42));
        assert_eq!(number_value(-7.0), json!(-7));
        assert_eq!(number_value(0.5), json!(0.5));
    }

    #[tokio::test]
    async fn tool_returns_integer_for_whole_result() {
        let result = CalculatorTool.call(&input("3111696 / 74088")).await.unwrap();
        assert_eq!(result, json!(42));
    }

    #[tokio::test]
    async fn tool_reports_evaluation_error() {
        let err = CalculatorTool.call(&input("1 / 0")).await.unwrap_err();
        assert_eq!(err.to_string(), "division by zero");
    }
}
