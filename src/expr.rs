//! Expression segmentation and evaluation
//!
//! An expression is split once into literal spans and `${name}`
//! placeholders. If every literal span consists only of numbers,
//! `+ - * /`, parentheses and whitespace (and at least one operator or
//! parenthesis is present), the expression is evaluated arithmetically
//! with ordinary precedence. Otherwise it is plain interpolation:
//! literal spans are kept verbatim and placeholder values spliced in.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DocvarsError;

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Check a variable name: `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    IDENT_RE.is_match(name)
}

/// A parsed expression fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text between placeholders
    Literal(String),
    /// Placeholder: ${name}
    Placeholder(String),
}

/// Split an expression into literal and placeholder segments
pub fn segment(expr: &str) -> Result<Vec<Segment>, DocvarsError> {
    let mut segments = Vec::new();
    let mut curr = 0;

    while let Some(rel) = expr[curr..].find("${") {
        let start = curr + rel;
        if start > curr {
            segments.push(Segment::Literal(expr[curr..start].to_string()));
        }

        let name_start = start + 2;
        let Some(close_rel) = expr[name_start..].find('}') else {
            return Err(syntax(expr, "unterminated '${' placeholder"));
        };
        let name = &expr[name_start..name_start + close_rel];
        if !is_valid_identifier(name) {
            return Err(syntax(expr, format!("invalid placeholder name '{}'", name)));
        }

        segments.push(Segment::Placeholder(name.to_string()));
        curr = name_start + close_rel + 1;
    }

    if curr < expr.len() {
        segments.push(Segment::Literal(expr[curr..].to_string()));
    }

    Ok(segments)
}

/// Evaluate an expression, resolving placeholders through `lookup`.
///
/// Whole-number arithmetic results render with one decimal place
/// ("5.0", "10.0"); interpolated text is returned verbatim.
pub fn evaluate(
    expr: &str,
    lookup: &mut dyn FnMut(&str) -> Result<String, DocvarsError>,
) -> Result<String, DocvarsError> {
    let segments = segment(expr)?;

    match arithmetic_tokens(&segments) {
        Some(tokens) => eval_arithmetic(expr, &tokens, lookup),
        None => interpolate(&segments, lookup),
    }
}

fn interpolate(
    segments: &[Segment],
    lookup: &mut dyn FnMut(&str) -> Result<String, DocvarsError>,
) -> Result<String, DocvarsError> {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(name) => out.push_str(&lookup(name)?),
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Var(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Try to read the segments as an arithmetic token stream.
/// Returns None when any literal span carries non-arithmetic text or
/// when no operator/parenthesis is present (pure interpolation).
fn arithmetic_tokens(segments: &[Segment]) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    for seg in segments {
        match seg {
            Segment::Placeholder(name) => tokens.push(Token::Var(name.clone())),
            Segment::Literal(span) => {
                if !lex_span(span, &mut tokens) {
                    return None;
                }
            }
        }
    }

    let has_op = tokens.iter().any(|t| {
        matches!(
            t,
            Token::Plus | Token::Minus | Token::Star | Token::Slash | Token::LParen | Token::RParen
        )
    });
    has_op.then_some(tokens)
}

fn lex_span(span: &str, tokens: &mut Vec<Token>) -> bool {
    let mut chars = span.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            '*' => tokens.push(Token::Star),
            '/' => tokens.push(Token::Slash),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '0'..='9' => {
                let mut end = i + 1;
                while let Some((j, c)) = chars.peek() {
                    if c.is_ascii_digit() || *c == '.' {
                        end = *j + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                match span[i..end].parse::<f64>() {
                    Ok(n) => tokens.push(Token::Number(n)),
                    Err(_) => return false,
                }
            }
            _ => return false,
        }
    }
    true
}

/// An evaluated operand. Placeholder values stay textual until an
/// operator forces numeric coercion, so `${readme}` alone keeps its
/// literal rendering while `${num}+${readme}` becomes a float sum.
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Number(f64),
    Text(String),
}

impl Operand {
    fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Number(n) => Some(*n),
            Operand::Text(s) => s.trim().parse().ok(),
        }
    }

    fn render(self) -> String {
        match self {
            Operand::Number(n) if n.is_finite() && n.fract() == 0.0 => format!("{:.1}", n),
            Operand::Number(n) => n.to_string(),
            Operand::Text(s) => s,
        }
    }
}

struct ArithEval<'a> {
    expr: &'a str,
    tokens: &'a [Token],
    pos: usize,
    lookup: &'a mut dyn FnMut(&str) -> Result<String, DocvarsError>,
}

fn eval_arithmetic(
    expr: &str,
    tokens: &[Token],
    lookup: &mut dyn FnMut(&str) -> Result<String, DocvarsError>,
) -> Result<String, DocvarsError> {
    let mut eval = ArithEval {
        expr,
        tokens,
        pos: 0,
        lookup,
    };
    let value = eval.add_sub()?;
    if eval.pos != eval.tokens.len() {
        return Err(syntax(expr, "unexpected trailing tokens"));
    }
    Ok(value.render())
}

impl ArithEval<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn add_sub(&mut self) -> Result<Operand, DocvarsError> {
        let mut lhs = self.mul_div()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let rhs = self.mul_div()?;
                    lhs = match (lhs.as_number(), rhs.as_number()) {
                        (Some(a), Some(b)) => Operand::Number(a + b),
                        // '+' with a non-numeric side concatenates
                        _ => Operand::Text(format!("{}{}", lhs.render(), rhs.render())),
                    };
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let rhs = self.mul_div()?;
                    let (a, b) = self.numeric_pair(&lhs, &rhs, "-")?;
                    lhs = Operand::Number(a - b);
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn mul_div(&mut self) -> Result<Operand, DocvarsError> {
        let mut lhs = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.factor()?;
                    let (a, b) = self.numeric_pair(&lhs, &rhs, "*")?;
                    lhs = Operand::Number(a * b);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.factor()?;
                    let (a, b) = self.numeric_pair(&lhs, &rhs, "/")?;
                    if b == 0.0 {
                        return Err(syntax(self.expr, "division by zero"));
                    }
                    lhs = Operand::Number(a / b);
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Operand, DocvarsError> {
        match self.peek() {
            Some(Token::Number(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(Operand::Number(n))
            }
            Some(Token::Var(name)) => {
                let name = name.clone();
                self.pos += 1;
                let value = (self.lookup)(&name)?;
                Ok(Operand::Text(value))
            }
            Some(Token::Minus) => {
                self.pos += 1;
                let value = self.factor()?;
                let n = value
                    .as_number()
                    .ok_or_else(|| syntax(self.expr, "unary '-' requires a numeric operand"))?;
                Ok(Operand::Number(-n))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let value = self.add_sub()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err(syntax(self.expr, "missing closing parenthesis")),
                }
            }
            Some(_) => Err(syntax(self.expr, "expected a value")),
            None => Err(syntax(self.expr, "expression ends with a dangling operator")),
        }
    }

    fn numeric_pair(
        &self,
        lhs: &Operand,
        rhs: &Operand,
        op: &str,
    ) -> Result<(f64, f64), DocvarsError> {
        match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(syntax(
                self.expr,
                format!("operator '{}' requires numeric operands", op),
            )),
        }
    }
}

fn syntax(expr: &str, details: impl Into<String>) -> DocvarsError {
    DocvarsError::ExpressionSyntax {
        expr: expr.to_string(),
        details: details.into(),
    }
}
