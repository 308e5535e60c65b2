//! Slash commands recognised in place of the plain transform when tools are
//! enabled: `/calc <expr>`, `/remember <text>` and `/recall [query]`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::memory::Note;
use crate::transform::tagged;

const RECALL_LIMIT: usize = 5;
const MAX_CALC_DEPTH: usize = 256;

static COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^/(calc|remember|recall)\s*(.*)$").expect("command regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    Calc(String),
    Remember(String),
    Recall(String),
}

/// Result of running a command: the tagged reply plus a note to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub output: String,
    pub note: Option<Note>,
}

impl ToolCommand {
    pub fn parse(message: &str) -> Option<Self> {
        let caps = COMMAND.captures(message.trim())?;
        let arg = caps.get(2).map_or("", |m| m.as_str()).to_string();
        match caps[1].to_ascii_lowercase().as_str() {
            "calc" => Some(Self::Calc(arg)),
            "remember" => Some(Self::Remember(arg)),
            "recall" => Some(Self::Recall(arg)),
            _ => None,
        }
    }

    /// Whether the command reads stored notes before replying.
    pub fn reads_memory(&self) -> bool {
        matches!(self, Self::Recall(_))
    }

    pub fn run(self, notes: &[Note]) -> ToolOutcome {
        match self {
            Self::Calc(expr) => ToolOutcome {
                output: tagged(&calc(&expr)),
                note: None,
            },
            Self::Remember(text) => {
                let text = text.trim().to_string();
                ToolOutcome {
                    output: tagged(&format!("Saved: “{text}”")),
                    note: Some(Note::now(text)),
                }
            }
            Self::Recall(query) => ToolOutcome {
                output: tagged(&recall(notes, &query)),
                note: None,
            },
        }
    }
}

/// Last few notes matching `query` case-insensitively, or the most recent
/// notes when the query is blank.
pub fn recall(notes: &[Note], query: &str) -> String {
    let q = query.trim().to_lowercase();
    let hits: Vec<&Note> = if q.is_empty() {
        notes.iter().collect()
    } else {
        notes
            .iter()
            .filter(|n| n.text.to_lowercase().contains(&q))
            .collect()
    };
    if hits.is_empty() {
        return "No memory found.".to_string();
    }
    let start = hits.len().saturating_sub(RECALL_LIMIT);
    let lines: Vec<String> = hits[start..]
        .iter()
        .map(|n| format!("- {} (@{})", n.text, n.ts))
        .collect();
    format!("Recent memory:\n{}", lines.join("\n"))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected '{0}'")]
    Unexpected(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("division by zero")]
    DivisionByZero,
    #[error("expression nested too deeply")]
    TooDeep,
}

/// Evaluate an arithmetic expression after dropping every character outside
/// digits, operators, parentheses, dots and spaces.
pub fn calc(raw: &str) -> String {
    let expr: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || "+-*/(). ".contains(*c))
        .collect();
    match evaluate(&expr) {
        Ok(value) => format!("{expr} = {}", format_number(value)),
        Err(err) => format!("Calc error: {err}"),
    }
}

pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(tok) => Err(CalcError::Unexpected(tok.to_string())),
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Pow,
    Slash,
    FloorDiv,
    Open,
    Close,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", format_number(*n)),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Pow => f.write_str("**"),
            Token::Slash => f.write_str("/"),
            Token::FloorDiv => f.write_str("//"),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let (token, width) = match c {
            ' ' => {
                i += 1;
                continue;
            }
            '+' => (Token::Plus, 1),
            '-' => (Token::Minus, 1),
            '*' if next == Some('*') => (Token::Pow, 2),
            '*' => (Token::Star, 1),
            '/' if next == Some('/') => (Token::FloorDiv, 2),
            '/' => (Token::Slash, 1),
            '(' => (Token::Open, 1),
            ')' => (Token::Close, 1),
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CalcError::InvalidNumber(literal))?;
                tokens.push(Token::Num(value));
                continue;
            }
            other => return Err(CalcError::Unexpected(other.to_string())),
        };
        tokens.push(token);
        i += width;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.bump();
                    acc += self.term()?;
                }
                Some(Token::Minus) => {
                    self.bump();
                    acc -= self.term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.bump();
                    acc *= self.unary()?;
                }
                Some(op @ (Token::Slash | Token::FloorDiv)) => {
                    self.bump();
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    acc /= rhs;
                    if op == Token::FloorDiv {
                        acc = acc.floor();
                    }
                }
                _ => return Ok(acc),
            }
        }
    }

    // All recursion (parentheses, sign runs, exponents) goes through here.
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_CALC_DEPTH {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.bump();
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.bump();
                self.unary()
            }
            _ => self.power(),
        }
    }

    // `**` binds tighter than a unary sign on its left and is right-associative.
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Pow) {
            self.bump();
            let exp = self.unary()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        match self.bump() {
            Some(Token::Num(value)) => Ok(value),
            Some(Token::Open) => {
                let value = self.expr()?;
                match self.bump() {
                    Some(Token::Close) => Ok(value),
                    Some(tok) => Err(CalcError::Unexpected(tok.to_string())),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(tok) => Err(CalcError::Unexpected(tok.to_string())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(text: &str, ts: &str) -> Note {
        Note {
            text: text.into(),
            ts: ts.into(),
        }
    }

    #[test]
    fn parse_recognises_commands_case_insensitively() {
        assert_eq!(
            ToolCommand::parse("  /CALC 1+2 "),
            Some(ToolCommand::Calc("1+2".into()))
        );
        assert_eq!(
            ToolCommand::parse("/remember buy milk"),
            Some(ToolCommand::Remember("buy milk".into()))
        );
        assert_eq!(
            ToolCommand::parse("/Recall"),
            Some(ToolCommand::Recall(String::new()))
        );
        assert_eq!(ToolCommand::parse("hello /calc 1"), None);
        assert_eq!(ToolCommand::parse("/unknown x"), None);
    }

    #[test]
    fn calc_follows_precedence() {
        assert_eq!(calc("1 + 2 * 3"), "1 + 2 * 3 = 7");
        assert_eq!(calc("(1+2)*3"), "(1+2)*3 = 9");
        assert_eq!(calc("7/2"), "7/2 = 3.5");
        assert_eq!(calc("7//2"), "7//2 = 3");
        assert_eq!(calc("2**3**2"), "2**3**2 = 512");
        assert_eq!(calc("-2**2"), "-2**2 = -4");
        assert_eq!(calc("--3"), "--3 = 3");
    }

    #[test]
    fn calc_rejects_runaway_nesting() {
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(calc(&parens), "Calc error: expression nested too deeply");
        let signs = format!("{}1", "-".repeat(100_000));
        assert_eq!(evaluate(&signs), Err(CalcError::TooDeep));
        let powers = vec!["2"; 100_000].join("**");
        assert_eq!(evaluate(&powers), Err(CalcError::TooDeep));
    }

    #[test]
    fn calc_allows_reasonable_nesting() {
        let parens = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&parens), Ok(1.0));
        let signs = format!("{}1", "-".repeat(100));
        assert_eq!(evaluate(&signs), Ok(1.0));
    }

    #[test]
    fn calc_strips_foreign_characters() {
        assert_eq!(calc("x = 4 * 5;"), "  4 * 5 = 20");
    }

    #[test]
    fn calc_reports_errors() {
        assert_eq!(calc("1/0"), "Calc error: division by zero");
        assert_eq!(calc(""), "Calc error: empty expression");
        assert_eq!(calc("abc"), "Calc error: empty expression");
        assert_eq!(calc("(1+2"), "Calc error: unexpected end of expression");
        assert_eq!(calc("1.2.3"), "Calc error: invalid number '1.2.3'");
        assert_eq!(calc("2 3"), "Calc error: unexpected '3'");
        assert_eq!(calc("2 * * 3"), "Calc error: unexpected '*'");
    }

    #[test]
    fn recall_returns_last_five_matches() {
        let notes: Vec<Note> = (0..7)
            .map(|i| note(&format!("item {i}"), &format!("t{i}")))
            .collect();
        let out = recall(&notes, "");
        assert!(out.starts_with("Recent memory:\n- item 2 (@t2)"));
        assert!(out.ends_with("- item 6 (@t6)"));
        assert_eq!(out.lines().count(), 6);
    }

    #[test]
    fn recall_filters_by_query() {
        let notes = vec![note("Buy Milk", "a"), note("call mom", "b")];
        assert_eq!(recall(&notes, " milk "), "Recent memory:\n- Buy Milk (@a)");
        assert_eq!(recall(&notes, "bread"), "No memory found.");
        assert_eq!(recall(&[], ""), "No memory found.");
    }

    #[test]
    fn run_tags_output_and_emits_note_for_remember() {
        let outcome = ToolCommand::Remember("  water plants ".into()).run(&[]);
        assert_eq!(outcome.output, "[nanda-go] Saved: “water plants”");
        assert_eq!(outcome.note.map(|n| n.text), Some("water plants".into()));

        let outcome = ToolCommand::Calc("2+2".into()).run(&[]);
        assert_eq!(outcome.output, "[nanda-go] 2+2 = 4");
        assert!(outcome.note.is_none());

        let notes = vec![note("water plants", "ts")];
        let outcome = ToolCommand::Recall("plants".into()).run(&notes);
        assert_eq!(
            outcome.output,
            "[nanda-go] Recent memory:\n- water plants (@ts)"
        );
        assert!(ToolCommand::Recall(String::new()).reads_memory());
        assert!(!ToolCommand::Calc(String::new()).reads_memory());
    }
}
