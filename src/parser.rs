//! A recursive-descent parser for the pattern language.
//!
//! From loosest to tightest binding:
//!
//! ```text
//! expr     := sequence ('*' weight)? ('/' sequence ('*' weight)?)*
//! sequence := quantified ('.' quantified)*
//! quantified := term ('{' bounds '}')?
//! term     := atom | '(' expr ')' | '[' expr ']' | identifier
//! atom     := "'" (escaped character | any character but "'")* "'"
//! bounds   := n | min ':' max | ':' max
//! ```
//!
//! Whitespace between tokens is ignored. Replacement expressions of rewrites
//! may additionally use `#n#` to splice in the n-th captured segment.

use crate::error::SyntaxError;
use crate::expr::{Expr, WeightedExpr};
use crate::util::{self, is_identifier_char, is_identifier_start, Bounds};

type Result<T> = std::result::Result<T, SyntaxError>;

/// Parses a pattern.
///
/// # Examples
///
/// ```rust
/// # use wordgen::{parse, Expr};
/// let e = parse("'a'.'b'").unwrap();
/// assert_eq!(Expr::seq(vec![Expr::atom("a"), Expr::atom("b")]), e);
/// ```
///
/// # Errors
///
/// A `SyntaxError` describing the first problem found: an unterminated atom,
/// an unexpected character, invalid quantifier bounds or weight, or input
/// left over after a complete expression.
pub fn parse(source: &str) -> Result<Expr> {
    Parser::new(source, false).parse()
}

/// Parses the replacement side of a rewrite, which unlike other patterns may
/// contain `#n#` placeholders.
pub fn parse_replacement(source: &str) -> Result<Expr> {
    Parser::new(source, true).parse()
}

struct Parser {
    chars: Vec<char>,
    position: usize,
    placeholders: bool,
}

impl Parser {
    fn new(source: &str, placeholders: bool) -> Parser {
        let mut p = Parser {
            chars: source.chars().collect(),
            position: 0,
            placeholders,
        };
        p.skip_whitespace();
        p
    }
    fn parse(mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        match self.peek() {
            Some(c) => Err(self.unexpected(c)),
            None => Ok(expr),
        }
    }
    fn parse_expr(&mut self) -> Result<Expr> {
        let expr = self.parse_sequence()?;
        match self.peek() {
            Some('/') | Some('*') => self.parse_choice(expr),
            _ => Ok(expr),
        }
    }
    fn parse_sequence(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_quantified_term()?];
        while self.consume('.') {
            items.push(self.parse_quantified_term()?);
        }
        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Expr::Seq(items))
        }
    }
    fn parse_quantified_term(&mut self) -> Result<Expr> {
        let term = self.parse_term()?;
        if self.peek() == Some('{') {
            let (min, max) = self.parse_quantifier()?;
            Ok(Expr::range(term, min, max))
        } else {
            Ok(term)
        }
    }
    fn parse_choice(&mut self, first: Expr) -> Result<Expr> {
        let weight = self.parse_optional_weight()?;
        let mut items = vec![WeightedExpr::new(first, weight)];
        while self.consume('/') {
            let expr = self.parse_sequence()?;
            let weight = self.parse_optional_weight()?;
            items.push(WeightedExpr::new(expr, weight));
        }
        Ok(Expr::Choice(items))
    }
    fn parse_optional_weight(&mut self) -> Result<f64> {
        if self.consume('*') {
            self.parse_weight()
        } else {
            Ok(1.0)
        }
    }
    fn parse_term(&mut self) -> Result<Expr> {
        match self.peek() {
            // an empty pattern, or one ending where a term is expected, stands
            // for the empty string
            None => Ok(Expr::atom("")),
            Some('\'') => self.parse_atom(),
            Some('(') => self.parse_option(),
            Some('[') => self.parse_group(),
            Some('#') if self.placeholders => self.parse_placeholder(),
            Some(c) if is_identifier_start(c) => Ok(self.parse_ref()),
            Some(c) => Err(self.unexpected(c)),
        }
    }
    fn parse_atom(&mut self) -> Result<Expr> {
        let start = self.position;
        // the opening quote; whitespace after it belongs to the atom
        self.advance(false);
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(SyntaxError::new(
                        "expected single quote to end atom",
                        start,
                    ))
                }
                Some('\'') => break,
                Some('\\') => {
                    self.advance(false);
                    match self.peek() {
                        Some(c) => {
                            value.push(c);
                            self.advance(false);
                        }
                        None => {
                            return Err(SyntaxError::new(
                                "expected single quote to end atom",
                                start,
                            ))
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance(false);
                }
            }
        }
        self.advance(true);
        Ok(Expr::Atom(value))
    }
    fn parse_ref(&mut self) -> Expr {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !is_identifier_char(c) {
                break;
            }
            name.push(c);
            self.advance(false);
        }
        self.skip_whitespace();
        Expr::Ref(name)
    }
    fn parse_option(&mut self) -> Result<Expr> {
        self.advance(true);
        let expr = self.parse_expr()?;
        if !self.consume(')') {
            return Err(self.error("expected ')' at the end of an optional expression"));
        }
        Ok(Expr::optional(expr))
    }
    fn parse_group(&mut self) -> Result<Expr> {
        self.advance(true);
        let expr = self.parse_expr()?;
        if !self.consume(']') {
            return Err(self.error("expected ']' at the end of a group"));
        }
        Ok(expr)
    }
    fn parse_placeholder(&mut self) -> Result<Expr> {
        let start = self.position;
        self.advance(false);
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.advance(false);
        }
        if self.peek() != Some('#') {
            return Err(SyntaxError::new("unterminated match placeholder", start));
        }
        self.advance(true);
        digits
            .parse()
            .map(Expr::Match)
            .map_err(|_| SyntaxError::new("invalid match placeholder", start))
    }
    fn parse_quantifier(&mut self) -> Result<(usize, usize)> {
        let start = self.position;
        self.advance(true);
        let mut bounds = String::new();
        while let Some(c) = self.peek() {
            if c == '}' {
                break;
            }
            bounds.push(c);
            self.advance(true);
        }
        if !self.consume('}') {
            return Err(self.error("expected '}' at the end of quantifier expression"));
        }
        util::parse_quantifier(&bounds).map_err(|e| match e {
            Bounds::TooManyParts => SyntaxError::new("invalid quantifier range", start),
            Bounds::Invalid => SyntaxError::new("invalid quantifier bounds", start),
        })
    }
    fn parse_weight(&mut self) -> Result<f64> {
        let start = self.position;
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_ascii_digit() || c == '.') {
                break;
            }
            digits.push(c);
            self.advance(false);
        }
        self.skip_whitespace();
        util::parse_weight(&digits).ok_or_else(|| SyntaxError::new("invalid weight value", start))
    }
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).cloned()
    }
    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance(true);
            true
        } else {
            false
        }
    }
    fn advance(&mut self, skip_whitespace: bool) {
        if self.position < self.chars.len() {
            self.position += 1;
        }
        if skip_whitespace {
            self.skip_whitespace();
        }
    }
    fn skip_whitespace(&mut self) {
        while let Some(' ') | Some('\n') | Some('\t') = self.peek() {
            self.position += 1;
        }
    }
    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError::new(message, self.position)
    }
    fn unexpected(&self, c: char) -> SyntaxError {
        SyntaxError::new(format!("unexpected character `{}`", c), self.position)
    }
}
