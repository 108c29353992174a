use std::fmt;

/// A node of the pattern language.
///
/// Expressions are built once, by the parser or by hand, and never mutated
/// afterwards. Their `Display` form is valid pattern text: parsing what an
/// expression prints yields an equal expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal terminal.
    Atom(String),
    /// A reference to another rule by name.
    Ref(String),
    /// The i-th segment captured by a rewrite's match expression. Only
    /// meaningful inside a replacement.
    Match(usize),
    Seq(Vec<Expr>),
    Choice(Vec<WeightedExpr>),
    /// `expr` repeated between `min` and `max` times, inclusive.
    Quantifier {
        expr: Box<Expr>,
        min: usize,
        max: usize,
    },
}

/// One alternative of a choice with its relative weight.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedExpr {
    pub expr: Expr,
    pub weight: f64,
}

impl WeightedExpr {
    pub fn new(expr: Expr, weight: f64) -> WeightedExpr {
        WeightedExpr { expr, weight }
    }
}

impl From<Expr> for WeightedExpr {
    fn from(expr: Expr) -> WeightedExpr {
        WeightedExpr::new(expr, 1.0)
    }
}

impl Expr {
    pub fn atom(value: &str) -> Expr {
        Expr::Atom(value.to_string())
    }
    pub fn reference(rule: &str) -> Expr {
        Expr::Ref(rule.to_string())
    }
    pub fn seq(items: Vec<Expr>) -> Expr {
        Expr::Seq(items)
    }
    /// A choice in which every alternative has weight 1.
    pub fn choice(items: Vec<Expr>) -> Expr {
        Expr::Choice(items.into_iter().map(WeightedExpr::from).collect())
    }
    pub fn weighted_choice(items: Vec<WeightedExpr>) -> Expr {
        Expr::Choice(items)
    }
    pub fn range(expr: Expr, min: usize, max: usize) -> Expr {
        Expr::Quantifier {
            expr: Box::new(expr),
            min,
            max,
        }
    }
    pub fn repeat(expr: Expr, count: usize) -> Expr {
        Expr::range(expr, count, count)
    }
    pub fn optional(expr: Expr) -> Expr {
        Expr::range(expr, 0, 1)
    }
    /// Names of the rules this expression refers to, in the order they
    /// appear, duplicates included.
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }
    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Atom(_) | Expr::Match(_) => (),
            Expr::Ref(name) => names.push(name),
            Expr::Seq(items) => {
                for e in items {
                    e.collect_references(names);
                }
            }
            Expr::Choice(items) => {
                for w in items {
                    w.expr.collect_references(names);
                }
            }
            Expr::Quantifier { expr, .. } => expr.collect_references(names),
        }
    }
    /// Whether a `Match` placeholder occurs anywhere in the expression.
    pub fn has_placeholders(&self) -> bool {
        match self {
            Expr::Match(_) => true,
            Expr::Atom(_) | Expr::Ref(_) => false,
            Expr::Seq(items) => items.iter().any(Expr::has_placeholders),
            Expr::Choice(items) => items.iter().any(|w| w.expr.has_placeholders()),
            Expr::Quantifier { expr, .. } => expr.has_placeholders(),
        }
    }
    // whether the expression can stand in the position of a quantified term
    // without brackets
    fn is_term(&self) -> bool {
        match self {
            Expr::Atom(_) | Expr::Ref(_) | Expr::Match(_) => true,
            Expr::Quantifier { min: 0, max: 1, .. } => true,
            _ => false,
        }
    }
    fn write_term(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_term() {
            write!(f, "{}", self)
        } else {
            write!(f, "[{}]", self)
        }
    }
    // sequence items may be quantified terms but not choices or sequences
    fn write_item(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Seq(_) | Expr::Choice(_) => write!(f, "[{}]", self),
            _ => write!(f, "{}", self),
        }
    }
}

pub(crate) fn escape_atom(value: &str) -> String {
    let mut s = String::with_capacity(value.len() + 2);
    s.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            s.push('\\');
        }
        s.push(c);
    }
    s.push('\'');
    s
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Atom(value) => write!(f, "{}", escape_atom(value)),
            Expr::Ref(name) => write!(f, "{}", name),
            Expr::Match(index) => write!(f, "#{}#", index),
            Expr::Seq(items) => {
                for (i, e) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    e.write_item(f)?;
                }
                Ok(())
            }
            Expr::Choice(items) => {
                let lone = items.len() == 1;
                for (i, w) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " / ")?;
                    }
                    match w.expr {
                        Expr::Choice(_) => write!(f, "[{}]", w.expr)?,
                        _ => write!(f, "{}", w.expr)?,
                    }
                    // a lone alternative keeps its weight so it reads back as a choice
                    if lone || w.weight != 1.0 {
                        write!(f, "*{}", w.weight)?;
                    }
                }
                Ok(())
            }
            Expr::Quantifier { expr, min, max } => {
                if *min == 0 && *max == 1 {
                    write!(f, "({})", expr)
                } else {
                    expr.write_term(f)?;
                    if min == max {
                        write!(f, "{{{}}}", min)
                    } else {
                        write!(f, "{{{}:{}}}", min, max)
                    }
                }
            }
        }
    }
}
