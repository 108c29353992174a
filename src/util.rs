use regex::Regex;


/// Whether `s` can be used as a rule name, i.e., matches `[A-Za-z_][A-Za-z_0-9]*`.
pub(crate) fn is_identifier(s: &str) -> bool {
    lazy_static! {
        static ref IDENTIFIER: Regex = Regex::new(r"\A[A-Za-z_][A-Za-z_0-9]*\z").unwrap();
    }
    IDENTIFIER.is_match(s)
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Bounds {
    Invalid,
    TooManyParts,
}

/// Interprets the text between the braces of a quantifier: `n`, `min:max`
/// or `:max`. Whitespace has already been removed.
pub(crate) fn parse_quantifier(s: &str) -> Result<(usize, usize), Bounds> {
    lazy_static! {
        static ref QUANTIFIER: Regex = Regex::new(r"\A(?:(\d+)|(\d*):(\d+))\z").unwrap();
    }
    if s.matches(':').count() > 1 {
        return Err(Bounds::TooManyParts);
    }
    let caps = QUANTIFIER.captures(s).ok_or(Bounds::Invalid)?;
    let number = |m: Option<regex::Match>| -> Result<Option<usize>, Bounds> {
        match m {
            Some(m) if !m.as_str().is_empty() => {
                m.as_str().parse().map(Some).map_err(|_| Bounds::Invalid)
            }
            _ => Ok(None),
        }
    };
    let (min, max) = if let Some(n) = number(caps.get(1))? {
        (n, n)
    } else {
        let max = number(caps.get(3))?.ok_or(Bounds::Invalid)?;
        (number(caps.get(2))?.unwrap_or(0), max)
    };
    if max < min {
        Err(Bounds::Invalid)
    } else {
        Ok((min, max))
    }
}

/// Interprets the digits and dots following a `*` in a choice.
pub(crate) fn parse_weight(s: &str) -> Option<f64> {
    lazy_static! {
        static ref WEIGHT: Regex = Regex::new(r"\A(?:\d+\.?\d*|\.\d+)\z").unwrap();
    }
    if WEIGHT.is_match(s) {
        s.parse().ok()
    } else {
        None
    }
}
