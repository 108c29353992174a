use crate::expr::Expr;
use crate::grammar::{Grammar, Rule};

/// Decides whether text can be produced by an expression, and how.
///
/// Matching works on characters, not bytes, so multi-byte terminals behave
/// like any others. A successful match yields the lengths, in characters, of
/// the pieces of text consumed by each atom, in order. These are the
/// segments a rewrite's replacement refers to as `#0#`, `#1#`, ...
///
/// The search backtracks over every way of splitting the text among the
/// items of a sequence and can be exponential in the length of the text.
#[derive(Clone, Copy, Debug)]
pub struct Matcher<'g> {
    grammar: &'g Grammar,
}

impl<'g> Matcher<'g> {
    pub fn new(grammar: &'g Grammar) -> Matcher<'g> {
        Matcher { grammar }
    }
    /// Matches the whole of `text` against `expr`, returning the segment
    /// lengths on success.
    ///
    /// Sequences try the shortest text for their first item first,
    /// quantifiers the fewest repetitions, and choices their alternatives in
    /// declared order; the first success wins.
    ///
    /// # Panics
    ///
    /// If `expr` contains a match placeholder.
    pub fn match_expr(&self, expr: &Expr, text: &str) -> Option<Vec<usize>> {
        let chars: Vec<char> = text.chars().collect();
        self.match_chars(expr, &chars)
    }
    /// Whether all of `text` matches `expr`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use wordgen::{parse, Config, RuleDef};
    /// let grammar = Config::new("V")
    ///     .rule(RuleDef::terminal("V", &["a", "e"]))
    ///     .compile()
    ///     .unwrap()
    ///     .unwrap();
    /// let m = grammar.matcher();
    /// let e = parse("V{2}").unwrap();
    /// assert!(m.is_match(&e, "ae"));
    /// assert!(!m.is_match(&e, "aei"));
    /// ```
    pub fn is_match(&self, expr: &Expr, text: &str) -> bool {
        self.match_expr(expr, text).is_some()
    }
    /// Finds the first occurrence of `expr` in `text`: the earliest start,
    /// and from there the shortest non-empty match.
    pub fn find<'t>(&self, expr: &Expr, text: &'t str) -> Option<Occurrence<'t>> {
        let chars: Vec<char> = text.chars().collect();
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        (0..chars.len())
            .filter_map(|start| {
                self.match_at(expr, &chars, start)
                    .map(|(end, segments)| (start, end, segments))
            })
            .next()
            .map(|(start, end, segments)| Occurrence {
                text,
                start: offsets[start],
                end: offsets[end],
                segments,
            })
    }
    /// Whether any non-empty stretch of `text` matches any of the rule's
    /// exclusions.
    pub fn is_excluded(&self, rule: &Rule, text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        self.excluded(rule, &chars)
    }
    pub(crate) fn excluded(&self, rule: &Rule, chars: &[char]) -> bool {
        rule.exclusions.iter().any(|e| self.contains(e, chars))
    }
    fn contains(&self, expr: &Expr, chars: &[char]) -> bool {
        (0..chars.len()).any(|i| {
            (i + 1..=chars.len()).any(|j| self.match_chars(expr, &chars[i..j]).is_some())
        })
    }
    /// The shortest non-empty match of `expr` starting at `start`, as the
    /// end offset and the segment lengths.
    pub(crate) fn match_at(
        &self,
        expr: &Expr,
        chars: &[char],
        start: usize,
    ) -> Option<(usize, Vec<usize>)> {
        (start + 1..=chars.len())
            .filter_map(|end| {
                self.match_chars(expr, &chars[start..end])
                    .map(|segments| (end, segments))
            })
            .next()
    }
    pub(crate) fn match_chars(&self, expr: &Expr, s: &[char]) -> Option<Vec<usize>> {
        match expr {
            Expr::Atom(value) => {
                if value.chars().eq(s.iter().cloned()) {
                    Some(vec![s.len()])
                } else {
                    None
                }
            }
            Expr::Ref(name) => {
                let rule = self.grammar.get(self.grammar.resolve(name));
                self.match_chars(&rule.expr, s)
            }
            Expr::Match(i) => panic!("match placeholder #{}# cannot be matched against", i),
            Expr::Seq(items) => self.match_seq(items.len(), &|i| &items[i], 0, s),
            Expr::Choice(items) => items
                .iter()
                .filter_map(|w| self.match_chars(&w.expr, s))
                .next(),
            Expr::Quantifier { expr, min, max } => {
                for n in *min..=*max {
                    let m = self.match_seq(n, &|_| &**expr, 0, s);
                    if m.is_some() {
                        return m;
                    }
                    // beyond s.len() copies at least one must match nothing;
                    // dropping it would have matched with one copy fewer
                    if n > s.len() {
                        break;
                    }
                }
                None
            }
        }
    }
    // matches items i.. of a sequence of `count` items against all of `s`
    fn match_seq<'e, F>(&self, count: usize, item: &F, i: usize, s: &[char]) -> Option<Vec<usize>>
    where
        F: Fn(usize) -> &'e Expr,
    {
        if i == count {
            return if s.is_empty() { Some(Vec::new()) } else { None };
        }
        for split in 0..=s.len() {
            if let Some(mut head) = self.match_chars(item(i), &s[..split]) {
                if let Some(rest) = self.match_seq(count, item, i + 1, &s[split..]) {
                    head.extend(rest);
                    return Some(head);
                }
            }
        }
        None
    }
}

/// Where and how an expression matched inside a larger text.
///
/// The lifetime parameter `'t` represents the lifetime of the `&str` matched
/// against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occurrence<'t> {
    text: &'t str,
    start: usize,
    end: usize,
    segments: Vec<usize>,
}

impl<'t> Occurrence<'t> {
    /// Returns the matched text.
    pub fn as_str(&self) -> &'t str {
        &self.text[self.start..self.end]
    }
    /// Returns the byte offset at which the match starts.
    pub fn start(&self) -> usize {
        self.start
    }
    /// Returns the byte offset at which the match ends.
    pub fn end(&self) -> usize {
        self.end
    }
    /// Returns the text consumed by each atom of the expression, in order.
    pub fn segments(&self) -> Vec<&'t str> {
        split_segments(self.as_str(), &self.segments)
    }
}

/// Cuts `text` into consecutive pieces of the given character lengths.
pub(crate) fn split_segments<'t>(text: &'t str, lengths: &[usize]) -> Vec<&'t str> {
    let mut pieces = Vec::with_capacity(lengths.len());
    let mut rest = text;
    for &n in lengths {
        let cut = rest
            .char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or_else(|| rest.len());
        pieces.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, RuleDef};
    use crate::parser::parse;

    fn grammar() -> Grammar {
        Config::new("V")
            .rule(RuleDef::terminal("V", &["a", "e", "ə"]))
            .rule(RuleDef::terminal("C", &["p", "t", "ŋ"]))
            .rule(RuleDef::patterns("S", &["C.V"]))
            .compile()
            .unwrap()
            .unwrap()
    }

    fn segments(pattern: &str, text: &str) -> Option<Vec<usize>> {
        let g = grammar();
        g.matcher().match_expr(&parse(pattern).unwrap(), text)
    }

    #[test]
    fn atom_must_match_exactly() {
        assert_eq!(Some(vec![2]), segments("'ab'", "ab"));
        assert_eq!(None, segments("'ab'", "abc"));
        assert_eq!(None, segments("'ab'", "a"));
    }
    #[test]
    fn references_follow_rules() {
        assert_eq!(Some(vec![1, 1]), segments("S", "pa"));
        assert_eq!(None, segments("S", "ap"));
    }
    #[test]
    fn sequence_segments() {
        assert_eq!(Some(vec![2, 1, 3]), segments("'ab'.'c'.'def'", "abcdef"));
    }
    #[test]
    fn choice_takes_first_success() {
        assert_eq!(Some(vec![1, 1]), segments("'a'.'b' / 'ab'", "ab"));
        assert_eq!(Some(vec![2]), segments("'ab' / 'a'.'b'", "ab"));
    }
    #[test]
    fn quantifier_tries_fewest_repetitions() {
        assert_eq!(Some(vec![1, 1, 1]), segments("V{1:4}", "aea"));
        assert_eq!(None, segments("V{1:2}", "aea"));
        assert_eq!(Some(vec![]), segments("V{0:2}", ""));
    }
    #[test]
    fn optional_items_in_sequences() {
        assert_eq!(Some(vec![1]), segments("('x').'b'", "b"));
        assert_eq!(Some(vec![1, 1]), segments("('x').'b'", "xb"));
    }
    #[test]
    fn multibyte_characters() {
        assert_eq!(Some(vec![1, 1]), segments("C.V", "ŋə"));
        let g = grammar();
        let e = parse("C.V").unwrap();
        let found = g.matcher().find(&e, "aŋəa").unwrap();
        assert_eq!("ŋə", found.as_str());
        assert_eq!(1, found.start());
        assert_eq!(5, found.end());
        assert_eq!(vec!["ŋ", "ə"], found.segments());
    }
    #[test]
    fn find_prefers_earliest_then_shortest() {
        let g = grammar();
        let e = parse("V{1:3}").unwrap();
        let found = g.matcher().find(&e, "ppaae").unwrap();
        assert_eq!("a", found.as_str());
        assert_eq!(2, found.start());
        assert!(g.matcher().find(&e, "ppp").is_none());
    }
    #[test]
    fn exclusions_match_anywhere() {
        let g = Config::new("W")
            .rule(RuleDef::patterns("W", &["'a'"]).exclude("'ti'"))
            .compile()
            .unwrap()
            .unwrap();
        let rule = g.rule("W").unwrap();
        let m = g.matcher();
        assert!(m.is_excluded(rule, "ti"));
        assert!(m.is_excluded(rule, "pati"));
        assert!(m.is_excluded(rule, "patin"));
        assert!(!m.is_excluded(rule, "pat"));
        assert!(!m.is_excluded(rule, ""));
    }
    #[test]
    #[should_panic]
    fn placeholders_cannot_be_matched() {
        let g = grammar();
        g.matcher().match_expr(&Expr::Match(0), "a");
    }
    #[test]
    fn split_segments_by_characters() {
        assert_eq!(vec!["ŋ", "əa", ""], split_segments("ŋəa", &[1, 2, 0]));
    }
}
