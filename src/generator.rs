use crate::error::GenerateError;
use crate::expr::{Expr, WeightedExpr};
use crate::grammar::{Grammar, RuleId};
use crate::matching::{split_segments, Matcher};
use rand::Rng;

/// How many expansions of a rule may be rejected by its exclusions before
/// generation gives up.
pub const MAX_ATTEMPTS: usize = 100;

/// Generates a word from the root rule of `grammar`.
///
/// Each rule, the root and every rule it refers to, is expanded, rewritten
/// and checked against its exclusions independently, retrying up to
/// `MAX_ATTEMPTS` times.
///
/// # Examples
///
/// ```rust
/// # use wordgen::{generate, Config, RuleDef};
/// # use rand::SeedableRng;
/// let grammar = Config::new("Word")
///     .rule(RuleDef::terminal("C", &["p", "t", "k"]))
///     .rule(RuleDef::terminal("V", &["a", "i", "u"]))
///     .rule(RuleDef::patterns("Word", &["C.V"]))
///     .compile()
///     .unwrap()
///     .unwrap();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let word = generate(&grammar, &mut rng).unwrap();
/// assert_eq!(2, word.chars().count());
/// ```
///
/// # Errors
///
/// `RootNotFound` if no rule has the root's name, `ExclusionTooRestrictive`
/// if some rule exhausted its attempts, and `MatchIndexOutOfRange` if a
/// replacement refers to a segment its match did not capture.
pub fn generate<R: Rng + ?Sized>(grammar: &Grammar, rng: &mut R) -> Result<String, GenerateError> {
    let root = grammar
        .id(grammar.root())
        .ok_or_else(|| GenerateError::RootNotFound(grammar.root().to_string()))?;
    Generator::new(grammar, rng).generate_rule(root)
}

/// The words of a batch generated before the first failure, and the failure
/// if there was one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub words: Vec<String>,
    pub error: Option<GenerateError>,
}

/// Generates `count` words, stopping at the first error. Words generated
/// before the error are kept.
pub fn generate_batch<R: Rng + ?Sized>(grammar: &Grammar, count: usize, rng: &mut R) -> Batch {
    let mut words = Vec::with_capacity(count);
    for _ in 0..count {
        match generate(grammar, rng) {
            Ok(w) => words.push(w),
            Err(e) => {
                return Batch {
                    words,
                    error: Some(e),
                }
            }
        }
    }
    Batch { words, error: None }
}

struct Generator<'g, 'r, R: ?Sized> {
    grammar: &'g Grammar,
    matcher: Matcher<'g>,
    rng: &'r mut R,
}

impl<'g, 'r, R: Rng + ?Sized> Generator<'g, 'r, R> {
    fn new(grammar: &'g Grammar, rng: &'r mut R) -> Generator<'g, 'r, R> {
        Generator {
            grammar,
            matcher: Matcher::new(grammar),
            rng,
        }
    }
    fn generate_rule(&mut self, id: RuleId) -> Result<String, GenerateError> {
        let grammar = self.grammar;
        let rule = grammar.get(id);
        for attempt in 0..MAX_ATTEMPTS {
            let word = self.expand(&rule.expr, None)?;
            let word = self.rewrite(id, word)?;
            let chars: Vec<char> = word.chars().collect();
            if !self.matcher.excluded(rule, &chars) {
                return Ok(word);
            }
            debug!("{}: attempt {} produced excluded {:?}", rule.name, attempt + 1, word);
        }
        warn!("{}: every one of {} attempts was excluded", rule.name, MAX_ATTEMPTS);
        Err(GenerateError::ExclusionTooRestrictive(rule.name.clone()))
    }
    // applies each rewrite in turn, replacing non-overlapping matches from
    // left to right
    fn rewrite(&mut self, id: RuleId, word: String) -> Result<String, GenerateError> {
        let grammar = self.grammar;
        let rule = grammar.get(id);
        if rule.rewrites.is_empty() {
            return Ok(word);
        }
        let mut chars: Vec<char> = word.chars().collect();
        for (pattern, replace) in &rule.rewrites {
            let mut i = 0;
            while i < chars.len() {
                let (end, segments) = match self.matcher.match_at(pattern, &chars, i) {
                    Some(m) => m,
                    None => {
                        i += 1;
                        continue;
                    }
                };
                let matched: String = chars[i..end].iter().collect();
                let captures: Vec<String> = split_segments(&matched, &segments)
                    .into_iter()
                    .map(String::from)
                    .collect();
                let replacement = self.expand(replace, Some(&captures[..]))?;
                trace!("{}: rewriting {:?} at {} as {:?}", rule.name, matched, i, replacement);
                let replacement: Vec<char> = replacement.chars().collect();
                let n = replacement.len();
                chars.splice(i..end, replacement);
                i += n;
            }
        }
        Ok(chars.into_iter().collect())
    }
    fn expand(&mut self, e: &Expr, captures: Option<&[String]>) -> Result<String, GenerateError> {
        match e {
            Expr::Atom(value) => Ok(value.clone()),
            Expr::Ref(name) => {
                let id = self.grammar.resolve(name);
                self.generate_rule(id)
            }
            Expr::Match(index) => match captures {
                Some(captures) => captures.get(*index).cloned().ok_or_else(|| {
                    GenerateError::MatchIndexOutOfRange {
                        index: *index,
                        available: captures.len(),
                    }
                }),
                None => panic!("match placeholder #{}# expanded outside a replacement", index),
            },
            Expr::Seq(items) => {
                let mut s = String::new();
                for e in items {
                    s += &self.expand(e, captures)?;
                }
                Ok(s)
            }
            Expr::Choice(items) => {
                let picked = if self.grammar.use_weights() {
                    weighted_pick(items, &mut *self.rng)
                } else {
                    random_pick(items, &mut *self.rng)
                };
                match picked {
                    Some(e) => self.expand(e, captures),
                    None => Ok(String::new()),
                }
            }
            Expr::Quantifier { expr, min, max } => {
                let n = self.rng.gen_range(*min..=*max);
                let mut s = String::new();
                for _ in 0..n {
                    s += &self.expand(expr, captures)?;
                }
                Ok(s)
            }
        }
    }
}

fn random_pick<'a, R: Rng + ?Sized>(items: &'a [WeightedExpr], rng: &mut R) -> Option<&'a Expr> {
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.gen_range(0..items.len())].expr)
    }
}

/// Picks an alternative with probability proportional to its weight. An
/// alternative of weight 0 is never picked unless all weights are 0.
fn weighted_pick<'a, R: Rng + ?Sized>(items: &'a [WeightedExpr], rng: &mut R) -> Option<&'a Expr> {
    let last = items.iter().rev().find(|w| w.weight > 0.0).or_else(|| items.last())?;
    let total: f64 = items.iter().map(|w| w.weight).sum();
    let mut r = rng.gen::<f64>() * total;
    for w in items {
        if r < w.weight {
            return Some(&w.expr);
        }
        r -= w.weight;
    }
    // rounding
    Some(&last.expr)
}
