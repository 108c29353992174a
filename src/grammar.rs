use crate::config::{Config, RuleDef};
use crate::error::{CompileError, Field, GenerateError};
use crate::expr::{Expr, WeightedExpr};
use crate::generator::{self, Batch};
use crate::matching::Matcher;
use crate::parser::{parse, parse_replacement};
use crate::util::is_identifier;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;

/// Position of a rule within its `Grammar`.
pub type RuleId = usize;

/// A compiled rule: what it expands to, the rewrites applied to each
/// expansion, in order, and the exclusions an expansion must avoid.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub name: String,
    pub expr: Expr,
    pub exclusions: Vec<Expr>,
    pub rewrites: Vec<(Expr, Expr)>,
}

impl Rule {
    pub fn new(name: &str, expr: Expr) -> Rule {
        Rule {
            name: name.to_string(),
            expr,
            exclusions: Vec::new(),
            rewrites: Vec::new(),
        }
    }
    /// Rules the primary expression depends on. Exclusions and rewrites are
    /// not expanded from this rule, so they contribute no edges.
    pub fn edges(&self) -> Vec<&str> {
        self.expr.references()
    }
    fn all_references(&self) -> Vec<&str> {
        let mut names = self.expr.references();
        for e in &self.exclusions {
            names.extend(e.references());
        }
        for (m, r) in &self.rewrites {
            names.extend(m.references());
            names.extend(r.references());
        }
        names
    }
}

/// A closed set of rules with a designated root.
///
/// You normally get a `Grammar` from `Config::compile`. A grammar is never
/// modified; after the configuration changes, compile a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct Grammar {
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
    root: String,
    use_weights: bool,
}

/// The health of a grammar as shown to someone editing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    /// The rules forming a reference cycle reachable from the root, if any.
    pub cycle: Option<Vec<String>>,
    /// An upper bound on the number of distinct words; 0 when the grammar
    /// has a cycle or no root rule.
    pub combinations: u128,
}

impl Grammar {
    /// Assembles a grammar from already compiled rules.
    ///
    /// The root need not exist yet; generation reports a missing root.
    ///
    /// # Errors
    ///
    /// A rule name that is not an identifier or occurs twice, or a reference
    /// anywhere in a rule, including its exclusions and rewrites, to a rule
    /// not in `rules`.
    pub fn new(root: &str, rules: Vec<Rule>, use_weights: bool) -> Result<Grammar, CompileError> {
        let mut index = HashMap::with_capacity(rules.len());
        for (i, r) in rules.iter().enumerate() {
            if !is_identifier(&r.name) {
                return Err(CompileError::InvalidRuleName(r.name.clone()));
            }
            if index.insert(r.name.clone(), i).is_some() {
                return Err(CompileError::DuplicateRule(r.name.clone()));
            }
        }
        for r in &rules {
            for name in r.all_references() {
                if !index.contains_key(name) {
                    return Err(CompileError::UnknownRule(name.to_string()));
                }
            }
        }
        Ok(Grammar {
            rules,
            index,
            root: root.to_string(),
            use_weights,
        })
    }
    pub(crate) fn compile(config: &Config) -> Result<Option<Grammar>, CompileError> {
        let root = match config.root.as_ref() {
            Some(r) if !r.is_empty() => r,
            _ => return Ok(None),
        };
        let rules = config
            .rules
            .iter()
            .map(compile_rule)
            .collect::<Result<Vec<_>, _>>()?;
        let g = Grammar::new(root, rules, config.enable_weights)?;
        debug!("compiled {} rules rooted at {}", g.rules.len(), g.root);
        Ok(Some(g))
    }
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
    pub fn root(&self) -> &str {
        &self.root
    }
    pub fn use_weights(&self) -> bool {
        self.use_weights
    }
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.id(name).map(|i| &self.rules[i])
    }
    pub(crate) fn id(&self, name: &str) -> Option<RuleId> {
        self.index.get(name).cloned()
    }
    pub(crate) fn get(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }
    // referenced names were all checked against the index on construction
    pub(crate) fn resolve(&self, name: &str) -> RuleId {
        match self.id(name) {
            Some(i) => i,
            None => panic!("rule {} is not part of the grammar", name),
        }
    }
    /// A `Matcher` for testing patterns against text with this grammar's
    /// rules.
    pub fn matcher(&self) -> Matcher {
        Matcher::new(self)
    }
    /// Generates one word from the root rule.
    ///
    /// The grammar must not contain a reference cycle reachable from the
    /// root; check with `detect_cycle` first. Expansion of a cyclic grammar
    /// recurses until the stack overflows.
    ///
    /// # Errors
    ///
    /// `RootNotFound` if no rule has the root's name, and
    /// `ExclusionTooRestrictive` if some rule could not produce an acceptable
    /// expansion in 100 attempts.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, GenerateError> {
        generator::generate(self, rng)
    }
    /// Generates up to `count` words, stopping at the first error.
    pub fn generate_batch<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Batch {
        generator::generate_batch(self, count, rng)
    }
    /// Looks for a cycle among the rules reachable from the root, following
    /// references in each rule's primary expression.
    ///
    /// Returns the rules on the cycle in the order they refer to each other,
    /// starting with the first one reached from the root.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use wordgen::{Config, RuleDef};
    /// let grammar = Config::new("A")
    ///     .rule(RuleDef::patterns("A", &["B"]))
    ///     .rule(RuleDef::patterns("B", &["'b'.A"]))
    ///     .compile()
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(Some(vec!["A".to_string(), "B".to_string()]), grammar.detect_cycle());
    /// ```
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let root = self.id(&self.root)?;
        let edges: Vec<Vec<RuleId>> = self
            .rules
            .iter()
            .map(|r| r.edges().into_iter().filter_map(|n| self.id(n)).collect())
            .collect();
        let mut state = vec![Visit::New; self.rules.len()];
        let mut path = Vec::new();
        find_cycle(root, &edges, &mut state, &mut path).map(|cycle| {
            cycle
                .into_iter()
                .map(|i| self.rules[i].name.clone())
                .collect()
        })
    }
    /// Counts the words the root rule can produce, ignoring exclusions and
    /// rewrites. Since those can only remove or merge words, this is an
    /// upper bound. Counts too large for a `u128` saturate.
    ///
    /// The grammar must be free of cycles; see `detect_cycle`.
    ///
    /// # Errors
    ///
    /// `RootNotFound` if no rule has the root's name.
    pub fn count_combinations(&self) -> Result<u128, GenerateError> {
        let root = self
            .id(&self.root)
            .ok_or_else(|| GenerateError::RootNotFound(self.root.clone()))?;
        let mut cache = vec![None; self.rules.len()];
        Ok(self.count_rule(root, &mut cache))
    }
    fn count_rule(&self, id: RuleId, cache: &mut Vec<Option<u128>>) -> u128 {
        if let Some(n) = cache[id] {
            return n;
        }
        let n = self.count_expr(&self.rules[id].expr, cache);
        cache[id] = Some(n);
        n
    }
    fn count_expr(&self, e: &Expr, cache: &mut Vec<Option<u128>>) -> u128 {
        match e {
            Expr::Atom(_) => 1,
            Expr::Ref(name) => self.count_rule(self.resolve(name), cache),
            Expr::Match(i) => panic!("match placeholder #{}# used outside a replacement", i),
            Expr::Seq(items) => items
                .iter()
                .fold(1, |acc: u128, e| acc.saturating_mul(self.count_expr(e, cache))),
            Expr::Choice(items) => items
                .iter()
                .fold(0, |acc: u128, w| acc.saturating_add(self.count_expr(&w.expr, cache))),
            Expr::Quantifier { expr, min, max } => {
                repetitions(self.count_expr(expr, cache), *min, *max)
            }
        }
    }
    /// The cycle check and, when there is no cycle, the combination count.
    pub fn diagnostics(&self) -> Diagnostics {
        let cycle = self.detect_cycle();
        let combinations = if cycle.is_some() {
            0
        } else {
            self.count_combinations().unwrap_or(0)
        };
        Diagnostics {
            cycle,
            combinations,
        }
    }
}

// sum of n^i for i in min..=max, saturating
fn repetitions(n: u128, min: usize, max: usize) -> u128 {
    match n {
        0 => {
            if min == 0 {
                1
            } else {
                0
            }
        }
        1 => (max - min) as u128 + 1,
        _ => {
            let mut count: u128 = 0;
            for i in min..=max {
                let term = if i > u32::MAX as usize {
                    u128::MAX
                } else {
                    n.saturating_pow(i as u32)
                };
                count = count.saturating_add(term);
                if count == u128::MAX {
                    break;
                }
            }
            count
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    New,
    Active,
    Done,
}

fn find_cycle(
    node: RuleId,
    edges: &[Vec<RuleId>],
    state: &mut Vec<Visit>,
    path: &mut Vec<RuleId>,
) -> Option<Vec<RuleId>> {
    state[node] = Visit::Active;
    path.push(node);
    for &next in &edges[node] {
        match state[next] {
            Visit::Active => {
                let start = path.iter().position(|&n| n == next).unwrap_or(0);
                return Some(path[start..].to_vec());
            }
            Visit::New => {
                if let Some(cycle) = find_cycle(next, edges, state, path) {
                    return Some(cycle);
                }
            }
            Visit::Done => (),
        }
    }
    path.pop();
    state[node] = Visit::Done;
    None
}

fn compile_rule(def: &RuleDef) -> Result<Rule, CompileError> {
    let syntax = |field: Field| {
        let rule = def.name.clone();
        move |source| CompileError::Syntax {
            rule,
            field,
            source,
        }
    };
    let mut alternatives = Vec::with_capacity(def.patterns.len());
    for p in &def.patterns {
        if !(p.weight >= 0.0) {
            return Err(CompileError::InvalidWeight {
                rule: def.name.clone(),
                weight: p.weight,
            });
        }
        // literals of terminal-only rules are taken as they are
        let expr = if def.terminal_only {
            Expr::Atom(p.pattern.clone())
        } else {
            parse(&p.pattern).map_err(syntax(Field::Pattern))?
        };
        alternatives.push(WeightedExpr::new(expr, p.weight));
    }
    let mut rule = Rule::new(&def.name, Expr::Choice(alternatives));
    if def.terminal_only {
        return Ok(rule);
    }
    if def.show_exclusions {
        for e in &def.exclusions {
            rule.exclusions
                .push(parse(e).map_err(syntax(Field::Exclusion))?);
        }
    }
    if def.show_rewrites {
        for r in &def.rewrites {
            let m = parse(&r.pattern).map_err(syntax(Field::RewriteMatch))?;
            let replace =
                parse_replacement(&r.replace).map_err(syntax(Field::RewriteReplacement))?;
            rule.rewrites.push((m, replace));
        }
    }
    Ok(rule)
}

impl fmt::Display for Grammar {
    /// One `name := expression` line per rule, root first, followed by that
    /// rule's rewrites (`~ match -> replacement`) and exclusions (`! match`).
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self.rules.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
        let root = self.id(&self.root);
        let order = root
            .into_iter()
            .chain((0..self.rules.len()).filter(|&i| Some(i) != root));
        for i in order {
            let r = &self.rules[i];
            match &r.expr {
                Expr::Choice(items) if items.len() == 1 && items[0].weight == 1.0 => {
                    writeln!(f, "{: >width$} := {}", r.name, items[0].expr, width = width)?
                }
                e => writeln!(f, "{: >width$} := {}", r.name, e, width = width)?,
            }
            for (m, replace) in &r.rewrites {
                writeln!(f, "{: >width$} ~ {} -> {}", "", m, replace, width = width)?;
            }
            for e in &r.exclusions {
                writeln!(f, "{: >width$} ! {}", "", e, width = width)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleDef;

    fn compile(config: Config) -> Grammar {
        config.compile().unwrap().unwrap()
    }

    #[test]
    fn no_root_is_no_grammar() {
        let mut config = Config::new("W").rule(RuleDef::patterns("W", &["'a'"]));
        config.root = None;
        assert_eq!(Ok(None), config.compile());
        config.root = Some(String::new());
        assert_eq!(Ok(None), config.compile());
    }
    #[test]
    fn terminal_patterns_are_not_parsed() {
        let g = compile(Config::new("T").rule(RuleDef::terminal("T", &["a.b", "'", "x/y"])));
        let expected = Expr::choice(vec![Expr::atom("a.b"), Expr::atom("'"), Expr::atom("x/y")]);
        assert_eq!(&expected, &g.rule("T").unwrap().expr);
    }
    #[test]
    fn terminal_rules_ignore_rewrites_and_exclusions() {
        let def = RuleDef::terminal("T", &["a"]).rewrite("'a'", "'b'").exclude("'a'");
        let g = compile(Config::new("T").rule(def));
        let r = g.rule("T").unwrap();
        assert!(r.rewrites.is_empty() && r.exclusions.is_empty());
    }
    #[test]
    fn hidden_rewrites_and_exclusions_are_skipped() {
        let mut def = RuleDef::patterns("W", &["'a'"])
            .rewrite("'a'", "'b'")
            .exclude("'b'");
        def.show_rewrites = false;
        def.show_exclusions = false;
        let g = compile(Config::new("W").rule(def));
        let r = g.rule("W").unwrap();
        assert!(r.rewrites.is_empty() && r.exclusions.is_empty());
    }
    #[test]
    fn pattern_weights_are_kept() {
        let g = compile(Config::new("W").rule(RuleDef::weighted(
            "W",
            false,
            &[("'a'", 1.0), ("'b'", 3.0)],
        )));
        let expected = Expr::weighted_choice(vec![
            WeightedExpr::new(Expr::atom("a"), 1.0),
            WeightedExpr::new(Expr::atom("b"), 3.0),
        ]);
        assert_eq!(&expected, &g.rule("W").unwrap().expr);
    }
    #[test]
    fn unknown_rule() {
        let config = Config::new("W").rule(RuleDef::patterns("W", &["Foo"]));
        assert_eq!(Err(CompileError::UnknownRule("Foo".to_string())), config.compile());
    }
    #[test]
    fn unknown_rule_in_exclusion() {
        let config = Config::new("W").rule(RuleDef::patterns("W", &["'a'"]).exclude("Bar"));
        assert_eq!(Err(CompileError::UnknownRule("Bar".to_string())), config.compile());
    }
    #[test]
    fn duplicate_rule() {
        let config = Config::new("W")
            .rule(RuleDef::patterns("W", &["'a'"]))
            .rule(RuleDef::patterns("W", &["'b'"]));
        assert_eq!(Err(CompileError::DuplicateRule("W".to_string())), config.compile());
    }
    #[test]
    fn invalid_rule_name() {
        let config = Config::new("W").rule(RuleDef::patterns("my rule", &["'a'"]));
        assert_eq!(
            Err(CompileError::InvalidRuleName("my rule".to_string())),
            config.compile()
        );
    }
    #[test]
    fn negative_weight() {
        let config = Config::new("W").rule(RuleDef::weighted("W", true, &[("a", -1.0)]));
        match config.compile() {
            Err(CompileError::InvalidWeight { rule, .. }) => assert_eq!("W", rule),
            other => panic!("unexpected {:?}", other),
        }
    }
    #[test]
    fn syntax_errors_name_rule_and_field() {
        let config = Config::new("W").rule(RuleDef::patterns("W", &["'a'"]).rewrite("'a'", "'b"));
        match config.compile() {
            Err(CompileError::Syntax { rule, field, .. }) => {
                assert_eq!("W", rule);
                assert_eq!(Field::RewriteReplacement, field);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
    #[test]
    fn placeholders_allowed_only_in_replacements() {
        let ok = Config::new("W").rule(RuleDef::patterns("W", &["'a'"]).rewrite("'a'", "#0#.#0#"));
        assert!(ok.compile().is_ok());
        let bad = Config::new("W").rule(RuleDef::patterns("W", &["#0#"]));
        assert!(bad.compile().is_err());
    }
    #[test]
    fn missing_root_compiles() {
        let g = compile(Config::new("Nope").rule(RuleDef::patterns("W", &["'a'"])));
        assert_eq!(None, g.detect_cycle());
        assert_eq!(
            Err(GenerateError::RootNotFound("Nope".to_string())),
            g.count_combinations()
        );
    }
    #[test]
    fn two_rule_cycle() {
        let g = compile(
            Config::new("A")
                .rule(RuleDef::patterns("A", &["B"]))
                .rule(RuleDef::patterns("B", &["A"])),
        );
        assert_eq!(Some(vec!["A".to_string(), "B".to_string()]), g.detect_cycle());
    }
    #[test]
    fn self_reference_is_a_cycle() {
        let g = compile(Config::new("A").rule(RuleDef::patterns("A", &["'a'.(A)"])));
        assert_eq!(Some(vec!["A".to_string()]), g.detect_cycle());
    }
    #[test]
    fn cycle_below_root() {
        let g = compile(
            Config::new("W")
                .rule(RuleDef::patterns("W", &["'x'.B"]))
                .rule(RuleDef::patterns("B", &["C"]))
                .rule(RuleDef::patterns("C", &["'c' / B"])),
        );
        assert_eq!(Some(vec!["B".to_string(), "C".to_string()]), g.detect_cycle());
    }
    #[test]
    fn unreachable_cycle_is_ignored() {
        let g = compile(
            Config::new("W")
                .rule(RuleDef::patterns("W", &["'w'"]))
                .rule(RuleDef::patterns("A", &["B"]))
                .rule(RuleDef::patterns("B", &["A"])),
        );
        assert_eq!(None, g.detect_cycle());
    }
    #[test]
    fn shared_dependencies_are_not_cycles() {
        let g = compile(
            Config::new("W")
                .rule(RuleDef::terminal("V", &["a"]))
                .rule(RuleDef::patterns("S", &["V.V"]))
                .rule(RuleDef::patterns("W", &["S.V.S"])),
        );
        assert_eq!(None, g.detect_cycle());
    }
    #[test]
    fn exclusions_are_not_edges() {
        let g = compile(Config::new("W").rule(RuleDef::patterns("W", &["'a'"]).exclude("W")));
        assert_eq!(None, g.detect_cycle());
    }
    #[test]
    fn count_vowel_pairs() {
        let g = compile(
            Config::new("Word")
                .rule(RuleDef::terminal("Vowel", &["a", "e", "i", "o", "u"]))
                .rule(RuleDef::patterns("Word", &["Vowel.Vowel"])),
        );
        assert_eq!(Ok(25), g.count_combinations());
    }
    #[test]
    fn count_quantifiers() {
        let g = compile(
            Config::new("W")
                .rule(RuleDef::terminal("V", &["a", "b"]))
                .rule(RuleDef::patterns("W", &["V{1:3}"])),
        );
        assert_eq!(Ok(2 + 4 + 8), g.count_combinations());
        let g = compile(Config::new("W").rule(RuleDef::patterns("W", &["('a').('b')"])));
        assert_eq!(Ok(4), g.count_combinations());
    }
    #[test]
    fn count_ignores_weights_and_exclusions() {
        let g = compile(
            Config::new("W").rule(RuleDef::patterns("W", &["'a'*0 / 'b'*5 / 'c'"]).exclude("'c'")),
        );
        assert_eq!(Ok(3), g.count_combinations());
    }
    #[test]
    fn count_saturates() {
        let g = compile(Config::new("W").rule(RuleDef::patterns("W", &["['a'/'b']{1000}"])));
        assert_eq!(Ok(u128::MAX), g.count_combinations());
    }
    #[test]
    fn repetitions_of_degenerate_counts() {
        assert_eq!(1, repetitions(0, 0, 5));
        assert_eq!(0, repetitions(0, 1, 5));
        assert_eq!(6, repetitions(1, 0, 5));
        assert_eq!(1 + 3 + 9, repetitions(3, 0, 2));
    }
    #[test]
    fn diagnostics() {
        let d = compile(Config::toki_pona()).diagnostics();
        assert_eq!(None, d.cycle);
        assert!(d.combinations > 0);
        let d = compile(Config::new("A").rule(RuleDef::patterns("A", &["A"]))).diagnostics();
        assert_eq!(Some(vec!["A".to_string()]), d.cycle);
        assert_eq!(0, d.combinations);
    }
    #[test]
    fn description() {
        let g = compile(
            Config::new("Word")
                .rule(RuleDef::terminal("V", &["a", "e"]))
                .rule(RuleDef::patterns("Word", &["V.V"]).rewrite("'aa'", "'a'").exclude("'ee'")),
        );
        let expected = "Word := V.V\n     ~ 'aa' -> 'a'\n     ! 'ee'\n   V := 'a' / 'e'\n";
        assert_eq!(expected, g.to_string());
    }
}
