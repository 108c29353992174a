use crate::error::CompileError;
use crate::grammar::Grammar;
use serde::{Deserialize, Serialize};

/// The user-facing description of a language: the rules as typed, which one
/// is the root, and whether choice weights are honored.
///
/// A `Config` is what gets saved, shared and edited. It is turned into a
/// `Grammar` with `compile`, which is rerun from scratch after every edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub rules: Vec<RuleDef>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub enable_weights: bool,
}

/// A rule as defined by the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDef {
    pub name: String,
    pub patterns: Vec<Pattern>,
    /// Patterns of a terminal-only rule are literal text, not pattern syntax,
    /// and the rule has neither rewrites nor exclusions.
    #[serde(default)]
    pub terminal_only: bool,
    #[serde(default)]
    pub rewrites: Vec<RewriteDef>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default = "enabled")]
    pub show_rewrites: bool,
    #[serde(default = "enabled")]
    pub show_exclusions: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern: String,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewriteDef {
    #[serde(rename = "match")]
    pub pattern: String,
    pub replace: String,
}

fn enabled() -> bool {
    true
}

fn unit_weight() -> f64 {
    1.0
}

impl Config {
    /// An empty configuration rooted at `root`, with weights disabled.
    pub fn new(root: &str) -> Config {
        Config {
            rules: Vec::new(),
            root: Some(root.to_string()),
            enable_weights: false,
        }
    }
    pub fn with_weights(mut self, enable: bool) -> Config {
        self.enable_weights = enable;
        self
    }
    /// Appends a rule.
    ///
    /// This method is chainable.
    pub fn rule(mut self, rule: RuleDef) -> Config {
        self.rules.push(rule);
        self
    }
    /// Builds the `Grammar` this configuration describes.
    ///
    /// Returns `Ok(None)` when no root rule has been chosen yet: there is
    /// nothing to generate from, but nothing is wrong either.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use wordgen::{Config, RuleDef};
    /// let config = Config::new("Word")
    ///     .rule(RuleDef::terminal("Vowel", &["a", "e", "i", "o", "u"]))
    ///     .rule(RuleDef::patterns("Word", &["Vowel.Vowel"]));
    /// let grammar = config.compile().unwrap().unwrap();
    /// assert_eq!(25, grammar.count_combinations().unwrap());
    /// ```
    ///
    /// # Errors
    ///
    /// A `CompileError` if a rule name is invalid or repeated, a weight is
    /// negative, a pattern does not parse, or a pattern refers to a rule
    /// that does not exist.
    pub fn compile(&self) -> Result<Option<Grammar>, CompileError> {
        Grammar::compile(self)
    }
    /// A small sample language in the style of Toki Pona: CV(n) syllables,
    /// with nasal assimilation done by rewrites and a few forbidden
    /// syllables excluded.
    pub fn toki_pona() -> Config {
        Config::new("Word")
            .rule(RuleDef::terminal("Vowel", &["a", "e", "i", "o", "u"]))
            .rule(RuleDef::terminal(
                "Consonant",
                &["p", "t", "k", "s", "m", "n", "l", "w", "j"],
            ))
            .rule(RuleDef::patterns("Syllable", &["Consonant.Vowel.('n')"]))
            .rule(
                RuleDef::patterns("Word", &["(Consonant).Vowel.('n').Syllable{:2}"])
                    .rewrite("'nn'", "'n'")
                    .rewrite("'nm'", "'m'")
                    .exclude("'wu'")
                    .exclude("'wo'")
                    .exclude("'ji'")
                    .exclude("'ti'"),
            )
    }
}

impl RuleDef {
    fn new(name: &str, terminal_only: bool, patterns: Vec<Pattern>) -> RuleDef {
        RuleDef {
            name: name.to_string(),
            patterns,
            terminal_only,
            rewrites: Vec::new(),
            exclusions: Vec::new(),
            show_rewrites: true,
            show_exclusions: true,
        }
    }
    /// A terminal-only rule choosing among the given literals.
    pub fn terminal(name: &str, literals: &[&str]) -> RuleDef {
        RuleDef::new(name, true, literals.iter().map(|s| Pattern::new(s, 1.0)).collect())
    }
    /// A rule choosing among the given patterns, all weighted 1.
    pub fn patterns(name: &str, patterns: &[&str]) -> RuleDef {
        RuleDef::new(name, false, patterns.iter().map(|s| Pattern::new(s, 1.0)).collect())
    }
    /// A rule choosing among weighted patterns.
    pub fn weighted(name: &str, terminal_only: bool, patterns: &[(&str, f64)]) -> RuleDef {
        RuleDef::new(
            name,
            terminal_only,
            patterns.iter().map(|&(s, w)| Pattern::new(s, w)).collect(),
        )
    }
    pub fn rewrite(mut self, pattern: &str, replace: &str) -> RuleDef {
        self.rewrites.push(RewriteDef {
            pattern: pattern.to_string(),
            replace: replace.to_string(),
        });
        self
    }
    pub fn exclude(mut self, pattern: &str) -> RuleDef {
        self.exclusions.push(pattern.to_string());
        self
    }
}

impl Pattern {
    pub fn new(pattern: &str, weight: f64) -> Pattern {
        Pattern {
            pattern: pattern.to_string(),
            weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let config = Config::toki_pona().with_weights(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
        assert_eq!(config.compile(), back.compile());
    }
    #[test]
    fn json_field_names() {
        let config = Config::new("W").rule(RuleDef::patterns("W", &["'a'"]).rewrite("'a'", "'b'"));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(false, json["enableWeights"]);
        assert_eq!("'a'", json["rules"][0]["rewrites"][0]["match"]);
        assert_eq!(true, json["rules"][0]["showRewrites"]);
    }
    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{"rules": [{"name": "V", "patterns": [{"pattern": "a"}], "terminalOnly": true}]}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(None, config.root);
        assert!(!config.enable_weights);
        let rule = &config.rules[0];
        assert_eq!(1.0, rule.patterns[0].weight);
        assert!(rule.show_rewrites && rule.show_exclusions);
        assert!(rule.rewrites.is_empty() && rule.exclusions.is_empty());
    }
}
