use crate::config::{Config, RuleDef};

/// Builds a `Config` from a compact list of declarations, each ending in a
/// semicolon:
///
/// * `root Name;` chooses the root rule
/// * `weights true;` enables choice weights
/// * `terminal Name: "a", "b" * 2.0, ...;` adds a terminal-only rule whose
///   literals may carry weights
/// * `rule Name: "pattern", "pattern" * 0.5, ...;` adds a rule of patterns
/// * `rewrite "match" => "replacement";` and `exclude "match";` attach to the
///   rule declared last
///
/// # Examples
///
/// ```rust
/// # use wordgen::rules;
/// let config = rules! {
///     root Word;
///     weights true;
///     terminal V: "a" * 3.0, "i";
///     rule Word: "V{1:3}";
///     rewrite "'ii'" => "'i'";
///     exclude "'aaa'";
/// };
/// assert_eq!(Some("Word".to_string()), config.root);
/// assert_eq!(1, config.rules[1].rewrites.len());
/// ```
///
/// # Panics
///
/// If a rewrite or exclusion comes before any rule.
#[macro_export]
macro_rules! rules {
    ( @munch $c:ident, ) => ();
    ( @munch $c:ident, root $name:ident ; $($rest:tt)* ) => (
        $c.root = Some(stringify!($name).to_string());
        $crate::rules!(@munch $c, $($rest)*)
    );
    ( @munch $c:ident, weights $on:expr ; $($rest:tt)* ) => (
        $c.enable_weights = $on;
        $crate::rules!(@munch $c, $($rest)*)
    );
    ( @munch $c:ident, terminal $name:ident : $($p:literal $(* $w:expr)?),+ ; $($rest:tt)* ) => (
        $c.rules.push($crate::RuleDef::weighted(
            stringify!($name),
            true,
            &[ $( ($p, $crate::rules!(@weight $($w)?)) ),+ ],
        ));
        $crate::rules!(@munch $c, $($rest)*)
    );
    ( @munch $c:ident, rule $name:ident : $($p:literal $(* $w:expr)?),+ ; $($rest:tt)* ) => (
        $c.rules.push($crate::RuleDef::weighted(
            stringify!($name),
            false,
            &[ $( ($p, $crate::rules!(@weight $($w)?)) ),+ ],
        ));
        $crate::rules!(@munch $c, $($rest)*)
    );
    ( @munch $c:ident, rewrite $m:literal => $r:literal ; $($rest:tt)* ) => (
        $crate::macros::last_rule(&mut $c, "rewrite").rewrites.push($crate::RewriteDef {
            pattern: $m.to_string(),
            replace: $r.to_string(),
        });
        $crate::rules!(@munch $c, $($rest)*)
    );
    ( @munch $c:ident, exclude $m:literal ; $($rest:tt)* ) => (
        $crate::macros::last_rule(&mut $c, "exclusion").exclusions.push($m.to_string());
        $crate::rules!(@munch $c, $($rest)*)
    );
    ( @weight ) => (1.0);
    ( @weight $w:expr ) => ($w as f64);
    ( $($rest:tt)* ) => ({
        let mut config = $crate::macros::empty();
        $crate::rules!(@munch config, $($rest)*);
        config
    });
}

#[doc(hidden)]
pub fn empty() -> Config {
    Config {
        rules: Vec::new(),
        root: None,
        enable_weights: false,
    }
}

#[doc(hidden)]
pub fn last_rule<'a>(config: &'a mut Config, what: &str) -> &'a mut RuleDef {
    match config.rules.last_mut() {
        Some(r) => r,
        None => panic!("{} declared before any rule", what),
    }
}
