//! Random word generation from small grammars.
//!
//! A language is described by a `Config`: named rules whose patterns are
//! written in a compact pattern language (`'a'` atoms, rule references,
//! `.` sequences, `/` weighted choices, `{min:max}` repetition, `(...)`
//! optional groups), plus per-rule rewrites and exclusions. Compiling the
//! configuration yields a `Grammar`, from which words are drawn.
//!
//! ```rust
//! # use wordgen::{rules, Config};
//! # use rand::SeedableRng;
//! let config = rules! {
//!     root Word;
//!     terminal Consonant: "p", "t", "k";
//!     terminal Vowel: "a", "i", "u";
//!     rule Word: "Consonant.Vowel";
//! };
//! let grammar = config.compile().unwrap().unwrap();
//! assert_eq!(None, grammar.detect_cycle());
//! assert_eq!(9, grammar.count_combinations().unwrap());
//! let word = grammar.generate(&mut rand::rngs::StdRng::seed_from_u64(3)).unwrap();
//! assert_eq!(2, word.len());
//! ```

extern crate rand;
extern crate regex;
extern crate serde;
extern crate thiserror;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

mod config;
mod error;
mod expr;
mod generator;
mod grammar;
#[doc(hidden)]
pub mod macros;
mod matching;
mod parser;
mod util;
pub use config::{Config, Pattern, RewriteDef, RuleDef};
pub use error::{CompileError, Field, GenerateError, SyntaxError};
pub use expr::{Expr, WeightedExpr};
pub use generator::{generate, generate_batch, Batch, MAX_ATTEMPTS};
pub use grammar::{Diagnostics, Grammar, Rule, RuleId};
pub use matching::{Matcher, Occurrence};
pub use parser::{parse, parse_replacement};
