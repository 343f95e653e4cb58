//! Keyword patterns for matching file names.
//!
//! A pattern is a tiny boolean language over case-insensitive substrings:
//!
//! | Pattern               | Matches file names that...                         |
//! |-----------------------|----------------------------------------------------|
//! | `invoice`             | contain `invoice`                                  |
//! | `photo * 2024`        | contain `photo` **and** `2024`                     |
//! | `jpg \| png \| gif`   | contain `jpg`, `png` **or** `gif`                  |
//! | `report ! draft`      | contain `report` but **not** `draft`               |
//!
//! Operators do not compose. The form is picked by scanning for operator
//! characters in a fixed order (`!`, then `|`, then `*`) and the first one
//! present decides how the whole pattern is read: `a * b | c` is an OR of
//! `a * b` and `c`, where `a * b` is a literal substring including the `*`.
//!
//! A `!` only forms an exclusion when it splits the pattern into exactly two
//! parts. With several `!`s the pattern is read as if `!` were an ordinary
//! character and the `|`, `*` and plain forms are tried instead.
//!
//! # Example
//!
//! ```
//! use keysort_library::Pattern;
//!
//! let pattern: Pattern = "photo * 2024".parse().unwrap();
//! assert!(pattern.matches("Vacation_Photo_2024.jpg"));
//! assert!(!pattern.matches("vacation_photo_2023.jpg"));
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

const NOT: char = '!';
const OR: char = '|';
const AND: char = '*';

/// The form a [`Pattern`] was parsed into. Every keyword is stored trimmed
/// and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// `include ! exclude`
    Not { include: String, exclude: String },
    /// `a | b | c`
    Or(Vec<String>),
    /// `a * b * c`
    And(Vec<String>),
    /// Anything without an operator (or with a malformed `!`).
    Plain(String),
}

/// A parsed keyword pattern.
///
/// Constructed via [`FromStr`] (which never fails: every string is a valid
/// pattern) or [`From<&str>`]. Keeps the text it was parsed from for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    expression: Expression,
}
impl FromStr for Pattern {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        let lowered = source.to_lowercase();
        Self {
            source: source.to_string(),
            expression: Expression::parse(&lowered),
        }
    }
}
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Expression {
    fn parse(lowered: &str) -> Self {
        if lowered.contains(NOT) {
            let parts: Vec<&str> = lowered.split(NOT).collect();
            if let [include, exclude] = parts.as_slice() {
                return Self::Not {
                    include: include.trim().to_string(),
                    exclude: exclude.trim().to_string(),
                };
            }
        }
        if lowered.contains(OR) {
            return Self::Or(Self::keywords(lowered, OR));
        }
        if lowered.contains(AND) {
            return Self::And(Self::keywords(lowered, AND));
        }
        Self::Plain(lowered.trim().to_string())
    }

    fn keywords(lowered: &str, operator: char) -> Vec<String> {
        lowered.split(operator).map(|part| part.trim().to_string()).collect()
    }

    /// Evaluate against an already lower-cased file name.
    fn eval(&self, name: &str) -> bool {
        match self {
            // An empty keyword is a substring of everything, so `report !`
            // never matches and `jpg |` always does.
            Self::Not { include, exclude } => name.contains(include.as_str()) && !name.contains(exclude.as_str()),
            Self::Or(keywords) => keywords.iter().any(|k| name.contains(k.as_str())),
            Self::And(keywords) => keywords.iter().all(|k| name.contains(k.as_str())),
            Self::Plain(keyword) => name.contains(keyword.as_str()),
        }
    }
}

impl Pattern {
    /// Case-insensitive match against a file name (extension included).
    pub fn matches(&self, filename: &str) -> bool {
        self.expression.eval(&filename.to_lowercase())
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// The text this pattern was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}
