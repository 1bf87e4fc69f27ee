// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Control-name expressions.
//!
//! Grammar:
//!
//! ```text
//! expr := ""
//!       | name ( "|" name )*
//! name := any characters except "|", surrounding tabs and spaces are ignored
//! ```
//!
//! Expression is an ordered list of control names combined with logical OR. Empty names are
//! dropped, so `"A||B|"` is the same as `"A|B"`. Rendering always produces the canonical form
//! without spaces around `|`.

use std::convert::Infallible;
use std::fmt::{self, Display};
use std::slice;
use std::str::FromStr;

const SEPARATOR: char = '|';
const TRIM: &[char] = &['\t', '\r', ' '];

/// Parsed control-name expression. Empty expression means that control is unbound.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ControlExpression {
    names: Vec<String>,
}

impl ControlExpression {
    pub fn new() -> Self {
        ControlExpression { names: Vec::new() }
    }

    /// Expression with single control name.
    pub fn single<S: Into<String>>(name: S) -> Self {
        let mut expr = ControlExpression::new();
        expr.push(name);
        expr
    }

    /// Adds `name` as another OR operand. Names that are empty after trimming or that contain
    /// separator are split the same way parser would split them.
    pub fn push<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        for part in name.split(SEPARATOR) {
            let part = part.trim_matches(TRIM);
            if !part.is_empty() {
                self.names.push(part.to_owned());
            }
        }
    }

    /// Removes all operands equal to `name`. Returns `true` if any was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let len = self.names.len();
        self.names.retain(|n| n != name);
        len != self.names.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Iterate over control names in order.
    pub fn names(&self) -> Names<'_> {
        Names(self.names.iter())
    }
}

/// Iterator over names in `ControlExpression`.
pub struct Names<'a>(slice::Iter<'a, String>);

impl<'a> Iterator for Names<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(String::as_str)
    }
}

impl FromStr for ControlExpression {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut expr = ControlExpression::new();
        expr.push(s);
        Ok(expr)
    }
}

impl Display for ControlExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names.iter().enumerate() {
            if i != 0 {
                f.write_str("|")?;
            }
            f.write_str(name)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ControlExpression {
        s.parse().unwrap()
    }

    #[test]
    fn empty() {
        assert!(parse("").is_empty());
        assert!(parse(" | \t|").is_empty());
        assert_eq!(parse("").to_string(), "");
    }

    #[test]
    fn single() {
        let expr = parse("  Button 0 ");
        assert_eq!(expr.names().collect::<Vec<_>>(), vec!["Button 0"]);
        assert_eq!(expr, ControlExpression::single("Button 0"));
    }

    #[test]
    fn or_list() {
        let expr = parse("Up | W||Axis Y-|");
        assert_eq!(expr.len(), 3);
        assert_eq!(expr.names().collect::<Vec<_>>(), vec!["Up", "W", "Axis Y-"]);
        assert_eq!(expr.to_string(), "Up|W|Axis Y-");
        assert_eq!(parse(&expr.to_string()), expr);
    }

    #[test]
    fn edit() {
        let mut expr = ControlExpression::single("A");
        expr.push("B");
        expr.push("C|D");
        assert_eq!(expr.to_string(), "A|B|C|D");
        assert!(expr.contains("C"));
        assert!(!expr.contains("C|D"));

        assert!(expr.remove("B"));
        assert!(!expr.remove("B"));
        assert_eq!(expr.to_string(), "A|C|D");

        expr.clear();
        assert!(expr.is_empty());
    }
}
