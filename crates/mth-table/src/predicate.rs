//! Predicate tests for `locate`.

use mth_common::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::cell::Cell;

/// Comparison applied between a stored cell and the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Test {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    /// Strictly between two bounds.
    Between,
}

impl Test {
    pub fn as_str(&self) -> &'static str {
        match self {
            Test::Eq => "eq",
            Test::Lt => "lt",
            Test::Le => "le",
            Test::Gt => "gt",
            Test::Ge => "ge",
            Test::Between => "between",
        }
    }

    /// Whether `ordering` of stored-vs-probe satisfies a single-bound test.
    pub(crate) fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Test::Eq => ordering == Ordering::Equal,
            Test::Lt => ordering == Ordering::Less,
            Test::Le => ordering != Ordering::Greater,
            Test::Gt => ordering == Ordering::Greater,
            Test::Ge => ordering != Ordering::Less,
            Test::Between => false,
        }
    }
}

impl fmt::Display for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Test {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "eq" | "==" => Ok(Test::Eq),
            "lt" | "<" => Ok(Test::Lt),
            "le" | "<=" => Ok(Test::Le),
            "gt" | ">" => Ok(Test::Gt),
            "ge" | ">=" => Ok(Test::Ge),
            "between" | "be" => Ok(Test::Between),
            _ => Err(Error::coercion(
                "test",
                "one of [ eq | lt | le | gt | ge | between ]",
                s,
            )),
        }
    }
}

/// Value searched for: one value, or a bound pair for [`Test::Between`].
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    Value(Cell),
    Pair(Cell, Cell),
}

impl Probe {
    pub fn value(cell: impl Into<Cell>) -> Self {
        Probe::Value(cell.into())
    }

    pub fn pair(low: impl Into<Cell>, high: impl Into<Cell>) -> Self {
        Probe::Pair(low.into(), high.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_symbols() {
        assert_eq!("between".parse::<Test>().unwrap(), Test::Between);
        assert_eq!("BE".parse::<Test>().unwrap(), Test::Between);
        assert_eq!("<=".parse::<Test>().unwrap(), Test::Le);
        assert!("like".parse::<Test>().is_err());
    }

    #[test]
    fn single_bound_tests() {
        assert!(Test::Le.accepts(Ordering::Equal));
        assert!(!Test::Lt.accepts(Ordering::Equal));
        assert!(Test::Ge.accepts(Ordering::Greater));
        assert!(!Test::Between.accepts(Ordering::Equal));
    }
}
