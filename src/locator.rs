//! XPath-style locators for table regions in the modem status page.
//!
//! Only the shape the status page actually needs is supported: the N-th
//! `<table>` of the document (in document order), optionally narrowed to its
//! `<tbody>`. The locator strings are configuration, so unsupported
//! expressions are rejected at parse time rather than silently matching
//! nothing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Default locator for the downstream channel table.
pub const DEFAULT_DOWNSTREAM: &str = "//table[2]/tbody";

/// Default locator for the upstream channel table.
pub const DEFAULT_UPSTREAM: &str = "//table[4]/tbody";

/// Error returned for locator expressions outside the supported grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid locator `{0}`: expected `//table[N]` or `//table[N]/tbody` with N >= 1")]
pub struct LocatorError(pub String);

/// A parsed locator expression identifying one table region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    /// 1-based index of the table, counted in document order.
    pub table: usize,
    /// Whether to narrow the region to the table's first `<tbody>`.
    pub tbody: bool,
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || LocatorError(s.to_string());

        let rest = s.strip_prefix("//table[").ok_or_else(err)?;
        let close = rest.find(']').ok_or_else(err)?;
        let table: usize = rest[..close].parse().map_err(|_| err())?;
        if table == 0 {
            return Err(err());
        }

        let tbody = match &rest[close + 1..] {
            "" => false,
            "/tbody" => true,
            _ => return Err(err()),
        };

        Ok(Locator { table, tbody })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//table[{}]", self.table)?;
        if self.tbody {
            write!(f, "/tbody")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let down: Locator = DEFAULT_DOWNSTREAM.parse().unwrap();
        assert_eq!(
            down,
            Locator {
                table: 2,
                tbody: true
            }
        );

        let up: Locator = DEFAULT_UPSTREAM.parse().unwrap();
        assert_eq!(
            up,
            Locator {
                table: 4,
                tbody: true
            }
        );
    }

    #[test]
    fn test_parse_without_tbody() {
        let loc: Locator = "//table[1]".parse().unwrap();
        assert_eq!(
            loc,
            Locator {
                table: 1,
                tbody: false
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for expr in [
            "",
            "table[2]",
            "//table[]",
            "//table[0]",
            "//table[2]/thead",
            "//table[2]/tbody/tr",
            "//div[2]/tbody",
            "//table[x]/tbody",
        ] {
            assert!(expr.parse::<Locator>().is_err(), "accepted `{expr}`");
        }
    }

    #[test]
    fn test_display_round_trip() {
        for expr in ["//table[2]/tbody", "//table[7]"] {
            let loc: Locator = expr.parse().unwrap();
            assert_eq!(loc.to_string(), expr);
        }
    }
}
