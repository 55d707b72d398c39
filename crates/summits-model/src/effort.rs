//! Effort estimates
//!
//! An [`Effort`] is an amount of some calendar unit. Strings like
//! `"2 weeks 3 days"` parse into the smallest unit mentioned.

use crate::error::ModelError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar unit, largest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffortUnit {
    /// 100 years
    Century,
    /// 12 months, 52 weeks or 365 days
    Year,
    /// 4 weeks or 30 days
    Month,
    /// 7 days
    Week,
    /// 24 hours
    Day,
    /// 60 minutes
    Hour,
    /// 60 seconds
    Minute,
    /// Base unit
    Second,
}

impl EffortUnit {
    /// All units, largest first
    pub const ALL: [Self; 8] = [
        Self::Century,
        Self::Year,
        Self::Month,
        Self::Week,
        Self::Day,
        Self::Hour,
        Self::Minute,
        Self::Second,
    ];

    /// Single-letter code (`o` for month, `i` for minute)
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Self::Century => 'c',
            Self::Year => 'y',
            Self::Month => 'o',
            Self::Week => 'w',
            Self::Day => 'd',
            Self::Hour => 'h',
            Self::Minute => 'i',
            Self::Second => 's',
        }
    }

    /// Prefix that introduces this unit in free text
    #[must_use]
    pub fn beginning(self) -> &'static str {
        match self {
            Self::Century => "c",
            Self::Year => "y",
            Self::Month => "mo",
            Self::Week => "w",
            Self::Day => "d",
            Self::Hour => "h",
            Self::Minute => "mi",
            Self::Second => "s",
        }
    }

    /// Singular name
    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            Self::Century => "century",
            Self::Year => "year",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }

    /// Plural name
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            Self::Century => "centuries",
            Self::Year => "years",
            Self::Month => "months",
            Self::Week => "weeks",
            Self::Day => "days",
            Self::Hour => "hours",
            Self::Minute => "minutes",
            Self::Second => "seconds",
        }
    }

    /// Direct conversion factors into smaller units
    fn factors(self) -> &'static [(EffortUnit, f64)] {
        match self {
            Self::Century => &[(Self::Year, 100.0)],
            Self::Year => &[(Self::Month, 12.0), (Self::Week, 52.0), (Self::Day, 365.0)],
            Self::Month => &[(Self::Week, 4.0), (Self::Day, 30.0)],
            Self::Week => &[(Self::Day, 7.0)],
            Self::Day => &[(Self::Hour, 24.0)],
            Self::Hour => &[(Self::Minute, 60.0)],
            Self::Minute => &[(Self::Second, 60.0)],
            Self::Second => &[],
        }
    }

    /// Unit the conversion chain continues through
    fn smallest(self) -> Option<EffortUnit> {
        match self {
            Self::Century => Some(Self::Year),
            Self::Year | Self::Month | Self::Week => Some(Self::Day),
            Self::Day => Some(Self::Hour),
            Self::Hour => Some(Self::Minute),
            Self::Minute => Some(Self::Second),
            Self::Second => None,
        }
    }

    /// How many `smaller` fit into one `self`
    ///
    /// `None` if `smaller` is not reachable from `self` (including itself).
    #[must_use]
    pub fn conversion_factor(self, smaller: EffortUnit) -> Option<f64> {
        if let Some(&(_, factor)) = self.factors().iter().find(|(unit, _)| *unit == smaller) {
            return Some(factor);
        }
        let via = self.smallest()?;
        let direct = self.factors().iter().find(|(unit, _)| *unit == via)?.1;
        via.conversion_factor(smaller).map(|rest| direct * rest)
    }
}

static UNIT_PATTERNS: Lazy<Vec<(EffortUnit, Regex)>> = Lazy::new(|| {
    EffortUnit::ALL
        .iter()
        .filter_map(|&unit| {
            let pattern = format!(r"(\d+\.?\d*)\s*{}", unit.beginning());
            Regex::new(&pattern).ok().map(|re| (unit, re))
        })
        .collect()
});

/// Amount of work in some unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effort {
    /// Unit of `amount`
    pub unit: EffortUnit,
    /// Amount, possibly fractional
    pub amount: f64,
}

impl Default for Effort {
    fn default() -> Self {
        Self::new(EffortUnit::Second, 0.0)
    }
}

impl Effort {
    /// Create effort
    #[inline]
    #[must_use]
    pub const fn new(unit: EffortUnit, amount: f64) -> Self {
        Self { unit, amount }
    }

    /// Same effort expressed in `target`, if reachable
    ///
    /// Unreachable targets (larger units, the same unit) leave it unchanged.
    #[must_use]
    pub fn convert(self, target: EffortUnit) -> Self {
        match self.unit.conversion_factor(target) {
            Some(factor) => Self::new(target, self.amount * factor),
            None => self,
        }
    }

    /// `"1 day"`, `"2.5 weeks"`
    #[must_use]
    pub fn humanize(&self) -> String {
        #[allow(clippy::float_cmp)]
        let name = if self.amount == 1.0 {
            self.unit.singular()
        } else {
            self.unit.plural()
        };
        format!("{} {name}", self.amount)
    }
}

impl FromStr for Effort {
    type Err = ModelError;

    /// Sum every `<number> <unit>` found, in the smallest unit mentioned
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut found = Vec::new();
        for (unit, re) in UNIT_PATTERNS.iter() {
            if let Some(captures) = re.captures(s) {
                let amount: f64 = captures[1]
                    .parse::<f64>()
                    .map_err(|_| ModelError::InvalidEffort(s.to_string()))?;
                found.push(Effort::new(*unit, amount));
            }
        }

        let smallest = found
            .last()
            .map(|e| e.unit)
            .ok_or_else(|| ModelError::InvalidEffort(s.to_string()))?;
        let amount = found.iter().map(|e| e.convert(smallest).amount).sum();
        Ok(Effort::new(smallest, amount))
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.humanize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_factors_chain() {
        assert_eq!(EffortUnit::Year.conversion_factor(EffortUnit::Day), Some(365.0));
        assert_eq!(EffortUnit::Century.conversion_factor(EffortUnit::Day), Some(36_500.0));
        assert_eq!(EffortUnit::Week.conversion_factor(EffortUnit::Minute), Some(10_080.0));
        assert_eq!(EffortUnit::Month.conversion_factor(EffortUnit::Hour), Some(720.0));
        assert_eq!(EffortUnit::Day.conversion_factor(EffortUnit::Day), None);
        assert_eq!(EffortUnit::Day.conversion_factor(EffortUnit::Week), None);
    }

    #[test]
    fn parses_single_unit() {
        let e: Effort = "3 days".parse().unwrap();
        assert_eq!(e, Effort::new(EffortUnit::Day, 3.0));
    }

    #[test]
    fn parses_mixed_units_into_smallest() {
        let e: Effort = "2w 3d".parse().unwrap();
        assert_eq!(e, Effort::new(EffortUnit::Day, 17.0));

        let e: Effort = "1 hour 30 minutes".parse().unwrap();
        assert_eq!(e, Effort::new(EffortUnit::Minute, 90.0));
    }

    #[test]
    fn parses_fractions() {
        let e: Effort = "1.5 months".parse().unwrap();
        assert_eq!(e, Effort::new(EffortUnit::Month, 1.5));
    }

    #[test]
    fn rejects_unitless_text() {
        assert!("soon".parse::<Effort>().is_err());
        assert!("".parse::<Effort>().is_err());
    }

    #[test]
    fn humanizes() {
        assert_eq!(Effort::new(EffortUnit::Day, 1.0).humanize(), "1 day");
        assert_eq!(Effort::new(EffortUnit::Day, 17.0).to_string(), "17 days");
        assert_eq!(Effort::new(EffortUnit::Minute, 2.0).to_string(), "2 minutes");
    }
}
