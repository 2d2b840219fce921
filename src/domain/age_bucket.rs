//! Age-bucket classification.
//!
//! Children are grouped into a fixed, ordered set of buckets by their age
//! on a reference cutoff date. The cutoff is a fixed calendar date chosen
//! for the whole classification period (e.g. June 30), not "today", so a
//! child does not change buckets mid-term.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// The fixed set of age buckets, ordered youngest to oldest. This order
/// is also the roster display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBucket {
    /// Ages 4 and under.
    Preschool,
    /// Ages 5 through 8. Also the fallback when no birthdate is recorded.
    Primary,
    /// Ages 9 and up.
    Youth,
}

/// Fixed display order for roster grouping.
pub const BUCKET_ORDER: [AgeBucket; 3] = [AgeBucket::Preschool, AgeBucket::Primary, AgeBucket::Youth];

impl AgeBucket {
    pub fn display_name(&self) -> &'static str {
        match self {
            AgeBucket::Preschool => "Preschool",
            AgeBucket::Primary => "Primary",
            AgeBucket::Youth => "Youth",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBucket::Preschool => "preschool",
            AgeBucket::Primary => "primary",
            AgeBucket::Youth => "youth",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "preschool" => Some(AgeBucket::Preschool),
            "primary" => Some(AgeBucket::Primary),
            "youth" => Some(AgeBucket::Youth),
            _ => None,
        }
    }
}

/// Default bucket when a child has no recorded birthdate.
pub const DEFAULT_BUCKET: AgeBucket = AgeBucket::Primary;

/// Classify a child into an age bucket as of the cutoff date.
///
/// Pure and total: a missing birthdate yields [`DEFAULT_BUCKET`], and a
/// birthdate after the cutoff clamps to the youngest bucket.
pub fn classify(birthdate: Option<NaiveDate>, cutoff: NaiveDate) -> AgeBucket {
    let birthdate = match birthdate {
        Some(date) => date,
        None => return DEFAULT_BUCKET,
    };

    let age = age_on(birthdate, cutoff);
    if age <= 4 {
        AgeBucket::Preschool
    } else if age <= 8 {
        AgeBucket::Primary
    } else {
        AgeBucket::Youth
    }
}

/// Whole years of age on the cutoff date, subtracting one year when the
/// birthday has not yet occurred by the cutoff's month/day. Clamped to
/// zero for birthdates after the cutoff.
fn age_on(birthdate: NaiveDate, cutoff: NaiveDate) -> i32 {
    let mut age = cutoff.year() - birthdate.year();
    if (cutoff.month(), cutoff.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    age.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_birthday_not_yet_reached_by_cutoff() {
        // Born 2020-07-01, cutoff 2025-06-30: still 4 years old.
        let bucket = classify(Some(date(2020, 7, 1)), date(2025, 6, 30));
        assert_eq!(bucket, AgeBucket::Preschool);
    }

    #[test]
    fn test_birthday_on_cutoff_counts() {
        // Born 2020-06-30, cutoff 2025-06-30: turned 5 that day.
        let bucket = classify(Some(date(2020, 6, 30)), date(2025, 6, 30));
        assert_eq!(bucket, AgeBucket::Primary);
    }

    #[test]
    fn test_bucket_thresholds() {
        let cutoff = date(2025, 6, 30);
        // 4 years old -> Preschool
        assert_eq!(classify(Some(date(2021, 1, 1)), cutoff), AgeBucket::Preschool);
        // 8 years old -> Primary
        assert_eq!(classify(Some(date(2017, 1, 1)), cutoff), AgeBucket::Primary);
        // 9 years old -> Youth
        assert_eq!(classify(Some(date(2016, 1, 1)), cutoff), AgeBucket::Youth);
        // 12 years old -> Youth
        assert_eq!(classify(Some(date(2013, 3, 15)), cutoff), AgeBucket::Youth);
    }

    #[test]
    fn test_missing_birthdate_uses_default() {
        assert_eq!(classify(None, date(2025, 6, 30)), DEFAULT_BUCKET);
    }

    #[test]
    fn test_birthdate_after_cutoff_clamps_to_youngest() {
        let bucket = classify(Some(date(2026, 1, 1)), date(2025, 6, 30));
        assert_eq!(bucket, AgeBucket::Preschool);
    }

    #[test]
    fn test_bucket_order_is_youngest_first() {
        assert!(AgeBucket::Preschool < AgeBucket::Primary);
        assert!(AgeBucket::Primary < AgeBucket::Youth);
    }

    #[test]
    fn test_parse_round_trip() {
        for bucket in BUCKET_ORDER {
            assert_eq!(AgeBucket::parse(bucket.as_str()), Some(bucket));
        }
        assert_eq!(AgeBucket::parse("toddler"), None);
    }
}
