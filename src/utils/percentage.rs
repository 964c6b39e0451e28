use std::{fmt::Display, ops::Deref, str::FromStr};

use anyhow::anyhow;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::time::seconds_f64;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.);
    pub const FULL: Percentage = Percentage(100.);

    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. || value.is_nan() {
            None
        } else {
            Some(Percentage(value))
        }
    }

    /// Share of `index` in `count` equal slots.
    pub fn slot(index: usize, count: usize) -> Percentage {
        if count == 0 {
            return Percentage::ZERO;
        }
        Percentage(index as f64 / count as f64 * 100.)
    }
}

impl FromStr for Percentage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // This means that 100%% also works, but I think I'm fine with that
        let s = s.trim_end_matches("%");
        let v = s.parse::<f64>()?;
        Percentage::new_opt(v).ok_or_else(|| anyhow!("Can't parse {s} into percentage"))
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `value` in `whole`. An empty whole yields 0 instead of NaN.
pub fn duration_percentage(value: Duration, whole: Duration) -> Percentage {
    let whole = seconds_f64(whole);
    if whole <= 0. {
        return Percentage::ZERO;
    }
    Percentage::new_opt(seconds_f64(value.max(Duration::zero())) / whole * 100.)
        .unwrap_or(Percentage::ZERO)
}

/// Serializes a percentage the way css expects it, `"50%"`.
pub mod css_ser {
    use serde::Serializer;

    use super::Percentage;

    pub fn serialize<S>(percentage: &Percentage, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(percentage)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::{Percentage, duration_percentage};

    #[test]
    fn zero_whole_is_zero_percent() {
        assert_eq!(
            duration_percentage(Duration::seconds(10), Duration::zero()),
            Percentage::ZERO
        );
    }

    #[test]
    fn parses_with_and_without_sign() {
        assert_eq!(*"12.5%".parse::<Percentage>().unwrap(), 12.5);
        assert_eq!(*"3".parse::<Percentage>().unwrap(), 3.);
        assert!("-1".parse::<Percentage>().is_err());
    }

    #[test]
    fn slot_formats_like_css() {
        assert_eq!(Percentage::slot(1, 2).to_string(), "50%");
        assert_eq!(Percentage::slot(0, 3).to_string(), "0%");
        assert_eq!(Percentage::slot(1, 1).to_string(), "100%");
    }
}
