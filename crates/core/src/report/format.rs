use serde::{Deserialize, Serialize};

/// Direction of a period-over-period variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Values that round to 0.00 at the 2-dp contract boundary count as flat.
    pub fn from_variation(variation: f64) -> Trend {
        if variation.abs() < 0.005 {
            Trend::Flat
        } else if variation > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "→",
        }
    }
}

/// Signed percentage with one decimal, e.g. "+20.0%" / "-30.0%".
pub fn format_percent(variation: f64) -> String {
    format!("{variation:+.1}%")
}

/// Currency with thousands separators, e.g. "$1,234.50".
pub fn format_money(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let grouped = group_thousands(whole);
    if negative {
        format!("-${grouped}.{frac:02}")
    } else {
        format!("${grouped}.{frac:02}")
    }
}

/// Whole count with thousands separators.
pub fn format_count(value: f64) -> String {
    group_thousands(value.round().max(0.0) as u64)
}

/// Bare ratio with two decimals, used for ROAS.
pub fn format_ratio(value: f64) -> String {
    format!("{value:.2}")
}

fn group_thousands(mut n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }
    let mut groups = Vec::new();
    while n >= 1000 {
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    let mut out = n.to_string();
    for g in groups.iter().rev() {
        out.push(',');
        out.push_str(g);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_follows_variation_sign() {
        assert_eq!(Trend::from_variation(20.0), Trend::Up);
        assert_eq!(Trend::from_variation(-30.0), Trend::Down);
        assert_eq!(Trend::from_variation(0.0), Trend::Flat);
        assert_eq!(Trend::from_variation(0.004), Trend::Flat);
        assert_eq!(Trend::from_variation(-0.01), Trend::Down);
    }

    #[test]
    fn percent_carries_sign() {
        assert_eq!(format_percent(20.0), "+20.0%");
        assert_eq!(format_percent(-30.0), "-30.0%");
        assert_eq!(format_percent(0.0), "+0.0%");
    }

    #[test]
    fn money_groups_thousands() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(999.9), "$999.90");
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(1_250_000.0), "$1,250,000.00");
        assert_eq!(format_money(-42.0), "-$42.00");
    }

    #[test]
    fn count_rounds_to_whole() {
        assert_eq!(format_count(100.0), "100");
        assert_eq!(format_count(12345.6), "12,346");
    }

    #[test]
    fn ratio_has_two_decimals() {
        assert_eq!(format_ratio(3.5), "3.50");
    }
}
