const COMPACT_UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Whole US dollars with thousands separators, e.g. `$1,234,567`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(rounded.abs() as u64))
}

/// Compact notation with at most one fraction digit, e.g. `1.2K`, `3M`.
pub fn format_compact(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    for (idx, (scale, suffix)) in COMPACT_UNITS.iter().enumerate() {
        if abs >= *scale {
            let scaled = round1(abs / scale);
            // 999.96K rounds up to 1000K; promote to the next unit.
            if scaled >= 1_000.0 && idx > 0 {
                let (bigger, bigger_suffix) = COMPACT_UNITS[idx - 1];
                return format!("{sign}{}{bigger_suffix}", trim_fraction(round1(abs / bigger)));
            }
            return format!("{sign}{}{suffix}", trim_fraction(scaled));
        }
    }
    let rounded = round1(abs);
    if rounded >= 1_000.0 {
        return format!("{sign}1K");
    }
    format!("{sign}{}", trim_fraction(rounded))
}

pub fn format_percent(value: f64, fraction_digits: usize) -> String {
    let plus = if value > 0.0 { "+" } else { "" };
    format!("{plus}{value:.fraction_digits$}%")
}

pub fn format_age(seconds: u64) -> String {
    match seconds {
        0..=59 => format!("{}s", seconds.max(1)),
        60..=3_599 => format!("{}m", seconds / 60),
        3_600..=86_399 => format!("{}h", seconds / 3_600),
        _ => format!("{}d", seconds / 86_400),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn trim_fraction(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(1_234_567.4), "$1,234,567");
        assert_eq!(format_currency(999.5), "$1,000");
        assert_eq!(format_currency(-42_000.0), "-$42,000");
    }

    #[test]
    fn compact_picks_unit() {
        assert_eq!(format_compact(950.0), "950");
        assert_eq!(format_compact(1_000.0), "1K");
        assert_eq!(format_compact(1_250.0), "1.3K");
        assert_eq!(format_compact(2_500_000.0), "2.5M");
        assert_eq!(format_compact(999_960.0), "1M");
        assert_eq!(format_compact(7.2e9), "7.2B");
    }

    #[test]
    fn percent_prefixes_positive_values() {
        assert_eq!(format_percent(3.14159, 1), "+3.1%");
        assert_eq!(format_percent(-2.0, 2), "-2.00%");
        assert_eq!(format_percent(0.0, 1), "0.0%");
    }

    #[test]
    fn age_buckets() {
        assert_eq!(format_age(0), "1s");
        assert_eq!(format_age(59), "59s");
        assert_eq!(format_age(61), "1m");
        assert_eq!(format_age(7_200), "2h");
        assert_eq!(format_age(190_000), "2d");
    }
}
