/// Rounds half up, so `-2.5` becomes `-2` and `2.5` becomes `3`. All emitted
/// currency figures go through this.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    round_half_up(value * scale) / scale
}

/// Short currency label: `$1.20M`, `$45K`, `$950`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0".to_string();
    }
    if value >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.0}K", round_half_up(value / 1_000.0))
    } else {
        format!("${}", group_thousands(round_half_up(value)))
    }
}

pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up_like_currency_display() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(1234.49), 1234.0);
        assert_eq!(round_to(0.123_56, 3), 0.124);
    }

    #[test]
    fn formats_currency_by_magnitude() {
        assert_eq!(format_currency(1_200_000.0), "$1.20M");
        assert_eq!(format_currency(45_000.0), "$45K");
        assert_eq!(format_currency(45_600.0), "$46K");
        assert_eq!(format_currency(950.0), "$950");
        assert_eq!(format_currency(-12_500.0), "$-12,500");
        assert_eq!(format_currency(f64::NAN), "$0");
    }

    #[test]
    fn formats_percent_with_two_decimals() {
        assert_eq!(format_percent(0.04), "4.00%");
        assert_eq!(format_percent(0.035), "3.50%");
    }
}
