//! Static survival-rate estimates from the Trinity study tables. A display
//! helper only; nothing here simulates returns.

type Row = [f64; 7];

// [withdrawal rate, 15y, 20y, 25y, 30y, 35y, 40y], 75% stocks / 25% bonds.
const AGGRESSIVE: [Row; 8] = [
    [0.03, 100.0, 100.0, 100.0, 100.0, 98.0, 95.0],
    [0.04, 100.0, 100.0, 98.0, 95.0, 90.0, 85.0],
    [0.05, 100.0, 98.0, 90.0, 83.0, 73.0, 63.0],
    [0.06, 100.0, 90.0, 78.0, 68.0, 57.0, 46.0],
    [0.07, 98.0, 80.0, 63.0, 52.0, 42.0, 32.0],
    [0.08, 90.0, 65.0, 50.0, 38.0, 29.0, 22.0],
    [0.09, 80.0, 52.0, 38.0, 27.0, 20.0, 15.0],
    [0.10, 68.0, 40.0, 27.0, 18.0, 13.0, 10.0],
];

// 50% stocks / 50% bonds.
const MODERATE: [Row; 8] = [
    [0.03, 100.0, 100.0, 100.0, 99.0, 95.0, 90.0],
    [0.04, 100.0, 99.0, 93.0, 87.0, 80.0, 72.0],
    [0.05, 100.0, 90.0, 78.0, 66.0, 55.0, 45.0],
    [0.06, 98.0, 78.0, 60.0, 47.0, 37.0, 28.0],
    [0.07, 88.0, 62.0, 43.0, 32.0, 23.0, 17.0],
    [0.08, 72.0, 46.0, 30.0, 21.0, 14.0, 10.0],
    [0.09, 58.0, 33.0, 20.0, 13.0, 8.0, 5.0],
    [0.10, 44.0, 23.0, 13.0, 8.0, 5.0, 3.0],
];

fn horizon_column(years: u32) -> usize {
    match years {
        0..=15 => 1,
        16..=20 => 2,
        21..=25 => 3,
        26..=30 => 4,
        31..=35 => 5,
        _ => 6,
    }
}

fn interpolate(table: &[Row; 8], rate: f64, years: u32) -> f64 {
    let col = horizon_column(years);
    let rate = rate.clamp(0.03, 0.10);

    for pair in table.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        if rate >= lo[0] && rate <= hi[0] {
            let t = (rate - lo[0]) / (hi[0] - lo[0]);
            return (lo[col] + t * (hi[col] - lo[col])).round();
        }
    }
    table[table.len() - 1][col]
}

/// Estimated percent chance the portfolio survives `retirement_years`. More
/// Roth is read as a more equity-heavy allocation.
pub fn trinity_success_rate(withdrawal_rate: f64, retirement_years: u32, roth_pct: f64) -> u32 {
    let aggressive = interpolate(&AGGRESSIVE, withdrawal_rate, retirement_years);
    let moderate = interpolate(&MODERATE, withdrawal_rate, retirement_years);
    let blend = (roth_pct / 100.0).clamp(0.0, 1.0);
    (aggressive * blend + moderate * (1.0 - blend)).round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_are_returned_exactly() {
        assert_eq!(trinity_success_rate(0.04, 30, 100.0), 95);
        assert_eq!(trinity_success_rate(0.04, 30, 0.0), 87);
        assert_eq!(trinity_success_rate(0.10, 40, 0.0), 3);
    }

    #[test]
    fn rates_between_rows_interpolate() {
        // aggressive 30y: 95 at 4%, 83 at 5%
        assert_eq!(trinity_success_rate(0.045, 30, 100.0), 89);
    }

    #[test]
    fn rates_outside_table_are_clamped() {
        assert_eq!(trinity_success_rate(0.01, 20, 100.0), 100);
        assert_eq!(trinity_success_rate(0.20, 20, 100.0), 40);
    }

    #[test]
    fn roth_share_blends_tables() {
        // 30y at 4%: aggressive 95, moderate 87
        assert_eq!(trinity_success_rate(0.04, 30, 50.0), 91);
    }

    #[test]
    fn long_horizons_use_last_column() {
        assert_eq!(trinity_success_rate(0.04, 55, 100.0), 85);
        assert_eq!(trinity_success_rate(0.04, 10, 0.0), 100);
    }
}
