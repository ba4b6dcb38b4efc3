use super::plan::FilingStatus;

const GROSS_SEARCH_ITERATIONS: u32 = 100;
const GROSS_SEARCH_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
struct Bracket {
    floor: f64,
    ceiling: f64,
    rate: f64,
}

const fn bracket(floor: f64, ceiling: f64, rate: f64) -> Bracket {
    Bracket {
        floor,
        ceiling,
        rate,
    }
}

// 2025 federal ordinary income brackets.
const SINGLE_BRACKETS: [Bracket; 7] = [
    bracket(0.0, 11_925.0, 0.10),
    bracket(11_925.0, 48_475.0, 0.12),
    bracket(48_475.0, 103_350.0, 0.22),
    bracket(103_350.0, 197_300.0, 0.24),
    bracket(197_300.0, 250_525.0, 0.32),
    bracket(250_525.0, 626_350.0, 0.35),
    bracket(626_350.0, f64::INFINITY, 0.37),
];

const MARRIED_BRACKETS: [Bracket; 7] = [
    bracket(0.0, 23_850.0, 0.10),
    bracket(23_850.0, 96_950.0, 0.12),
    bracket(96_950.0, 206_700.0, 0.22),
    bracket(206_700.0, 394_600.0, 0.24),
    bracket(394_600.0, 501_050.0, 0.32),
    bracket(501_050.0, 751_600.0, 0.35),
    bracket(751_600.0, f64::INFINITY, 0.37),
];

fn brackets(status: FilingStatus) -> &'static [Bracket] {
    match status {
        FilingStatus::Single => &SINGLE_BRACKETS,
        FilingStatus::Married => &MARRIED_BRACKETS,
    }
}

pub fn standard_deduction(status: FilingStatus) -> f64 {
    match status {
        FilingStatus::Single => 14_600.0,
        FilingStatus::Married => 29_200.0,
    }
}

/// Federal income tax on traditional (taxable) income after the standard
/// deduction.
pub fn federal_tax(gross_traditional_income: f64, status: FilingStatus) -> f64 {
    let taxable_income = (gross_traditional_income - standard_deduction(status)).max(0.0);

    let mut tax = 0.0;
    for b in brackets(status) {
        if taxable_income <= b.floor {
            break;
        }
        tax += (taxable_income.min(b.ceiling) - b.floor) * b.rate;
    }
    tax
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawalTax {
    pub tax_owed: f64,
    pub effective_rate: f64,
    pub net: f64,
}

/// Splits a gross withdrawal into Roth (untaxed) and traditional (taxed)
/// shares and taxes the traditional share.
pub fn withdrawal_tax(gross: f64, roth_pct: f64, status: FilingStatus) -> WithdrawalTax {
    let traditional = gross * (100.0 - roth_pct) / 100.0;
    let tax_owed = federal_tax(traditional, status);
    let effective_rate = if gross > 0.0 { tax_owed / gross } else { 0.0 };
    WithdrawalTax {
        tax_owed,
        effective_rate,
        net: gross - tax_owed,
    }
}

pub fn effective_tax_rate(gross_withdrawal: f64, roth_pct: f64, status: FilingStatus) -> f64 {
    withdrawal_tax(gross_withdrawal, roth_pct, status).effective_rate
}

pub fn net_from_gross(gross: f64, roth_pct: f64, status: FilingStatus) -> f64 {
    withdrawal_tax(gross, roth_pct, status).net
}

/// Gross withdrawal needed to take home `target_net` after tax. Always
/// returns a value; when the search budget runs out the last midpoint is the
/// answer.
pub fn gross_for_net(target_net: f64, roth_pct: f64, status: FilingStatus) -> f64 {
    if roth_pct >= 100.0 {
        return target_net;
    }

    let mut lo = target_net;
    let mut hi = target_net * 2.0;
    // Net is at least 63% of gross, so one doubling is normally enough.
    for _ in 0..8 {
        if hi <= 0.0 || net_from_gross(hi, roth_pct, status) >= target_net {
            break;
        }
        lo = hi;
        hi *= 2.0;
    }

    for _ in 0..GROSS_SEARCH_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        let net = net_from_gross(mid, roth_pct, status);
        if (net - target_net).abs() < GROSS_SEARCH_TOLERANCE {
            return mid;
        }
        if net < target_net {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn income_below_standard_deduction_is_untaxed() {
        assert_eq!(federal_tax(14_600.0, FilingStatus::Single), 0.0);
        assert_eq!(federal_tax(29_000.0, FilingStatus::Married), 0.0);
        assert_eq!(federal_tax(-5_000.0, FilingStatus::Single), 0.0);
    }

    #[test]
    fn single_filer_tax_walks_brackets() {
        // taxable 50,000: 11,925 @ 10% + 36,550 @ 12% + 1,525 @ 22%
        let expected = 1_192.5 + 4_386.0 + 335.5;
        assert_close(federal_tax(64_600.0, FilingStatus::Single), expected, 1e-6);
    }

    #[test]
    fn married_filer_tax_walks_brackets() {
        // taxable 100,000: 23,850 @ 10% + 73,100 @ 12% + 3,050 @ 22%
        let expected = 2_385.0 + 8_772.0 + 671.0;
        assert_close(federal_tax(129_200.0, FilingStatus::Married), expected, 1e-6);
    }

    #[test]
    fn top_bracket_applies_without_ceiling() {
        let at_floor = federal_tax(626_350.0 + 14_600.0, FilingStatus::Single);
        let above = federal_tax(726_350.0 + 14_600.0, FilingStatus::Single);
        assert_close(above - at_floor, 37_000.0, 1e-6);
    }

    #[test]
    fn effective_rate_splits_roth_share() {
        let full_trad = withdrawal_tax(100_000.0, 0.0, FilingStatus::Single);
        let half_roth = withdrawal_tax(100_000.0, 50.0, FilingStatus::Single);
        assert_close(
            half_roth.tax_owed,
            federal_tax(50_000.0, FilingStatus::Single),
            1e-9,
        );
        assert!(half_roth.effective_rate < full_trad.effective_rate);
        assert_close(full_trad.net, 100_000.0 - full_trad.tax_owed, 1e-9);
    }

    #[test]
    fn effective_rate_is_zero_for_non_positive_gross() {
        assert_eq!(effective_tax_rate(0.0, 0.0, FilingStatus::Single), 0.0);
        assert_eq!(effective_tax_rate(-10.0, 0.0, FilingStatus::Married), 0.0);
    }

    #[test]
    fn all_roth_short_circuits_gross_for_net() {
        assert_eq!(gross_for_net(144_000.0, 100.0, FilingStatus::Single), 144_000.0);
    }

    #[test]
    fn gross_for_net_of_zero_is_zero() {
        assert_close(gross_for_net(0.0, 0.0, FilingStatus::Single), 0.0, 1e-9);
    }

    proptest! {
        #[test]
        fn prop_all_roth_has_no_tax(gross in 0.0f64..5_000_000.0, married in proptest::bool::ANY) {
            let status = if married { FilingStatus::Married } else { FilingStatus::Single };
            prop_assert!(effective_tax_rate(gross, 100.0, status) == 0.0);
        }

        #[test]
        fn prop_gross_for_net_roundtrips_within_a_dollar(
            net in 1_000.0f64..2_000_000.0,
            roth_pct in 0.0f64..99.99,
            married in proptest::bool::ANY,
        ) {
            let status = if married { FilingStatus::Married } else { FilingStatus::Single };
            let gross = gross_for_net(net, roth_pct, status);
            let recovered = net_from_gross(gross, roth_pct, status);
            prop_assert!((recovered - net).abs() < 1.0, "net {net} recovered {recovered}");
            prop_assert!(gross >= net - 1e-9);
        }

        #[test]
        fn prop_tax_never_exceeds_top_rate(income in 0.0f64..10_000_000.0) {
            let tax = federal_tax(income, FilingStatus::Single);
            prop_assert!(tax >= 0.0);
            prop_assert!(tax <= income * 0.37 + 1e-6);
        }
    }
}
