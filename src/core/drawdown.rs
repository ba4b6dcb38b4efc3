use super::engine::current_year;
use super::format::{round_half_up, round_to};
use super::plan::RetirementPlan;
use super::tax::effective_tax_rate;
use super::types::DrawdownYear;

pub fn build_drawdown(plan: &RetirementPlan, starting_nest_egg: f64) -> Vec<DrawdownYear> {
    build_drawdown_from(plan, starting_nest_egg, current_year())
}

/// Simulates retirement withdrawals from `starting_nest_egg`, one row per year
/// until life expectancy. The first withdrawal is `withdrawal_rate` of the
/// starting balance, inflated every year after. Stops after the first year
/// that starts with nothing left.
pub fn build_drawdown_from(
    plan: &RetirementPlan,
    starting_nest_egg: f64,
    start_year: i32,
) -> Vec<DrawdownYear> {
    let retirement_year = start_year + plan.years_to_retirement() as i32;
    let base_withdrawal = starting_nest_egg * plan.withdrawal_rate;
    let post_return = plan.post_retirement_return_rate;
    let years = plan.retirement_years();

    let mut rows = Vec::with_capacity(years as usize);
    let mut balance = starting_nest_egg;

    for i in 0..years {
        let depleted = balance <= 0.0;
        let gross = base_withdrawal * (1.0 + plan.inflation_rate).powi(i as i32);
        let actual = if depleted { 0.0 } else { gross.min(balance) };
        let remainder = balance - actual;
        let end_balance = if depleted {
            0.0
        } else {
            (remainder * (1.0 + post_return)).max(0.0)
        };
        let growth = if depleted { 0.0 } else { remainder * post_return };

        rows.push(DrawdownYear {
            age: plan.retirement_age + i,
            year: retirement_year + i as i32,
            start_balance: round_half_up(balance.max(0.0)),
            withdrawal: round_half_up(actual),
            growth: round_half_up(growth),
            end_balance: round_half_up(end_balance),
            depleted,
            effective_tax_rate: round_to(
                effective_tax_rate(actual, plan.roth_pct, plan.filing_status),
                3,
            ),
        });

        if depleted {
            break;
        }
        balance = end_balance;
    }
    rows
}

/// End balance of the last simulated retirement year, 0 when nothing was
/// simulated.
pub fn final_end_balance(rows: &[DrawdownYear]) -> f64 {
    rows.last().map(|r| r.end_balance).unwrap_or(0.0)
}
