use chrono::{Datelike, Local};

use super::drawdown::build_drawdown_from;
use super::format::round_half_up;
use super::milestones::build_milestones;
use super::plan::{ContributionMode, RetirementPlan};
use super::tax::{federal_tax, gross_for_net};
use super::trinity::trinity_success_rate;
use super::types::{ProjectionReport, Scenario, ScenarioOutcome, YearlyProjection};

pub(crate) fn current_year() -> i32 {
    Local::now().year()
}

fn salary_for_year(plan: &RetirementPlan, year_index: u32) -> f64 {
    plan.current_salary * (1.0 + plan.expected_salary_growth_pct / 100.0).powi(year_index as i32)
}

/// Contribution for the `year_index`-th year of accumulation.
pub fn annual_contribution(plan: &RetirementPlan, year_index: u32) -> f64 {
    match plan.contribution_mode {
        ContributionMode::Fixed => plan.annual_contribution,
        ContributionMode::Salary => round_half_up(
            salary_for_year(plan, year_index) * plan.salary_contribution_pct / 100.0,
        ),
    }
}

pub fn estimated_salary(plan: &RetirementPlan, year_index: u32) -> f64 {
    match plan.contribution_mode {
        ContributionMode::Fixed => 0.0,
        ContributionMode::Salary => round_half_up(salary_for_year(plan, year_index)),
    }
}

/// Balance needed at retirement so that withdrawing `withdrawal_rate` of it
/// nets the inflated spending goal after tax.
pub fn nest_egg_needed(plan: &RetirementPlan) -> f64 {
    let years = plan.years_to_retirement() as i32;
    let future_monthly = plan.monthly_spending_goal * (1.0 + plan.inflation_rate).powi(years);
    let future_annual = future_monthly * 12.0;
    let gross_annual = gross_for_net(future_annual, plan.roth_pct, plan.filing_status);
    if plan.withdrawal_rate <= 0.0 {
        return 0.0;
    }
    round_half_up(gross_annual / plan.withdrawal_rate)
}

fn growth_factors(rate: f64, years: u32) -> (f64, f64) {
    let growth = (1.0 + rate).powi(years as i32);
    let annuity = if rate == 0.0 {
        years as f64
    } else {
        (growth - 1.0) / rate
    };
    (growth, annuity)
}

/// Glide path from today's savings to `target` at retirement, one entry per
/// year inclusive of both ends.
fn on_track_targets(plan: &RetirementPlan, target: f64) -> Vec<f64> {
    let years = plan.years_to_retirement();
    let r = plan.expected_return_rate;
    let (growth, annuity) = growth_factors(r, years);
    let implied_contribution = if annuity == 0.0 {
        0.0
    } else {
        (target - plan.current_savings * growth) / annuity
    };

    (0..=years)
        .map(|i| {
            let (g, a) = growth_factors(r, i);
            round_half_up(plan.current_savings * g + implied_contribution * a)
        })
        .collect()
}

pub fn build_projections(plan: &RetirementPlan) -> Vec<YearlyProjection> {
    build_projections_from(plan, current_year())
}

pub fn build_projections_from(plan: &RetirementPlan, start_year: i32) -> Vec<YearlyProjection> {
    let years = plan.years_to_retirement();
    let targets = on_track_targets(plan, nest_egg_needed(plan));
    let growth = 1.0 + plan.expected_return_rate;

    let mut projections = Vec::with_capacity(years as usize + 1);
    let mut balance = plan.current_savings;
    let mut do_nothing = plan.current_savings;

    for i in 0..=years {
        let age = plan.current_age + i;
        let is_retirement_year = age == plan.retirement_age;
        let contribution = if is_retirement_year {
            0.0
        } else {
            annual_contribution(plan, i)
        };

        projections.push(YearlyProjection {
            age,
            year: start_year + i as i32,
            balance: round_half_up(balance),
            balance_inflation_adjusted: round_half_up(
                balance / (1.0 + plan.inflation_rate).powi(i as i32),
            ),
            annual_contribution: contribution,
            estimated_salary: estimated_salary(plan, i),
            is_retirement_year,
            on_track_target: targets[i as usize],
            do_nothing_balance: round_half_up(do_nothing),
        });

        if !is_retirement_year {
            balance = (balance + contribution) * growth;
            do_nothing *= growth;
        }
    }
    projections
}

/// Balance in the retirement year of the projection, or 0 if none.
pub fn projected_nest_egg(projections: &[YearlyProjection]) -> f64 {
    projections
        .iter()
        .find(|p| p.is_retirement_year)
        .map(|p| p.balance)
        .unwrap_or(0.0)
}

pub fn monthly_withdrawal(nest_egg: f64, plan: &RetirementPlan) -> f64 {
    if nest_egg <= 0.0 {
        return 0.0;
    }
    round_half_up(nest_egg * plan.withdrawal_rate / 12.0)
}

pub fn net_monthly_withdrawal(nest_egg: f64, plan: &RetirementPlan) -> f64 {
    let gross = monthly_withdrawal(nest_egg, plan);
    let annual_traditional = gross * 12.0 * (1.0 - plan.roth_pct / 100.0);
    let tax = federal_tax(annual_traditional, plan.filing_status);
    round_half_up(gross - tax / 12.0)
}

pub fn compute_projections(plan: &RetirementPlan) -> ProjectionReport {
    compute_projections_from(plan, current_year())
}

pub fn compute_projections_from(plan: &RetirementPlan, start_year: i32) -> ProjectionReport {
    let projections = build_projections_from(plan, start_year);
    let nest_egg_needed = nest_egg_needed(plan);
    let projected = projections.last().map(|p| p.balance).unwrap_or(0.0);
    let drawdown = build_drawdown_from(plan, projected, start_year);
    let milestones = build_milestones(plan, &projections);

    ProjectionReport {
        monthly_withdrawal: monthly_withdrawal(projected, plan),
        net_monthly_withdrawal: net_monthly_withdrawal(projected, plan),
        on_track: projected >= nest_egg_needed,
        success_rate: trinity_success_rate(
            plan.withdrawal_rate,
            plan.retirement_years(),
            plan.roth_pct,
        ),
        projections,
        nest_egg_needed,
        projected_nest_egg: projected,
        drawdown,
        milestones,
    }
}

/// Projects each scenario's patch over the base plan.
pub fn compare_scenarios(plan: &RetirementPlan, scenarios: &[Scenario]) -> Vec<ScenarioOutcome> {
    let start_year = current_year();
    scenarios
        .iter()
        .map(|scenario| {
            let patched = plan.patched(&scenario.patch);
            let projections = build_projections_from(&patched, start_year);
            let nest_egg_at_retirement = projections
                .iter()
                .find(|p| p.age == patched.retirement_age)
                .or(projections.last())
                .map(|p| p.balance)
                .unwrap_or(0.0);
            let needed = nest_egg_needed(&patched);
            ScenarioOutcome {
                label: scenario.label.clone(),
                retirement_age: patched.retirement_age,
                nest_egg_at_retirement,
                nest_egg_needed: needed,
                on_track: nest_egg_at_retirement >= needed,
                projections,
            }
        })
        .collect()
}
