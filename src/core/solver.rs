use tracing::{debug, warn};

use super::drawdown::{build_drawdown_from, final_end_balance};
use super::engine::{build_projections, build_projections_from, nest_egg_needed, projected_nest_egg};
use super::format::{format_currency, format_percent, round_half_up};
use super::plan::{PlanPatch, RetirementPlan};
use super::types::{Lever, SolveRequest, SolveResult, SolveTarget};

pub const CURRENCY_TOLERANCE: f64 = 100.0;
pub const MAX_ITERATIONS: u32 = 100;

const WITHDRAWAL_RATE_MIN: f64 = 0.02;
const WITHDRAWAL_RATE_MAX: f64 = 0.10;
const MONTHLY_SPENDING_MIN: f64 = 500.0;

const RATE_RESOLUTION: f64 = 1e-9;
const AMOUNT_RESOLUTION: f64 = 1e-6;
// Candidate ages are rounded, so the bracket narrows onto the half-year jump.
const AGE_RESOLUTION: f64 = 1e-9;

// Objective evaluations never look at calendar years.
const OBJECTIVE_YEAR: i32 = 0;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// The observed outcome rises with the lever.
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub direction: Direction,
    pub tolerance: f64,
    /// Bracket width below which the search stops narrowing.
    pub resolution: f64,
    pub max_iterations: u32,
}

impl SearchConfig {
    fn new(lower_bound: f64, upper_bound: f64, direction: Direction, resolution: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            direction,
            tolerance: CURRENCY_TOLERANCE,
            resolution,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    pub value: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Bisects `objective` toward `target` inside the configured bracket. Returns
/// `None` only for an empty or non-finite bracket; running out of iterations
/// yields the last midpoint with `converged == false`.
pub fn bisect<F>(mut objective: F, target: f64, config: SearchConfig) -> Option<SearchOutcome>
where
    F: FnMut(f64) -> f64,
{
    let (mut lo, mut hi) = (config.lower_bound, config.upper_bound);
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        warn!(lo, hi, "degenerate search bracket");
        return None;
    }

    let mut iterations = 0;
    while iterations < config.max_iterations {
        iterations += 1;
        let mid = (lo + hi) * 0.5;
        let observed = objective(mid);
        debug!(iterations, lo, hi, mid, observed, target, "bisect step");

        if (observed - target).abs() < config.tolerance {
            return Some(SearchOutcome {
                value: mid,
                iterations,
                converged: true,
            });
        }

        let overshoot = observed > target;
        let shrink_high = match config.direction {
            Direction::Increasing => overshoot,
            Direction::Decreasing => !overshoot,
        };
        if shrink_high {
            hi = mid;
        } else {
            lo = mid;
        }

        if hi - lo <= config.resolution {
            break;
        }
    }

    let value = (lo + hi) * 0.5;
    warn!(iterations, value, target, "search stopped before reaching tolerance");
    Some(SearchOutcome {
        value,
        iterations,
        converged: false,
    })
}

/// Levers the solver accepts for each target.
pub fn supported_levers(target: SolveTarget) -> &'static [Lever] {
    match target {
        SolveTarget::EndBalance => &[
            Lever::WithdrawalRate,
            Lever::AnnualContribution,
            Lever::RetirementAge,
            Lever::MonthlySpending,
        ],
        SolveTarget::MonthlySpend => &[Lever::AnnualContribution, Lever::RetirementAge],
        SolveTarget::RetireEarlier => &[Lever::AnnualContribution],
    }
}

fn lever_value(plan: &RetirementPlan, lever: Lever) -> f64 {
    match lever {
        Lever::WithdrawalRate => plan.withdrawal_rate,
        Lever::AnnualContribution => plan.annual_contribution,
        Lever::RetirementAge => plan.retirement_age as f64,
        Lever::MonthlySpending => plan.monthly_spending_goal,
    }
}

fn lever_patch(lever: Lever, value: f64) -> PlanPatch {
    let mut patch = PlanPatch::default();
    match lever {
        Lever::WithdrawalRate => patch.withdrawal_rate = Some(value),
        Lever::AnnualContribution => patch.annual_contribution = Some(value),
        Lever::RetirementAge => patch.retirement_age = Some(round_half_up(value).max(0.0) as u32),
        Lever::MonthlySpending => patch.monthly_spending_goal = Some(value),
    }
    patch
}

/// Final drawdown balance when retiring on the projected nest egg.
fn end_balance(plan: &RetirementPlan) -> f64 {
    let projections = build_projections_from(plan, OBJECTIVE_YEAR);
    let nest_egg = projected_nest_egg(&projections);
    final_end_balance(&build_drawdown_from(plan, nest_egg, OBJECTIVE_YEAR))
}

fn projected(plan: &RetirementPlan) -> f64 {
    projected_nest_egg(&build_projections_from(plan, OBJECTIVE_YEAR))
}

fn search_bracket(plan: &RetirementPlan, lever: Lever, target: SolveTarget) -> SearchConfig {
    let age_bracket = || {
        SearchConfig::new(
            (plan.current_age + 1) as f64,
            plan.life_expectancy.saturating_sub(1) as f64,
            Direction::Increasing,
            AGE_RESOLUTION,
        )
    };
    let contribution_scale = if target == SolveTarget::RetireEarlier {
        10.0
    } else {
        5.0
    };
    match lever {
        Lever::WithdrawalRate => SearchConfig::new(
            WITHDRAWAL_RATE_MIN,
            WITHDRAWAL_RATE_MAX,
            Direction::Decreasing,
            RATE_RESOLUTION,
        ),
        Lever::AnnualContribution => SearchConfig::new(
            0.0,
            plan.annual_contribution * contribution_scale,
            Direction::Increasing,
            AMOUNT_RESOLUTION,
        ),
        Lever::RetirementAge => age_bracket(),
        // The end balance does not depend on the spending goal; the search settles on a bracket edge.
        Lever::MonthlySpending => SearchConfig::new(
            MONTHLY_SPENDING_MIN,
            plan.monthly_spending_goal * 3.0,
            Direction::Increasing,
            AMOUNT_RESOLUTION,
        ),
    }
}

/// The whole-year retirement age a retire-earlier target pins, if it lies
/// strictly between the plan's current age and life expectancy.
pub fn retire_earlier_age(plan: &RetirementPlan, target_value: f64) -> Option<u32> {
    if !target_value.is_finite() {
        return None;
    }
    let age = round_half_up(target_value);
    let in_range = age > plan.current_age as f64 && age < plan.life_expectancy as f64;
    in_range.then_some(age as u32)
}

struct Solved {
    value: f64,
    plan: RetirementPlan,
    description: String,
}

fn describe(target: SolveTarget, target_value: f64, lever: Lever, original: f64, solved: f64) -> String {
    let goal = format_currency(target_value);
    match (target, lever) {
        (SolveTarget::EndBalance, Lever::WithdrawalRate) => format!(
            "To die with {goal}, change your withdrawal rate from {} to {}.",
            format_percent(original),
            format_percent(solved)
        ),
        (SolveTarget::EndBalance, Lever::AnnualContribution) => format!(
            "To die with {goal}, change your annual contribution from {} to {}.",
            format_currency(original),
            format_currency(solved)
        ),
        (SolveTarget::EndBalance, Lever::RetirementAge) => format!(
            "To die with {goal}, retire at age {solved} instead of {original}."
        ),
        (SolveTarget::EndBalance, Lever::MonthlySpending) => format!(
            "To die with {goal}, adjust monthly spending from {} to {}.",
            format_currency(original),
            format_currency(solved)
        ),
        (SolveTarget::MonthlySpend, Lever::RetirementAge) => {
            format!("To spend {goal}/mo in retirement, retire at age {solved}.")
        }
        (SolveTarget::MonthlySpend, _) => format!(
            "To spend {goal}/mo in retirement, increase annual contribution to {}.",
            format_currency(solved)
        ),
        (SolveTarget::RetireEarlier, _) => format!(
            "To retire at {}, increase your annual contribution to {}.",
            round_half_up(target_value),
            format_currency(solved)
        ),
    }
}

fn solve_lever(
    plan: &RetirementPlan,
    target: SolveTarget,
    target_value: f64,
    lever: Lever,
) -> Option<Solved> {
    let config = search_bracket(plan, lever, target);

    // The plan every candidate is laid over, and the outcome it must reach.
    let (base, goal) = match target {
        SolveTarget::EndBalance => (plan.clone(), target_value),
        SolveTarget::MonthlySpend => {
            let base = plan.patched(&PlanPatch {
                monthly_spending_goal: Some(target_value),
                ..PlanPatch::default()
            });
            let needed = nest_egg_needed(&base);
            (base, needed)
        }
        SolveTarget::RetireEarlier => {
            let age = retire_earlier_age(plan, target_value)?;
            let base = plan.patched(&PlanPatch {
                retirement_age: Some(age),
                ..PlanPatch::default()
            });
            let needed = nest_egg_needed(&base);
            (base, needed)
        }
    };

    let outcome = bisect(
        |v| {
            let candidate = base.patched(&lever_patch(lever, v));
            match target {
                SolveTarget::EndBalance => end_balance(&candidate),
                SolveTarget::MonthlySpend | SolveTarget::RetireEarlier => projected(&candidate),
            }
        },
        goal,
        config,
    )?;

    let value = match lever {
        Lever::WithdrawalRate => outcome.value,
        _ => round_half_up(outcome.value),
    };
    let original = lever_value(plan, lever);
    Some(Solved {
        value,
        plan: base.patched(&lever_patch(lever, value)),
        description: describe(target, target_value, lever, original, value),
    })
}

pub fn solve(plan: &RetirementPlan, target: SolveTarget, target_value: f64, lever: Lever) -> SolveResult {
    let original_value = lever_value(plan, lever);

    let solved = if supported_levers(target).contains(&lever) {
        solve_lever(plan, target, target_value, lever)
    } else {
        warn!(?target, ?lever, "lever not available for target");
        None
    };

    let Some(solved) = solved else {
        let projections = build_projections(plan);
        return SolveResult {
            success: false,
            lever,
            original_value,
            solved_value: None,
            description: "Could not find a solution within the search bounds.".to_string(),
            solved_plan: plan.clone(),
            projected_nest_egg: projected_nest_egg(&projections),
            nest_egg_needed: nest_egg_needed(plan),
            projections,
        };
    };

    let projections = build_projections(&solved.plan);
    SolveResult {
        success: true,
        lever,
        original_value,
        solved_value: Some(solved.value),
        description: solved.description,
        projected_nest_egg: projected_nest_egg(&projections),
        nest_egg_needed: nest_egg_needed(&solved.plan),
        solved_plan: solved.plan,
        projections,
    }
}

pub fn solve_request(request: &SolveRequest) -> SolveResult {
    solve(&request.plan, request.target, request.target_value, request.lever)
}
