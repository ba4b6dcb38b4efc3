mod drawdown;
mod engine;
mod format;
mod milestones;
mod plan;
mod solver;
mod tax;
mod trinity;
mod types;

pub use drawdown::{build_drawdown, build_drawdown_from, final_end_balance};
pub use engine::{
    annual_contribution, build_projections, build_projections_from, compare_scenarios,
    compute_projections, compute_projections_from, estimated_salary, monthly_withdrawal,
    nest_egg_needed, net_monthly_withdrawal, projected_nest_egg,
};
pub use format::{format_currency, format_percent};
pub use milestones::build_milestones;
pub use plan::{ContributionMode, FilingStatus, PlanError, PlanPatch, RetirementPlan};
pub use solver::{
    Direction, SearchConfig, SearchOutcome, bisect, retire_earlier_age, solve, solve_request,
    supported_levers,
};
pub use tax::{
    WithdrawalTax, effective_tax_rate, federal_tax, gross_for_net, net_from_gross, withdrawal_tax,
};
pub use trinity::trinity_success_rate;
pub use types::{
    DrawdownYear, Lever, Milestone, ProjectionReport, Scenario, ScenarioOutcome, SolveRequest,
    SolveResult, SolveTarget, YearlyProjection,
};
