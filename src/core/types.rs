use serde::{Deserialize, Serialize};

use super::plan::{PlanPatch, RetirementPlan};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyProjection {
    pub age: u32,
    pub year: i32,
    pub balance: f64,
    pub balance_inflation_adjusted: f64,
    pub annual_contribution: f64,
    pub estimated_salary: f64,
    pub is_retirement_year: bool,
    /// Balance an evenly paced saver would hold at this age.
    pub on_track_target: f64,
    pub do_nothing_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownYear {
    pub age: u32,
    pub year: i32,
    pub start_balance: f64,
    pub withdrawal: f64,
    pub growth: f64,
    pub end_balance: f64,
    pub depleted: bool,
    pub effective_tax_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub age: u32,
    pub label: String,
    pub target_balance: f64,
    pub projected_balance: f64,
    pub reached: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionReport {
    pub projections: Vec<YearlyProjection>,
    pub nest_egg_needed: f64,
    pub projected_nest_egg: f64,
    pub drawdown: Vec<DrawdownYear>,
    pub milestones: Vec<Milestone>,
    pub monthly_withdrawal: f64,
    pub net_monthly_withdrawal: f64,
    pub on_track: bool,
    pub success_rate: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub label: String,
    #[serde(flatten)]
    pub patch: PlanPatch,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutcome {
    pub label: String,
    pub retirement_age: u32,
    pub nest_egg_at_retirement: f64,
    pub nest_egg_needed: f64,
    pub on_track: bool,
    pub projections: Vec<YearlyProjection>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolveTarget {
    #[serde(alias = "end-balance", alias = "end_balance")]
    EndBalance,
    #[serde(alias = "monthly-spend", alias = "monthly_spend")]
    MonthlySpend,
    #[serde(alias = "retire-earlier", alias = "retire_earlier")]
    RetireEarlier,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lever {
    #[serde(alias = "withdrawal-rate", alias = "withdrawal_rate")]
    WithdrawalRate,
    #[serde(alias = "annual-contribution", alias = "annual_contribution")]
    AnnualContribution,
    #[serde(alias = "retirement-age", alias = "retirement_age")]
    RetirementAge,
    #[serde(
        alias = "monthlySpendingGoal",
        alias = "monthly-spending",
        alias = "monthly_spending"
    )]
    MonthlySpending,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub plan: RetirementPlan,
    pub target: SolveTarget,
    pub target_value: f64,
    pub lever: Lever,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResult {
    pub success: bool,
    pub lever: Lever,
    pub original_value: f64,
    pub solved_value: Option<f64>,
    pub description: String,
    pub solved_plan: RetirementPlan,
    pub projections: Vec<YearlyProjection>,
    pub nest_egg_needed: f64,
    pub projected_nest_egg: f64,
}
