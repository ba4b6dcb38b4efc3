use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LIFE_EXPECTANCY: u32 = 90;
pub const DEFAULT_WITHDRAWAL_RATE: f64 = 0.04;
pub const DEFAULT_POST_RETIREMENT_RETURN: f64 = 0.05;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    #[default]
    Single,
    #[serde(alias = "mfj", alias = "joint")]
    Married,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionMode {
    #[default]
    Fixed,
    Salary,
}

/// A snapshot of the user's retirement plan. Every computation takes one by
/// reference and never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementPlan {
    pub current_age: u32,
    pub retirement_age: u32,
    #[serde(default = "default_life_expectancy")]
    pub life_expectancy: u32,
    pub current_savings: f64,
    #[serde(default)]
    pub current_savings_roth: f64,
    pub expected_return_rate: f64,
    #[serde(default = "default_post_retirement_return")]
    pub post_retirement_return_rate: f64,
    pub inflation_rate: f64,
    #[serde(default = "default_withdrawal_rate")]
    pub withdrawal_rate: f64,
    pub monthly_spending_goal: f64,
    #[serde(default)]
    pub die_with_target: f64,
    /// Percent (0-100) of contributions and withdrawals treated as Roth.
    pub roth_pct: f64,
    #[serde(default)]
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub contribution_mode: ContributionMode,
    #[serde(default)]
    pub annual_contribution: f64,
    #[serde(default)]
    pub current_salary: f64,
    #[serde(default)]
    pub salary_contribution_pct: f64,
    #[serde(default)]
    pub expected_salary_growth_pct: f64,
}

fn default_life_expectancy() -> u32 {
    DEFAULT_LIFE_EXPECTANCY
}

fn default_withdrawal_rate() -> f64 {
    DEFAULT_WITHDRAWAL_RATE
}

fn default_post_retirement_return() -> f64 {
    DEFAULT_POST_RETIREMENT_RETURN
}

impl Default for RetirementPlan {
    fn default() -> Self {
        Self {
            current_age: 31,
            retirement_age: 56,
            life_expectancy: DEFAULT_LIFE_EXPECTANCY,
            current_savings: 126_000.0,
            current_savings_roth: 126_000.0,
            expected_return_rate: 0.10,
            post_retirement_return_rate: DEFAULT_POST_RETIREMENT_RETURN,
            inflation_rate: 0.03,
            withdrawal_rate: DEFAULT_WITHDRAWAL_RATE,
            monthly_spending_goal: 9_000.0,
            die_with_target: 0.0,
            roth_pct: 100.0,
            filing_status: FilingStatus::Single,
            contribution_mode: ContributionMode::Fixed,
            annual_contribution: 35_000.0,
            current_salary: 120_000.0,
            salary_contribution_pct: 15.0,
            expected_salary_growth_pct: 3.0,
        }
    }
}

/// The plan fields a scenario or the solver may override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanPatch {
    pub annual_contribution: Option<f64>,
    pub expected_return_rate: Option<f64>,
    pub retirement_age: Option<u32>,
    pub monthly_spending_goal: Option<f64>,
    pub withdrawal_rate: Option<f64>,
}

impl PlanPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("retirementAge ({retirement_age}) must be greater than currentAge ({current_age})")]
    RetirementBeforeCurrentAge {
        current_age: u32,
        retirement_age: u32,
    },
    #[error(
        "lifeExpectancy ({life_expectancy}) must be greater than retirementAge ({retirement_age})"
    )]
    LifeExpectancyBeforeRetirement {
        retirement_age: u32,
        life_expectancy: u32,
    },
    #[error("currentSavingsRoth cannot exceed currentSavings")]
    RothExceedsSavings,
}

impl RetirementPlan {
    pub fn years_to_retirement(&self) -> u32 {
        self.retirement_age.saturating_sub(self.current_age)
    }

    pub fn retirement_years(&self) -> u32 {
        self.life_expectancy.saturating_sub(self.retirement_age)
    }

    /// Returns a new plan with the patch's fields laid over this one. Setting a
    /// contribution pins the plan to fixed contributions.
    pub fn patched(&self, patch: &PlanPatch) -> RetirementPlan {
        let mut plan = self.clone();
        if let Some(v) = patch.annual_contribution {
            plan.annual_contribution = v;
            plan.contribution_mode = ContributionMode::Fixed;
        }
        if let Some(v) = patch.expected_return_rate {
            plan.expected_return_rate = v;
        }
        if let Some(v) = patch.retirement_age {
            plan.retirement_age = v;
        }
        if let Some(v) = patch.monthly_spending_goal {
            plan.monthly_spending_goal = v;
        }
        if let Some(v) = patch.withdrawal_rate {
            plan.withdrawal_rate = v;
        }
        plan
    }

    /// Applies a patch and checks the result, for callers that accept
    /// overrides from outside.
    pub fn try_patched(&self, patch: &PlanPatch) -> Result<RetirementPlan, PlanError> {
        let plan = self.patched(patch);
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        for (field, value) in [
            ("currentSavings", self.current_savings),
            ("currentSavingsRoth", self.current_savings_roth),
            ("expectedReturnRate", self.expected_return_rate),
            ("postRetirementReturnRate", self.post_retirement_return_rate),
            ("inflationRate", self.inflation_rate),
            ("withdrawalRate", self.withdrawal_rate),
            ("monthlySpendingGoal", self.monthly_spending_goal),
            ("dieWithTarget", self.die_with_target),
            ("rothPct", self.roth_pct),
            ("annualContribution", self.annual_contribution),
            ("currentSalary", self.current_salary),
            ("salaryContributionPct", self.salary_contribution_pct),
            ("expectedSalaryGrowthPct", self.expected_salary_growth_pct),
        ] {
            if !value.is_finite() {
                return Err(PlanError::NonFinite { field });
            }
        }

        check_range("currentAge", self.current_age as f64, 18.0, 80.0)?;
        check_range("retirementAge", self.retirement_age as f64, 40.0, 90.0)?;
        check_range("lifeExpectancy", self.life_expectancy as f64, 60.0, 110.0)?;
        if self.retirement_age <= self.current_age {
            return Err(PlanError::RetirementBeforeCurrentAge {
                current_age: self.current_age,
                retirement_age: self.retirement_age,
            });
        }
        if self.life_expectancy <= self.retirement_age {
            return Err(PlanError::LifeExpectancyBeforeRetirement {
                retirement_age: self.retirement_age,
                life_expectancy: self.life_expectancy,
            });
        }

        check_range("currentSavings", self.current_savings, 0.0, f64::MAX)?;
        check_range("currentSavingsRoth", self.current_savings_roth, 0.0, f64::MAX)?;
        if self.current_savings_roth > self.current_savings {
            return Err(PlanError::RothExceedsSavings);
        }
        check_range("expectedReturnRate", self.expected_return_rate, 0.001, 0.30)?;
        check_range(
            "postRetirementReturnRate",
            self.post_retirement_return_rate,
            -0.5,
            0.5,
        )?;
        check_range("inflationRate", self.inflation_rate, 0.0, 0.20)?;
        if self.withdrawal_rate <= 0.0 {
            return Err(PlanError::OutOfRange {
                field: "withdrawalRate",
                min: 0.0,
                max: 1.0,
                value: self.withdrawal_rate,
            });
        }
        check_range("withdrawalRate", self.withdrawal_rate, 0.0, 1.0)?;
        check_range("monthlySpendingGoal", self.monthly_spending_goal, 500.0, f64::MAX)?;
        check_range("dieWithTarget", self.die_with_target, 0.0, f64::MAX)?;
        check_range("rothPct", self.roth_pct, 0.0, 100.0)?;
        check_range("annualContribution", self.annual_contribution, 0.0, f64::MAX)?;
        check_range("currentSalary", self.current_salary, 0.0, f64::MAX)?;
        check_range("salaryContributionPct", self.salary_contribution_pct, 0.0, 100.0)?;
        check_range(
            "expectedSalaryGrowthPct",
            self.expected_salary_growth_pct,
            0.0,
            50.0,
        )?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), PlanError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PlanError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_is_valid() {
        RetirementPlan::default().validate().expect("default plan must validate");
    }

    #[test]
    fn deserialize_fills_optional_fields() {
        let json = r#"{
            "currentAge": 30,
            "retirementAge": 65,
            "currentSavings": 50000,
            "expectedReturnRate": 0.07,
            "inflationRate": 0.03,
            "monthlySpendingGoal": 4000,
            "rothPct": 50,
            "annualContribution": 10000
        }"#;
        let plan: RetirementPlan = serde_json::from_str(json).expect("valid plan json");
        assert_eq!(plan.filing_status, FilingStatus::Single);
        assert_eq!(plan.contribution_mode, ContributionMode::Fixed);
        assert_eq!(plan.life_expectancy, 90);
        assert_eq!(plan.withdrawal_rate, 0.04);
        assert_eq!(plan.post_retirement_return_rate, 0.05);
        assert_eq!(plan.current_savings_roth, 0.0);
    }

    #[test]
    fn deserialize_rejects_missing_required_field() {
        let json = r#"{ "currentAge": 30, "retirementAge": 65 }"#;
        assert!(serde_json::from_str::<RetirementPlan>(json).is_err());
    }

    #[test]
    fn patch_with_contribution_forces_fixed_mode() {
        let plan = RetirementPlan {
            contribution_mode: ContributionMode::Salary,
            ..RetirementPlan::default()
        };
        let patched = plan.patched(&PlanPatch {
            annual_contribution: Some(45_000.0),
            ..PlanPatch::default()
        });
        assert_eq!(patched.contribution_mode, ContributionMode::Fixed);
        assert_eq!(patched.annual_contribution, 45_000.0);
        assert_eq!(plan.contribution_mode, ContributionMode::Salary);
    }

    #[test]
    fn patch_leaves_unset_fields_alone() {
        let plan = RetirementPlan::default();
        let patched = plan.patched(&PlanPatch {
            retirement_age: Some(60),
            ..PlanPatch::default()
        });
        assert_eq!(patched.retirement_age, 60);
        assert_eq!(patched.annual_contribution, plan.annual_contribution);
        assert_eq!(patched.contribution_mode, plan.contribution_mode);
        assert!(PlanPatch::default().is_empty());
        assert!(
            !PlanPatch {
                withdrawal_rate: Some(0.05),
                ..PlanPatch::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn try_patched_rejects_retirement_before_current_age() {
        let plan = RetirementPlan {
            current_age: 45,
            ..RetirementPlan::default()
        };
        let err = plan
            .try_patched(&PlanPatch {
                retirement_age: Some(45),
                ..PlanPatch::default()
            })
            .expect_err("must reject");
        assert!(matches!(err, PlanError::RetirementBeforeCurrentAge { .. }));
    }

    #[test]
    fn validate_rejects_out_of_range_fields() {
        let mut plan = RetirementPlan::default();
        plan.roth_pct = 120.0;
        let err = plan.validate().expect_err("must reject roth pct");
        assert!(err.to_string().contains("rothPct"));

        let mut plan = RetirementPlan::default();
        plan.current_savings_roth = plan.current_savings + 1.0;
        assert_eq!(plan.validate(), Err(PlanError::RothExceedsSavings));

        let mut plan = RetirementPlan::default();
        plan.inflation_rate = f64::NAN;
        assert_eq!(
            plan.validate(),
            Err(PlanError::NonFinite {
                field: "inflationRate"
            })
        );

        let mut plan = RetirementPlan::default();
        plan.withdrawal_rate = 0.0;
        assert!(plan.validate().is_err());
    }
}
