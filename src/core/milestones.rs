use super::plan::RetirementPlan;
use super::types::{Milestone, YearlyProjection};

const CHECKPOINTS: [(u32, &str); 4] = [
    (35, "Early Career"),
    (40, "Mid Career"),
    (45, "Peak Earning"),
    (50, "Final Push"),
];

/// Checkpoint progress against the glide path. Ages with no matching
/// projection row report zero for both balances.
pub fn build_milestones(plan: &RetirementPlan, projections: &[YearlyProjection]) -> Vec<Milestone> {
    CHECKPOINTS
        .iter()
        .copied()
        .chain(std::iter::once((plan.retirement_age, "Retirement")))
        .filter(|(age, _)| *age >= plan.current_age)
        .map(|(age, name)| {
            let row = projections.iter().find(|p| p.age == age);
            let target_balance = row.map(|p| p.on_track_target).unwrap_or(0.0);
            let projected_balance = row.map(|p| p.balance).unwrap_or(0.0);
            Milestone {
                age,
                label: format!("{age} - {name}"),
                target_balance,
                projected_balance,
                reached: projected_balance >= target_balance,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::build_projections_from;
    use crate::core::fixtures::sample_plan;

    #[test]
    fn checkpoints_before_current_age_are_dropped() {
        let plan = RetirementPlan {
            current_age: 42,
            ..sample_plan()
        };
        let projections = build_projections_from(&plan, 2026);
        let ages: Vec<u32> = build_milestones(&plan, &projections)
            .iter()
            .map(|m| m.age)
            .collect();
        assert_eq!(ages, vec![45, 50, 65]);
    }

    #[test]
    fn milestones_read_matching_projection_row() {
        let plan = sample_plan();
        let projections = build_projections_from(&plan, 2026);
        let milestones = build_milestones(&plan, &projections);
        assert_eq!(milestones.len(), 5);
        let at_40 = &milestones[1];
        let row = &projections[10];
        assert_eq!(at_40.label, "40 - Mid Career");
        assert_eq!(at_40.target_balance, row.on_track_target);
        assert_eq!(at_40.projected_balance, row.balance);
        assert_eq!(at_40.reached, row.balance >= row.on_track_target);
        assert_eq!(milestones[4].label, "65 - Retirement");
    }

    #[test]
    fn checkpoint_past_retirement_defaults_to_reached_zeroes() {
        let plan = RetirementPlan {
            current_age: 30,
            retirement_age: 42,
            ..sample_plan()
        };
        let projections = build_projections_from(&plan, 2026);
        let milestones = build_milestones(&plan, &projections);
        let at_45 = milestones.iter().find(|m| m.age == 45).expect("45 present");
        assert_eq!(at_45.target_balance, 0.0);
        assert_eq!(at_45.projected_balance, 0.0);
        assert!(at_45.reached);
    }
}
