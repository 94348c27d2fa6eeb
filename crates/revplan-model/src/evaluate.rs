use thiserror::Error;

use crate::model::ProblemModel;
use crate::reformulate::Reformulation;
use revplan_solver::{Solution, SolutionStatus};

/// Post-solve figures for one activity
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivityFigures {
    /// Optimal activity level
    pub level: f64,
    /// Revenue earned at that level under the piecewise price curve
    pub revenue: f64,
    /// Effective price per unit, revenue / level; None for an idle activity
    pub average_price: Option<f64>,
}

/// Per-activity figures and totals derived from an optimal solution
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationReport {
    pub activities: Vec<ActivityFigures>,
    /// Sum of the per-activity revenues; agrees with the LP objective
    /// within floating tolerance
    pub total_revenue: f64,
    /// The objective value the solver reported
    pub objective_value: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluateError {
    /// The solver status is carried unchanged; no figures exist for a
    /// non-optimal outcome
    #[error("no optimal solution to evaluate, solver reported {0:?}")]
    NotOptimal(SolutionStatus),
}

impl AllocationReport {
    /// Pure post-processing of an optimal solution; no search happens here
    pub fn from_solution(
        model: &ProblemModel,
        reformulation: &Reformulation,
        solution: &Solution,
    ) -> Result<Self, EvaluateError> {
        if solution.status != SolutionStatus::Optimal {
            return Err(EvaluateError::NotOptimal(solution.status));
        }

        let levels = reformulation.activity_levels(solution);
        let mut activities = Vec::with_capacity(levels.len());
        let mut total_revenue = 0.0;
        for (j, &level) in levels.iter().enumerate() {
            let revenue = model.revenue(j, level);
            let average_price = if level > 0.0 {
                Some(revenue / level)
            } else {
                None
            };
            total_revenue += revenue;
            activities.push(ActivityFigures {
                level,
                revenue,
                average_price,
            });
        }

        Ok(Self {
            activities,
            total_revenue,
            objective_value: solution.objective_value,
        })
    }
}
