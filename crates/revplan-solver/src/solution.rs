/// The result of solving an LP problem
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Optimal objective value (NaN unless optimal)
    pub objective_value: f64,
    /// Figures read off the final tableau
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The pivot budget ran out before the solver converged
    IterationLimitExceeded,
}

/// Quantities the optimal tableau yields directly, without further search
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Analysis {
    /// Shadow prices (dual values) for each inequality constraint
    pub shadow_prices: Vec<ShadowPrice>,

    /// Reduced costs for each variable
    pub reduced_costs: Vec<ReducedCost>,

    /// Which constraints are binding (tight) at optimum
    pub binding_constraints: Vec<String>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShadowPrice {
    /// Constraint name
    pub constraint: String,
    /// Objective change per unit relaxation of the constraint
    pub value: f64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Reduced cost in the tableau's maximize orientation
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

impl Solution {
    pub fn infeasible() -> Self {
        Self::without_values(SolutionStatus::Infeasible)
    }

    pub fn unbounded() -> Self {
        Self::without_values(SolutionStatus::Unbounded)
    }

    pub fn iteration_limit_exceeded() -> Self {
        Self::without_values(SolutionStatus::IterationLimitExceeded)
    }

    fn without_values(status: SolutionStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: f64::NAN,
            analysis: Analysis::empty(),
        }
    }
}

impl Analysis {
    pub fn empty() -> Self {
        Self {
            shadow_prices: Vec::new(),
            reduced_costs: Vec::new(),
            binding_constraints: Vec::new(),
        }
    }
}
