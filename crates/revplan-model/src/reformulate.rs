use crate::model::ProblemModel;
use revplan_solver::{ConstraintOp, LpProblem, Solution};

/// Linear-program reformulation of the concave piecewise revenue curves.
///
/// The revenue curve of activity j is the pointwise minimum of its two
/// affine pieces, f1(x) = p*x and f2(x) = p*q + pd*(x - q), which cross at
/// the breakpoint. Maximizing that minimum is the same as maximizing one
/// auxiliary revenue variable per activity capped above by each piece: the
/// variable appears only positively in the objective, so the solver pushes
/// it onto the binding piece.
///
/// The auxiliary variable is free in sign, so it enters the LP split into a
/// nonnegative pair r = r⁺ - r⁻, keeping every solver variable >= 0.
/// Columns are laid out x_1..x_n, r⁺_1..r⁺_n, r⁻_1..r⁻_n.
pub struct Reformulation {
    problem: LpProblem,
    activities: usize,
}

impl Reformulation {
    pub fn new(model: &ProblemModel) -> Self {
        let n = model.num_activities();
        let m = model.num_resources();

        let mut variables = Vec::with_capacity(3 * n);
        for j in 0..n {
            variables.push(format!("x{}", j + 1));
        }
        for j in 0..n {
            variables.push(format!("r{}_pos", j + 1));
        }
        for j in 0..n {
            variables.push(format!("r{}_neg", j + 1));
        }

        let mut problem = LpProblem::new(variables);

        // Maximize the sum of achieved revenues
        let mut objective = vec![0.0; 3 * n];
        for j in 0..n {
            objective[n + j] = 1.0;
            objective[2 * n + j] = -1.0;
        }
        problem.maximize(objective);

        // Two caps per activity: r_j <= p_j * x_j and
        // r_j <= p_j*q_j + pd_j*(x_j - q_j)
        for j in 0..n {
            let p = model.price()[j];
            let pd = model.discount_price()[j];
            let q = model.breakpoint()[j];

            let mut cap = vec![0.0; 3 * n];
            cap[j] = -p;
            cap[n + j] = 1.0;
            cap[2 * n + j] = -1.0;
            problem.add_constraint(format!("price_cap_{}", j + 1), cap, ConstraintOp::Le, 0.0);

            let mut cap = vec![0.0; 3 * n];
            cap[j] = -pd;
            cap[n + j] = 1.0;
            cap[2 * n + j] = -1.0;
            problem.add_constraint(
                format!("discount_cap_{}", j + 1),
                cap,
                ConstraintOp::Le,
                (p - pd) * q,
            );
        }

        // One capacity row per resource, over the x block only
        for i in 0..m {
            let mut row = vec![0.0; 3 * n];
            row[..n].copy_from_slice(&model.consumption()[i]);
            problem.add_constraint(
                format!("capacity_{}", i + 1),
                row,
                ConstraintOp::Le,
                model.capacity()[i],
            );
        }

        Self {
            problem,
            activities: n,
        }
    }

    pub fn problem(&self) -> &LpProblem {
        &self.problem
    }

    pub fn num_activities(&self) -> usize {
        self.activities
    }

    /// The activity levels are the x block of the solution; the split
    /// revenue variables are internal to the reformulation
    pub fn activity_levels(&self, solution: &Solution) -> Vec<f64> {
        solution
            .values
            .iter()
            .take(self.activities)
            .copied()
            .collect()
    }
}
