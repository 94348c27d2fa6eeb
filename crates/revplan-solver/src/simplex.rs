use crate::problem::{ConstraintOp, LpProblem, ObjectiveSense};
use crate::solution::{Analysis, ReducedCost, ShadowPrice, Solution, SolutionStatus};

/// Two-phase simplex solver for linear programming problems
pub struct Solver {
    /// Pivot budget shared by both phases
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-9,
        }
    }
}

/// Dense simplex tableau: constraint rows followed by the objective row,
/// with the RHS in the last column. Basic variable identity is tracked by
/// column index in `basis`, one entry per constraint row.
struct Tableau {
    rows: Vec<Vec<f64>>,
    basis: Vec<usize>,
    n_structural: usize,
    n_slack: usize,
    n_artificial: usize,
    /// Per constraint: slack column, sign of its entry (+1 slack, -1 surplus),
    /// and the row sign applied during RHS normalization. None for equalities.
    slack_info: Vec<Option<(usize, f64, f64)>>,
}

impl Tableau {
    fn pivot(&mut self, row: usize, col: usize) {
        self.basis[row] = col;
        let cols = self.rows[0].len();

        let pivot = self.rows[row][col];
        for j in 0..cols {
            self.rows[row][j] /= pivot;
        }

        for i in 0..self.rows.len() {
            if i == row {
                continue;
            }
            let factor = self.rows[i][col];
            if factor != 0.0 {
                for j in 0..cols {
                    self.rows[i][j] -= factor * self.rows[row][j];
                }
            }
        }
    }
}

enum Pivoting {
    Converged,
    Unbounded,
    OutOfIterations,
}

enum Phase1Outcome {
    Feasible,
    Infeasible,
    OutOfIterations,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let mut tableau = self.build_tableau(problem);
        let mut budget = self.max_iterations;

        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau, &mut budget) {
                Phase1Outcome::Feasible => {}
                Phase1Outcome::Infeasible => return Solution::infeasible(),
                Phase1Outcome::OutOfIterations => return Solution::iteration_limit_exceeded(),
            }
        }

        // Artificial columns are never eligible to re-enter in phase 2
        let real_cols = tableau.n_structural + tableau.n_slack;
        match self.run_simplex(&mut tableau, real_cols, &mut budget) {
            Pivoting::Converged => self.extract_solution(&tableau, problem),
            Pivoting::Unbounded => Solution::unbounded(),
            Pivoting::OutOfIterations => Solution::iteration_limit_exceeded(),
        }
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n = problem.num_variables();
        let m = problem.num_constraints();

        // Normalize every row to a nonnegative RHS first; a flipped <= row
        // becomes a >= row whose surplus cannot seed the basis, so it gets an
        // artificial like any other >= or = row.
        let mut normalized: Vec<(Vec<f64>, ConstraintOp, f64, f64)> = Vec::with_capacity(m);
        for c in &problem.constraints {
            let mut coeffs = vec![0.0; n];
            for (j, &a) in c.coefficients.iter().enumerate().take(n) {
                coeffs[j] = a;
            }
            if c.rhs < 0.0 {
                for a in &mut coeffs {
                    *a = -*a;
                }
                let op = match c.op {
                    ConstraintOp::Le => ConstraintOp::Ge,
                    ConstraintOp::Ge => ConstraintOp::Le,
                    ConstraintOp::Eq => ConstraintOp::Eq,
                };
                normalized.push((coeffs, op, -c.rhs, -1.0));
            } else {
                normalized.push((coeffs, c.op, c.rhs, 1.0));
            }
        }

        let n_slack = normalized
            .iter()
            .filter(|(_, op, _, _)| *op != ConstraintOp::Eq)
            .count();
        let n_artificial = normalized
            .iter()
            .filter(|(_, op, _, _)| *op != ConstraintOp::Le)
            .count();

        let cols = n + n_slack + n_artificial + 1;
        let mut rows = vec![vec![0.0; cols]; m + 1];
        let mut basis = vec![0usize; m];
        let mut slack_info = vec![None; m];

        let mut slack_col = n;
        let mut artificial_col = n + n_slack;
        for (i, (coeffs, op, rhs, sign)) in normalized.iter().enumerate() {
            rows[i][..n].copy_from_slice(coeffs);
            rows[i][cols - 1] = *rhs;

            match op {
                ConstraintOp::Le => {
                    rows[i][slack_col] = 1.0;
                    basis[i] = slack_col;
                    slack_info[i] = Some((slack_col, 1.0, *sign));
                    slack_col += 1;
                }
                ConstraintOp::Ge => {
                    rows[i][slack_col] = -1.0;
                    slack_info[i] = Some((slack_col, -1.0, *sign));
                    slack_col += 1;
                    rows[i][artificial_col] = 1.0;
                    basis[i] = artificial_col;
                    artificial_col += 1;
                }
                ConstraintOp::Eq => {
                    rows[i][artificial_col] = 1.0;
                    basis[i] = artificial_col;
                    artificial_col += 1;
                }
            }
        }

        // Objective row holds reduced costs oriented so that a positive entry
        // improves the objective; minimization is solved as maximize(-c)
        for (j, &c) in problem.objective.coefficients.iter().enumerate().take(n) {
            rows[m][j] = match problem.objective.sense {
                ObjectiveSense::Maximize => c,
                ObjectiveSense::Minimize => -c,
            };
        }

        Tableau {
            rows,
            basis,
            n_structural: n,
            n_slack,
            n_artificial,
            slack_info,
        }
    }

    fn phase1(&self, tableau: &mut Tableau, budget: &mut usize) -> Phase1Outcome {
        let obj = tableau.basis.len();
        let cols = tableau.rows[0].len();
        let art_start = tableau.n_structural + tableau.n_slack;

        // Swap in the auxiliary objective: maximize -sum(artificials)
        let original = std::mem::replace(&mut tableau.rows[obj], vec![0.0; cols]);
        for j in art_start..cols - 1 {
            tableau.rows[obj][j] = -1.0;
        }
        // Cancel the entries of the basic artificials so the reduced costs
        // start consistent with the basis
        for i in 0..tableau.basis.len() {
            if tableau.basis[i] >= art_start {
                for j in 0..cols {
                    tableau.rows[obj][j] += tableau.rows[i][j];
                }
            }
        }

        match self.run_simplex(tableau, cols - 1, budget) {
            Pivoting::Converged => {}
            // The auxiliary objective is bounded above by zero; a missing
            // ratio row here is numerical breakdown, reported as infeasible
            Pivoting::Unbounded => return Phase1Outcome::Infeasible,
            Pivoting::OutOfIterations => return Phase1Outcome::OutOfIterations,
        }

        // Any artificial still carrying value means no feasible point exists
        let rhs_col = cols - 1;
        for i in 0..tableau.basis.len() {
            if tableau.basis[i] >= art_start && tableau.rows[i][rhs_col].abs() > self.tolerance {
                return Phase1Outcome::Infeasible;
            }
        }

        // Drive zero-valued artificials out of the basis where a real column
        // allows it; a row with no such column is redundant and stays inert
        for i in 0..tableau.basis.len() {
            if tableau.basis[i] >= art_start {
                let col = (0..art_start).find(|&j| tableau.rows[i][j].abs() > self.tolerance);
                if let Some(col) = col {
                    tableau.pivot(i, col);
                }
            }
        }

        // Restore the real objective, re-reduced against the current basis
        tableau.rows[obj] = original;
        for i in 0..tableau.basis.len() {
            let factor = tableau.rows[obj][tableau.basis[i]];
            if factor.abs() > self.tolerance {
                for j in 0..cols {
                    tableau.rows[obj][j] -= factor * tableau.rows[i][j];
                }
            }
        }

        Phase1Outcome::Feasible
    }

    fn run_simplex(
        &self,
        tableau: &mut Tableau,
        eligible_cols: usize,
        budget: &mut usize,
    ) -> Pivoting {
        loop {
            let Some(col) = self.entering_column(tableau, eligible_cols) else {
                return Pivoting::Converged;
            };
            let Some(row) = self.leaving_row(tableau, col) else {
                return Pivoting::Unbounded;
            };
            if *budget == 0 {
                return Pivoting::OutOfIterations;
            }
            *budget -= 1;
            tableau.pivot(row, col);
        }
    }

    /// Bland's rule: the lowest-index column whose reduced cost still improves
    /// the objective. Guarantees termination on degenerate problems.
    fn entering_column(&self, tableau: &Tableau, eligible_cols: usize) -> Option<usize> {
        let obj = tableau.rows.len() - 1;
        (0..eligible_cols).find(|&j| tableau.rows[obj][j] > self.tolerance)
    }

    /// Minimum-ratio test over rows with a positive pivot-column entry,
    /// ties broken by the smallest row index
    fn leaving_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.rows[0].len() - 1;
        let mut best: Option<(usize, f64)> = None;
        for i in 0..tableau.basis.len() {
            let entry = tableau.rows[i][col];
            if entry > self.tolerance {
                let ratio = tableau.rows[i][rhs_col] / entry;
                match best {
                    Some((_, smallest)) if ratio >= smallest => {}
                    _ => best = Some((i, ratio)),
                }
            }
        }
        best.map(|(i, _)| i)
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n = tableau.n_structural;
        let rhs_col = tableau.rows[0].len() - 1;

        let mut values = vec![0.0; n];
        for (i, &basic) in tableau.basis.iter().enumerate() {
            if basic < n {
                values[basic] = tableau.rows[i][rhs_col];
            }
        }

        // Recompute the objective from the original coefficients rather than
        // trusting the accumulated tableau corner value
        let mut objective_value = 0.0;
        for (j, &c) in problem.objective.coefficients.iter().enumerate().take(n) {
            objective_value += c * values[j];
        }

        let analysis = self.analyze(tableau, problem, &values);

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            analysis,
        }
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem, values: &[f64]) -> Analysis {
        let obj = tableau.basis.len();

        // The slack's reduced cost at optimum is -y_i * slack_sign, and a row
        // negated during normalization negates its dual again. Equality rows
        // have no slack column and report no shadow price.
        let mut shadow_prices = Vec::new();
        for (i, constraint) in problem.constraints.iter().enumerate() {
            if let Some((col, slack_sign, row_sign)) = tableau.slack_info[i] {
                let value = -row_sign * slack_sign * tableau.rows[obj][col];
                shadow_prices.push(ShadowPrice {
                    constraint: constraint.name.clone(),
                    value,
                });
            }
        }

        let mut reduced_costs = Vec::new();
        for (j, name) in problem.variables.iter().enumerate() {
            let is_basic = tableau.basis.contains(&j);
            let rc = if is_basic { 0.0 } else { tableau.rows[obj][j] };
            reduced_costs.push(ReducedCost {
                variable: name.clone(),
                value: values[j],
                reduced_cost: rc,
                is_basic,
            });
        }

        let binding_constraints = shadow_prices
            .iter()
            .filter(|sp| sp.value.abs() > self.tolerance)
            .map(|sp| sp.constraint.clone())
            .collect();

        Analysis {
            shadow_prices,
            reduced_costs,
            binding_constraints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::LpProblem;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        //   x, y >= 0
        // Optimal: x=3, y=1, obj=11
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.maximize(vec![3.0, 2.0]);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!(
            (solution.values[0] - 3.0).abs() < 1e-6,
            "x = {} (expected 3)",
            solution.values[0]
        );
        assert!(
            (solution.values[1] - 1.0).abs() < 1e-6,
            "y = {} (expected 1)",
            solution.values[1]
        );
        assert!(
            (solution.objective_value - 11.0).abs() < 1e-6,
            "obj = {} (expected 11)",
            solution.objective_value
        );
    }

    #[test]
    fn test_shadow_prices_at_optimum() {
        // Same problem as above; at x=3, y=1 the "sum" and "x_max" rows are
        // tight with duals 2 and 1, while "y_max" is slack
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.maximize(vec![3.0, 2.0]);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);
        let duals: Vec<f64> = solution
            .analysis
            .shadow_prices
            .iter()
            .map(|sp| sp.value)
            .collect();

        assert!((duals[0] - 2.0).abs() < 1e-6, "sum dual = {}", duals[0]);
        assert!((duals[1] - 1.0).abs() < 1e-6, "x_max dual = {}", duals[1]);
        assert!(duals[2].abs() < 1e-6, "y_max dual = {}", duals[2]);
        assert_eq!(
            solution.analysis.binding_constraints,
            vec!["sum".to_string(), "x_max".to_string()]
        );
    }

    #[test]
    fn test_minimization_with_surplus() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        //   x, y >= 0
        // Optimal: x=3, y=1, obj=9
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.minimize(vec![2.0, 3.0]);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {}", solution.values[1]);
        assert!(
            (solution.objective_value - 9.0).abs() < 1e-6,
            "obj = {} (expected 9)",
            solution.objective_value
        );
    }

    #[test]
    fn test_equality_constraint() {
        // Maximize 3x + 2y with x + y = 4 and x <= 3: x=3, y=1, obj=11
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.maximize(vec![3.0, 2.0]);
        problem.add_constraint("balance", vec![1.0, 1.0], ConstraintOp::Eq, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {}", solution.values[1]);
        assert!((solution.objective_value - 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_rhs_forces_artificial() {
        // -x <= -5 is x >= 5 after normalization; the flipped slack cannot
        // seed the basis, so this exercises the artificial path
        let mut problem = LpProblem::new(names(&["x"]));
        problem.minimize(vec![1.0]);
        problem.add_constraint("lower", vec![-1.0], ConstraintOp::Le, -5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 10.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 5.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.objective_value - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        // x >= 5 and x <= 3 cannot both hold
        let mut problem = LpProblem::new(names(&["x"]));
        problem.minimize(vec![1.0]);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        // Maximize x + y with only x - y <= 1: y can grow without limit
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.maximize(vec![1.0, 1.0]);
        problem.add_constraint("gap", vec![1.0, -1.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_iteration_limit_reported() {
        // The simple maximization needs two pivots; a budget of one must be
        // reported, not silently returned as optimal
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.maximize(vec![3.0, 2.0]);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().with_max_iterations(1).solve(&problem);

        assert_eq!(solution.status, SolutionStatus::IterationLimitExceeded);
    }

    #[test]
    fn test_deterministic_resolve() {
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.maximize(vec![3.0, 2.0]);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let first = Solver::new().solve(&problem);
        let second = Solver::new().solve(&problem);

        assert_eq!(first.status, second.status);
        assert!(
            (first.objective_value - second.objective_value).abs() < 1e-12,
            "objectives diverged: {} vs {}",
            first.objective_value,
            second.objective_value
        );
        assert_eq!(first.values, second.values);
    }

    #[test]
    fn test_no_constraints() {
        // With no rows the zero vector is the only vertex; a positive
        // coefficient makes the problem unbounded instead
        let mut bounded = LpProblem::new(names(&["x"]));
        bounded.maximize(vec![-1.0]);
        let solution = Solver::new().solve(&bounded);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!(solution.objective_value.abs() < 1e-9);

        let mut unbounded = LpProblem::new(names(&["x"]));
        unbounded.maximize(vec![1.0]);
        let solution = Solver::new().solve(&unbounded);
        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }
}
