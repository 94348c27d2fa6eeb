use thiserror::Error;

/// Validated, read-only input data for a revenue allocation problem.
///
/// Each of the `n` activities earns its basic price per unit up to the
/// discount breakpoint and the (lower) discount price beyond it, while
/// consuming the `m` shared resources according to the consumption matrix.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemModel {
    /// Resource consumption per unit of activity, m rows by n columns.
    /// Negative entries denote net production.
    consumption: Vec<Vec<f64>>,
    /// Capacity of each resource. Negative capacities are accepted; they
    /// make the problem infeasible, which is the solver's verdict to give.
    capacity: Vec<f64>,
    /// Basic price per unit of each activity
    price: Vec<f64>,
    /// Discounted price per unit beyond the breakpoint
    discount_price: Vec<f64>,
    /// Activity level at which the discount starts
    breakpoint: Vec<f64>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("Invalid price data: {0}")]
    InvalidPriceData(String),
}

impl ProblemModel {
    /// Build a model from raw problem data, validating it eagerly.
    ///
    /// Fails with [`ModelError::InvalidDimensions`] when the matrix shape
    /// disagrees with the capacity or price vectors, and with
    /// [`ModelError::InvalidPriceData`] when any price triple violates
    /// `price > 0`, `breakpoint > 0`, `0 < discount_price < price`.
    pub fn new(
        consumption: Vec<Vec<f64>>,
        capacity: Vec<f64>,
        price: Vec<f64>,
        discount_price: Vec<f64>,
        breakpoint: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let m = consumption.len();
        let n = price.len();

        if m == 0 || n == 0 {
            return Err(ModelError::InvalidDimensions(
                "need at least one resource and one activity".to_string(),
            ));
        }
        if capacity.len() != m {
            return Err(ModelError::InvalidDimensions(format!(
                "consumption matrix has {} rows but {} capacities given",
                m,
                capacity.len()
            )));
        }
        for (i, row) in consumption.iter().enumerate() {
            if row.len() != n {
                return Err(ModelError::InvalidDimensions(format!(
                    "consumption row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
        }
        if discount_price.len() != n || breakpoint.len() != n {
            return Err(ModelError::InvalidDimensions(format!(
                "{} prices, {} discount prices, {} breakpoints",
                n,
                discount_price.len(),
                breakpoint.len()
            )));
        }

        for j in 0..n {
            if price[j] <= 0.0 {
                return Err(ModelError::InvalidPriceData(format!(
                    "activity {}: price {} must be positive",
                    j, price[j]
                )));
            }
            if breakpoint[j] <= 0.0 {
                return Err(ModelError::InvalidPriceData(format!(
                    "activity {}: breakpoint {} must be positive",
                    j, breakpoint[j]
                )));
            }
            if discount_price[j] <= 0.0 {
                return Err(ModelError::InvalidPriceData(format!(
                    "activity {}: discount price {} must be positive",
                    j, discount_price[j]
                )));
            }
            if discount_price[j] >= price[j] {
                return Err(ModelError::InvalidPriceData(format!(
                    "activity {}: discount price {} must be below price {}",
                    j, discount_price[j], price[j]
                )));
            }
        }

        Ok(Self {
            consumption,
            capacity,
            price,
            discount_price,
            breakpoint,
        })
    }

    pub fn num_activities(&self) -> usize {
        self.price.len()
    }

    pub fn num_resources(&self) -> usize {
        self.capacity.len()
    }

    pub fn consumption(&self) -> &[Vec<f64>] {
        &self.consumption
    }

    pub fn capacity(&self) -> &[f64] {
        &self.capacity
    }

    pub fn price(&self) -> &[f64] {
        &self.price
    }

    pub fn discount_price(&self) -> &[f64] {
        &self.discount_price
    }

    pub fn breakpoint(&self) -> &[f64] {
        &self.breakpoint
    }

    /// Revenue earned by `activity` at `level`: the basic price applies up
    /// to the breakpoint, the discount price beyond it
    pub fn revenue(&self, activity: usize, level: f64) -> f64 {
        let p = self.price[activity];
        let pd = self.discount_price[activity];
        let q = self.breakpoint[activity];
        if level <= q {
            p * level
        } else {
            p * q + pd * (level - q)
        }
    }
}
