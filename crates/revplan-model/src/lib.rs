pub mod evaluate;
pub mod model;
pub mod reformulate;

pub use evaluate::{ActivityFigures, AllocationReport, EvaluateError};
pub use model::{ModelError, ProblemModel};
pub use reformulate::Reformulation;
