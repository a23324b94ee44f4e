// Path Planning: curve fitting and trajectory synthesis

pub mod cubic_spline;
pub mod trajectory;

pub use cubic_spline::*;
pub use trajectory::*;
