pub mod gradient;
pub mod regression;
pub mod logistic;

pub use gradient::*;
pub use regression::*;
pub use logistic::*;
