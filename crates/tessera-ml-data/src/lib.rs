pub mod dataframe;
pub mod error;

pub use dataframe::{Cell, DataFrame};
pub use error::{DataError, DataResult};
