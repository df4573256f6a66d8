pub mod csv_io;
pub mod error;
pub mod model_io;

pub use csv_io::{read_csv, read_csv_from};
pub use error::{IoError, IoResult};
pub use model_io::{load_json, load_params, read_params, save_json, save_params, write_params, ModelParams};
