pub mod model;

pub use model::{AllowFlags, DEFAULT_CONFIGURATION_PATH, Policy};
