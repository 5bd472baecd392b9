pub mod args;
pub mod config;
pub mod loader;

pub use args::{Action, Args};
pub use config::ConfigFile;
pub use loader::{PolicyInputs, PolicyLoader};
