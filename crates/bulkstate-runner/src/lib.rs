pub mod config;
pub mod progress;
pub mod runner;

pub use config::*;
pub use progress::*;
pub use runner::*;
