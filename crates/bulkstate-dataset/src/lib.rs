pub mod dataset;
pub mod selection;

pub use dataset::*;
pub use selection::*;
