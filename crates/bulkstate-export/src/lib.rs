pub mod exporter;
pub mod report;
pub mod sink;

pub use exporter::*;
pub use report::*;
pub use sink::*;
