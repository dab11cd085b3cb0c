pub mod engine;
pub mod errors;
pub mod gateway;
pub mod ids;
pub mod model;
pub mod outcomes;
pub mod progress;
pub mod time;
pub mod types;
pub mod validate;

pub use engine::*;
pub use errors::*;
pub use gateway::*;
pub use ids::*;
pub use model::*;
pub use outcomes::*;
pub use progress::*;
pub use time::*;
pub use types::*;
pub use validate::*;
