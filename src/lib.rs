pub mod config;
pub mod error;
pub mod simulation;
pub mod engine;

pub use simulation::*;
pub use config::*;
pub use engine::*;
pub use error::SimError;
