pub mod serialization;
pub mod setup;
pub mod solver;
pub mod state;
