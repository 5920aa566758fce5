pub mod board;
pub mod moves;
pub mod player;
pub mod region;
pub mod score;
pub mod values;
