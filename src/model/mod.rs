pub mod board;
pub mod column;
pub mod config;
pub mod task;
