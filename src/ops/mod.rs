pub mod board_ops;
pub mod controller;
pub mod optimistic;
pub mod validate;
