pub mod config;
pub mod display;
pub mod error;
pub mod intervals;
pub mod session;
pub mod sound;
pub mod terminal;
