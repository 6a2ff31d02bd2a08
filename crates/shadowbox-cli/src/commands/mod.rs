pub mod breathe;
pub mod combo;
pub mod config;
pub mod live;
pub mod stats;
pub mod stopwatch;
pub mod workout;
