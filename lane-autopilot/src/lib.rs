pub mod benchmark;
pub mod campaign;
pub mod config;
pub mod dataset;
pub mod drivers;
pub mod runner;
pub mod util;
