pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod parallel;
pub mod projector;
pub mod season;
pub mod server;
