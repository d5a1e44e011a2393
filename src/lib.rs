pub mod config;
pub mod domain;
pub mod platform;
pub mod probe;
pub mod runner;
pub mod telemetry;
