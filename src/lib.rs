pub mod agents;
pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod graph;
pub mod kinds;
pub mod logging;
pub mod machine;
pub mod models;
pub mod phases;
pub mod tracker;
pub mod validation;
