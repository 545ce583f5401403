//! Port traits for the collaborators around the engine.

pub mod config_port;
pub mod data_port;
pub mod report_port;
