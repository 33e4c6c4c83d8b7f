pub mod build;
pub mod config;
pub mod deploy;
pub mod descriptor;
pub mod error;
pub mod humanize;
pub mod observability;
pub mod outputs;
pub mod pipeline;
pub mod platform;
pub mod provision;
pub mod spec;
