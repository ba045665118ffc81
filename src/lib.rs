pub mod cli;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod error;
pub mod health;
pub mod orchestrator;
pub mod profile;
pub mod runtime;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;
