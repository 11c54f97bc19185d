pub mod account;
pub mod action;
pub mod actions;
pub mod bootstrap;
pub mod config;
pub mod container;
pub mod environment;
pub mod errors;
pub mod flags;
pub mod hooks;
pub mod lifecycle;
pub mod middleware;
pub mod precondition;
pub mod project;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;
