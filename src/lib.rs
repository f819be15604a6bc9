//! Common functionality for battsched.
#![warn(missing_docs)]
pub mod cli;
pub mod config;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod schedule;
pub mod solver;

#[cfg(test)]
mod fixture;
