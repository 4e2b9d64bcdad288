//! COURTSIDE: de-vigged edge scoring and Kelly staking for basketball slates
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod data;
pub mod strategy;
pub mod storage;
pub mod alerts;
pub mod engine;

#[cfg(test)]
mod test_support;
